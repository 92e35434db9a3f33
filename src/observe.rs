//! Turns what an agent can see into the fixed-size input vector of its network.
//!
//! The upcoming checkpoints are moved into the agent's frame (agent at the origin, facing
//! +x), scaled so the farthest lies on the unit circle, flattened and remapped from [-1, 1]
//! to [0, 1]. Speed and powerup state follow.

use crate::{agent::Agent, track::Environment, vector::Vector2};

/// The next `count` checkpoints for an agent having passed `passed` of them
pub fn checkpoint_window(env: &Environment, count: usize, passed: u32) -> Vec<Vector2> {
    env.checkpoint_window(count, passed)
}

pub fn translate(points: &mut [Vector2], by: Vector2) {
    for p in points {
        p.add(by);
    }
}

/// Rotate every point by `deg` degrees about the origin
pub fn rotate(points: &mut [Vector2], deg: f64) {
    for p in points {
        p.rotate(deg);
    }
}

/// Largest distance from the origin
pub fn max_dist(points: &[Vector2]) -> f64 {
    points.iter().map(Vector2::mag).fold(0., f64::max)
}

/// Divide by [max_dist], so every point lands in the unit disc. All points sitting on the
/// origin are left there.
pub fn scale(points: &mut [Vector2]) {
    let mut max = max_dist(points);
    if max == 0. {
        max = 1.;
    }
    for p in points {
        p.div(max);
    }
}

pub fn flatten(points: &[Vector2]) -> Vec<f64> {
    points.iter().flat_map(|p| [p.x, p.y]).collect()
}

/// Linearly map `v` from [from_lo, from_hi] to [to_lo, to_hi]
#[inline]
pub fn map_value(v: f64, from_lo: f64, from_hi: f64, to_lo: f64, to_hi: f64) -> f64 {
    to_lo + (v - from_lo) * (to_hi - to_lo) / (from_hi - from_lo)
}

#[inline]
fn flag(b: bool) -> f64 {
    if b {
        1.
    } else {
        0.
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Encoder {
    pub lookahead: usize,
}

impl Encoder {
    pub fn new(lookahead: usize) -> Self {
        assert!(lookahead > 0, "encoder must look at least one checkpoint ahead");
        Self { lookahead }
    }

    /// Length of every observation, which is the input size of the networks reading them
    #[inline]
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        2 * self.lookahead + 4
    }

    /// `speed_cap` is the speed that maps to 1; faster is clamped
    pub fn encode(&self, env: &Environment, agent: &Agent, speed_cap: f64) -> Vec<f64> {
        let mut points = checkpoint_window(env, self.lookahead, agent.reached_checkpoints);
        translate(&mut points, -agent.pos);
        rotate(&mut points, -agent.direction.heading());
        scale(&mut points);

        let mut obs = Vec::with_capacity(self.len());
        obs.extend(
            flatten(&points)
                .into_iter()
                .map(|v| map_value(v, -1., 1., 0., 1.)),
        );

        let speed = if speed_cap > 0. {
            (agent.speed() / speed_cap).clamp(0., 1.)
        } else {
            0.
        };
        obs.extend([
            speed,
            flag(agent.has_booster_pickup),
            flag(agent.has_rocket_pickup),
            flag(agent.is_boosting),
        ]);
        obs
    }
}
