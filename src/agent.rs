//! A single racer: its kinematics, its progress along the track, and the discrete actions a
//! policy can take.

use crate::{
    config::PhysicsConfig,
    constants::{GYMKHANA_STEERING_DELTAS, GYMKHANA_THROTTLE_DELTAS},
    track::PowerupKind,
    vector::Vector2,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    /// Turn by this many degrees
    Steer(f64),
    /// Change throttle by this much
    Throttle(f64),
    ActivateBooster,
    Noop,
}

/// The mapping from a network's output index to an [Action]: one id per steering delta,
/// then one per throttle delta, then the booster, then a no-op.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionSpace {
    steering: Vec<f64>,
    throttle: Vec<f64>,
}

impl Default for ActionSpace {
    fn default() -> Self {
        Self::new(
            GYMKHANA_STEERING_DELTAS.to_vec(),
            GYMKHANA_THROTTLE_DELTAS.to_vec(),
        )
    }
}

impl ActionSpace {
    pub fn new(steering: Vec<f64>, throttle: Vec<f64>) -> Self {
        Self { steering, throttle }
    }

    #[inline]
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.steering.len() + self.throttle.len() + 2
    }

    pub fn booster_id(&self) -> usize {
        self.steering.len() + self.throttle.len()
    }

    pub fn noop_id(&self) -> usize {
        self.booster_id() + 1
    }

    /// Ids past the end decode to [Action::Noop]
    pub fn decode(&self, id: usize) -> Action {
        let steer = self.steering.len();
        let throttle = steer + self.throttle.len();
        match id {
            i if i < steer => Action::Steer(self.steering[i]),
            i if i < throttle => Action::Throttle(self.throttle[i - steer]),
            i if i == throttle => Action::ActivateBooster,
            _ => Action::Noop,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Agent {
    pub start_pos: Vector2,
    pub start_dir: Vector2,
    pub initial_throttle: f64,

    pub pos: Vector2,
    /// Unit heading
    pub direction: Vector2,
    pub velocity: Vector2,
    pub throttle: f64,
    pub alive: bool,

    pub reached_checkpoints: u32,
    pub score: f64,
    pub ticks_since_checkpoint: u32,
    pub next_checkpoint_pos: Vector2,

    pub has_booster_pickup: bool,
    pub has_rocket_pickup: bool,
    pub booster_ticks_remaining: i32,
    pub is_boosting: bool,
    pub max_speed_seen: f64,
}

impl Agent {
    pub fn new(start_pos: Vector2, start_dir: Vector2, initial_throttle: f64) -> Self {
        let mut agent = Self {
            start_pos,
            start_dir,
            initial_throttle,
            pos: start_pos,
            direction: start_dir,
            velocity: Vector2::ZERO,
            throttle: initial_throttle,
            alive: true,
            reached_checkpoints: 0,
            score: 0.,
            ticks_since_checkpoint: 0,
            next_checkpoint_pos: start_pos,
            has_booster_pickup: false,
            has_rocket_pickup: false,
            booster_ticks_remaining: 0,
            is_boosting: false,
            max_speed_seen: 0.,
        };
        agent.reset();
        agent
    }

    /// Move the spawn point used by the next [Agent::reset]
    pub fn set_start(&mut self, start_pos: Vector2, start_dir: Vector2) {
        self.start_pos = start_pos;
        self.start_dir = start_dir;
    }

    pub fn reset(&mut self) {
        self.pos = self.start_pos;
        self.direction = self.start_dir;
        self.velocity = Vector2::ZERO;
        self.throttle = self.initial_throttle;
        self.alive = true;
        self.reached_checkpoints = 0;
        self.score = 0.;
        self.ticks_since_checkpoint = 0;
        self.next_checkpoint_pos = self.start_pos;
        self.has_booster_pickup = false;
        self.has_rocket_pickup = false;
        self.booster_ticks_remaining = 0;
        self.is_boosting = false;
        self.max_speed_seen = 0.;
    }

    #[inline]
    pub fn fitness(&self) -> f64 {
        self.reached_checkpoints as f64 + self.score
    }

    #[inline]
    pub fn speed(&self) -> f64 {
        self.velocity.mag()
    }

    /// Advance one tick under `action`. Dead agents don't move.
    pub fn update(&mut self, action: Action, physics: &PhysicsConfig) {
        if !self.alive {
            return;
        }

        let (steer, throttle_delta) = match action {
            Action::Steer(deg) => (deg, 0.),
            Action::Throttle(delta) => (0., delta),
            Action::ActivateBooster => {
                self.activate_booster(physics);
                (0., 0.)
            }
            Action::Noop => (0., 0.),
        };

        self.direction.rotate(steer);

        let boost = if self.is_boosting {
            physics.boost_throttle
        } else {
            0.
        };
        let new_throttle = self.throttle + throttle_delta + boost;
        if new_throttle > 0. && new_throttle < 1. {
            self.throttle = new_throttle;
        }

        self.velocity += self.direction * self.throttle;
        if self.is_boosting {
            self.velocity.mult(physics.boost_damping);
        } else {
            self.velocity.div(physics.drag_divisor);
        }
        self.pos += self.velocity;
        self.max_speed_seen = self.max_speed_seen.max(self.speed());

        self.ticks_since_checkpoint += 1;
        if self.is_boosting {
            self.booster_ticks_remaining -= 1;
            if self.booster_ticks_remaining <= 0 {
                self.booster_ticks_remaining = 0;
                self.is_boosting = false;
            }
        }

        if self.ticks_since_checkpoint > physics.stall_ticks {
            self.score = 0.;
            self.alive = false;
        }
    }

    fn activate_booster(&mut self, physics: &PhysicsConfig) {
        if !self.has_booster_pickup {
            return;
        }
        self.has_booster_pickup = false;
        self.booster_ticks_remaining = physics.booster_ticks;
        self.is_boosting = true;
        self.score += physics.boost_bonus;
    }

    /// Credit a reached checkpoint, with `lap_bonus` on every full lap of `num_checkpoints`
    pub fn pass_checkpoint(&mut self, num_checkpoints: usize, lap_bonus: f64) {
        self.ticks_since_checkpoint = 0;
        self.reached_checkpoints += 1;
        if self.reached_checkpoints as usize % num_checkpoints == 0 {
            self.score += lap_bonus;
        }
    }

    pub fn pick_up(&mut self, kind: PowerupKind) {
        match kind {
            PowerupKind::Booster => self.has_booster_pickup = true,
            PowerupKind::Rocket => self.has_rocket_pickup = true,
        }
    }

    pub fn kill(&mut self) {
        self.alive = false;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        assert_f64_approx,
        network::NeuralNetwork,
        observe::Encoder,
        track::{Environment, TrackVariant},
    };

    fn agent() -> Agent {
        Agent::new(Vector2::ZERO, Vector2::new(0., 1.), 0.1)
    }

    #[test]
    fn test_decode_boundaries() {
        let space = ActionSpace::default();
        assert_eq!(space.len(), 17);
        assert_eq!(space.decode(0), Action::Steer(-16.));
        assert_eq!(space.decode(8), Action::Steer(16.));
        assert_eq!(space.decode(9), Action::Throttle(-0.5));
        assert_eq!(space.decode(14), Action::Throttle(0.5));
        assert_eq!(space.decode(15), Action::ActivateBooster);
        assert_eq!(space.decode(space.booster_id()), Action::ActivateBooster);
        assert_eq!(space.decode(16), Action::Noop);
        assert_eq!(space.decode(space.noop_id()), Action::Noop);
        assert_eq!(space.decode(1000), Action::Noop);
    }

    #[test]
    fn test_stall() {
        let physics = PhysicsConfig::default();
        let mut agent = agent();
        agent.score = 3.;
        for _ in 0..physics.stall_ticks {
            agent.update(Action::Noop, &physics);
        }
        assert!(agent.alive);
        assert_f64_approx!(agent.score, 3.);

        agent.update(Action::Noop, &physics);
        assert!(!agent.alive);
        assert_eq!(agent.score, 0.);

        let pos = agent.pos;
        agent.update(Action::Throttle(0.5), &physics);
        assert_eq!(agent.pos, pos);
        assert_eq!(agent.ticks_since_checkpoint, physics.stall_ticks + 1);
    }

    #[test]
    fn test_checkpoint_resets_stall() {
        let physics = PhysicsConfig::default();
        let mut agent = agent();
        for _ in 0..3 {
            for _ in 0..physics.stall_ticks {
                agent.update(Action::Noop, &physics);
            }
            agent.pass_checkpoint(36, 100.);
        }
        assert!(agent.alive);
        assert_eq!(agent.reached_checkpoints, 3);
    }

    #[test]
    fn test_throttle_bounds() {
        let physics = PhysicsConfig::default();
        let mut agent = agent();
        agent.update(Action::Throttle(-0.5), &physics);
        assert_f64_approx!(agent.throttle, 0.1);
        agent.update(Action::Throttle(-0.1), &physics);
        assert_f64_approx!(agent.throttle, 0.1);
        agent.update(Action::Throttle(0.5), &physics);
        assert_f64_approx!(agent.throttle, 0.6);
        agent.update(Action::Throttle(0.5), &physics);
        assert_f64_approx!(agent.throttle, 0.6);
        agent.update(Action::Throttle(0.25), &physics);
        assert_f64_approx!(agent.throttle, 0.85);
    }

    #[test]
    fn test_steer() {
        let physics = PhysicsConfig::default();
        let mut agent = agent();
        agent.update(Action::Steer(-16.), &physics);
        assert_f64_approx!(agent.direction.heading(), 74.);
        assert_f64_approx!(agent.direction.mag(), 1.);
        assert_f64_approx!(agent.velocity.heading(), 74.);
    }

    #[test]
    fn test_boost() {
        let physics = PhysicsConfig::default();
        let mut agent = agent();

        agent.update(Action::ActivateBooster, &physics);
        assert!(!agent.is_boosting);
        assert_eq!(agent.score, 0.);

        agent.reset();
        agent.pick_up(PowerupKind::Booster);
        agent.update(Action::ActivateBooster, &physics);
        assert!(agent.is_boosting);
        assert!(!agent.has_booster_pickup);
        assert_f64_approx!(agent.score, physics.boost_bonus);
        assert_f64_approx!(agent.throttle, 0.35);
        assert_f64_approx!(agent.speed(), 0.35 * 0.92);
        assert_eq!(agent.booster_ticks_remaining, physics.booster_ticks - 1);

        for _ in 1..physics.booster_ticks {
            assert!(agent.is_boosting);
            agent.ticks_since_checkpoint = 0;
            agent.update(Action::Noop, &physics);
        }
        assert!(!agent.is_boosting);
        assert_eq!(agent.booster_ticks_remaining, 0);
        assert!(agent.alive);
    }

    #[test]
    fn test_lap_bonus() {
        let mut agent = agent();
        for _ in 0..35 {
            agent.pass_checkpoint(36, 100.);
        }
        assert_f64_approx!(agent.fitness(), 35.);
        agent.pass_checkpoint(36, 100.);
        assert_f64_approx!(agent.fitness(), 136.);
    }

    #[test]
    fn test_reset() {
        let physics = PhysicsConfig::default();
        let fresh = agent();
        let mut agent = fresh.clone();
        agent.pick_up(PowerupKind::Rocket);
        agent.update(Action::Throttle(0.5), &physics);
        agent.pass_checkpoint(36, 100.);
        agent.kill();
        agent.reset();
        assert_eq!(agent, fresh);
    }

    #[test]
    fn test_idle_policy_coasts() {
        let physics = PhysicsConfig::default();
        let space = physics.action_space();
        let env = Environment::from_variant(TrackVariant::default());
        let encoder = Encoder::new(5);
        let brain = NeuralNetwork::always(encoder.len(), space.len(), space.noop_id());

        let (start, direction) = env.start_pose();
        let mut agent = Agent::new(start, direction, physics.initial_throttle);

        let ticks = 20;
        let mut speed = 0.;
        let mut travelled = 0.;
        for _ in 0..ticks {
            let obs = encoder.encode(&env, &agent, 1.);
            assert_eq!(obs.len(), 14);
            let action = space.decode(brain.predict(&obs));
            assert_eq!(action, Action::Noop);
            agent.update(action, &physics);

            speed = (speed + physics.initial_throttle) / physics.drag_divisor;
            travelled += speed;
        }

        let expected = start + direction * travelled;
        assert_f64_approx!(agent.pos.x, expected.x, 1e-9);
        assert_f64_approx!(agent.pos.y, expected.y, 1e-9);
        assert_f64_approx!(agent.speed(), speed, 1e-12);
        // checkpoint credit is race bookkeeping, which a bare agent never sees
        assert_eq!(agent.reached_checkpoints, 0);
        assert!(agent.alive);
    }
}
