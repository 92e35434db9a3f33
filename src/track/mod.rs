//! Tracks: a cyclic sequence of checkpoints agents must pass in order, plus the powerups
//! lying along it.

pub mod generate;

pub use generate::{Circle, Park, Segment, SineLoop, TileLoop};

use crate::{config::TrackConfig, constants::GYMKHANA_START_LERP, vector::Vector2};
use serde::{Deserialize, Serialize};

/// Checkpoint geometry as produced by a [TrackGenerator]
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub checkpoints: Vec<Vector2>,
    pub start_checkpoint_index: usize,
}

impl Track {
    /// Panics unless the track is usable: at least two checkpoints, all finite, start index
    /// in range. A single checkpoint would be passed, and lapped, on every tick.
    pub fn validate(&self) {
        assert!(!self.checkpoints.is_empty(), "track has no checkpoints");
        assert!(
            self.checkpoints.len() >= 2,
            "track needs at least two checkpoints, has {}",
            self.checkpoints.len()
        );
        assert!(
            self.start_checkpoint_index < self.checkpoints.len(),
            "start checkpoint {} out of range for {} checkpoints",
            self.start_checkpoint_index,
            self.checkpoints.len()
        );
        assert!(
            self.checkpoints.iter().all(Vector2::is_finite),
            "track has non-finite checkpoints"
        );
    }
}

pub trait TrackGenerator {
    fn generate(&self) -> Track;
}

/// Which generator builds a track, and with what parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TrackVariant {
    Circle {
        checkpoints: usize,
        radius: f64,
    },
    Sine {
        checkpoints: usize,
        radius: f64,
        amplitude: f64,
        waves: u32,
    },
    Park {
        segments: Vec<Segment>,
        spacing: f64,
    },
    Tiles {
        cols: usize,
        rows: usize,
        tile: f64,
        seed: u64,
    },
}

impl Default for TrackVariant {
    fn default() -> Self {
        let Circle {
            checkpoints,
            radius,
        } = Circle::default();
        Self::Circle {
            checkpoints,
            radius,
        }
    }
}

impl TrackVariant {
    /// The named variant with its default parameters
    pub fn named(name: &str) -> Option<Self> {
        Some(match name {
            "circle" => Self::default(),
            "sine" => {
                let SineLoop {
                    checkpoints,
                    radius,
                    amplitude,
                    waves,
                } = SineLoop::default();
                Self::Sine {
                    checkpoints,
                    radius,
                    amplitude,
                    waves,
                }
            }
            "park" => {
                let Park { segments, spacing } = Park::default();
                Self::Park { segments, spacing }
            }
            "tiles" => {
                let TileLoop {
                    cols,
                    rows,
                    tile,
                    seed,
                } = TileLoop::default();
                Self::Tiles {
                    cols,
                    rows,
                    tile,
                    seed,
                }
            }
            _ => return None,
        })
    }
}

impl TrackGenerator for TrackVariant {
    fn generate(&self) -> Track {
        match self.clone() {
            Self::Circle {
                checkpoints,
                radius,
            } => Circle {
                checkpoints,
                radius,
            }
            .generate(),
            Self::Sine {
                checkpoints,
                radius,
                amplitude,
                waves,
            } => SineLoop {
                checkpoints,
                radius,
                amplitude,
                waves,
            }
            .generate(),
            Self::Park { segments, spacing } => Park { segments, spacing }.generate(),
            Self::Tiles {
                cols,
                rows,
                tile,
                seed,
            } => TileLoop {
                cols,
                rows,
                tile,
                seed,
            }
            .generate(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerupKind {
    Booster,
    Rocket,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Powerup {
    pub pos: Vector2,
    pub cooldown_ticks: i32,
    pub kind: PowerupKind,
}

impl Powerup {
    #[inline]
    pub fn is_available(&self) -> bool {
        self.cooldown_ticks <= 0
    }
}

/// A track with its powerups, as raced on.
///
/// Checkpoint indices are always taken modulo the checkpoint count. The geometry only
/// changes through [Environment::regenerate].
#[derive(Debug, Clone)]
pub struct Environment {
    checkpoints: Vec<Vector2>,
    powerups: Vec<Powerup>,
    start_checkpoint_index: usize,
    pub max_leave_distance: f64,
    powerup_count: usize,
    variant: TrackVariant,
}

impl Environment {
    pub fn new(config: &TrackConfig) -> Self {
        let mut env = Self {
            checkpoints: Vec::new(),
            powerups: Vec::new(),
            start_checkpoint_index: 0,
            max_leave_distance: config.max_leave_distance,
            powerup_count: config.powerups,
            variant: config.variant.clone(),
        };
        env.regenerate(config.variant.clone());
        env
    }

    /// A default-configured environment on the given track
    pub fn from_variant(variant: TrackVariant) -> Self {
        Self::new(&TrackConfig {
            variant,
            ..TrackConfig::default()
        })
    }

    /// Rebuild the checkpoints and powerups from `variant`
    pub fn regenerate(&mut self, variant: TrackVariant) {
        let track = variant.generate();
        track.validate();
        self.checkpoints = track.checkpoints;
        self.start_checkpoint_index = track.start_checkpoint_index;
        self.variant = variant;
        self.place_powerups();
    }

    /// Spread powerups evenly along the lap, midway between checkpoints, alternating kinds
    fn place_powerups(&mut self) {
        let n = self.checkpoints.len();
        let count = self.powerup_count;
        self.powerups = (0..count)
            .map(|i| {
                let idx = self.start_checkpoint_index + (i + 1) * n / (count + 1);
                Powerup {
                    pos: self.checkpoint(idx).lerp(self.checkpoint(idx + 1), 0.5),
                    cooldown_ticks: 0,
                    kind: if i % 2 == 0 {
                        PowerupKind::Booster
                    } else {
                        PowerupKind::Rocket
                    },
                }
            })
            .collect();
    }

    pub fn variant(&self) -> &TrackVariant {
        &self.variant
    }

    pub fn checkpoints(&self) -> &[Vector2] {
        &self.checkpoints
    }

    pub fn num_checkpoints(&self) -> usize {
        self.checkpoints.len()
    }

    pub fn start_checkpoint_index(&self) -> usize {
        self.start_checkpoint_index
    }

    #[inline]
    pub fn checkpoint(&self, idx: usize) -> Vector2 {
        self.checkpoints[idx % self.checkpoints.len()]
    }

    /// Indices of the `count` checkpoints following `passed` checkpoints from the start,
    /// wrapping around the lap
    pub fn window_indices(&self, count: usize, passed: u32) -> impl Iterator<Item = usize> {
        let n = self.checkpoints.len();
        let first = (self.start_checkpoint_index + passed as usize % n) % n;
        (0..count).map(move |i| (first + i) % n)
    }

    /// Positions of [Environment::window_indices], by value
    pub fn checkpoint_window(&self, count: usize, passed: u32) -> Vec<Vector2> {
        self.window_indices(count, passed)
            .map(|idx| self.checkpoints[idx])
            .collect()
    }

    /// The checkpoint an agent having passed `passed` checkpoints is heading for
    pub fn target(&self, passed: u32) -> Vector2 {
        self.checkpoint(self.start_checkpoint_index + passed as usize % self.checkpoints.len())
    }

    /// Where agents spawn and which way they face: most of the way from the checkpoint
    /// before the start towards the start checkpoint
    pub fn start_pose(&self) -> (Vector2, Vector2) {
        let n = self.checkpoints.len();
        let start = self.checkpoints[self.start_checkpoint_index];
        let prev = self.checkpoint(self.start_checkpoint_index + n - 1);
        let pos = prev.lerp(start, GYMKHANA_START_LERP);
        let mut direction = (start - prev).normalized();
        if direction == Vector2::ZERO {
            direction = Vector2::new(1., 0.);
        }
        (pos, direction)
    }

    pub fn has_left_course(&self, pos: Vector2, passed: u32) -> bool {
        pos.dist(self.target(passed)) > self.max_leave_distance
    }

    pub fn powerups(&self) -> &[Powerup] {
        &self.powerups
    }

    /// The first available powerup within `radius` of `pos`
    pub fn available_powerup_near(&mut self, pos: Vector2, radius: f64) -> Option<&mut Powerup> {
        self.powerups
            .iter_mut()
            .find(|p| p.is_available() && p.pos.dist(pos) < radius)
    }

    /// Count every cooldown down by one tick
    pub fn update_powerups(&mut self) {
        for powerup in &mut self.powerups {
            powerup.cooldown_ticks = (powerup.cooldown_ticks - 1).max(0);
        }
    }

    pub fn reset_powerups(&mut self) {
        for powerup in &mut self.powerups {
            powerup.cooldown_ticks = 0;
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::assert_f64_approx;

    fn circle() -> Environment {
        Environment::from_variant(TrackVariant::default())
    }

    #[test]
    fn test_window_wraps() {
        let env = circle();
        assert_eq!(env.window_indices(3, 35).collect::<Vec<_>>(), [35, 0, 1]);
        assert_eq!(env.window_indices(3, 35 + 36 * 2).collect::<Vec<_>>(), [35, 0, 1]);
        assert_eq!(
            env.checkpoint_window(3, 35),
            [env.checkpoints()[35], env.checkpoints()[0], env.checkpoints()[1]]
        );
    }

    #[test]
    fn test_window_respects_start_index() {
        let mut env = circle();
        env.start_checkpoint_index = 34;
        assert_eq!(env.window_indices(4, 1).collect::<Vec<_>>(), [35, 0, 1, 2]);
        assert_eq!(env.target(2), env.checkpoints()[0]);
    }

    #[test]
    fn test_start_pose() {
        let (pos, direction) = circle().start_pose();
        assert_f64_approx!(pos.heading(), -1., 0.01);
        assert_f64_approx!(direction.mag(), 1.);
        // the chord from -10° to 0° on a circle
        assert_f64_approx!(direction.heading(), 85., 1e-6);
        assert!(pos.dist(Vector2::new(200., 0.)) < 40.);
    }

    #[test]
    fn test_left_course() {
        let env = circle();
        let target = env.target(0);
        assert!(!env.has_left_course(target, 0));
        assert!(!env.has_left_course(target + Vector2::new(249., 0.), 0));
        assert!(env.has_left_course(target + Vector2::new(251., 0.), 0));
        assert!(env.has_left_course(target + Vector2::new(251., 0.), 36));
    }

    #[test]
    fn test_powerups() {
        let mut env = circle();
        assert_eq!(env.powerups().len(), 4);
        assert_eq!(env.powerups()[0].kind, PowerupKind::Booster);
        assert_eq!(env.powerups()[1].kind, PowerupKind::Rocket);

        let pos = env.powerups()[1].pos;
        let found = env.available_powerup_near(pos, 15.).unwrap();
        assert_eq!(found.kind, PowerupKind::Rocket);
        found.cooldown_ticks = 2;
        assert!(env.available_powerup_near(pos, 15.).is_none());

        env.update_powerups();
        assert_eq!(env.powerups()[1].cooldown_ticks, 1);
        env.update_powerups();
        env.update_powerups();
        assert_eq!(env.powerups()[1].cooldown_ticks, 0);
        assert!(env.available_powerup_near(pos, 15.).is_some());
    }

    #[test]
    fn test_regenerate() {
        let mut env = circle();
        env.regenerate(TrackVariant::named("tiles").unwrap());
        assert_eq!(env.num_checkpoints(), 48);
        assert_eq!(env.powerups().len(), 4);
        assert!(matches!(env.variant(), TrackVariant::Tiles { .. }));
    }

    #[test]
    fn test_named_variants() {
        for name in ["circle", "sine", "park", "tiles"] {
            let variant = TrackVariant::named(name).unwrap();
            let back: TrackVariant =
                serde_json::from_str(&serde_json::to_string(&variant).unwrap()).unwrap();
            assert_eq!(variant, back);
        }
        assert!(TrackVariant::named("moebius").is_none());
    }

    #[test]
    #[should_panic(expected = "track needs at least two checkpoints, has 1")]
    fn test_single_checkpoint_track() {
        Environment::from_variant(TrackVariant::Park {
            segments: Vec::new(),
            spacing: 45.,
        });
    }

    #[test]
    #[should_panic(expected = "track has no checkpoints")]
    fn test_empty_track() {
        Environment::from_variant(TrackVariant::Circle {
            checkpoints: 0,
            radius: 100.,
        });
    }
}
