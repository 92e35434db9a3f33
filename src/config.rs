//! Run configuration. Every field defaults to its counterpart in [crate::constants], and every
//! struct deserializes with `#[serde(default)]`, so a config file only needs the values it
//! overrides.

use crate::{agent::ActionSpace, constants::*, track::TrackVariant};
use core::error::Error;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// Agent kinematics and the action space the policy chooses from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    pub steering_deltas: Vec<f64>,
    pub throttle_deltas: Vec<f64>,
    pub initial_throttle: f64,
    pub boost_throttle: f64,
    pub drag_divisor: f64,
    pub boost_damping: f64,
    pub stall_ticks: u32,
    pub booster_ticks: i32,
    pub boost_bonus: f64,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            steering_deltas: GYMKHANA_STEERING_DELTAS.to_vec(),
            throttle_deltas: GYMKHANA_THROTTLE_DELTAS.to_vec(),
            initial_throttle: GYMKHANA_INITIAL_THROTTLE,
            boost_throttle: GYMKHANA_BOOST_THROTTLE,
            drag_divisor: GYMKHANA_DRAG_DIVISOR,
            boost_damping: GYMKHANA_BOOST_DAMPING,
            stall_ticks: GYMKHANA_STALL_TICKS,
            booster_ticks: GYMKHANA_BOOSTER_TICKS,
            boost_bonus: GYMKHANA_BOOST_BONUS,
        }
    }
}

impl PhysicsConfig {
    pub fn action_space(&self) -> ActionSpace {
        ActionSpace::new(self.steering_deltas.clone(), self.throttle_deltas.clone())
    }
}

/// Per-race bookkeeping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RaceConfig {
    pub checkpoint_radius: f64,
    pub pickup_radius: f64,
    pub max_steps: u32,
    pub lap_bonus: f64,
    pub lookahead: usize,
    pub powerup_cooldown: i32,
    pub start_jitter: f64,
    pub collisions: bool,
    pub collision_radius: f64,
    pub collision_impulse: f64,
}

impl Default for RaceConfig {
    fn default() -> Self {
        Self {
            checkpoint_radius: GYMKHANA_CHECKPOINT_RADIUS,
            pickup_radius: GYMKHANA_PICKUP_RADIUS,
            max_steps: GYMKHANA_MAX_STEPS,
            lap_bonus: GYMKHANA_LAP_BONUS,
            lookahead: GYMKHANA_LOOKAHEAD,
            powerup_cooldown: GYMKHANA_POWERUP_COOLDOWN,
            start_jitter: GYMKHANA_START_JITTER,
            collisions: false,
            collision_radius: GYMKHANA_COLLISION_RADIUS,
            collision_impulse: GYMKHANA_COLLISION_IMPULSE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackConfig {
    pub variant: TrackVariant,
    pub powerups: usize,
    pub max_leave_distance: f64,
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self {
            variant: TrackVariant::default(),
            powerups: GYMKHANA_POWERUP_COUNT,
            max_leave_distance: GYMKHANA_MAX_LEAVE_DISTANCE,
        }
    }
}

/// Population shape and the evolutionary schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GymConfig {
    pub races: usize,
    pub agents_per_race: usize,
    /// Hidden layer width; half the sum of input and output sizes when unset
    pub hidden_nodes: Option<usize>,
    pub epoch_limit: u32,
    pub epsilon_max: f64,
    pub epsilon_min: f64,
    /// Stop training once the best fitness reaches this
    pub success_threshold: Option<f64>,
    pub best_networks_cap: usize,
    pub showcase_steps: u32,
    pub store_key: String,
}

impl Default for GymConfig {
    fn default() -> Self {
        Self {
            races: GYMKHANA_RACES,
            agents_per_race: GYMKHANA_AGENTS_PER_RACE,
            hidden_nodes: None,
            epoch_limit: GYMKHANA_EPOCH_LIMIT,
            epsilon_max: GYMKHANA_EPSILON_MAX,
            epsilon_min: GYMKHANA_EPSILON_MIN,
            success_threshold: None,
            best_networks_cap: GYMKHANA_BEST_NETWORKS_CAP,
            showcase_steps: GYMKHANA_SHOWCASE_STEPS,
            store_key: GYMKHANA_STORE_KEY.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub physics: PhysicsConfig,
    pub race: RaceConfig,
    pub track: TrackConfig,
    pub gym: GymConfig,
}

impl Config {
    pub fn to_string(&self) -> Result<String, Box<dyn Error>> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self, Box<dyn Error>> {
        serde_json::from_str(s).map_err(|op| op.into())
    }

    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn Error>> {
        fs::write(path, self.to_string()?)?;
        Ok(())
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn Error>> {
        Self::from_str(&fs::read_to_string(path)?)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_round_trip() {
        let mut config = Config::default();
        config.gym.races = 3;
        config.race.collisions = true;
        config.track.variant = TrackVariant::Tiles {
            cols: 3,
            rows: 2,
            tile: 50.,
            seed: 9,
        };

        let back = Config::from_str(&config.to_string().unwrap()).unwrap();
        assert_eq!(config, back);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config = Config::from_str(
            r#"{"physics": {"stall_ticks": 40}, "gym": {"success_threshold": 72.0}}"#,
        )
        .unwrap();
        assert_eq!(config.physics.stall_ticks, 40);
        assert_eq!(config.physics.drag_divisor, GYMKHANA_DRAG_DIVISOR);
        assert_eq!(config.gym.success_threshold, Some(72.));
        assert_eq!(config.gym.races, GYMKHANA_RACES);
        assert_eq!(config.race, RaceConfig::default());
    }

    #[test]
    fn test_action_space_len() {
        let space = PhysicsConfig::default().action_space();
        assert_eq!(
            space.len(),
            GYMKHANA_STEERING_DELTAS.len() + GYMKHANA_THROTTLE_DELTAS.len() + 2
        );
    }
}
