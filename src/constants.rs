//! Centralized defaults for gymkhana simulation and evolution parameters.
//!
//! All tunable parameters are defined here with the `GYMKHANA_` prefix. They seed the
//! `Default` impls in [crate::config], which is where a run actually reads them from.

// ============================================================================
// Agent Physics
// ============================================================================

/// Heading changes, in degrees, selectable by the policy
pub const GYMKHANA_STEERING_DELTAS: [f64; 9] = [-16., -8., -5., -3., 0., 3., 5., 8., 16.];

/// Throttle changes selectable by the policy
pub const GYMKHANA_THROTTLE_DELTAS: [f64; 6] = [-0.5, -0.25, -0.1, 0.1, 0.25, 0.5];

/// Throttle of a freshly reset agent
pub const GYMKHANA_INITIAL_THROTTLE: f64 = 0.1;

/// Extra throttle requested every tick while boosting
pub const GYMKHANA_BOOST_THROTTLE: f64 = 0.25;

/// Velocity divisor applied every tick when not boosting
pub const GYMKHANA_DRAG_DIVISOR: f64 = 1.1;

/// Velocity multiplier applied every tick while boosting
pub const GYMKHANA_BOOST_DAMPING: f64 = 0.92;

/// Ticks without reaching a checkpoint before an agent stalls out
pub const GYMKHANA_STALL_TICKS: u32 = 25;

/// Duration of an activated booster
pub const GYMKHANA_BOOSTER_TICKS: i32 = 100;

/// Score awarded for activating a held booster
pub const GYMKHANA_BOOST_BONUS: f64 = 0.5;

// ============================================================================
// Race Parameters
// ============================================================================

/// Distance at which a checkpoint counts as reached
pub const GYMKHANA_CHECKPOINT_RADIUS: f64 = 40.;

/// Distance at which a powerup is picked up
pub const GYMKHANA_PICKUP_RADIUS: f64 = 15.;

/// Tick budget of a training race
pub const GYMKHANA_MAX_STEPS: u32 = 1000;

/// Score awarded every time an agent completes a lap
pub const GYMKHANA_LAP_BONUS: f64 = 100.;

/// Number of upcoming checkpoints fed to the policy
pub const GYMKHANA_LOOKAHEAD: usize = 5;

/// Ticks a powerup stays unavailable after being picked up
pub const GYMKHANA_POWERUP_COOLDOWN: i32 = 200;

/// Radius of random start position jitter; 0 keeps resets deterministic
pub const GYMKHANA_START_JITTER: f64 = 0.;

/// Distance under which two agents push each other apart, when collisions are enabled
pub const GYMKHANA_COLLISION_RADIUS: f64 = 10.;

/// Strength of the collision push
pub const GYMKHANA_COLLISION_IMPULSE: f64 = 0.5;

// ============================================================================
// Track Parameters
// ============================================================================

/// Number of checkpoints on generated loop tracks
pub const GYMKHANA_TRACK_CHECKPOINTS: usize = 36;

/// Radius of the circle track
pub const GYMKHANA_TRACK_RADIUS: f64 = 200.;

/// Distance from the target checkpoint past which an agent has left the course
pub const GYMKHANA_MAX_LEAVE_DISTANCE: f64 = 250.;

/// Number of powerups placed on a generated track
pub const GYMKHANA_POWERUP_COUNT: usize = 4;

/// Fraction of the way from the previous checkpoint to the start checkpoint where agents spawn
pub const GYMKHANA_START_LERP: f64 = 0.9;

// ============================================================================
// Evolution Parameters
// ============================================================================

/// Independent races run every generation
pub const GYMKHANA_RACES: usize = 8;

/// Agents per race
pub const GYMKHANA_AGENTS_PER_RACE: usize = 4;

/// Generations before training stops
pub const GYMKHANA_EPOCH_LIMIT: u32 = 500;

/// Mutation rate at the first generation
pub const GYMKHANA_EPSILON_MAX: f64 = 0.5;

/// Mutation rate at the last generation
pub const GYMKHANA_EPSILON_MIN: f64 = 0.01;

/// Standard deviation multiplier of a weight perturbation
pub const GYMKHANA_MUTATION_SCALE: f64 = 0.5;

/// Number of best-ever networks retained, most fit first
pub const GYMKHANA_BEST_NETWORKS_CAP: usize = 8;

/// Tick budget of the showcase race run after training
pub const GYMKHANA_SHOWCASE_STEPS: u32 = 5000;

/// Key the best network is persisted under
pub const GYMKHANA_STORE_KEY: &str = "best-network";

/// Learning rate of the backprop rule
pub const GYMKHANA_LEARNING_RATE: f64 = 0.1;
