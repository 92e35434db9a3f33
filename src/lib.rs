pub mod agent;
pub mod config;
pub mod constants;
pub mod gym;
pub mod macros;
pub mod network;
pub mod observe;
pub mod race;
pub mod random;
pub mod serialize;
pub mod store;
pub mod track;
pub mod vector;

pub use agent::{Action, ActionSpace, Agent};
pub use config::Config;
pub use gym::{EvolutionHooks, Gym, Hook, Progress, Stats};
pub use network::{activate, NeuralNetwork};
pub use observe::Encoder;
pub use race::{Race, RaceSnapshot};
pub use store::{FileStore, MemoryStore, NetworkStore};
pub use track::{Environment, TrackGenerator, TrackVariant};
pub use vector::Vector2;
