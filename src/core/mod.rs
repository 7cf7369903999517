pub mod config;
pub mod error;
pub mod rng;
pub mod types;

pub use config::{load_combat_config, CombatConfig};
pub use rng::CombatRng;
