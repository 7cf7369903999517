//! Combatant AI: decision state machine, patrol routes, fear destinations
//!
//! Architecture: data in, directives out
//! - CombatantDirector holds per-combatant state and decides each tick
//! - The world gathers sightings and applies the returned directives
//! - FearDestinations picks safe points for fleeing combatants

pub mod director;
pub mod fear;
pub mod patrol;
pub mod state;

pub use director::{
    CombatantDirector, Directive, DirectorContext, DirectorProfile, FormationLink, Sighting,
};
pub use fear::{FearDestinations, FearSelection};
pub use patrol::PatrolRoute;
pub use state::DirectorState;
