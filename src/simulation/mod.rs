//! Simulation layer: the world, its timer queue and the host environment
//!
//! Combat rules live in `combat`, decisions in `ai`; this module wires them
//! to a registry of combatants and advances everything one tick at a time.

pub mod combatant;
pub mod environment;
pub mod events;
pub mod sandbox;
pub mod scheduler;
pub mod world;

pub use combatant::{Combatant, CombatantBlueprint, Controller, HandSlot};
pub use environment::{Environment, Feedback};
pub use events::CombatEvent;
pub use sandbox::Sandbox;
pub use scheduler::{Lane, Scheduler, Task};
pub use world::World;
