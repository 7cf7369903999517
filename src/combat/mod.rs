pub mod armor;
pub mod armory;
pub mod body_zone;
pub mod constants;
pub mod defense;
pub mod event;
pub mod health;
pub mod math;
pub mod offense;
pub mod weapons;

pub use armor::{ArmorLoadout, ArmorProfile};
pub use armory::Armory;
pub use body_zone::HitLocation;
pub use defense::{DefenseContext, DefenseOutcome, DefenseResolver};
pub use event::{AttackAdjustments, AttackEvent};
pub use health::{HealthChange, HealthTracker};
pub use math::DamagePacket;
pub use offense::{CycleStart, OffenseController, OffenseFlags};
pub use weapons::{AttackKind, WeaponProfile};
