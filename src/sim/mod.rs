//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only, all timers counted in frames
//! - Seeded RNG only, owned by the game state
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod collision;
pub mod difficulty;
pub mod entity;
pub mod progression;
pub mod state;
pub mod store;
pub mod tick;
pub mod weapons;

pub use collision::{Aabb, within_radius};
pub use entity::{
    Burn, Enemy, EnemyKind, Hazard, HazardSpec, MovementProfile, Obstacle, Pickup, PickupKind,
    Projectile, ProjectileEffects,
};
pub use progression::{
    EffectModifiers, PassiveId, Progression, UltimateId, UpgradeChoice, UpgradeId,
};
pub use state::{GameEvent, GamePhase, GameState, Player, SoundCue};
pub use store::EntityStore;
pub use tick::TickInput;
pub use weapons::{Battery, HitEvent, Weapon, WeaponKind, WeaponOutput, WeaponSpec};
