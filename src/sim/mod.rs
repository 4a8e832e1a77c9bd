//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod abilities;
pub mod collision;
pub mod effects;
pub mod entity;
pub mod projectile;
pub mod spawner;
pub mod state;
pub mod status;
pub mod tick;

pub use abilities::{Ability, AbilityId, AbilityRegistry, AttackModifiers, UpgradeOption};
pub use collision::CollisionOutcome;
pub use effects::{BuffEffect, EffectCommand, OnHitEffect};
pub use entity::{Enemy, EnemyKind, EntityId, ExperiencePickup, Player};
pub use projectile::{Faction, Projectile};
pub use spawner::Spawner;
pub use state::{GameEvent, GamePhase, GameState};
pub use status::{StatusApplication, StatusEffects};
pub use tick::{TickInput, tick};
