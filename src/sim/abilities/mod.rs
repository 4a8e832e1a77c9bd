//! Ability catalog, runtime state and leveling

pub mod ability;
pub mod catalog;
pub mod modifiers;
pub mod registry;

pub use ability::{
    Ability, AbilityContext, AbilityId, AbilityKind, AreaEffect, Element, MAX_ABILITY_LEVEL,
    PassiveAbility, ProjectileAttack, ProjectilePattern, TimedBuff,
};
pub use modifiers::AttackModifiers;
pub use registry::{AbilityRegistry, UpgradeOption};
