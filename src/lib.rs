//! Mage Cats - combat resolution engine for an arcade survival game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (entities, abilities, projectiles, collisions)
//! - `platform`: Input, rendering and game-state signaling contracts
//! - `persistence`: JSON file storage helpers
//! - `highscores`: Survival-time rankings
//! - `settings`: Tunable match settings

pub mod highscores;
pub mod persistence;
pub mod platform;
pub mod settings;
pub mod sim;

pub use highscores::{FileRankingStore, MemoryRankingStore, RankingEntry, RankingStore, Rankings};
pub use settings::Settings;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation tick in milliseconds
    pub const TICK_MS: u64 = 16;
    /// Fixed simulation timestep in seconds
    pub const SIM_DT: f32 = TICK_MS as f32 / 1000.0;

    /// Arena dimensions (pixels)
    pub const ARENA_WIDTH: f32 = 1280.0;
    pub const ARENA_HEIGHT: f32 = 720.0;
    /// Projectiles survive this far past the visible arena before despawning
    pub const OUT_OF_BOUNDS_MARGIN: f32 = 50.0;

    /// Player defaults
    pub const PLAYER_RADIUS: f32 = 40.0;
    pub const PLAYER_SPEED: f32 = 300.0;
    pub const PLAYER_MAX_HP: i32 = 100;

    /// Basic attack
    pub const PLAYER_FIRE_COOLDOWN_MS: u64 = 500;
    pub const PLAYER_PROJECTILE_DAMAGE: i32 = 10;
    pub const PLAYER_PROJECTILE_SPEED: f32 = 420.0;
    pub const PLAYER_PROJECTILE_RADIUS: f32 = 4.0;

    /// Experience
    pub const XP_PER_LEVEL: u32 = 100;
    pub const LEVEL_UP_HEAL: i32 = 10;
    pub const XP_PICKUP_RADIUS: f32 = 6.0;
    /// Number of upgrade options offered per level-up
    pub const UPGRADE_CHOICES: usize = 3;

    /// Shooter enemy projectile radius
    pub const ENEMY_PROJECTILE_RADIUS: f32 = 5.0;

    /// Steering rates (fraction of the way toward the desired velocity per tick)
    pub const HOMING_TURN_RATE: f32 = 0.1;
    pub const CHAIN_TURN_RATE: f32 = 0.35;

    /// Minimum time between strikes of a charmed enemy
    pub const CHARM_ATTACK_INTERVAL_MS: u64 = 1000;
}

/// Unit vector from `from` toward `to`, or zero when they coincide
#[inline]
pub fn direction_to(from: Vec2, to: Vec2) -> Vec2 {
    (to - from).normalize_or_zero()
}

/// Returns true when two circles overlap (touching counts)
#[inline]
pub fn circles_overlap(a: Vec2, ra: f32, b: Vec2, rb: f32) -> bool {
    let r = ra + rb;
    a.distance_squared(b) <= r * r
}
