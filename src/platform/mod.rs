//! Platform abstraction layer
//!
//! The simulation talks to the outside world only through these traits:
//! - Input: movement intent and ability activation requests, polled once per tick
//! - Rendering: read-only draw calls after each tick
//! - Signals: player death, time limit and level-up notifications

use glam::Vec2;

use crate::sim::abilities::{AbilityId, UpgradeOption};
use crate::sim::entity::{EnemyKind, EntityId};
use crate::sim::projectile::Faction;

/// Source of player input
pub trait InputSource {
    /// Desired movement direction (any length; normalized by the simulation)
    fn movement_intent(&mut self) -> Vec2;

    /// Abilities the player asked to use this tick
    fn activation_requests(&mut self) -> Vec<AbilityId>;

    /// Pause toggle
    fn pause_requested(&mut self) -> bool {
        false
    }
}

/// Read-only view of one entity for drawing
#[derive(Debug, Clone, PartialEq)]
pub enum Drawable {
    Player {
        pos: Vec2,
        radius: f32,
        hp: i32,
        max_hp: i32,
        shielded: bool,
    },
    Enemy {
        id: EntityId,
        kind: EnemyKind,
        pos: Vec2,
        radius: f32,
        frozen: bool,
        burning: bool,
        charmed: bool,
        stunned: bool,
    },
    Projectile {
        id: EntityId,
        faction: Faction,
        pos: Vec2,
        radius: f32,
        color: Option<[u8; 3]>,
    },
    Pickup {
        id: EntityId,
        pos: Vec2,
        value: u32,
    },
}

/// Draw target
pub trait Renderer {
    fn draw(&mut self, drawable: &Drawable);
}

/// Game-state notifications. Screen transitions are the host's job.
pub trait GameSignals {
    fn on_player_death(&mut self) {}

    fn on_time_limit_reached(&mut self) {}

    fn on_level_up(&mut self, _options: &[UpgradeOption]) {}
}

/// Ignores every signal
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSignals;

impl GameSignals for NoSignals {}
