//! Projectiles and their movement
//!
//! Behavior flags are optional fields: a projectile may pierce, chain
//! (re-target after each hit), home in on enemies, explode, and carry
//! on-hit effects, in any combination.

use std::collections::BTreeSet;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::effects::OnHitEffect;
use super::entity::{Enemy, EntityId};
use crate::consts::*;
use crate::direction_to;
use crate::settings::Settings;

/// Who fired the projectile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Faction {
    /// Hits enemies
    Player,
    /// Hits the player
    Enemy,
}

/// Piercing budget
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PierceState {
    pub max_pierces: u32,
    /// Enemies already damaged
    pub hit: BTreeSet<EntityId>,
}

impl PierceState {
    pub fn exhausted(&self) -> bool {
        self.hit.len() as u32 >= self.max_pierces
    }
}

/// Chaining ("static jump") budget
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChainState {
    pub max_jumps: u32,
    /// Enemies already touched while chaining
    pub jumped: BTreeSet<EntityId>,
    /// Position of the first damaging contact
    pub origin: Option<Vec2>,
    /// Chase radius measured from `origin`
    pub radius: f32,
}

impl ChainState {
    pub fn exhausted(&self) -> bool {
        self.jumped.len() as u32 >= self.max_jumps
    }

    /// Whether `pos` may be chained to
    pub fn in_reach(&self, pos: Vec2) -> bool {
        self.origin.is_none_or(|origin| pos.distance(origin) <= self.radius)
    }
}

/// A projectile entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    pub id: EntityId,
    pub faction: Faction,
    pub pos: Vec2,
    pub vel: Vec2,
    /// Constant travel speed
    pub speed: f32,
    pub radius: f32,
    pub damage: i32,
    /// Absolute expiry (None = lives until out of bounds or spent)
    pub expires_at: Option<u64>,
    /// Steer toward the nearest hostile enemy
    pub homing: bool,
    /// Enemy to re-aim at (set by chaining)
    pub target: Option<EntityId>,
    pub pierce: Option<PierceState>,
    pub chain: Option<ChainState>,
    pub on_hit: Vec<OnHitEffect>,
    /// Splash damage radius around the contact point
    pub explosion_radius: Option<f32>,
    /// Render tint
    pub color: Option<[u8; 3]>,
    pub alive: bool,
}

impl Projectile {
    /// Straight projectile moving along `dir` at `speed`
    pub fn new(faction: Faction, pos: Vec2, dir: Vec2, speed: f32, damage: i32, radius: f32) -> Self {
        let dir = dir.normalize_or(Vec2::X);
        Self {
            id: 0,
            faction,
            pos,
            vel: dir * speed,
            speed,
            radius,
            damage,
            expires_at: None,
            homing: false,
            target: None,
            pierce: None,
            chain: None,
            on_hit: Vec::new(),
            explosion_radius: None,
            color: None,
            alive: true,
        }
    }

    pub fn with_lifetime(mut self, now: u64, lifetime_ms: u64) -> Self {
        self.expires_at = Some(now + lifetime_ms);
        self
    }

    pub fn with_homing(mut self) -> Self {
        self.homing = true;
        self
    }

    pub fn with_pierce(mut self, max_pierces: u32) -> Self {
        self.pierce = Some(PierceState {
            max_pierces,
            hit: BTreeSet::new(),
        });
        self
    }

    pub fn with_chain(mut self, max_jumps: u32, radius: f32) -> Self {
        self.chain = Some(ChainState {
            max_jumps,
            jumped: BTreeSet::new(),
            origin: None,
            radius,
        });
        self
    }

    pub fn with_on_hit(mut self, effects: Vec<OnHitEffect>) -> Self {
        self.on_hit = effects;
        self
    }

    pub fn with_explosion(mut self, radius: f32) -> Self {
        self.explosion_radius = Some(radius);
        self
    }

    pub fn with_color(mut self, color: Option<[u8; 3]>) -> Self {
        self.color = color;
        self
    }

    /// Already damaged `id` (pierce or chain)
    pub fn has_touched(&self, id: EntityId) -> bool {
        self.pierce.as_ref().is_some_and(|p| p.hit.contains(&id))
            || self.chain.as_ref().is_some_and(|c| c.jumped.contains(&id))
    }

    /// Piercing is spent (or absent) and a chain budget is available
    pub fn is_chaining(&self) -> bool {
        self.chain.is_some() && self.pierce.as_ref().is_none_or(PierceState::exhausted)
    }

    /// Blend velocity toward `desired_dir` by `rate`, keeping speed
    fn steer(&mut self, desired_dir: Vec2, rate: f32) {
        let desired = desired_dir * self.speed;
        let blended = self.vel.lerp(desired, rate);
        if let Some(dir) = blended.try_normalize() {
            self.vel = dir * self.speed;
        }
    }

    /// One tick: steer, integrate, then lifetime and out-of-bounds checks
    pub fn update(&mut self, enemies: &[Enemy], now: u64, dt: f32, settings: &Settings) {
        if !self.alive {
            return;
        }

        if let Some(target_id) = self.target {
            match enemies.iter().find(|e| e.id == target_id && e.alive) {
                Some(target) => self.steer(direction_to(self.pos, target.pos), CHAIN_TURN_RATE),
                None => self.target = None,
            }
        } else if self.homing
            && let Some(target) = nearest_hostile(enemies, self.pos, |_| true)
        {
            self.steer(direction_to(self.pos, target.pos), HOMING_TURN_RATE);
        }

        self.pos += self.vel * dt;

        if self.expires_at.is_some_and(|t| now >= t) {
            self.alive = false;
            return;
        }

        let margin = settings.out_of_bounds_margin;
        if self.pos.x < -margin
            || self.pos.y < -margin
            || self.pos.x > settings.arena_width + margin
            || self.pos.y > settings.arena_height + margin
        {
            self.alive = false;
        }
    }
}

/// Nearest alive, non-charmed enemy accepted by `filter`
pub fn nearest_hostile<'a>(
    enemies: &'a [Enemy],
    pos: Vec2,
    filter: impl Fn(&Enemy) -> bool,
) -> Option<&'a Enemy> {
    enemies
        .iter()
        .filter(|e| e.is_hostile() && filter(e))
        .min_by(|a, b| a.pos.distance_squared(pos).total_cmp(&b.pos.distance_squared(pos)))
}
