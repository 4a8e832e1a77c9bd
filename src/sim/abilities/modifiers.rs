//! Attack modifications contributed by passive abilities
//!
//! Layers are merged in acquisition order: `on_hit` lists concatenate and
//! every scalar takes the last value set.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::sim::effects::OnHitEffect;
use crate::sim::entity::Player;
use crate::sim::projectile::{Faction, Projectile};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttackModifiers {
    /// Projectile tint
    pub color: Option<[u8; 3]>,
    /// Projectile radius override
    pub size: Option<f32>,
    /// Flat damage added to the basic attack
    pub damage_bonus: Option<i32>,
    pub max_pierces: Option<u32>,
    pub max_jumps: Option<u32>,
    pub on_hit: Vec<OnHitEffect>,
}

impl AttackModifiers {
    /// Merge layers in order
    pub fn merge<'a>(layers: impl IntoIterator<Item = &'a AttackModifiers>) -> Self {
        let mut merged = Self::default();
        for layer in layers {
            merged.layer(layer);
        }
        merged
    }

    /// Put `other` on top of this set
    pub fn layer(&mut self, other: &AttackModifiers) {
        self.color = other.color.or(self.color);
        self.size = other.size.or(self.size);
        self.damage_bonus = other.damage_bonus.or(self.damage_bonus);
        self.max_pierces = other.max_pierces.or(self.max_pierces);
        self.max_jumps = other.max_jumps.or(self.max_jumps);
        self.on_hit.extend_from_slice(&other.on_hit);
    }

    /// Build the player's basic attack aimed at `target`
    pub fn basic_attack(&self, player: &Player, target: Vec2, chain_radius: f32) -> Projectile {
        let damage = player.projectile_damage + self.damage_bonus.unwrap_or(0);
        let radius = self.size.unwrap_or(PLAYER_PROJECTILE_RADIUS);

        let mut projectile = Projectile::new(
            Faction::Player,
            player.pos,
            target - player.pos,
            PLAYER_PROJECTILE_SPEED,
            damage,
            radius,
        )
        .with_on_hit(self.on_hit.clone())
        .with_color(self.color);

        if let Some(max_pierces) = self.max_pierces {
            projectile = projectile.with_pierce(max_pierces);
        }
        if let Some(max_jumps) = self.max_jumps {
            projectile = projectile.with_chain(max_jumps, chain_radius);
        }
        projectile
    }
}
