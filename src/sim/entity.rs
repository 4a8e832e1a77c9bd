//! Player, enemies and experience pickups
//!
//! Passive data plus per-tick self-movement. Health is clamped at zero and
//! `take_damage` reports the alive -> dead transition exactly once.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::status::StatusEffects;
use crate::consts::*;
use crate::direction_to;

/// Stable entity identifier (allocation order)
pub type EntityId = u32;

/// Active Purring Shield parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShieldBuff {
    /// Damage reflected into an enemy that touches the shield
    pub damage: i32,
    /// Shield radius (contact radius while active)
    pub radius: f32,
}

/// The player cat
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub pos: Vec2,
    pub radius: f32,
    pub hp: i32,
    pub max_hp: i32,
    /// Movement speed (pixels/s)
    pub speed: f32,
    /// Basic attack damage
    pub projectile_damage: i32,
    /// Base time between basic attacks
    pub fire_cooldown_ms: u64,
    /// Permanent fraction shaved off the fire cooldown (0..1)
    pub fire_cooldown_reduction: f32,
    /// Temporary fire cooldown multiplier
    pub fire_rate_scale: Option<f32>,
    pub shield: Option<ShieldBuff>,
    pub last_shot_ms: Option<u64>,
    pub last_hit_ms: Option<u64>,
    pub level: u32,
    /// Experience toward the next level
    pub xp: u32,
    /// Last non-zero movement direction (unit vector)
    pub facing: Vec2,
}

impl Player {
    pub fn new(pos: Vec2, max_hp: i32) -> Self {
        Self {
            pos,
            radius: PLAYER_RADIUS,
            hp: max_hp,
            max_hp,
            speed: PLAYER_SPEED,
            projectile_damage: PLAYER_PROJECTILE_DAMAGE,
            fire_cooldown_ms: PLAYER_FIRE_COOLDOWN_MS,
            fire_cooldown_reduction: 0.0,
            fire_rate_scale: None,
            shield: None,
            last_shot_ms: None,
            last_hit_ms: None,
            level: 1,
            xp: 0,
            facing: Vec2::X,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    /// Apply damage. Returns true only when this hit killed the player.
    pub fn take_damage(&mut self, amount: i32) -> bool {
        if !self.is_alive() {
            return false;
        }
        self.hp = (self.hp - amount.max(0)).max(0);
        self.hp == 0
    }

    pub fn heal(&mut self, amount: i32) {
        if self.is_alive() {
            self.hp = (self.hp + amount.max(0)).min(self.max_hp);
        }
    }

    /// Add experience, returning how many levels were gained
    pub fn gain_xp(&mut self, amount: u32) -> u32 {
        self.xp += amount;
        let mut levels = 0;
        while self.xp >= XP_PER_LEVEL {
            self.xp -= XP_PER_LEVEL;
            self.level += 1;
            levels += 1;
            self.heal(LEVEL_UP_HEAL);
        }
        levels
    }

    /// Whether the post-hit invincibility window is still open at `now`
    pub fn is_invincible(&self, now: u64, window_ms: u64) -> bool {
        self.last_hit_ms.is_some_and(|t| now < t.saturating_add(window_ms))
    }

    /// Radius used for enemy contact checks
    pub fn contact_radius(&self) -> f32 {
        match self.shield {
            Some(shield) => shield.radius.max(self.radius),
            None => self.radius,
        }
    }

    /// Time between basic attacks after passives and buffs
    pub fn effective_fire_cooldown_ms(&self) -> u64 {
        let mut cooldown = self.fire_cooldown_ms as f32 * (1.0 - self.fire_cooldown_reduction);
        if let Some(scale) = self.fire_rate_scale {
            cooldown *= scale;
        }
        (cooldown.round() as u64).max(TICK_MS)
    }

    pub fn can_fire(&self, now: u64) -> bool {
        self.last_shot_ms
            .is_none_or(|t| now >= t + self.effective_fire_cooldown_ms())
    }

    /// Move by an intent vector, staying inside the arena
    pub fn step(&mut self, intent: Vec2, dt: f32, arena: Vec2) {
        let dir = intent.normalize_or_zero();
        if dir != Vec2::ZERO {
            self.facing = dir;
        }
        self.pos += dir * self.speed * dt;
        self.pos = self
            .pos
            .clamp(Vec2::splat(self.radius), (arena - self.radius).max(Vec2::splat(self.radius)));
    }
}

/// Enemy variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnemyKind {
    Basic,
    Square,
    /// Ranged: keeps its distance and shoots
    Triangle,
    Fast,
    /// Boss
    BigSquare,
}

/// Ranged attack of shooter enemies
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShooterStats {
    /// Preferred distance band from the player
    pub min_range: f32,
    pub max_range: f32,
    pub cooldown_ms: u64,
    pub projectile_damage: i32,
    pub projectile_speed: f32,
}

/// Per-kind base stats
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemyStats {
    pub radius: f32,
    pub speed: f32,
    pub hp: i32,
    pub damage: i32,
    pub xp: u32,
    pub shooter: Option<ShooterStats>,
    pub boss: bool,
}

impl EnemyKind {
    pub fn stats(self) -> EnemyStats {
        let base = EnemyStats {
            radius: 20.0,
            speed: 120.0,
            hp: 20,
            damage: 10,
            xp: 10,
            shooter: None,
            boss: false,
        };
        match self {
            EnemyKind::Basic => base,
            EnemyKind::Square => EnemyStats {
                speed: 90.0,
                hp: 40,
                damage: 15,
                xp: 15,
                ..base
            },
            EnemyKind::Triangle => EnemyStats {
                radius: 12.5,
                speed: 180.0,
                hp: 15,
                damage: 8,
                xp: 20,
                shooter: Some(ShooterStats {
                    min_range: 300.0,
                    max_range: 500.0,
                    cooldown_ms: 2000,
                    projectile_damage: 8,
                    projectile_speed: 250.0,
                }),
                ..base
            },
            EnemyKind::Fast => EnemyStats {
                radius: 7.5,
                speed: 240.0,
                hp: 10,
                damage: 5,
                xp: 5,
                ..base
            },
            EnemyKind::BigSquare => EnemyStats {
                radius: 75.0,
                speed: 60.0,
                hp: 500,
                damage: 50,
                xp: 50,
                boss: true,
                ..base
            },
        }
    }
}

/// An enemy entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub id: EntityId,
    pub kind: EnemyKind,
    pub pos: Vec2,
    pub radius: f32,
    pub hp: i32,
    pub max_hp: i32,
    /// Contact damage
    pub damage: i32,
    /// Current speed (zeroed while frozen or stunned)
    pub speed: f32,
    pub xp_value: u32,
    pub shooter: Option<ShooterStats>,
    pub boss: bool,
    pub status: StatusEffects,
    /// False once killed; swept at the end of the phase
    pub alive: bool,
    pub last_shot_ms: Option<u64>,
    pub last_charm_attack_ms: Option<u64>,
}

impl Enemy {
    pub fn new(id: EntityId, kind: EnemyKind, pos: Vec2) -> Self {
        let stats = kind.stats();
        Self {
            id,
            kind,
            pos,
            radius: stats.radius,
            hp: stats.hp,
            max_hp: stats.hp,
            damage: stats.damage,
            speed: stats.speed,
            xp_value: stats.xp,
            shooter: stats.shooter,
            boss: stats.boss,
            status: StatusEffects::default(),
            alive: true,
            last_shot_ms: None,
            last_charm_attack_ms: None,
        }
    }

    /// Apply damage. Returns true only on the hit that kills.
    pub fn take_damage(&mut self, amount: i32) -> bool {
        if !self.alive {
            return false;
        }
        self.hp = (self.hp - amount.max(0)).max(0);
        if self.hp == 0 {
            self.alive = false;
            true
        } else {
            false
        }
    }

    /// Alive and fighting against the player
    pub fn is_hostile(&self) -> bool {
        self.alive && !self.status.is_charmed()
    }

    /// Move for one tick.
    ///
    /// `ally_target` is the nearest non-charmed enemy, used only while charmed.
    pub fn step(&mut self, player_pos: Vec2, ally_target: Option<Vec2>, dt: f32) {
        if !self.alive || self.status.is_immobilized() {
            return;
        }

        let dir = if self.status.is_charmed() {
            match ally_target {
                Some(target) => direction_to(self.pos, target),
                None => Vec2::ZERO,
            }
        } else if let Some(shooter) = self.shooter {
            let dist = self.pos.distance(player_pos);
            if dist < shooter.min_range {
                direction_to(player_pos, self.pos)
            } else if dist > shooter.max_range {
                direction_to(self.pos, player_pos)
            } else {
                Vec2::ZERO
            }
        } else {
            direction_to(self.pos, player_pos)
        };

        self.pos += dir * self.speed * dt;
    }

    /// Whether a shooter is in range and off cooldown
    pub fn can_shoot(&self, player_pos: Vec2, now: u64) -> bool {
        let Some(shooter) = self.shooter else {
            return false;
        };
        if !self.is_hostile() || self.status.is_immobilized() {
            return false;
        }
        let in_range = self.pos.distance(player_pos) <= shooter.max_range * 1.2;
        in_range && self.last_shot_ms.is_none_or(|t| now >= t + shooter.cooldown_ms)
    }
}

/// Experience dropped by a killed enemy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperiencePickup {
    pub id: EntityId,
    pub pos: Vec2,
    pub value: u32,
}

impl ExperiencePickup {
    pub fn radius(&self) -> f32 {
        XP_PICKUP_RADIUS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enemy_take_damage_reports_death_once() {
        let mut enemy = Enemy::new(1, EnemyKind::Basic, Vec2::ZERO);
        assert!(!enemy.take_damage(5));
        assert_eq!(enemy.hp, 15);
        assert!(enemy.take_damage(100));
        assert_eq!(enemy.hp, 0);
        assert!(!enemy.alive);
        // Already dead: no second death report
        assert!(!enemy.take_damage(10));
        assert_eq!(enemy.hp, 0);
    }

    #[test]
    fn test_player_damage_clamps() {
        let mut player = Player::new(Vec2::ZERO, 30);
        assert!(!player.take_damage(10));
        assert!(player.take_damage(50));
        assert_eq!(player.hp, 0);
        assert!(!player.take_damage(1));
    }

    #[test]
    fn test_gain_xp_levels_and_heals() {
        let mut player = Player::new(Vec2::ZERO, 100);
        player.hp = 50;
        assert_eq!(player.gain_xp(90), 0);
        assert_eq!(player.gain_xp(215), 3);
        assert_eq!(player.level, 4);
        assert_eq!(player.xp, 5);
        assert_eq!(player.hp, 80);
    }

    #[test]
    fn test_invincibility_window() {
        let mut player = Player::new(Vec2::ZERO, 100);
        assert!(!player.is_invincible(0, 500));
        player.last_hit_ms = Some(1000);
        assert!(player.is_invincible(1499, 500));
        assert!(!player.is_invincible(1500, 500));
    }

    #[test]
    fn test_fire_cooldown_modifiers() {
        let mut player = Player::new(Vec2::ZERO, 100);
        assert_eq!(player.effective_fire_cooldown_ms(), 500);
        player.fire_cooldown_reduction = 0.3;
        assert_eq!(player.effective_fire_cooldown_ms(), 350);
        player.fire_rate_scale = Some(0.4);
        assert_eq!(player.effective_fire_cooldown_ms(), 140);
    }

    #[test]
    fn test_shooter_holds_band() {
        let player_pos = Vec2::new(600.0, 360.0);
        let mut near = Enemy::new(1, EnemyKind::Triangle, player_pos + Vec2::new(100.0, 0.0));
        near.step(player_pos, None, SIM_DT);
        assert!(near.pos.x > 700.0);

        let start = player_pos + Vec2::new(400.0, 0.0);
        let mut held = Enemy::new(2, EnemyKind::Triangle, start);
        held.step(player_pos, None, SIM_DT);
        assert_eq!(held.pos, start);
    }

    #[test]
    fn test_player_clamped_to_arena() {
        let mut player = Player::new(Vec2::new(50.0, 50.0), 100);
        for _ in 0..100 {
            player.step(Vec2::new(-1.0, -1.0), SIM_DT, Vec2::new(ARENA_WIDTH, ARENA_HEIGHT));
        }
        assert_eq!(player.pos, Vec2::splat(PLAYER_RADIUS));
        assert!((player.facing.length() - 1.0).abs() < 1e-5);
    }
}
