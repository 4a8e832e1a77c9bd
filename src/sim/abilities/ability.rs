//! Ability runtime state, activation and upgrade rules
//!
//! Activation is two-phase: `plan` inspects the world and builds effect
//! commands without touching the ability, `commit` records the use. A failed
//! precondition therefore leaves the ability (and the RNG) untouched.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

use super::modifiers::AttackModifiers;
use crate::direction_to;
use crate::settings::Settings;
use crate::sim::effects::{BuffEffect, EffectCommand, OnHitEffect};
use crate::sim::entity::{Enemy, Player};
use crate::sim::projectile::{Faction, Projectile, nearest_hostile};
use crate::sim::status::StatusApplication;

/// Highest level any ability reaches
pub const MAX_ABILITY_LEVEL: u32 = 5;

/// Teleport destinations must be at least this far from every enemy
pub const TELEPORT_SAFE_DISTANCE: f32 = 80.0;
/// Buffs auto-trigger when a hostile enemy is this close
pub const BUFF_TRIGGER_RADIUS: f32 = 200.0;
/// Fish start this far above their landing spot
pub const FISH_DROP_HEIGHT: f32 = 200.0;
pub const FISH_SPEED: f32 = 400.0;

/// Every ability in the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AbilityId {
    // Passive
    CatnipSpell,
    FrozenClaw,
    FlamingPaws,
    CleaningTongue,
    Pawquake,
    StaticFur,
    SteelWhiskers,
    Tailwind,
    // Projectile attacks
    WhiskerBeam,
    ArcaneFurBall,
    ElementalTail,
    GhostRatSummoning,
    // Area effects
    MysticalMeow,
    EtherealFishRain,
    EnchantedGaze,
    FelineTeleport,
    // Timed buffs
    PurringShield,
    ReflexAura,
}

impl AbilityId {
    pub const ALL: [AbilityId; 18] = [
        AbilityId::CatnipSpell,
        AbilityId::FrozenClaw,
        AbilityId::FlamingPaws,
        AbilityId::CleaningTongue,
        AbilityId::Pawquake,
        AbilityId::StaticFur,
        AbilityId::SteelWhiskers,
        AbilityId::Tailwind,
        AbilityId::WhiskerBeam,
        AbilityId::ArcaneFurBall,
        AbilityId::ElementalTail,
        AbilityId::GhostRatSummoning,
        AbilityId::MysticalMeow,
        AbilityId::EtherealFishRain,
        AbilityId::EnchantedGaze,
        AbilityId::FelineTeleport,
        AbilityId::PurringShield,
        AbilityId::ReflexAura,
    ];

    pub fn name(self) -> &'static str {
        match self {
            AbilityId::CatnipSpell => "Catnip Spell",
            AbilityId::FrozenClaw => "Frozen Claw",
            AbilityId::FlamingPaws => "Flaming Paws",
            AbilityId::CleaningTongue => "Cleaning Tongue",
            AbilityId::Pawquake => "Pawquake",
            AbilityId::StaticFur => "Static Fur",
            AbilityId::SteelWhiskers => "Steel Whiskers",
            AbilityId::Tailwind => "Tailwind",
            AbilityId::WhiskerBeam => "Whisker Beam",
            AbilityId::ArcaneFurBall => "Arcane Fur Ball",
            AbilityId::ElementalTail => "Elemental Tail",
            AbilityId::GhostRatSummoning => "Ghost Rat Summoning",
            AbilityId::MysticalMeow => "Mystical Meow",
            AbilityId::EtherealFishRain => "Ethereal Fish Rain",
            AbilityId::EnchantedGaze => "Enchanted Gaze",
            AbilityId::FelineTeleport => "Feline Teleport",
            AbilityId::PurringShield => "Purring Shield",
            AbilityId::ReflexAura => "Reflex Aura",
        }
    }
}

/// What the world looks like to an activating ability
#[derive(Debug, Clone, Copy)]
pub struct AbilityContext<'a> {
    pub now: u64,
    pub player: &'a Player,
    pub enemies: &'a [Enemy],
    pub settings: &'a Settings,
}

impl AbilityContext<'_> {
    fn hostiles_within(&self, radius: f32) -> impl Iterator<Item = &Enemy> + '_ {
        let center = self.player.pos;
        self.enemies
            .iter()
            .filter(move |e| e.is_hostile() && e.pos.distance(center) <= radius)
    }

    fn any_hostile(&self) -> bool {
        self.enemies.iter().any(Enemy::is_hostile)
    }
}

/// Permanent stat change plus an attack modification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassiveAbility {
    /// Added to the player's basic attack damage
    pub damage_bonus: i32,
    /// Added to the player's movement speed
    pub speed_bonus: f32,
    /// Permanent fire cooldown reduction (fraction)
    pub fire_cooldown_reduction: Option<f32>,
    pub modifiers: AttackModifiers,
}

/// Ice, fire or lightning, cycled by Elemental Tail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Element {
    Fire,
    Ice,
    Lightning,
}

impl Element {
    pub fn next(self) -> Self {
        match self {
            Element::Fire => Element::Ice,
            Element::Ice => Element::Lightning,
            Element::Lightning => Element::Fire,
        }
    }

    pub fn on_hit(self) -> OnHitEffect {
        match self {
            Element::Fire => OnHitEffect::Burn {
                damage_per_tick: 5,
                duration_ms: 3000,
            },
            Element::Ice => OnHitEffect::Freeze {
                chance: 1.0,
                duration_ms: 2000,
            },
            Element::Lightning => OnHitEffect::Stun { duration_ms: 1000 },
        }
    }

    pub fn color(self) -> [u8; 3] {
        match self {
            Element::Fire => [255, 100, 0],
            Element::Ice => [100, 200, 255],
            Element::Lightning => [255, 255, 100],
        }
    }
}

/// Shape-specific projectile parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ProjectilePattern {
    /// Piercing beam at the nearest enemy
    WhiskerBeam { max_pierces: u32 },
    /// Explodes on impact, aimed at a random enemy
    FurBall { explosion_radius: f32 },
    /// Piercing shot behind the player, cycling elements
    ElementalTail { max_pierces: u32, element: Element },
    /// Ring of homing rats
    GhostRats { count: u32 },
}

/// Spawns shaped attacks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectileAttack {
    pub base_damage: i32,
    pub damage: i32,
    pub speed: f32,
    pub radius: f32,
    pub lifetime_ms: Option<u64>,
    pub base_cooldown_ms: u64,
    pub color: [u8; 3],
    pub pattern: ProjectilePattern,
}

/// Instant radius-based effects
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AreaEffect {
    Meow {
        radius: f32,
        damage: i32,
        stun_ms: u64,
    },
    FishRain {
        radius: f32,
        damage: i32,
        fish: u32,
        lifetime_ms: u64,
    },
    Gaze {
        radius: f32,
        max_targets: u32,
        duration_ms: u64,
    },
    Teleport {
        distance: f32,
    },
}

/// Temporary buff with automatic revert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedBuff {
    pub duration_ms: u64,
    pub active_until: Option<u64>,
    pub effect: BuffEffect,
}

/// Ability behavior by kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AbilityKind {
    Passive(PassiveAbility),
    ProjectileAttack(ProjectileAttack),
    AreaEffect(AreaEffect),
    TimedBuff(TimedBuff),
}

/// An owned ability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ability {
    pub id: AbilityId,
    pub level: u32,
    pub max_level: u32,
    pub cooldown_ms: u64,
    /// None = never used (ready)
    pub last_used_ms: Option<u64>,
    /// Fired by the engine whenever ready and its precondition holds
    pub auto_trigger: bool,
    pub kind: AbilityKind,
}

impl Ability {
    pub fn new(id: AbilityId, cooldown_ms: u64, auto_trigger: bool, kind: AbilityKind) -> Self {
        Self {
            id,
            level: 1,
            max_level: MAX_ABILITY_LEVEL,
            cooldown_ms,
            last_used_ms: None,
            auto_trigger,
            kind,
        }
    }

    pub fn is_ready(&self, now: u64) -> bool {
        self.last_used_ms.is_none_or(|t| now >= t + self.cooldown_ms)
    }

    pub fn remaining_cooldown_ms(&self, now: u64) -> u64 {
        self.last_used_ms
            .map_or(0, |t| (t + self.cooldown_ms).saturating_sub(now))
    }

    pub fn can_upgrade(&self) -> bool {
        self.level < self.max_level
    }

    pub fn passive(&self) -> Option<&PassiveAbility> {
        match &self.kind {
            AbilityKind::Passive(passive) => Some(passive),
            _ => None,
        }
    }

    pub fn is_buff_active(&self, now: u64) -> bool {
        match &self.kind {
            AbilityKind::TimedBuff(buff) => buff.active_until.is_some_and(|t| now < t),
            _ => false,
        }
    }

    /// Raise the level by one and apply this ability's upgrade rule
    pub fn upgrade(&mut self) -> bool {
        if !self.can_upgrade() {
            return false;
        }
        self.level += 1;
        let level = self.level;

        match &mut self.kind {
            AbilityKind::Passive(passive) => {
                match self.id {
                    AbilityId::CatnipSpell => passive.damage_bonus += 5,
                    AbilityId::Tailwind => {
                        passive.speed_bonus += 12.0;
                        passive.fire_cooldown_reduction = passive
                            .fire_cooldown_reduction
                            .map(|r| (r + 0.05).min(0.8));
                    }
                    _ => {}
                }
                let mods = &mut passive.modifiers;
                if let Some(jumps) = mods.max_jumps.as_mut() {
                    *jumps += 1;
                }
                if let Some(pierces) = mods.max_pierces.as_mut() {
                    *pierces += 1;
                }
                for effect in &mut mods.on_hit {
                    upgrade_on_hit(effect);
                }
            }
            AbilityKind::ProjectileAttack(attack) => {
                attack.damage = attack.base_damage * level as i32;
                let reduced = attack
                    .base_cooldown_ms
                    .saturating_sub((level as u64 - 1) * 100);
                let floor = (attack.base_cooldown_ms as f32 * 0.3) as u64;
                self.cooldown_ms = reduced.max(floor);
                match &mut attack.pattern {
                    ProjectilePattern::WhiskerBeam { max_pierces } => {
                        *max_pierces = (*max_pierces + 1).min(5);
                    }
                    ProjectilePattern::FurBall { explosion_radius } => *explosion_radius += 15.0,
                    ProjectilePattern::ElementalTail { .. } => {}
                    ProjectilePattern::GhostRats { count } => *count += 1,
                }
            }
            AbilityKind::AreaEffect(area) => match area {
                AreaEffect::Meow {
                    radius, stun_ms, ..
                } => {
                    *radius += 20.0;
                    *stun_ms += 300;
                }
                AreaEffect::FishRain { radius, fish, .. } => {
                    *radius += 20.0;
                    *fish += 2;
                }
                AreaEffect::Gaze {
                    radius,
                    max_targets,
                    duration_ms,
                } => {
                    *radius += 20.0;
                    *max_targets += 1;
                    *duration_ms += 1000;
                }
                AreaEffect::Teleport { distance } => {
                    *distance += 20.0;
                    self.cooldown_ms = self.cooldown_ms.saturating_sub(200).max(1000);
                }
            },
            AbilityKind::TimedBuff(buff) => match &mut buff.effect {
                BuffEffect::FireRate { scale } => {
                    *scale = (*scale - 0.05).max(0.2);
                    buff.duration_ms += 1000;
                }
                BuffEffect::Shield { damage, radius } => {
                    *damage += 5;
                    *radius += 10.0;
                }
            },
        }
        true
    }

    /// Whether the engine should fire this ability now
    pub fn should_auto_trigger(&self, ctx: &AbilityContext) -> bool {
        self.auto_trigger && self.is_ready(ctx.now) && self.precondition(ctx)
    }

    fn precondition(&self, ctx: &AbilityContext) -> bool {
        match &self.kind {
            AbilityKind::Passive(_) => false,
            AbilityKind::ProjectileAttack(_) => ctx.any_hostile(),
            AbilityKind::AreaEffect(area) => match *area {
                AreaEffect::Meow { radius, .. } | AreaEffect::Gaze { radius, .. } => {
                    ctx.hostiles_within(radius).next().is_some()
                }
                AreaEffect::FishRain { radius, .. } => {
                    ctx.hostiles_within(radius * 2.0).next().is_some()
                }
                AreaEffect::Teleport { .. } => true,
            },
            AbilityKind::TimedBuff(_) => {
                !self.is_buff_active(ctx.now)
                    && ctx.hostiles_within(BUFF_TRIGGER_RADIUS).next().is_some()
            }
        }
    }

    /// Try to use the ability.
    ///
    /// Returns None (and changes nothing) while on cooldown or when the
    /// ability has nothing to act on.
    pub fn activate(
        &mut self,
        ctx: &AbilityContext,
        rng: &mut impl Rng,
    ) -> Option<Vec<EffectCommand>> {
        if !self.is_ready(ctx.now) {
            return None;
        }
        let commands = self.plan(ctx, rng)?;
        self.commit(ctx.now);
        Some(commands)
    }

    /// End an active buff early, reverting it like a natural expiry
    pub fn deactivate(&mut self) -> Vec<EffectCommand> {
        match &mut self.kind {
            AbilityKind::TimedBuff(buff) if buff.active_until.is_some() => {
                buff.active_until = None;
                vec![EffectCommand::EndBuff(buff.effect)]
            }
            _ => Vec::new(),
        }
    }

    /// Revert a buff whose duration has run out
    pub fn expire(&mut self, now: u64) -> Vec<EffectCommand> {
        let expired = matches!(
            &self.kind,
            AbilityKind::TimedBuff(buff) if buff.active_until.is_some_and(|t| now >= t)
        );
        if expired {
            self.deactivate()
        } else {
            Vec::new()
        }
    }

    fn commit(&mut self, now: u64) {
        self.last_used_ms = Some(now);
        match &mut self.kind {
            AbilityKind::ProjectileAttack(ProjectileAttack {
                pattern: ProjectilePattern::ElementalTail { element, .. },
                ..
            }) => *element = element.next(),
            AbilityKind::TimedBuff(buff) => buff.active_until = Some(now + buff.duration_ms),
            _ => {}
        }
    }

    fn plan(&self, ctx: &AbilityContext, rng: &mut impl Rng) -> Option<Vec<EffectCommand>> {
        match &self.kind {
            AbilityKind::Passive(_) => None,
            AbilityKind::ProjectileAttack(attack) => plan_projectiles(attack, ctx, rng),
            AbilityKind::AreaEffect(area) => plan_area(*area, ctx, rng),
            AbilityKind::TimedBuff(buff) => {
                if self.is_buff_active(ctx.now) {
                    return None;
                }
                Some(vec![EffectCommand::StartBuff(buff.effect)])
            }
        }
    }
}

fn upgrade_on_hit(effect: &mut OnHitEffect) {
    match effect {
        OnHitEffect::Freeze { chance, .. } => *chance = (*chance + 0.05).min(1.0),
        OnHitEffect::Burn {
            damage_per_tick,
            duration_ms,
        } => {
            *damage_per_tick += 5;
            *duration_ms += 500;
        }
        OnHitEffect::Stun { duration_ms } => *duration_ms += 200,
        OnHitEffect::Heal { chance, fraction } => {
            *chance = (*chance + 0.05).min(1.0);
            *fraction += 0.01;
        }
        OnHitEffect::Knockback { distance } => *distance += 10.0,
    }
}

fn plan_projectiles(
    attack: &ProjectileAttack,
    ctx: &AbilityContext,
    rng: &mut impl Rng,
) -> Option<Vec<EffectCommand>> {
    let origin = ctx.player.pos;
    let shot = |dir: Vec2| {
        let projectile = Projectile::new(
            Faction::Player,
            origin,
            dir,
            attack.speed,
            attack.damage,
            attack.radius,
        )
        .with_color(Some(attack.color));
        match attack.lifetime_ms {
            Some(lifetime) => projectile.with_lifetime(ctx.now, lifetime),
            None => projectile,
        }
    };

    let projectiles = match attack.pattern {
        ProjectilePattern::WhiskerBeam { max_pierces } => {
            let target = nearest_hostile(ctx.enemies, origin, |_| true)?;
            vec![shot(direction_to(origin, target.pos)).with_pierce(max_pierces)]
        }
        ProjectilePattern::FurBall { explosion_radius } => {
            let hostiles: Vec<&Enemy> = ctx.enemies.iter().filter(|e| e.is_hostile()).collect();
            let target = hostiles.choose(rng)?;
            vec![shot(direction_to(origin, target.pos)).with_explosion(explosion_radius)]
        }
        ProjectilePattern::ElementalTail {
            max_pierces,
            element,
        } => {
            if !ctx.any_hostile() {
                return None;
            }
            vec![
                shot(-ctx.player.facing)
                    .with_pierce(max_pierces)
                    .with_on_hit(vec![element.on_hit()])
                    .with_color(Some(element.color())),
            ]
        }
        ProjectilePattern::GhostRats { count } => {
            if !ctx.any_hostile() {
                return None;
            }
            (0..count)
                .map(|i| {
                    let angle = TAU * i as f32 / count as f32;
                    let dir = Vec2::from_angle(angle);
                    let mut rat = shot(dir).with_homing();
                    rat.pos += dir * ctx.player.radius;
                    rat
                })
                .collect()
        }
    };

    Some(
        projectiles
            .into_iter()
            .map(EffectCommand::SpawnProjectile)
            .collect(),
    )
}

fn plan_area(
    area: AreaEffect,
    ctx: &AbilityContext,
    rng: &mut impl Rng,
) -> Option<Vec<EffectCommand>> {
    match area {
        AreaEffect::Meow {
            radius,
            damage,
            stun_ms,
        } => {
            let targets: Vec<&Enemy> = ctx.hostiles_within(radius).collect();
            if targets.is_empty() {
                return None;
            }
            let mut commands = Vec::with_capacity(targets.len() * 2);
            for enemy in targets {
                commands.push(EffectCommand::Damage {
                    target: enemy.id,
                    amount: damage,
                });
                commands.push(EffectCommand::ApplyStatus {
                    target: enemy.id,
                    status: StatusApplication::Stun {
                        duration_ms: stun_ms,
                    },
                });
            }
            Some(commands)
        }
        AreaEffect::FishRain {
            radius,
            damage,
            fish,
            lifetime_ms,
        } => {
            if ctx.hostiles_within(radius * 2.0).next().is_none() {
                return None;
            }
            let top = -ctx.settings.out_of_bounds_margin * 0.5;
            let commands = (0..fish)
                .map(|i| {
                    let angle = TAU * i as f32 / fish as f32 + rng.random_range(-0.2..0.2);
                    let landing = ctx.player.pos + Vec2::from_angle(angle) * radius;
                    let start = Vec2::new(landing.x, (landing.y - FISH_DROP_HEIGHT).max(top));
                    EffectCommand::SpawnProjectile(
                        Projectile::new(Faction::Player, start, Vec2::Y, FISH_SPEED, damage, 8.0)
                            .with_lifetime(ctx.now, lifetime_ms)
                            .with_color(Some([120, 180, 255])),
                    )
                })
                .collect();
            Some(commands)
        }
        AreaEffect::Gaze {
            radius,
            max_targets,
            duration_ms,
        } => {
            let candidates: Vec<&Enemy> = ctx.hostiles_within(radius).collect();
            if candidates.is_empty() {
                return None;
            }
            let amount = (max_targets as usize).min(candidates.len());
            let picked = rand::seq::index::sample(rng, candidates.len(), amount);
            Some(
                picked
                    .into_iter()
                    .map(|i| EffectCommand::ApplyStatus {
                        target: candidates[i].id,
                        status: StatusApplication::Charm { duration_ms },
                    })
                    .collect(),
            )
        }
        AreaEffect::Teleport { distance } => {
            let to = safe_teleport_destination(ctx, distance)?;
            Some(vec![EffectCommand::TeleportPlayer { to }])
        }
    }
}

/// First spot `distance` away (facing first, then rotating by 45 degrees)
/// that is inside the arena and clear of enemies
fn safe_teleport_destination(ctx: &AbilityContext, distance: f32) -> Option<Vec2> {
    let player = ctx.player;
    let arena = Vec2::new(ctx.settings.arena_width, ctx.settings.arena_height);
    let min = Vec2::splat(player.radius);
    let max = (arena - player.radius).max(min);

    (0..8)
        .map(|step| {
            let dir = Vec2::from_angle(step as f32 * TAU / 8.0).rotate(player.facing);
            (player.pos + dir * distance).clamp(min, max)
        })
        .find(|spot| {
            ctx.enemies
                .iter()
                .filter(|e| e.is_hostile())
                .all(|e| e.pos.distance(*spot) >= TELEPORT_SAFE_DISTANCE)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::abilities::catalog;
    use crate::sim::entity::EnemyKind;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn world() -> (Player, Vec<Enemy>, Settings) {
        let player = Player::new(Vec2::new(640.0, 360.0), 100);
        let enemies = vec![
            Enemy::new(1, EnemyKind::Basic, Vec2::new(700.0, 360.0)),
            Enemy::new(2, EnemyKind::Square, Vec2::new(640.0, 450.0)),
            Enemy::new(3, EnemyKind::Fast, Vec2::new(1000.0, 100.0)),
        ];
        (player, enemies, Settings::default())
    }

    fn ctx<'a>(now: u64, player: &'a Player, enemies: &'a [Enemy], settings: &'a Settings) -> AbilityContext<'a> {
        AbilityContext {
            now,
            player,
            enemies,
            settings,
        }
    }

    #[test]
    fn test_cooldown_gate() {
        let (player, enemies, settings) = world();
        let mut rng = Pcg32::seed_from_u64(1);
        let mut beam = catalog::create(AbilityId::WhiskerBeam);

        assert!(beam.activate(&ctx(1000, &player, &enemies, &settings), &mut rng).is_some());
        let snapshot = beam.clone();
        assert!(beam.activate(&ctx(1500, &player, &enemies, &settings), &mut rng).is_none());
        assert_eq!(beam, snapshot);
        assert!(beam.activate(&ctx(2499, &player, &enemies, &settings), &mut rng).is_none());
        assert!(beam.activate(&ctx(2500, &player, &enemies, &settings), &mut rng).is_some());
    }

    #[test]
    fn test_precondition_failure_is_side_effect_free() {
        let (player, _, settings) = world();
        let mut rng = Pcg32::seed_from_u64(1);
        let mut reference_rng = Pcg32::seed_from_u64(1);
        let mut fur_ball = catalog::create(AbilityId::ArcaneFurBall);
        let snapshot = fur_ball.clone();

        assert!(fur_ball.activate(&ctx(0, &player, &[], &settings), &mut rng).is_none());
        assert_eq!(fur_ball, snapshot);
        assert_eq!(rng.random::<u32>(), reference_rng.random::<u32>());
    }

    #[test]
    fn test_whisker_beam_targets_nearest() {
        let (player, enemies, settings) = world();
        let mut rng = Pcg32::seed_from_u64(1);
        let mut beam = catalog::create(AbilityId::WhiskerBeam);

        let commands = beam.activate(&ctx(0, &player, &enemies, &settings), &mut rng).unwrap();
        let [EffectCommand::SpawnProjectile(p)] = commands.as_slice() else {
            panic!("expected one projectile, got {:?}", commands);
        };
        assert!(p.vel.x > 0.0);
        assert!(p.vel.y.abs() < 1e-3);
        assert!(p.pierce.is_some());
        assert_eq!(p.expires_at, Some(2000));
    }

    #[test]
    fn test_elemental_tail_cycles_on_success_only() {
        let (mut player, enemies, settings) = world();
        player.facing = Vec2::X;
        let mut rng = Pcg32::seed_from_u64(1);
        let mut tail = catalog::create(AbilityId::ElementalTail);

        assert!(tail.activate(&ctx(0, &player, &[], &settings), &mut rng).is_none());

        let mut effects = Vec::new();
        for i in 0..3 {
            let commands = tail
                .activate(&ctx(i * 10_000, &player, &enemies, &settings), &mut rng)
                .unwrap();
            let EffectCommand::SpawnProjectile(p) = &commands[0] else {
                panic!("expected projectile");
            };
            assert!(p.vel.x < 0.0, "tail shoots behind the player");
            effects.push(p.on_hit[0]);
        }
        assert!(matches!(effects[0], OnHitEffect::Burn { .. }));
        assert!(matches!(effects[1], OnHitEffect::Freeze { .. }));
        assert!(matches!(effects[2], OnHitEffect::Stun { .. }));
    }

    #[test]
    fn test_ghost_rats_ring() {
        let (player, enemies, settings) = world();
        let mut rng = Pcg32::seed_from_u64(1);
        let mut rats = catalog::create(AbilityId::GhostRatSummoning);
        rats.upgrade();

        let commands = rats.activate(&ctx(0, &player, &enemies, &settings), &mut rng).unwrap();
        assert_eq!(commands.len(), 4);
        for command in &commands {
            let EffectCommand::SpawnProjectile(p) = command else {
                panic!("expected projectile");
            };
            assert!(p.homing);
            assert_eq!(p.damage, 30);
        }
    }

    #[test]
    fn test_meow_stuns_in_radius() {
        let (player, enemies, settings) = world();
        let mut rng = Pcg32::seed_from_u64(1);
        let mut meow = catalog::create(AbilityId::MysticalMeow);

        let commands = meow.activate(&ctx(0, &player, &enemies, &settings), &mut rng).unwrap();
        // Enemies 1 and 2 are in range, 3 is not
        assert_eq!(commands.len(), 4);
        assert!(commands.iter().all(|c| match c {
            EffectCommand::Damage { target, .. } | EffectCommand::ApplyStatus { target, .. } =>
                *target != 3,
            _ => false,
        }));
    }

    #[test]
    fn test_gaze_charms_bounded_sample() {
        let (player, enemies, settings) = world();
        let mut rng = Pcg32::seed_from_u64(1);
        let mut gaze = catalog::create(AbilityId::EnchantedGaze);

        let commands = gaze.activate(&ctx(0, &player, &enemies, &settings), &mut rng).unwrap();
        assert_eq!(commands.len(), 2);
        assert!(commands.iter().all(|c| matches!(
            c,
            EffectCommand::ApplyStatus {
                status: StatusApplication::Charm { .. },
                ..
            }
        )));
    }

    #[test]
    fn test_teleport_avoids_enemies() {
        let (mut player, _, settings) = world();
        player.facing = Vec2::X;
        let blocker = vec![Enemy::new(1, EnemyKind::Basic, player.pos + Vec2::new(100.0, 0.0))];
        let mut rng = Pcg32::seed_from_u64(1);
        let mut teleport = catalog::create(AbilityId::FelineTeleport);
        assert!(!teleport.auto_trigger);

        let commands = teleport.activate(&ctx(0, &player, &blocker, &settings), &mut rng).unwrap();
        let [EffectCommand::TeleportPlayer { to }] = commands.as_slice() else {
            panic!("expected teleport");
        };
        assert!(to.distance(blocker[0].pos) >= TELEPORT_SAFE_DISTANCE);
        assert!((to.distance(player.pos) - 100.0).abs() < 1e-3);
    }

    #[test]
    fn test_buff_lifecycle() {
        let (player, enemies, settings) = world();
        let mut rng = Pcg32::seed_from_u64(1);
        let mut aura = catalog::create(AbilityId::ReflexAura);

        let start = aura.activate(&ctx(0, &player, &enemies, &settings), &mut rng).unwrap();
        assert_eq!(
            start,
            vec![EffectCommand::StartBuff(BuffEffect::FireRate { scale: 0.4 })]
        );
        assert!(aura.is_buff_active(7999));
        assert!(aura.expire(7999).is_empty());
        assert_eq!(
            aura.expire(8000),
            vec![EffectCommand::EndBuff(BuffEffect::FireRate { scale: 0.4 })]
        );
        assert!(aura.deactivate().is_empty());
    }

    #[test]
    fn test_manual_deactivate_matches_expiry() {
        let (player, enemies, settings) = world();
        let mut rng = Pcg32::seed_from_u64(1);
        let mut shield = catalog::create(AbilityId::PurringShield);
        shield.activate(&ctx(0, &player, &enemies, &settings), &mut rng).unwrap();

        let mut natural = shield.clone();
        assert_eq!(shield.deactivate(), natural.expire(5000));
        assert_eq!(shield, natural);
    }

    #[test]
    fn test_level_capped() {
        let mut ability = catalog::create(AbilityId::CatnipSpell);
        for _ in 0..10 {
            ability.upgrade();
        }
        assert_eq!(ability.level, MAX_ABILITY_LEVEL);
        assert!(!ability.upgrade());
    }

    /// Numeric parameters paired with whether larger is better
    fn parameters(ability: &Ability) -> Vec<(f64, bool)> {
        let mut params = vec![(ability.cooldown_ms as f64, false)];
        match &ability.kind {
            AbilityKind::Passive(p) => {
                params.push((p.damage_bonus as f64, true));
                params.push((p.speed_bonus as f64, true));
                params.push((p.fire_cooldown_reduction.unwrap_or(0.0) as f64, true));
                params.push((p.modifiers.max_jumps.unwrap_or(0) as f64, true));
                params.push((p.modifiers.max_pierces.unwrap_or(0) as f64, true));
                for effect in &p.modifiers.on_hit {
                    match *effect {
                        OnHitEffect::Freeze { chance, duration_ms } => {
                            params.push((chance as f64, true));
                            params.push((duration_ms as f64, true));
                        }
                        OnHitEffect::Burn { damage_per_tick, duration_ms } => {
                            params.push((damage_per_tick as f64, true));
                            params.push((duration_ms as f64, true));
                        }
                        OnHitEffect::Stun { duration_ms } => params.push((duration_ms as f64, true)),
                        OnHitEffect::Heal { chance, fraction } => {
                            params.push((chance as f64, true));
                            params.push((fraction as f64, true));
                        }
                        OnHitEffect::Knockback { distance } => params.push((distance as f64, true)),
                    }
                }
            }
            AbilityKind::ProjectileAttack(a) => {
                params.push((a.damage as f64, true));
                match a.pattern {
                    ProjectilePattern::WhiskerBeam { max_pierces } => {
                        params.push((max_pierces as f64, true))
                    }
                    ProjectilePattern::FurBall { explosion_radius } => {
                        params.push((explosion_radius as f64, true))
                    }
                    ProjectilePattern::ElementalTail { max_pierces, .. } => {
                        params.push((max_pierces as f64, true))
                    }
                    ProjectilePattern::GhostRats { count } => params.push((count as f64, true)),
                }
            }
            AbilityKind::AreaEffect(area) => match *area {
                AreaEffect::Meow { radius, damage, stun_ms } => {
                    params.extend([(radius as f64, true), (damage as f64, true), (stun_ms as f64, true)])
                }
                AreaEffect::FishRain { radius, damage, fish, lifetime_ms } => params.extend([
                    (radius as f64, true),
                    (damage as f64, true),
                    (fish as f64, true),
                    (lifetime_ms as f64, true),
                ]),
                AreaEffect::Gaze { radius, max_targets, duration_ms } => params.extend([
                    (radius as f64, true),
                    (max_targets as f64, true),
                    (duration_ms as f64, true),
                ]),
                AreaEffect::Teleport { distance } => params.push((distance as f64, true)),
            },
            AbilityKind::TimedBuff(b) => {
                params.push((b.duration_ms as f64, true));
                match b.effect {
                    BuffEffect::FireRate { scale } => params.push((scale as f64, false)),
                    BuffEffect::Shield { damage, radius } => {
                        params.extend([(damage as f64, true), (radius as f64, true)])
                    }
                }
            }
        }
        params
    }

    proptest! {
        #[test]
        fn test_upgrade_monotonicity(index in 0usize..18, upgrades in 1u32..8) {
            let mut ability = catalog::create(AbilityId::ALL[index]);
            for _ in 0..upgrades {
                let before = parameters(&ability);
                let level = ability.level;
                let upgraded = ability.upgrade();
                let after = parameters(&ability);

                prop_assert!(ability.level <= ability.max_level);
                if !upgraded {
                    prop_assert_eq!(level, ability.max_level);
                    prop_assert_eq!(before, after);
                    continue;
                }
                prop_assert_eq!(ability.level, level + 1);

                let mut improved = false;
                for ((b, higher), (a, _)) in before.iter().zip(after.iter()) {
                    if *higher {
                        prop_assert!(a >= b, "{:?} got worse", ability.id);
                        improved |= a > b;
                    } else {
                        prop_assert!(a <= b, "{:?} got worse", ability.id);
                        improved |= a < b;
                    }
                }
                prop_assert!(improved, "{:?} upgrade changed nothing", ability.id);
            }
        }

        #[test]
        fn test_cooldown_gate_property(start in 0u64..100_000, early in 0u64..1500, late in 0u64..1500) {
            let (player, enemies, settings) = world();
            let mut rng = Pcg32::seed_from_u64(start);
            let mut beam = catalog::create(AbilityId::WhiskerBeam);
            let cooldown = beam.cooldown_ms;
            let (first, second) = (early.min(late), early.max(late));

            prop_assert!(beam.activate(&ctx(start, &player, &enemies, &settings), &mut rng).is_some());
            let snapshot = beam.clone();
            prop_assert!(beam.activate(&ctx(start + first, &player, &enemies, &settings), &mut rng).is_none());
            prop_assert!(beam.activate(&ctx(start + second, &player, &enemies, &settings), &mut rng).is_none());
            prop_assert_eq!(&beam, &snapshot);
            prop_assert!(beam.activate(&ctx(start + cooldown, &player, &enemies, &settings), &mut rng).is_some());
        }
    }
}
