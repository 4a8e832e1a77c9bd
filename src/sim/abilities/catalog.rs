//! Level-1 definitions of every ability

use super::ability::{
    Ability, AbilityId, AbilityKind, AreaEffect, Element, PassiveAbility, ProjectileAttack,
    ProjectilePattern, TimedBuff,
};
use super::modifiers::AttackModifiers;
use crate::sim::effects::{BuffEffect, OnHitEffect};

const FIRE: [u8; 3] = [255, 100, 0];
const ICE: [u8; 3] = [100, 200, 255];

/// One-line description for upgrade menus
pub fn description(id: AbilityId) -> &'static str {
    match id {
        AbilityId::CatnipSpell => "Empowers basic attacks with extra damage",
        AbilityId::FrozenClaw => "Attacks may freeze enemies",
        AbilityId::FlamingPaws => "Attacks set enemies on fire",
        AbilityId::CleaningTongue => "Hits may heal you",
        AbilityId::Pawquake => "Attacks knock enemies back",
        AbilityId::StaticFur => "Attacks jump between nearby enemies",
        AbilityId::SteelWhiskers => "Attacks pierce through enemies",
        AbilityId::Tailwind => "Move faster and attack more often",
        AbilityId::WhiskerBeam => "Fires a piercing beam at the nearest enemy",
        AbilityId::ArcaneFurBall => "Lobs an exploding fur ball at a random enemy",
        AbilityId::ElementalTail => "Shoots behind you, cycling fire, ice and lightning",
        AbilityId::GhostRatSummoning => "Summons homing ghost rats",
        AbilityId::MysticalMeow => "Damages and stuns nearby enemies",
        AbilityId::EtherealFishRain => "Rains fish around you",
        AbilityId::EnchantedGaze => "Charms nearby enemies to fight for you",
        AbilityId::FelineTeleport => "Teleports you to a safe spot",
        AbilityId::PurringShield => "A shield that hurts enemies that touch it",
        AbilityId::ReflexAura => "Temporarily attack much faster",
    }
}

/// Instantiate an ability at level 1
pub fn create(id: AbilityId) -> Ability {
    match id {
        AbilityId::CatnipSpell => passive(
            id,
            5,
            AttackModifiers {
                color: Some([200, 100, 255]),
                size: Some(6.0),
                ..Default::default()
            },
        ),
        AbilityId::FrozenClaw => passive(
            id,
            3,
            AttackModifiers {
                color: Some(ICE),
                size: Some(5.0),
                on_hit: vec![OnHitEffect::Freeze {
                    chance: 0.15,
                    duration_ms: 2000,
                }],
                ..Default::default()
            },
        ),
        AbilityId::FlamingPaws => passive(
            id,
            2,
            AttackModifiers {
                color: Some(FIRE),
                size: Some(5.0),
                damage_bonus: Some(1),
                on_hit: vec![OnHitEffect::Burn {
                    damage_per_tick: 20,
                    duration_ms: 3000,
                }],
                ..Default::default()
            },
        ),
        AbilityId::CleaningTongue => passive(
            id,
            0,
            AttackModifiers {
                color: Some([255, 150, 200]),
                size: Some(4.0),
                on_hit: vec![OnHitEffect::Heal {
                    chance: 0.05,
                    fraction: 0.15,
                }],
                ..Default::default()
            },
        ),
        AbilityId::Pawquake => passive(
            id,
            0,
            AttackModifiers {
                color: Some([150, 100, 50]),
                size: Some(6.0),
                on_hit: vec![OnHitEffect::Knockback { distance: 60.0 }],
                ..Default::default()
            },
        ),
        AbilityId::StaticFur => passive(
            id,
            0,
            AttackModifiers {
                color: Some([255, 255, 100]),
                size: Some(4.0),
                max_jumps: Some(2),
                ..Default::default()
            },
        ),
        AbilityId::SteelWhiskers => passive(
            id,
            0,
            AttackModifiers {
                color: Some([192, 192, 192]),
                size: Some(3.0),
                max_pierces: Some(2),
                ..Default::default()
            },
        ),
        AbilityId::Tailwind => Ability::new(
            id,
            0,
            false,
            AbilityKind::Passive(PassiveAbility {
                damage_bonus: 0,
                speed_bonus: 12.0,
                fire_cooldown_reduction: Some(0.3),
                modifiers: AttackModifiers {
                    color: Some([150, 255, 150]),
                    size: Some(4.0),
                    ..Default::default()
                },
            }),
        ),

        AbilityId::WhiskerBeam => projectile(
            id,
            ProjectileAttack {
                base_damage: 25,
                damage: 25,
                speed: 480.0,
                radius: 3.0,
                lifetime_ms: Some(2000),
                base_cooldown_ms: 1500,
                color: [255, 255, 255],
                pattern: ProjectilePattern::WhiskerBeam { max_pierces: 3 },
            },
        ),
        AbilityId::ArcaneFurBall => projectile(
            id,
            ProjectileAttack {
                base_damage: 35,
                damage: 35,
                speed: 360.0,
                radius: 10.0,
                lifetime_ms: Some(3000),
                base_cooldown_ms: 2500,
                color: [180, 80, 255],
                pattern: ProjectilePattern::FurBall {
                    explosion_radius: 60.0,
                },
            },
        ),
        AbilityId::ElementalTail => projectile(
            id,
            ProjectileAttack {
                base_damage: 30,
                damage: 30,
                speed: 600.0,
                radius: 6.0,
                lifetime_ms: Some(1500),
                base_cooldown_ms: 2000,
                color: Element::Fire.color(),
                pattern: ProjectilePattern::ElementalTail {
                    max_pierces: 3,
                    element: Element::Fire,
                },
            },
        ),
        AbilityId::GhostRatSummoning => projectile(
            id,
            ProjectileAttack {
                base_damage: 15,
                damage: 15,
                speed: 180.0,
                radius: 6.0,
                lifetime_ms: Some(8000),
                base_cooldown_ms: 7000,
                color: [200, 200, 220],
                pattern: ProjectilePattern::GhostRats { count: 3 },
            },
        ),

        AbilityId::MysticalMeow => Ability::new(
            id,
            4000,
            true,
            AbilityKind::AreaEffect(AreaEffect::Meow {
                radius: 120.0,
                damage: 10,
                stun_ms: 1500,
            }),
        ),
        AbilityId::EtherealFishRain => Ability::new(
            id,
            6000,
            true,
            AbilityKind::AreaEffect(AreaEffect::FishRain {
                radius: 150.0,
                damage: 20,
                fish: 8,
                lifetime_ms: 3000,
            }),
        ),
        AbilityId::EnchantedGaze => Ability::new(
            id,
            8000,
            true,
            AbilityKind::AreaEffect(AreaEffect::Gaze {
                radius: 100.0,
                max_targets: 2,
                duration_ms: 5000,
            }),
        ),
        AbilityId::FelineTeleport => Ability::new(
            id,
            3000,
            false,
            AbilityKind::AreaEffect(AreaEffect::Teleport { distance: 100.0 }),
        ),

        AbilityId::PurringShield => Ability::new(
            id,
            8000,
            true,
            AbilityKind::TimedBuff(TimedBuff {
                duration_ms: 5000,
                active_until: None,
                effect: BuffEffect::Shield {
                    damage: 15,
                    radius: 50.0,
                },
            }),
        ),
        AbilityId::ReflexAura => Ability::new(
            id,
            10_000,
            true,
            AbilityKind::TimedBuff(TimedBuff {
                duration_ms: 8000,
                active_until: None,
                effect: BuffEffect::FireRate { scale: 0.4 },
            }),
        ),
    }
}

fn passive(id: AbilityId, damage_bonus: i32, modifiers: AttackModifiers) -> Ability {
    Ability::new(
        id,
        0,
        false,
        AbilityKind::Passive(PassiveAbility {
            damage_bonus,
            speed_bonus: 0.0,
            fire_cooldown_reduction: None,
            modifiers,
        }),
    )
}

fn projectile(id: AbilityId, attack: ProjectileAttack) -> Ability {
    let cooldown = attack.base_cooldown_ms;
    Ability::new(id, cooldown, true, AbilityKind::ProjectileAttack(attack))
}
