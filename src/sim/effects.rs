//! Effect commands
//!
//! Abilities and on-hit modifiers never touch the world directly. They emit
//! `EffectCommand`s and `execute` applies them, so every enemy kill goes
//! through the same path in `GameState`.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::entity::{Enemy, EntityId};
use super::projectile::Projectile;
use super::state::{GameEvent, GameState};
use super::status::StatusApplication;
use crate::direction_to;

/// Effect carried by a projectile and applied to whatever it hits
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum OnHitEffect {
    /// Chance (0..1) to freeze the target
    Freeze { chance: f32, duration_ms: u64 },
    Burn { damage_per_tick: i32, duration_ms: u64 },
    Stun { duration_ms: u64 },
    /// Chance to heal the player by a fraction of max HP
    Heal { chance: f32, fraction: f32 },
    /// Push the target away from the impact
    Knockback { distance: f32 },
}

/// Timed player buff
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BuffEffect {
    /// Multiply the fire cooldown
    FireRate { scale: f32 },
    /// Absorb contact hits and reflect damage
    Shield { damage: i32, radius: f32 },
}

/// A single world mutation
#[derive(Debug, Clone, PartialEq)]
pub enum EffectCommand {
    Damage { target: EntityId, amount: i32 },
    ApplyStatus { target: EntityId, status: StatusApplication },
    HealPlayer { amount: i32 },
    Knockback { target: EntityId, offset: Vec2 },
    /// Id is assigned on execution
    SpawnProjectile(Projectile),
    StartBuff(BuffEffect),
    EndBuff(BuffEffect),
    TeleportPlayer { to: Vec2 },
}

/// Roll a projectile's on-hit effects against `target`.
///
/// `impact` is where the hit came from (used for knockback direction).
/// Chance rolls consume RNG in effect order.
pub fn on_hit_commands(
    effects: &[OnHitEffect],
    target: &Enemy,
    impact: Vec2,
    player_max_hp: i32,
    rng: &mut impl Rng,
) -> Vec<EffectCommand> {
    let mut commands = Vec::new();

    for effect in effects {
        match *effect {
            OnHitEffect::Freeze {
                chance,
                duration_ms,
            } => {
                if rng.random::<f32>() < chance {
                    commands.push(EffectCommand::ApplyStatus {
                        target: target.id,
                        status: StatusApplication::Freeze { duration_ms },
                    });
                }
            }
            OnHitEffect::Burn {
                damage_per_tick,
                duration_ms,
            } => commands.push(EffectCommand::ApplyStatus {
                target: target.id,
                status: StatusApplication::Burn {
                    damage_per_tick,
                    duration_ms,
                },
            }),
            OnHitEffect::Stun { duration_ms } => commands.push(EffectCommand::ApplyStatus {
                target: target.id,
                status: StatusApplication::Stun { duration_ms },
            }),
            OnHitEffect::Heal { chance, fraction } => {
                if rng.random::<f32>() < chance {
                    let amount = ((player_max_hp as f32 * fraction).round() as i32).max(1);
                    commands.push(EffectCommand::HealPlayer { amount });
                }
            }
            OnHitEffect::Knockback { distance } => {
                let dir = direction_to(impact, target.pos);
                if dir != Vec2::ZERO {
                    commands.push(EffectCommand::Knockback {
                        target: target.id,
                        offset: dir * distance,
                    });
                }
            }
        }
    }

    commands
}

/// Apply commands in order
pub fn execute(state: &mut GameState, commands: Vec<EffectCommand>) {
    for command in commands {
        match command {
            EffectCommand::Damage { target, amount } => {
                if let Some(index) = state.enemy_index(target) {
                    state.damage_enemy(index, amount);
                }
            }
            EffectCommand::ApplyStatus { target, status } => {
                let now = state.now_ms();
                let burn_interval = state.settings.burn_tick_interval_ms;
                if let Some(enemy) = state.enemies.iter_mut().find(|e| e.id == target && e.alive) {
                    enemy
                        .status
                        .apply(status, now, &mut enemy.speed, burn_interval);
                }
            }
            EffectCommand::HealPlayer { amount } => state.player.heal(amount),
            EffectCommand::Knockback { target, offset } => {
                if let Some(enemy) = state.enemies.iter_mut().find(|e| e.id == target && e.alive) {
                    enemy.pos += offset;
                }
            }
            EffectCommand::SpawnProjectile(mut projectile) => {
                projectile.id = state.next_entity_id();
                state.events.push(GameEvent::ProjectileFired {
                    id: projectile.id,
                    faction: projectile.faction,
                });
                state.projectiles.push(projectile);
            }
            EffectCommand::StartBuff(buff) => match buff {
                BuffEffect::FireRate { scale } => state.player.fire_rate_scale = Some(scale),
                BuffEffect::Shield { damage, radius } => {
                    state.player.shield = Some(super::entity::ShieldBuff { damage, radius })
                }
            },
            EffectCommand::EndBuff(buff) => match buff {
                BuffEffect::FireRate { .. } => state.player.fire_rate_scale = None,
                BuffEffect::Shield { .. } => state.player.shield = None,
            },
            EffectCommand::TeleportPlayer { to } => state.player.pos = to,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::sim::entity::EnemyKind;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_guaranteed_effects_always_emitted() {
        let enemy = Enemy::new(3, EnemyKind::Basic, Vec2::new(100.0, 0.0));
        let mut rng = Pcg32::seed_from_u64(1);
        let effects = [
            OnHitEffect::Freeze {
                chance: 1.0,
                duration_ms: 2000,
            },
            OnHitEffect::Stun { duration_ms: 1000 },
            OnHitEffect::Knockback { distance: 60.0 },
        ];
        let commands = on_hit_commands(&effects, &enemy, Vec2::ZERO, 100, &mut rng);

        assert_eq!(commands.len(), 3);
        assert_eq!(
            commands[2],
            EffectCommand::Knockback {
                target: 3,
                offset: Vec2::new(60.0, 0.0)
            }
        );
    }

    #[test]
    fn test_zero_chance_never_fires() {
        let enemy = Enemy::new(3, EnemyKind::Basic, Vec2::ZERO);
        let mut rng = Pcg32::seed_from_u64(1);
        let effects = [OnHitEffect::Heal {
            chance: 0.0,
            fraction: 0.5,
        }];
        for _ in 0..100 {
            assert!(on_hit_commands(&effects, &enemy, Vec2::ZERO, 100, &mut rng).is_empty());
        }
    }

    #[test]
    fn test_execute_damage_routes_through_kill_path() {
        let mut state = GameState::new(5, Settings::default());
        let id = state.spawn_enemy(EnemyKind::Basic, Vec2::new(100.0, 100.0));

        execute(
            &mut state,
            vec![
                EffectCommand::Damage { target: id, amount: 50 },
                EffectCommand::Damage { target: id, amount: 50 },
            ],
        );

        let kills = state
            .events
            .iter()
            .filter(|e| matches!(e, GameEvent::EnemyKilled { .. }))
            .count();
        assert_eq!(kills, 1);
        assert_eq!(state.pickups.len(), 1);
    }

    #[test]
    fn test_buffs_start_and_end() {
        let mut state = GameState::new(5, Settings::default());
        let shield = BuffEffect::Shield {
            damage: 15,
            radius: 50.0,
        };
        execute(&mut state, vec![EffectCommand::StartBuff(shield)]);
        assert!(state.player.shield.is_some());
        execute(&mut state, vec![EffectCommand::EndBuff(shield)]);
        assert!(state.player.shield.is_none());
    }
}
