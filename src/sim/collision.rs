//! Collision and damage resolution
//!
//! Runs once per tick after movement. Order:
//! 1. Player projectiles vs enemies (damage, splash, on-hit effects, pierce/chain continuation)
//! 2. Enemy projectiles vs player
//! 3. Charmed enemies striking their former allies
//! 4. Enemy contact with the player, gated by the invincibility window
//! 5. Experience pickups
//!
//! Enemies are only marked dead here. A dead enemy is skipped by every later
//! check in the same pass and swept by the caller afterwards.

use glam::Vec2;

use super::effects::{self, EffectCommand};
use super::entity::EntityId;
use super::projectile::{Faction, Projectile};
use super::state::{GameEvent, GamePhase, GameState};
use crate::circles_overlap;
use crate::consts::*;

/// What the tick loop needs to know after resolution
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollisionOutcome {
    /// The player died during this pass
    pub player_died: bool,
}

/// Resolve every overlap for the current tick
pub fn resolve(state: &mut GameState) -> CollisionOutcome {
    resolve_player_projectiles(state);
    let mut player_died = resolve_enemy_projectiles(state);
    resolve_charmed_strikes(state);
    player_died |= resolve_contacts(state);
    collect_pickups(state);
    CollisionOutcome { player_died }
}

/// Player projectiles against enemies, in id order on both sides
pub fn resolve_player_projectiles(state: &mut GameState) {
    let mut projectiles = std::mem::take(&mut state.projectiles);
    for projectile in projectiles
        .iter_mut()
        .filter(|p| p.alive && p.faction == Faction::Player)
    {
        resolve_projectile(state, projectile);
    }
    // Keep anything spawned by effects during the pass
    projectiles.append(&mut state.projectiles);
    state.projectiles = projectiles;
}

fn resolve_projectile(state: &mut GameState, projectile: &mut Projectile) {
    for index in 0..state.enemies.len() {
        if !projectile.alive {
            break;
        }
        let enemy = &state.enemies[index];
        if !enemy.alive
            || projectile.has_touched(enemy.id)
            || !circles_overlap(projectile.pos, projectile.radius, enemy.pos, enemy.radius)
        {
            continue;
        }
        if projectile.is_chaining()
            && projectile
                .chain
                .as_ref()
                .is_some_and(|c| !c.in_reach(enemy.pos))
        {
            continue;
        }

        let target = enemy.id;
        let contact = projectile.pos;
        // Chase radius is anchored at the first damaging contact, pierce or not
        if let Some(chain) = projectile.chain.as_mut() {
            chain.origin.get_or_insert(contact);
        }
        let commands = hit_commands(state, projectile, index, contact);
        effects::execute(state, commands);

        if !continue_after_hit(state, projectile, target, contact) {
            break;
        }
    }
}

/// Direct damage, splash damage, then on-hit effects
fn hit_commands(
    state: &mut GameState,
    projectile: &Projectile,
    index: usize,
    contact: Vec2,
) -> Vec<EffectCommand> {
    let enemy = &state.enemies[index];
    let mut commands = vec![EffectCommand::Damage {
        target: enemy.id,
        amount: projectile.damage,
    }];

    if let Some(radius) = projectile.explosion_radius {
        commands.extend(
            state
                .enemies
                .iter()
                .filter(|e| e.alive && e.id != enemy.id && e.pos.distance(contact) <= radius)
                .map(|e| EffectCommand::Damage {
                    target: e.id,
                    amount: projectile.damage,
                }),
        );
    }

    // Knockback pushes away from where the projectile came from
    let impact = contact - projectile.vel.normalize_or_zero() * projectile.radius;
    commands.extend(effects::on_hit_commands(
        &projectile.on_hit,
        enemy,
        impact,
        state.player.max_hp,
        &mut state.rng,
    ));
    commands
}

/// Update pierce/chain bookkeeping. Returns true to keep checking overlaps
/// this tick.
fn continue_after_hit(
    state: &GameState,
    projectile: &mut Projectile,
    target: EntityId,
    contact: Vec2,
) -> bool {
    if let Some(pierce) = projectile.pierce.as_mut()
        && !pierce.exhausted()
    {
        pierce.hit.insert(target);
        if !pierce.exhausted() {
            return true;
        }
        if projectile.chain.is_none() {
            projectile.alive = false;
            return false;
        }
    }

    let pierce = &projectile.pierce;
    let Some(chain) = projectile.chain.as_mut() else {
        projectile.alive = false;
        return false;
    };

    chain.jumped.insert(target);
    let origin = chain.origin.unwrap_or(contact);
    if chain.exhausted() {
        projectile.alive = false;
        return false;
    }

    let next = state
        .enemies
        .iter()
        .filter(|e| {
            e.alive
                && !chain.jumped.contains(&e.id)
                && !pierce.as_ref().is_some_and(|p| p.hit.contains(&e.id))
                && e.pos.distance(origin) <= chain.radius
        })
        .min_by(|a, b| {
            a.pos
                .distance_squared(contact)
                .total_cmp(&b.pos.distance_squared(contact))
        })
        .map(|e| e.id);

    match next {
        Some(id) => projectile.target = Some(id),
        None => projectile.alive = false,
    }
    false
}

/// Apply damage to the player and handle death. Returns true on the killing hit.
fn hit_player(state: &mut GameState, damage: i32) -> bool {
    let now = state.now_ms();
    state.player.last_hit_ms = Some(now);
    let died = state.player.take_damage(damage);
    state.events.push(GameEvent::PlayerHit {
        damage,
        hp: state.player.hp,
    });
    if died {
        log::info!("Player died at {}ms", now);
        state.phase = GamePhase::GameOver;
        state.events.push(GameEvent::GameOver);
    }
    died
}

fn resolve_enemy_projectiles(state: &mut GameState) -> bool {
    let now = state.now_ms();
    let window = state.settings.invincibility_ms;
    let mut died = false;

    for index in 0..state.projectiles.len() {
        let projectile = &state.projectiles[index];
        if !projectile.alive
            || projectile.faction != Faction::Enemy
            || !circles_overlap(
                projectile.pos,
                projectile.radius,
                state.player.pos,
                state.player.radius,
            )
        {
            continue;
        }
        let damage = projectile.damage;
        state.projectiles[index].alive = false;

        let player = &state.player;
        if !player.is_alive() || player.shield.is_some() || player.is_invincible(now, window) {
            continue;
        }
        died |= hit_player(state, damage);
    }
    died
}

fn resolve_charmed_strikes(state: &mut GameState) {
    let now = state.now_ms();

    for index in 0..state.enemies.len() {
        let striker = &state.enemies[index];
        if !striker.alive
            || !striker.status.is_charmed()
            || striker
                .last_charm_attack_ms
                .is_some_and(|t| now < t + CHARM_ATTACK_INTERVAL_MS)
        {
            continue;
        }
        let (pos, radius, damage) = (striker.pos, striker.radius, striker.damage);
        let victim = state
            .enemies
            .iter()
            .position(|e| e.is_hostile() && circles_overlap(pos, radius, e.pos, e.radius));

        if let Some(victim) = victim {
            state.enemies[index].last_charm_attack_ms = Some(now);
            state.damage_enemy(victim, damage);
        }
    }
}

/// Enemy bodies against the player. Returns true if the player died.
pub fn resolve_contacts(state: &mut GameState) -> bool {
    let now = state.now_ms();
    let window = state.settings.invincibility_ms;
    let mut died = false;

    for index in 0..state.enemies.len() {
        let player = &state.player;
        if !player.is_alive() || player.is_invincible(now, window) {
            break;
        }
        let enemy = &state.enemies[index];
        if !enemy.is_hostile()
            || !circles_overlap(enemy.pos, enemy.radius, player.pos, player.contact_radius())
        {
            continue;
        }

        let contact_damage = enemy.damage;
        match state.player.shield {
            Some(shield) => {
                state.player.last_hit_ms = Some(now);
                state.damage_enemy(index, shield.damage);
            }
            None => died |= hit_player(state, contact_damage),
        }

        if state.settings.contact_kills_enemy {
            let remaining = state.enemies[index].hp;
            state.damage_enemy(index, remaining);
        }
    }
    died
}

fn collect_pickups(state: &mut GameState) {
    let (pos, radius) = (state.player.pos, state.player.radius);
    let events = &mut state.events;
    let mut total = 0;

    state.pickups.retain(|pickup| {
        if circles_overlap(pickup.pos, pickup.radius(), pos, radius) {
            total += pickup.value;
            events.push(GameEvent::ExperienceCollected {
                value: pickup.value,
            });
            false
        } else {
            true
        }
    });

    if total == 0 {
        return;
    }
    let levels = state.player.gain_xp(total);
    for offset in 0..levels {
        let level = state.player.level - levels + 1 + offset;
        state.events.push(GameEvent::LevelUp { level });
    }
    state.pending_level_ups += levels;
}
