//! Fixed timestep simulation tick
//!
//! Core game loop that advances simulation deterministically. Phase order:
//! spawn, player and enemy movement, projectile movement, collision
//! resolution, status effects, abilities, basic attack, level-up and time limit.

use glam::Vec2;

use super::abilities::{AbilityContext, AbilityId};
use super::collision;
use super::effects::{self, EffectCommand};
use super::projectile::{Faction, Projectile, nearest_hostile};
use super::spawner::Spawner;
use super::state::{GameEvent, GamePhase, GameState};
use super::status;
use crate::consts::*;
use crate::platform::{GameSignals, InputSource};

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickInput {
    /// Desired movement direction
    pub movement: Vec2,
    /// Abilities the player asked to use
    pub activations: Vec<AbilityId>,
    /// Pause toggle
    pub pause: bool,
}

impl TickInput {
    /// Sample an input source once
    pub fn poll(source: &mut dyn InputSource) -> Self {
        Self {
            movement: source.movement_intent(),
            activations: source.activation_requests(),
            pause: source.pause_requested(),
        }
    }
}

/// Advance the game state by one fixed timestep
pub fn tick(
    state: &mut GameState,
    spawner: &mut Spawner,
    input: &TickInput,
    signals: &mut dyn GameSignals,
) {
    // Handle pause toggle
    if input.pause {
        match state.phase {
            GamePhase::Playing => {
                state.phase = GamePhase::Paused;
                return;
            }
            GamePhase::Paused => state.phase = GamePhase::Playing,
            _ => {}
        }
    }

    // Level-up choices, pause and finished matches freeze the clock
    if state.phase != GamePhase::Playing {
        return;
    }

    state.time_ticks += 1;

    spawner.update(state);

    let arena = state.arena();
    state.player.step(input.movement, SIM_DT, arena);
    move_enemies(state);
    fire_enemy_shots(state);
    move_projectiles(state);

    let outcome = collision::resolve(state);
    state.sweep();
    if outcome.player_died {
        signals.on_player_death();
        state.normalize_order();
        return;
    }

    update_statuses(state);
    state.sweep();

    update_abilities(state, &input.activations);
    fire_basic_attack(state);

    if state.now_ms() >= state.settings.match_duration_ms() {
        log::info!("Time limit reached at {}s", state.elapsed_secs());
        state.phase = GamePhase::Victory;
        state.events.push(GameEvent::TimeLimitReached);
        signals.on_time_limit_reached();
    } else {
        state.open_level_up(signals);
    }

    state.normalize_order();
}

fn move_enemies(state: &mut GameState) {
    let player_pos = state.player.pos;
    for index in 0..state.enemies.len() {
        let enemy = &state.enemies[index];
        let ally_target = if enemy.status.is_charmed() {
            nearest_hostile(&state.enemies, enemy.pos, |_| true).map(|e| e.pos)
        } else {
            None
        };
        state.enemies[index].step(player_pos, ally_target, SIM_DT);
    }
}

fn fire_enemy_shots(state: &mut GameState) {
    let now = state.now_ms();
    let player_pos = state.player.pos;
    let mut shots = Vec::new();

    for enemy in state.enemies.iter_mut() {
        if !enemy.can_shoot(player_pos, now) {
            continue;
        }
        let Some(shooter) = enemy.shooter else {
            continue;
        };
        enemy.last_shot_ms = Some(now);
        shots.push(EffectCommand::SpawnProjectile(Projectile::new(
            Faction::Enemy,
            enemy.pos,
            player_pos - enemy.pos,
            shooter.projectile_speed,
            shooter.projectile_damage,
            ENEMY_PROJECTILE_RADIUS,
        )));
    }

    effects::execute(state, shots);
}

/// Steer and integrate every projectile
pub fn move_projectiles(state: &mut GameState) {
    let now = state.now_ms();
    let enemies = &state.enemies;
    let settings = &state.settings;
    for projectile in state.projectiles.iter_mut() {
        projectile.update(enemies, now, SIM_DT, settings);
    }
}

/// Expire effects and apply burn ticks; burn kills go through the kill path
fn update_statuses(state: &mut GameState) {
    let now = state.now_ms();
    let interval = state.settings.burn_tick_interval_ms;
    let killed = status::update_statuses(&mut state.enemies, now, interval);
    for id in killed {
        if let Some(index) = state.enemy_index(id) {
            state.record_kill(index);
        }
    }
}

fn update_abilities(state: &mut GameState, requested: &[AbilityId]) {
    let now = state.now_ms();
    let expired = state.abilities.update(now);
    effects::execute(state, expired);

    for &id in requested {
        if !state.activate_ability(id) {
            let wait = state.abilities.get(id).map_or(0, |a| a.remaining_cooldown_ms(now));
            log::debug!("{} not activated ({}ms cooldown left)", id.name(), wait);
        }
    }

    let ctx = AbilityContext {
        now,
        player: &state.player,
        enemies: &state.enemies,
        settings: &state.settings,
    };
    let triggered = state.abilities.auto_triggers(&ctx);
    for id in triggered {
        state.activate_ability(id);
    }
}

/// Auto-fire at the nearest targetable enemy
fn fire_basic_attack(state: &mut GameState) {
    let now = state.now_ms();
    if !state.player.can_fire(now) {
        return;
    }
    let Some(target) = nearest_hostile(&state.enemies, state.player.pos, |_| true).map(|e| e.pos)
    else {
        return;
    };

    let projectile = state
        .abilities
        .attack_modifiers()
        .basic_attack(&state.player, target, state.settings.chain_radius);
    state.player.last_shot_ms = Some(now);
    effects::execute(state, vec![EffectCommand::SpawnProjectile(projectile)]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::NoSignals;
    use crate::settings::Settings;
    use crate::sim::abilities::UpgradeOption;
    use crate::sim::entity::{EnemyKind, EntityId};
    use crate::sim::status::Burn;

    #[derive(Default)]
    struct CountingSignals {
        deaths: u32,
        time_limits: u32,
        level_ups: u32,
    }

    impl GameSignals for CountingSignals {
        fn on_player_death(&mut self) {
            self.deaths += 1;
        }

        fn on_time_limit_reached(&mut self) {
            self.time_limits += 1;
        }

        fn on_level_up(&mut self, _options: &[UpgradeOption]) {
            self.level_ups += 1;
        }
    }

    struct Scripted {
        frame: u32,
    }

    impl InputSource for Scripted {
        fn movement_intent(&mut self) -> Vec2 {
            self.frame += 1;
            Vec2::from_angle(self.frame as f32 * 0.01)
        }

        fn activation_requests(&mut self) -> Vec<AbilityId> {
            if self.frame % 500 == 0 {
                vec![AbilityId::FelineTeleport]
            } else {
                Vec::new()
            }
        }
    }

    /// No spawning, so tests control every enemy
    fn quiet_settings() -> Settings {
        Settings {
            spawn_interval_ms: u64::MAX / 2,
            boss_spawn_interval_ms: u64::MAX / 2,
            ..Default::default()
        }
    }

    fn run(state: &mut GameState, spawner: &mut Spawner, signals: &mut CountingSignals, ticks: u32) {
        let input = TickInput::default();
        for _ in 0..ticks {
            tick(state, spawner, &input, signals);
        }
    }

    #[test]
    fn test_tick_pause() {
        let mut state = GameState::new(12345, quiet_settings());
        let mut spawner = Spawner::new();
        let mut signals = CountingSignals::default();

        run(&mut state, &mut spawner, &mut signals, 1);
        assert_eq!(state.time_ticks, 1);

        let pause = TickInput {
            pause: true,
            ..Default::default()
        };
        tick(&mut state, &mut spawner, &pause, &mut signals);
        assert_eq!(state.phase, GamePhase::Paused);
        run(&mut state, &mut spawner, &mut signals, 10);
        assert_eq!(state.time_ticks, 1);

        // Unpause
        tick(&mut state, &mut spawner, &pause, &mut signals);
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.time_ticks, 2);
    }

    #[test]
    fn test_poll_input_source() {
        let mut source = Scripted { frame: 499 };
        let input = TickInput::poll(&mut source);
        assert_eq!(input.activations, vec![AbilityId::FelineTeleport]);
        assert!(!input.pause);
        assert!((input.movement.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_victory_at_time_limit() {
        let settings = Settings {
            match_duration_secs: 1,
            ..quiet_settings()
        };
        let mut state = GameState::new(1, settings);
        let mut spawner = Spawner::new();
        let mut signals = CountingSignals::default();

        run(&mut state, &mut spawner, &mut signals, 62);
        assert_eq!(state.phase, GamePhase::Playing);
        run(&mut state, &mut spawner, &mut signals, 1);
        assert_eq!(state.phase, GamePhase::Victory);

        run(&mut state, &mut spawner, &mut signals, 20);
        assert_eq!(state.time_ticks, 63);
        assert_eq!(signals.time_limits, 1);
        assert!(state.events.contains(&GameEvent::TimeLimitReached));
    }

    #[test]
    fn test_player_death_signals_once() {
        let mut state = GameState::new(1, quiet_settings());
        let mut spawner = Spawner::new();
        let mut signals = CountingSignals::default();
        state.player.hp = 1;
        let pos = state.player.pos;
        state.spawn_enemy(EnemyKind::Basic, pos);

        run(&mut state, &mut spawner, &mut signals, 5);

        assert_eq!(state.phase, GamePhase::GameOver);
        assert_eq!(signals.deaths, 1);
        assert_eq!(state.time_ticks, 1);
        assert!(state.events.contains(&GameEvent::GameOver));
    }

    #[test]
    fn test_level_up_pauses_simulation() {
        let mut state = GameState::new(1, quiet_settings());
        let mut spawner = Spawner::new();
        let mut signals = CountingSignals::default();
        state.pending_level_ups = 1;

        run(&mut state, &mut spawner, &mut signals, 3);
        assert_eq!(state.phase, GamePhase::LevelUp);
        assert_eq!(state.time_ticks, 1);
        assert_eq!(signals.level_ups, 1);

        let pick = state.upgrade_options[0].ability;
        assert!(state.choose_upgrade(pick, &mut signals));
        run(&mut state, &mut spawner, &mut signals, 1);
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.time_ticks, 2);
    }

    #[test]
    fn test_burn_kill_awards_experience() {
        let mut state = GameState::new(1, quiet_settings());
        let mut spawner = Spawner::new();
        let mut signals = CountingSignals::default();
        let id = state.spawn_enemy(EnemyKind::Basic, Vec2::new(100.0, 100.0));
        state.enemies[0].status.burning = Some(Burn {
            expires_at: 10_000,
            damage_per_tick: 25,
            next_tick_at: 32,
        });

        run(&mut state, &mut spawner, &mut signals, 2);

        assert!(state.enemies.is_empty());
        let killed: Vec<EntityId> = state
            .events
            .iter()
            .filter_map(|e| match e {
                GameEvent::EnemyKilled { id, .. } => Some(*id),
                _ => None,
            })
            .collect();
        assert_eq!(killed, vec![id]);
        assert_eq!(state.pickups.len(), 1);
        assert_eq!(state.pickups[0].value, 10);
    }

    #[test]
    fn test_basic_attack_respects_cooldown() {
        let mut state = GameState::new(1, quiet_settings());
        let mut spawner = Spawner::new();
        let mut signals = CountingSignals::default();
        state.spawn_enemy(EnemyKind::Square, Vec2::new(1200.0, 360.0));

        run(&mut state, &mut spawner, &mut signals, 1);
        assert_eq!(state.player.last_shot_ms, Some(16));
        assert_eq!(state.projectiles.len(), 1);
        assert!(state.projectiles[0].vel.x > 0.0);

        // 500ms cooldown: next shot at 528ms
        run(&mut state, &mut spawner, &mut signals, 31);
        assert_eq!(state.projectiles.len(), 1);
        run(&mut state, &mut spawner, &mut signals, 1);
        assert_eq!(state.projectiles.len(), 2);
    }

    #[test]
    fn test_shooter_fires_at_player() {
        let mut state = GameState::new(1, quiet_settings());
        let mut spawner = Spawner::new();
        let mut signals = CountingSignals::default();
        let pos = state.player.pos + Vec2::new(0.0, 320.0);
        state.spawn_enemy(EnemyKind::Triangle, pos);

        run(&mut state, &mut spawner, &mut signals, 1);

        let hostile: Vec<&Projectile> = state
            .projectiles
            .iter()
            .filter(|p| p.faction == Faction::Enemy)
            .collect();
        assert_eq!(hostile.len(), 1);
        assert!(hostile[0].vel.y < 0.0);
    }

    #[test]
    fn test_determinism() {
        // Two states with same seed should produce identical results
        let mut a = GameState::new(99999, Settings::default());
        let mut b = GameState::new(99999, Settings::default());
        let (mut spawner_a, mut spawner_b) = (Spawner::new(), Spawner::new());
        let (mut source_a, mut source_b) = (Scripted { frame: 0 }, Scripted { frame: 0 });
        let mut signals = NoSignals;
        a.acquire_ability(AbilityId::FelineTeleport);
        b.acquire_ability(AbilityId::FelineTeleport);

        for _ in 0..3000 {
            for (state, spawner, source) in [
                (&mut a, &mut spawner_a, &mut source_a),
                (&mut b, &mut spawner_b, &mut source_b),
            ] {
                if state.phase == GamePhase::LevelUp {
                    let pick = state.upgrade_options[0].ability;
                    state.choose_upgrade(pick, &mut signals);
                }
                let input = TickInput::poll(source);
                tick(state, spawner, &input, &mut signals);
            }
            assert_eq!(a.drain_events(), b.drain_events());
        }

        assert_eq!(a.time_ticks, b.time_ticks);
        assert_eq!(a.player.pos, b.player.pos);
        assert_eq!(a.player.hp, b.player.hp);
        let ids = |s: &GameState| s.enemies.iter().map(|e| (e.id, e.hp)).collect::<Vec<_>>();
        assert_eq!(ids(&a), ids(&b));
        assert_eq!(a.projectiles, b.projectiles);
    }
}
