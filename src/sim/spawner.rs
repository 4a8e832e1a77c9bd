//! Enemy and boss spawning
//!
//! One regular enemy per spawn interval at a random arena edge. The kind mix
//! shifts toward tougher enemies as the match progresses. At most one boss is
//! alive at a time and its timer restarts when it dies.

use glam::Vec2;
use rand::Rng;
use rand::seq::IndexedRandom;

use super::entity::{EnemyKind, EntityId};
use super::state::{GameEvent, GameState};

/// Regular kinds in weight-table order
const REGULAR_KINDS: [EnemyKind; 4] = [
    EnemyKind::Basic,
    EnemyKind::Square,
    EnemyKind::Triangle,
    EnemyKind::Fast,
];

/// Spawn weights per match-progress tier, highest threshold first
const WEIGHT_TIERS: [(f32, [f32; 4]); 6] = [
    (0.9, [0.1, 0.5, 0.3, 0.1]),
    (0.8, [0.2, 0.4, 0.3, 0.1]),
    (0.6, [0.3, 0.35, 0.25, 0.1]),
    (0.4, [0.4, 0.3, 0.2, 0.1]),
    (0.2, [0.5, 0.25, 0.15, 0.1]),
    (0.0, [0.6, 0.2, 0.1, 0.1]),
];

/// Kind weights for a match progress fraction (0..1)
pub fn kind_weights(progress: f32) -> [f32; 4] {
    WEIGHT_TIERS
        .iter()
        .find(|(threshold, _)| progress >= *threshold)
        .map_or(WEIGHT_TIERS[5].1, |(_, weights)| *weights)
}

/// Pick a regular enemy kind for the given match progress
pub fn choose_kind(rng: &mut impl Rng, progress: f32) -> EnemyKind {
    let weights = kind_weights(progress);
    let table: Vec<(EnemyKind, f32)> = REGULAR_KINDS.into_iter().zip(weights).collect();
    table
        .choose_weighted(rng, |(_, weight)| *weight)
        .map_or(EnemyKind::Basic, |(kind, _)| *kind)
}

/// Random point on the arena boundary
pub fn edge_position(rng: &mut impl Rng, arena: Vec2) -> Vec2 {
    match rng.random_range(0..4) {
        0 => Vec2::new(rng.random_range(0.0..=arena.x), 0.0),
        1 => Vec2::new(arena.x, rng.random_range(0.0..=arena.y)),
        2 => Vec2::new(rng.random_range(0.0..=arena.x), arena.y),
        _ => Vec2::new(0.0, rng.random_range(0.0..=arena.y)),
    }
}

/// Spawn timers, passed into the tick loop by the host
#[derive(Debug, Clone, Default)]
pub struct Spawner {
    last_spawn_ms: u64,
    boss_timer_start_ms: u64,
    boss: Option<EntityId>,
}

impl Spawner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, state: &mut GameState) {
        let now = state.now_ms();

        if let Some(id) = self.boss
            && state
                .enemy_index(id)
                .is_none_or(|index| !state.enemies[index].alive)
        {
            log::debug!("Boss {} gone, boss timer restarts at {}ms", id, now);
            self.boss = None;
            self.boss_timer_start_ms = now;
        }

        if now >= self.last_spawn_ms.saturating_add(state.settings.spawn_interval_ms) {
            self.last_spawn_ms = now;
            let progress = now as f32 / state.settings.match_duration_ms().max(1) as f32;
            let arena = state.arena();
            let kind = choose_kind(&mut state.rng, progress);
            let pos = edge_position(&mut state.rng, arena);
            state.spawn_enemy(kind, pos);
        }

        let boss_due = self
            .boss_timer_start_ms
            .saturating_add(state.settings.boss_spawn_interval_ms);
        if self.boss.is_none() && now >= boss_due {
            self.spawn_boss(state);
        }
    }

    fn spawn_boss(&mut self, state: &mut GameState) {
        let now = state.now_ms();
        let arena = state.arena();
        let center = arena / 2.0;
        let clearance = EnemyKind::BigSquare.stats().radius + state.player.radius;

        let pos = if state.player.pos.distance(center) > clearance {
            center
        } else {
            edge_position(&mut state.rng, arena)
        };

        let id = state.spawn_enemy(EnemyKind::BigSquare, pos);
        state.events.push(GameEvent::BossSpawned { id });
        log::info!("Boss {} spawned at ({:.0}, {:.0}) at {}ms", id, pos.x, pos.y, now);
        self.boss = Some(id);
        self.boss_timer_start_ms = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use crate::settings::Settings;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn run(state: &mut GameState, spawner: &mut Spawner, ticks: u64) {
        for _ in 0..ticks {
            state.time_ticks += 1;
            spawner.update(state);
        }
    }

    fn bosses(state: &GameState) -> usize {
        state
            .events
            .iter()
            .filter(|e| matches!(e, GameEvent::BossSpawned { .. }))
            .count()
    }

    #[test]
    fn test_weights_shift_with_progress() {
        assert_eq!(kind_weights(0.0), [0.6, 0.2, 0.1, 0.1]);
        assert_eq!(kind_weights(0.25), [0.5, 0.25, 0.15, 0.1]);
        assert_eq!(kind_weights(0.85), [0.2, 0.4, 0.3, 0.1]);
        assert_eq!(kind_weights(1.0), [0.1, 0.5, 0.3, 0.1]);
        for (_, weights) in WEIGHT_TIERS {
            assert!((weights.iter().sum::<f32>() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_choose_kind_never_boss() {
        let mut rng = Pcg32::seed_from_u64(5);
        for i in 0..500 {
            let kind = choose_kind(&mut rng, i as f32 / 500.0);
            assert_ne!(kind, EnemyKind::BigSquare);
        }
    }

    #[test]
    fn test_edge_positions_on_boundary() {
        let mut rng = Pcg32::seed_from_u64(9);
        let arena = Vec2::new(ARENA_WIDTH, ARENA_HEIGHT);
        for _ in 0..200 {
            let pos = edge_position(&mut rng, arena);
            let on_edge = pos.x == 0.0 || pos.y == 0.0 || pos.x == arena.x || pos.y == arena.y;
            assert!(on_edge, "{:?}", pos);
        }
    }

    #[test]
    fn test_one_enemy_per_interval() {
        let mut state = GameState::new(3, Settings::default());
        let mut spawner = Spawner::new();
        // 1008ms, 2016ms, 3024ms
        run(&mut state, &mut spawner, 190);
        assert_eq!(state.enemies.len(), 3);
    }

    #[test]
    fn test_single_boss_and_timer_restart() {
        let settings = Settings {
            spawn_interval_ms: 1_000_000,
            boss_spawn_interval_ms: 1000,
            ..Default::default()
        };
        let mut state = GameState::new(3, settings);
        let mut spawner = Spawner::new();

        run(&mut state, &mut spawner, 63);
        assert_eq!(bosses(&state), 1);
        let boss = spawner.boss.unwrap();
        assert_eq!(state.enemies[0].id, boss);

        // Still alive: no second boss
        run(&mut state, &mut spawner, 200);
        assert_eq!(bosses(&state), 1);

        let index = state.enemy_index(boss).unwrap();
        let hp = state.enemies[index].hp;
        state.damage_enemy(index, hp);
        state.sweep();

        run(&mut state, &mut spawner, 62);
        assert_eq!(bosses(&state), 1, "interval restarts on death");
        run(&mut state, &mut spawner, 2);
        assert_eq!(bosses(&state), 2);
    }

    #[test]
    fn test_boss_avoids_player() {
        let settings = Settings {
            spawn_interval_ms: 1_000_000,
            boss_spawn_interval_ms: 16,
            ..Default::default()
        };
        let mut state = GameState::new(3, settings);
        let mut spawner = Spawner::new();
        run(&mut state, &mut spawner, 1);

        let boss = &state.enemies[0];
        assert!(boss.boss);
        assert!(boss.pos.distance(state.player.pos) > boss.radius + state.player.radius);
    }
}
