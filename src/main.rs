//! Mage Cats entry point
//!
//! Headless runner: plays one seeded match with an automated input source,
//! then records the survival time in the rankings file.
//!
//! Usage: `mage-cats [seed]`. Settings and rankings are read from
//! `$MAGE_CATS_DATA` (default: the current directory).

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::path::PathBuf;

    use glam::Vec2;
    use mage_cats::highscores::DEFAULT_RANKING_LIMIT;
    use mage_cats::platform::{Drawable, GameSignals, InputSource, Renderer};
    use mage_cats::sim::abilities::catalog::description;
    use mage_cats::sim::{AbilityId, GameEvent, GamePhase, GameState, Spawner, TickInput, UpgradeOption, tick};
    use mage_cats::{FileRankingStore, RankingStore, Settings};

    const DEFAULT_SEED: u64 = 12345;
    const PLAYER_NAME: &str = "Whiskers";

    /// Circles the arena and teleports now and then
    struct AutoPilot {
        frame: u64,
    }

    impl InputSource for AutoPilot {
        fn movement_intent(&mut self) -> Vec2 {
            self.frame += 1;
            Vec2::from_angle(self.frame as f32 * 0.02)
        }

        fn activation_requests(&mut self) -> Vec<AbilityId> {
            if self.frame % 300 == 0 {
                vec![AbilityId::FelineTeleport]
            } else {
                Vec::new()
            }
        }
    }

    /// Counts draw calls instead of drawing
    #[derive(Default)]
    struct FrameStats {
        draws: u64,
    }

    impl Renderer for FrameStats {
        fn draw(&mut self, _drawable: &Drawable) {
            self.draws += 1;
        }
    }

    struct LogSignals;

    impl GameSignals for LogSignals {
        fn on_player_death(&mut self) {
            log::info!("The cat has fallen");
        }

        fn on_time_limit_reached(&mut self) {
            log::info!("Survived until the bell");
        }

        fn on_level_up(&mut self, options: &[UpgradeOption]) {
            for option in options {
                log::info!(
                    "Upgrade choice: {} (level {}): {}",
                    option.ability.name(),
                    option.next_level,
                    description(option.ability)
                );
            }
        }
    }

    pub fn run() {
        env_logger::init();

        let seed = std::env::args()
            .nth(1)
            .and_then(|arg| arg.parse().ok())
            .unwrap_or(DEFAULT_SEED);
        let data_dir = std::env::var_os("MAGE_CATS_DATA").map_or_else(|| PathBuf::from("."), PathBuf::from);

        let settings = Settings::load_from(&data_dir.join("settings.json"));
        let mut state = GameState::new(seed, settings);
        let mut spawner = Spawner::new();
        let mut pilot = AutoPilot { frame: 0 };
        let mut signals = LogSignals;
        let mut frames = FrameStats::default();
        let mut kills = 0u32;
        log::info!("Mage Cats (native) starting with seed {}", seed);

        state.acquire_ability(AbilityId::FelineTeleport);

        while !state.is_over() {
            if state.phase == GamePhase::LevelUp {
                let Some(pick) = state.upgrade_options.first().map(|o| o.ability) else {
                    break;
                };
                state.choose_upgrade(pick, &mut signals);
            }

            let input = TickInput::poll(&mut pilot);
            tick(&mut state, &mut spawner, &input, &mut signals);
            state.render(&mut frames);

            for event in state.drain_events() {
                if matches!(event, GameEvent::EnemyKilled { .. }) {
                    kills += 1;
                }
                log::trace!("{:?}", event);
            }
        }

        let survived = state.elapsed_secs();
        log::info!(
            "Match over: {:?} after {}s, level {}, {} kills, {} draw calls",
            state.phase,
            survived,
            state.player.level,
            kills,
            frames.draws
        );

        let mut store = FileRankingStore::open(data_dir.join("rankings.json"));
        if let Err(e) = store.record_result(PLAYER_NAME, survived) {
            log::warn!("Failed to save rankings: {}", e);
        }
        for (rank, (name, secs)) in store.top_rankings(DEFAULT_RANKING_LIMIT).iter().enumerate() {
            log::info!("#{} {} {}s", rank + 1, name, secs);
        }
        if let Some(best) = store.rankings().best_time() {
            log::info!("Best survival time: {}s", best);
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    native::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // No web runner; the library is driven by the host
}
