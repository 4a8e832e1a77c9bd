//! Game state and core simulation types
//!
//! Everything the tick loop mutates lives here. Collaborators (spawner,
//! input, renderer, signals) are passed in from outside.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::abilities::{AbilityContext, AbilityId, AbilityRegistry, UpgradeOption};
use super::effects;
use super::entity::{Enemy, EnemyKind, EntityId, ExperiencePickup, Player};
use super::projectile::{Faction, Projectile};
use crate::consts::*;
use crate::platform::{Drawable, GameSignals, Renderer};
use crate::settings::Settings;

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Active gameplay
    Playing,
    /// Waiting for the player to pick an upgrade
    LevelUp,
    /// Game is paused
    Paused,
    /// Player died
    GameOver,
    /// Survived until the time limit
    Victory,
}

/// Things that happened during a tick, drained by the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    EnemySpawned { id: EntityId, kind: EnemyKind },
    BossSpawned { id: EntityId },
    EnemyKilled {
        id: EntityId,
        kind: EnemyKind,
        boss: bool,
        pos: Vec2,
        xp: u32,
    },
    ProjectileFired { id: EntityId, faction: Faction },
    AbilityAcquired { ability: AbilityId, level: u32 },
    AbilityActivated { ability: AbilityId },
    PlayerHit { damage: i32, hp: i32 },
    ExperienceCollected { value: u32 },
    LevelUp { level: u32 },
    GameOver,
    TimeLimitReached,
}

/// Complete game state (deterministic for a given seed and input sequence)
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
    pub settings: Settings,
    /// Simulation tick counter
    pub time_ticks: u64,
    pub phase: GamePhase,
    pub player: Player,
    /// Sorted by id
    pub enemies: Vec<Enemy>,
    /// Sorted by id
    pub projectiles: Vec<Projectile>,
    /// Sorted by id
    pub pickups: Vec<ExperiencePickup>,
    pub abilities: AbilityRegistry,
    pub events: Vec<GameEvent>,
    /// Level-ups earned but not yet chosen
    pub pending_level_ups: u32,
    /// Choices on offer while in `LevelUp`
    pub upgrade_options: Vec<UpgradeOption>,
    /// Next entity ID
    next_id: EntityId,
}

impl GameState {
    /// Create a new game state with the given seed
    pub fn new(seed: u64, settings: Settings) -> Self {
        let center = Vec2::new(settings.arena_width, settings.arena_height) / 2.0;
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            player: Player::new(center, settings.player_max_hp),
            settings,
            time_ticks: 0,
            phase: GamePhase::Playing,
            enemies: Vec::new(),
            projectiles: Vec::new(),
            pickups: Vec::new(),
            abilities: AbilityRegistry::new(),
            events: Vec::new(),
            pending_level_ups: 0,
            upgrade_options: Vec::new(),
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Simulation clock in milliseconds
    pub fn now_ms(&self) -> u64 {
        self.time_ticks * TICK_MS
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.now_ms() / 1000
    }

    pub fn arena(&self) -> Vec2 {
        Vec2::new(self.settings.arena_width, self.settings.arena_height)
    }

    pub fn is_over(&self) -> bool {
        matches!(self.phase, GamePhase::GameOver | GamePhase::Victory)
    }

    pub fn spawn_enemy(&mut self, kind: EnemyKind, pos: Vec2) -> EntityId {
        let id = self.next_entity_id();
        self.enemies.push(Enemy::new(id, kind, pos));
        self.events.push(GameEvent::EnemySpawned { id, kind });
        id
    }

    pub fn enemy_index(&self, id: EntityId) -> Option<usize> {
        self.enemies.binary_search_by_key(&id, |e| e.id).ok()
    }

    /// Damage an enemy, running the kill path if this hit killed it.
    ///
    /// Returns true on the killing hit only.
    pub fn damage_enemy(&mut self, index: usize, amount: i32) -> bool {
        let Some(enemy) = self.enemies.get_mut(index) else {
            return false;
        };
        if !enemy.take_damage(amount) {
            return false;
        }
        self.record_kill(index);
        true
    }

    /// Kill event and experience drop for an enemy that just died.
    ///
    /// Only call once per enemy, right after its killing hit.
    pub fn record_kill(&mut self, index: usize) {
        let Some(enemy) = self.enemies.get(index) else {
            return;
        };
        let (id, kind, boss, pos, xp) = (enemy.id, enemy.kind, enemy.boss, enemy.pos, enemy.xp_value);
        if boss {
            log::info!("Boss {} defeated at {}ms", id, self.now_ms());
        }
        self.events.push(GameEvent::EnemyKilled {
            id,
            kind,
            boss,
            pos,
            xp,
        });
        let pickup_id = self.next_entity_id();
        self.pickups.push(ExperiencePickup {
            id: pickup_id,
            pos,
            value: xp,
        });
    }

    /// Remove dead enemies and spent projectiles
    pub fn sweep(&mut self) {
        self.enemies.retain(|e| e.alive);
        self.projectiles.retain(|p| p.alive);
    }

    /// Ensure entities are sorted by ID for deterministic iteration
    pub fn normalize_order(&mut self) {
        self.enemies.sort_by_key(|e| e.id);
        self.projectiles.sort_by_key(|p| p.id);
        self.pickups.sort_by_key(|p| p.id);
    }

    /// Acquire an ability outside the level-up flow (starting loadout)
    pub fn acquire_ability(&mut self, id: AbilityId) -> bool {
        if !self.abilities.acquire(id, &mut self.player) {
            return false;
        }
        self.events.push(GameEvent::AbilityAcquired { ability: id, level: 1 });
        true
    }

    /// Try to activate an owned ability now
    pub fn activate_ability(&mut self, id: AbilityId) -> bool {
        let ctx = AbilityContext {
            now: self.now_ms(),
            player: &self.player,
            enemies: &self.enemies,
            settings: &self.settings,
        };
        let Some(commands) = self.abilities.activate(id, &ctx, &mut self.rng) else {
            return false;
        };
        self.events.push(GameEvent::AbilityActivated { ability: id });
        effects::execute(self, commands);
        true
    }

    /// End an active buff early
    pub fn deactivate_ability(&mut self, id: AbilityId) {
        let commands = self.abilities.deactivate(id);
        effects::execute(self, commands);
    }

    /// Offer upgrade choices if a level-up is pending
    pub fn open_level_up(&mut self, signals: &mut dyn GameSignals) {
        if self.pending_level_ups == 0 || self.phase != GamePhase::Playing {
            return;
        }
        let options = self.abilities.upgrade_options(&mut self.rng);
        if options.is_empty() {
            log::debug!("Every ability maxed, skipping {} level-ups", self.pending_level_ups);
            self.pending_level_ups = 0;
            return;
        }
        log::info!("Level up! Level {}", self.player.level);
        self.phase = GamePhase::LevelUp;
        signals.on_level_up(&options);
        self.upgrade_options = options;
    }

    /// Resolve a level-up choice. Fails if `id` was not offered.
    pub fn choose_upgrade(&mut self, id: AbilityId, signals: &mut dyn GameSignals) -> bool {
        if self.phase != GamePhase::LevelUp || !self.upgrade_options.iter().any(|o| o.ability == id) {
            return false;
        }
        if !self.abilities.apply_choice(id, &mut self.player) {
            return false;
        }
        let level = self.abilities.get(id).map_or(1, |a| a.level);
        self.events.push(GameEvent::AbilityAcquired { ability: id, level });

        self.pending_level_ups = self.pending_level_ups.saturating_sub(1);
        self.upgrade_options.clear();
        self.phase = GamePhase::Playing;
        self.open_level_up(signals);
        true
    }

    /// Take the events accumulated since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Hand every live entity to the renderer
    pub fn render(&self, renderer: &mut dyn Renderer) {
        for pickup in &self.pickups {
            renderer.draw(&Drawable::Pickup {
                id: pickup.id,
                pos: pickup.pos,
                value: pickup.value,
            });
        }
        for enemy in self.enemies.iter().filter(|e| e.alive) {
            renderer.draw(&Drawable::Enemy {
                id: enemy.id,
                kind: enemy.kind,
                pos: enemy.pos,
                radius: enemy.radius,
                frozen: enemy.status.is_frozen(),
                burning: enemy.status.is_burning(),
                charmed: enemy.status.is_charmed(),
                stunned: enemy.status.is_stunned(),
            });
        }
        for projectile in self.projectiles.iter().filter(|p| p.alive) {
            renderer.draw(&Drawable::Projectile {
                id: projectile.id,
                faction: projectile.faction,
                pos: projectile.pos,
                radius: projectile.radius,
                color: projectile.color,
            });
        }
        renderer.draw(&Drawable::Player {
            pos: self.player.pos,
            radius: self.player.radius,
            hp: self.player.hp,
            max_hp: self.player.max_hp,
            shielded: self.player.shield.is_some(),
        });
    }
}
