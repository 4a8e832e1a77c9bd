//! Match settings
//!
//! Persisted as a JSON file next to the rankings. Every field has a default,
//! so partially written or older files still load. Loaded values are clamped
//! into playable ranges so a hand-edited file cannot stall the simulation.

use std::fmt::Display;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::persistence::{self, Result};

/// Longest match accepted from a settings file
const MAX_MATCH_SECS: u64 = 86_400;
/// Longest timer interval accepted from a settings file
const MAX_INTERVAL_MS: u64 = 3_600_000;
const MAX_ARENA_SIZE: f32 = 10_000.0;
const MIN_ARENA_SIZE: f32 = 100.0;

/// Tunable match settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Match ===
    /// Match length; reaching it is a victory
    pub match_duration_secs: u64,

    // === Arena ===
    pub arena_width: f32,
    pub arena_height: f32,
    /// Distance past the arena edge before a projectile is despawned
    pub out_of_bounds_margin: f32,

    // === Player ===
    pub player_max_hp: i32,
    /// Window after a hit during which the player takes no further damage
    pub invincibility_ms: u64,

    // === Spawning ===
    pub spawn_interval_ms: u64,
    pub boss_spawn_interval_ms: u64,

    // === Combat ===
    /// Chase radius of chaining projectiles, measured from the first contact
    pub chain_radius: f32,
    /// Sub-interval between burn damage ticks
    pub burn_tick_interval_ms: u64,
    /// Enemies die when they touch the player
    pub contact_kills_enemy: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            match_duration_secs: 300,

            arena_width: ARENA_WIDTH,
            arena_height: ARENA_HEIGHT,
            out_of_bounds_margin: OUT_OF_BOUNDS_MARGIN,

            player_max_hp: PLAYER_MAX_HP,
            invincibility_ms: 500,

            spawn_interval_ms: 1000,
            boss_spawn_interval_ms: 120_000,

            chain_radius: 250.0,
            burn_tick_interval_ms: 1000,
            contact_kills_enemy: true,
        }
    }
}

impl Settings {
    /// Match length in simulation milliseconds
    pub fn match_duration_ms(&self) -> u64 {
        self.match_duration_secs.saturating_mul(1000)
    }

    /// Clamp every field into its playable range, warning on each change
    pub fn sanitized(self) -> Self {
        let defaults = Self::default();
        Self {
            match_duration_secs: clamped("match_duration_secs", self.match_duration_secs, 1, MAX_MATCH_SECS),
            arena_width: finite_clamped(
                "arena_width",
                self.arena_width,
                MIN_ARENA_SIZE,
                MAX_ARENA_SIZE,
                defaults.arena_width,
            ),
            arena_height: finite_clamped(
                "arena_height",
                self.arena_height,
                MIN_ARENA_SIZE,
                MAX_ARENA_SIZE,
                defaults.arena_height,
            ),
            out_of_bounds_margin: finite_clamped(
                "out_of_bounds_margin",
                self.out_of_bounds_margin,
                0.0,
                MAX_ARENA_SIZE,
                defaults.out_of_bounds_margin,
            ),
            player_max_hp: clamped("player_max_hp", self.player_max_hp, 1, 1_000_000),
            invincibility_ms: clamped("invincibility_ms", self.invincibility_ms, 0, MAX_INTERVAL_MS),
            spawn_interval_ms: clamped("spawn_interval_ms", self.spawn_interval_ms, TICK_MS, MAX_INTERVAL_MS),
            boss_spawn_interval_ms: clamped(
                "boss_spawn_interval_ms",
                self.boss_spawn_interval_ms,
                TICK_MS,
                MAX_INTERVAL_MS,
            ),
            chain_radius: finite_clamped(
                "chain_radius",
                self.chain_radius,
                0.0,
                MAX_ARENA_SIZE,
                defaults.chain_radius,
            ),
            burn_tick_interval_ms: clamped(
                "burn_tick_interval_ms",
                self.burn_tick_interval_ms,
                TICK_MS,
                MAX_INTERVAL_MS,
            ),
            contact_kills_enemy: self.contact_kills_enemy,
        }
    }

    /// Load settings from a JSON file, falling back to defaults
    pub fn load_from(path: &Path) -> Self {
        match persistence::read_json::<Settings>(path) {
            Ok(Some(settings)) => {
                log::info!("Loaded settings from {}", path.display());
                settings.sanitized()
            }
            Ok(None) => {
                log::info!("Using default settings");
                Self::default()
            }
            Err(e) => {
                log::warn!("Failed to load settings from {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Save settings to a JSON file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        persistence::write_json(path, self)?;
        log::info!("Settings saved");
        Ok(())
    }
}

fn clamped<T: PartialOrd + Copy + Display>(name: &str, value: T, min: T, max: T) -> T {
    let result = if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    };
    if result != value {
        log::warn!("Setting {} = {} out of range, using {}", name, value, result);
    }
    result
}

fn finite_clamped(name: &str, value: f32, min: f32, max: f32, fallback: f32) -> f32 {
    if !value.is_finite() {
        log::warn!("Setting {} = {} is not a number, using {}", name, value, fallback);
        return fallback;
    }
    clamped(name, value, min, max)
}
