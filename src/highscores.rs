//! Survival-time rankings
//!
//! An append-only table of `(name, survival seconds)` results, queried in
//! descending order. Equal times keep the order they were recorded in.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::persistence::{self, Result};

/// Default number of rankings shown
pub const DEFAULT_RANKING_LIMIT: usize = 10;

/// A single recorded result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingEntry {
    /// Player name
    pub name: String,
    /// Seconds survived
    pub survival_secs: u64,
}

/// Rankings table, kept sorted descending by survival time
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rankings {
    pub entries: Vec<RankingEntry>,
}

impl Rankings {
    /// Create an empty table
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Record a result, returning its 1-indexed rank
    pub fn record_result(&mut self, name: &str, survival_secs: u64) -> usize {
        let entry = RankingEntry {
            name: name.to_string(),
            survival_secs,
        };

        // Strictly greater so ties land after earlier entries
        match self
            .entries
            .iter()
            .position(|e| survival_secs > e.survival_secs)
        {
            Some(i) => {
                self.entries.insert(i, entry);
                i + 1
            }
            None => {
                self.entries.push(entry);
                self.entries.len()
            }
        }
    }

    /// Best `limit` results as `(name, seconds)`
    pub fn top_rankings(&self, limit: usize) -> Vec<(String, u64)> {
        self.entries
            .iter()
            .take(limit)
            .map(|e| (e.name.clone(), e.survival_secs))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Longest survival time recorded (if any)
    pub fn best_time(&self) -> Option<u64> {
        self.entries.first().map(|e| e.survival_secs)
    }
}

/// Storage for match results
pub trait RankingStore {
    /// Append a result
    fn record_result(&mut self, name: &str, survival_secs: u64) -> Result<()>;

    /// Best results ordered by seconds descending, ties by insertion order
    fn top_rankings(&self, limit: usize) -> Vec<(String, u64)>;
}

/// In-memory store (tests and throwaway runs)
#[derive(Debug, Default)]
pub struct MemoryRankingStore {
    rankings: Rankings,
}

impl MemoryRankingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RankingStore for MemoryRankingStore {
    fn record_result(&mut self, name: &str, survival_secs: u64) -> Result<()> {
        self.rankings.record_result(name, survival_secs);
        Ok(())
    }

    fn top_rankings(&self, limit: usize) -> Vec<(String, u64)> {
        self.rankings.top_rankings(limit)
    }
}

/// JSON file store. The whole table is rewritten on every record.
#[derive(Debug)]
pub struct FileRankingStore {
    path: PathBuf,
    rankings: Rankings,
}

impl FileRankingStore {
    /// Open a store at `path`. Missing or corrupt files start fresh.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let rankings = match persistence::read_json::<Rankings>(&path) {
            Ok(Some(rankings)) => {
                log::info!("Loaded {} rankings", rankings.entries.len());
                rankings
            }
            Ok(None) => {
                log::info!("No rankings found, starting fresh");
                Rankings::new()
            }
            Err(e) => {
                log::warn!("Failed to load rankings from {}: {}", path.display(), e);
                Rankings::new()
            }
        };
        Self { path, rankings }
    }

    pub fn rankings(&self) -> &Rankings {
        &self.rankings
    }
}

impl RankingStore for FileRankingStore {
    /// The table only changes once the file write succeeds
    fn record_result(&mut self, name: &str, survival_secs: u64) -> Result<()> {
        let mut updated = self.rankings.clone();
        let rank = updated.record_result(name, survival_secs);
        persistence::write_json(&self.path, &updated)?;
        self.rankings = updated;
        log::info!(
            "Recorded {} ({}s) at rank {} ({} entries)",
            name,
            survival_secs,
            rank,
            self.rankings.entries.len()
        );
        Ok(())
    }

    fn top_rankings(&self, limit: usize) -> Vec<(String, u64)> {
        self.rankings.top_rankings(limit)
    }
}
