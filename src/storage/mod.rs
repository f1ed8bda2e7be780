//! Telemetry store access.
//!
//! The engine reads telemetry through the [`TelemetryStore`] contract:
//! - Stat snapshot rows, kills, round boundaries and ultimate events per map
//! - Per-hero populations across every map, and per-10 samples drawn from them
//!
//! Two implementations are provided: a JSONL data lake on the local
//! filesystem and an in-memory store.

mod jsonl;
mod memory;

pub use jsonl::*;
pub use memory::*;

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

use crate::calculate::PopulationBuilder;
use crate::config::SamplingParams;
use crate::models::{
    Hero, KillEvent, MapId, RoundBoundary, Stat, StatSnapshotRow, UltimateEvent,
};

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Map not found: {0}")]
    MapNotFound(String),
}

/// Read-only telemetry source.
///
/// Every method may return duplicated rows; callers normalize before
/// aggregating.
#[async_trait]
pub trait TelemetryStore: Send + Sync {
    async fn stat_rows(&self, map_id: &MapId) -> Result<Vec<StatSnapshotRow>, StorageError>;

    async fn kills(&self, map_id: &MapId) -> Result<Vec<KillEvent>, StorageError>;

    async fn round_boundaries(&self, map_id: &MapId) -> Result<Vec<RoundBoundary>, StorageError>;

    async fn ultimates(&self, map_id: &MapId) -> Result<Vec<UltimateEvent>, StorageError>;

    /// Every player's accumulated totals on `hero` across all maps.
    async fn hero_population(&self, hero: Hero) -> Result<PopulationBuilder, StorageError>;

    /// Per-10 rates for `stat` on `hero`, one per qualifying player, at
    /// most `params.sample_limit` of them.
    async fn sample_stat_distribution(
        &self,
        hero: Hero,
        stat: Stat,
        params: SamplingParams,
    ) -> Result<Vec<f64>, StorageError> {
        Ok(self.hero_population(hero).await?.sample(stat, params))
    }
}

/// Telemetry file kinds stored per map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TelemetryFile {
    Stats,
    Kills,
    Rounds,
    Ultimates,
}

impl TelemetryFile {
    /// Get the filename for this file kind.
    pub fn filename(&self) -> &'static str {
        match self {
            TelemetryFile::Stats => "stats.jsonl",
            TelemetryFile::Kills => "kills.jsonl",
            TelemetryFile::Rounds => "rounds.jsonl",
            TelemetryFile::Ultimates => "ultimates.jsonl",
        }
    }
}

/// Configuration for storage paths.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl StorageConfig {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    pub fn maps_dir(&self) -> PathBuf {
        self.data_dir.join("maps")
    }

    pub fn map_dir(&self, map_id: &MapId) -> PathBuf {
        self.maps_dir().join(map_id.as_str())
    }

    pub fn map_file(&self, map_id: &MapId, file: TelemetryFile) -> PathBuf {
        self.map_dir(map_id).join(file.filename())
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new(PathBuf::from("./data"))
    }
}
