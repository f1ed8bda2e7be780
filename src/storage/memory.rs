//! In-memory telemetry store.

use std::collections::BTreeMap;

use async_trait::async_trait;

use super::{StorageError, TelemetryStore};
use crate::calculate::PopulationBuilder;
use crate::models::{Hero, KillEvent, MapId, RoundBoundary, StatSnapshotRow, UltimateEvent};

/// All telemetry streams of one map.
#[derive(Debug, Clone, Default)]
pub struct MapRecord {
    pub rows: Vec<StatSnapshotRow>,
    pub kills: Vec<KillEvent>,
    pub rounds: Vec<RoundBoundary>,
    pub ultimates: Vec<UltimateEvent>,
}

/// Telemetry store holding every map in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    maps: BTreeMap<MapId, MapRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_map(&mut self, map_id: MapId, record: MapRecord) {
        self.maps.insert(map_id, record);
    }

    pub fn with_map(mut self, map_id: impl Into<MapId>, record: MapRecord) -> Self {
        self.insert_map(map_id.into(), record);
        self
    }

    fn map(&self, map_id: &MapId) -> Result<&MapRecord, StorageError> {
        self.maps
            .get(map_id)
            .ok_or_else(|| StorageError::MapNotFound(map_id.to_string()))
    }
}

#[async_trait]
impl TelemetryStore for MemoryStore {
    async fn stat_rows(&self, map_id: &MapId) -> Result<Vec<StatSnapshotRow>, StorageError> {
        Ok(self.map(map_id)?.rows.clone())
    }

    async fn kills(&self, map_id: &MapId) -> Result<Vec<KillEvent>, StorageError> {
        Ok(self.map(map_id)?.kills.clone())
    }

    async fn round_boundaries(&self, map_id: &MapId) -> Result<Vec<RoundBoundary>, StorageError> {
        Ok(self.map(map_id)?.rounds.clone())
    }

    async fn ultimates(&self, map_id: &MapId) -> Result<Vec<UltimateEvent>, StorageError> {
        Ok(self.map(map_id)?.ultimates.clone())
    }

    async fn hero_population(&self, hero: Hero) -> Result<PopulationBuilder, StorageError> {
        let mut builder = PopulationBuilder::new(hero);
        for record in self.maps.values() {
            builder.add_map(&record.rows);
        }
        Ok(builder)
    }
}
