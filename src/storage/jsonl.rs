//! JSONL (JSON Lines) telemetry data lake.
//!
//! Each map has its own directory holding one JSONL file per telemetry
//! stream. Each line is a valid JSON object representing one record.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::marker::PhantomData;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info, warn};

use super::{StorageConfig, StorageError, TelemetryFile, TelemetryStore};
use crate::calculate::PopulationBuilder;
use crate::models::{Hero, KillEvent, MapId, RoundBoundary, StatSnapshotRow, UltimateEvent};

/// JSONL file writer.
pub struct JsonlWriter<T> {
    path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T: Serialize> JsonlWriter<T> {
    /// Create a new JSONL writer for the given path.
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _marker: PhantomData,
        }
    }

    /// Create a writer for one telemetry stream of a map.
    pub fn for_map(config: &StorageConfig, map_id: &MapId, file: TelemetryFile) -> Self {
        Self::new(config.map_file(map_id, file))
    }

    /// Ensure the parent directory exists.
    fn ensure_dir(&self) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    /// Write records, replacing the entire file.
    pub fn write_all(&self, records: &[T]) -> Result<usize, StorageError> {
        self.ensure_dir()?;

        let file = File::create(&self.path)?;
        let mut writer = BufWriter::new(file);

        for record in records {
            let json = serde_json::to_string(record)?;
            writeln!(writer, "{}", json)?;
        }

        writer.flush()?;
        info!("Wrote {} records to {:?}", records.len(), self.path);

        Ok(records.len())
    }
}

/// JSONL file reader.
pub struct JsonlReader<T> {
    path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T: DeserializeOwned> JsonlReader<T> {
    /// Create a new JSONL reader for the given path.
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _marker: PhantomData,
        }
    }

    /// Create a reader for one telemetry stream of a map.
    pub fn for_map(config: &StorageConfig, map_id: &MapId, file: TelemetryFile) -> Self {
        Self::new(config.map_file(map_id, file))
    }

    /// Read all records from the file.
    ///
    /// A missing file reads as empty. Lines that fail to parse (unknown
    /// hero, missing counter) are rejected with a warning.
    pub fn read_all(&self) -> Result<Vec<T>, StorageError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)?;
        let reader = BufReader::new(file);
        let mut records = Vec::new();

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;

            if line.trim().is_empty() {
                continue;
            }

            match serde_json::from_str(&line) {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!(
                        "Rejected line {} in {:?}: {}",
                        idx + 1,
                        self.path,
                        e
                    );
                }
            }
        }

        debug!("Read {} records from {:?}", records.len(), self.path);
        Ok(records)
    }
}

/// Find all map ids in the data lake, sorted.
pub fn list_maps(config: &StorageConfig) -> Result<Vec<MapId>, StorageError> {
    let pattern = config.maps_dir().join("*").join(TelemetryFile::Stats.filename());
    let pattern = pattern
        .to_str()
        .ok_or_else(|| StorageError::InvalidPath(format!("{:?}", pattern)))?
        .to_string();

    let paths =
        glob::glob(&pattern).map_err(|e| StorageError::InvalidPath(e.to_string()))?;

    let mut maps = Vec::new();
    for entry in paths {
        match entry {
            Ok(path) => {
                let name = path
                    .parent()
                    .and_then(|dir| dir.file_name())
                    .and_then(|name| name.to_str());
                if let Some(name) = name {
                    maps.push(MapId::from(name));
                }
            }
            Err(e) => warn!("Skipping unreadable map directory: {}", e),
        }
    }

    maps.sort();
    Ok(maps)
}

/// Telemetry store backed by the JSONL data lake.
#[derive(Debug, Clone)]
pub struct JsonlStore {
    config: StorageConfig,
}

impl JsonlStore {
    pub fn new(config: StorageConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    fn read_map<T: DeserializeOwned>(
        &self,
        map_id: &MapId,
        file: TelemetryFile,
    ) -> Result<Vec<T>, StorageError> {
        if !self.config.map_dir(map_id).exists() {
            return Err(StorageError::MapNotFound(map_id.to_string()));
        }
        JsonlReader::for_map(&self.config, map_id, file).read_all()
    }

    /// Write a complete map record, replacing any existing files.
    pub fn write_map(
        &self,
        map_id: &MapId,
        rows: &[StatSnapshotRow],
        kills: &[KillEvent],
        rounds: &[RoundBoundary],
        ultimates: &[UltimateEvent],
    ) -> Result<(), StorageError> {
        JsonlWriter::for_map(&self.config, map_id, TelemetryFile::Stats).write_all(rows)?;
        JsonlWriter::for_map(&self.config, map_id, TelemetryFile::Kills).write_all(kills)?;
        JsonlWriter::for_map(&self.config, map_id, TelemetryFile::Rounds).write_all(rounds)?;
        JsonlWriter::for_map(&self.config, map_id, TelemetryFile::Ultimates)
            .write_all(ultimates)?;
        Ok(())
    }
}

#[async_trait]
impl TelemetryStore for JsonlStore {
    async fn stat_rows(&self, map_id: &MapId) -> Result<Vec<StatSnapshotRow>, StorageError> {
        self.read_map(map_id, TelemetryFile::Stats)
    }

    async fn kills(&self, map_id: &MapId) -> Result<Vec<KillEvent>, StorageError> {
        self.read_map(map_id, TelemetryFile::Kills)
    }

    async fn round_boundaries(&self, map_id: &MapId) -> Result<Vec<RoundBoundary>, StorageError> {
        self.read_map(map_id, TelemetryFile::Rounds)
    }

    async fn ultimates(&self, map_id: &MapId) -> Result<Vec<UltimateEvent>, StorageError> {
        self.read_map(map_id, TelemetryFile::Ultimates)
    }

    async fn hero_population(&self, hero: Hero) -> Result<PopulationBuilder, StorageError> {
        let maps = list_maps(&self.config)?;
        let mut builder = PopulationBuilder::new(hero);
        for map_id in &maps {
            let rows: Vec<StatSnapshotRow> =
                JsonlReader::for_map(&self.config, map_id, TelemetryFile::Stats).read_all()?;
            builder.add_map(&rows);
        }

        debug!(
            "Read {} maps from {:?} for {} population",
            maps.len(),
            self.config.maps_dir(),
            hero
        );
        Ok(builder)
    }
}
