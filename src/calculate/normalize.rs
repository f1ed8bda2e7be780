//! Telemetry normalization: exact-duplicate removal for snapshot rows and
//! kill events, and row validation.

use std::collections::HashSet;

use tracing::debug;

use super::AnalyticsError;
use crate::models::{KillEvent, Stat, StatSnapshotRow};

/// Collapse exact duplicate rows, keeping the first occurrence.
///
/// Two rows are duplicates only when every field, identifiers and counters
/// alike, is equal. Order is preserved. Must run before any aggregation or
/// duplicated counters are double-counted.
pub fn dedup_rows(rows: Vec<StatSnapshotRow>) -> Vec<StatSnapshotRow> {
    let before = rows.len();
    let mut seen = HashSet::with_capacity(rows.len());
    let deduped: Vec<StatSnapshotRow> = rows
        .into_iter()
        .filter(|row| seen.insert(row.fingerprint()))
        .collect();

    if deduped.len() < before {
        debug!("Dropped {} duplicate snapshot rows", before - deduped.len());
    }
    deduped
}

/// Collapse exact duplicate kill events, keeping the first occurrence.
///
/// Same rule as [`dedup_rows`]: every field must match, and order is kept.
pub fn dedup_kills(kills: Vec<KillEvent>) -> Vec<KillEvent> {
    let before = kills.len();
    let mut seen = HashSet::with_capacity(kills.len());
    let deduped: Vec<KillEvent> = kills
        .into_iter()
        .filter(|kill| seen.insert(kill.fingerprint()))
        .collect();

    if deduped.len() < before {
        debug!("Dropped {} duplicate kill events", before - deduped.len());
    }
    deduped
}

/// Reject rows whose contents cannot be real telemetry.
pub fn validate_rows(rows: &[StatSnapshotRow]) -> Result<(), AnalyticsError> {
    for (index, row) in rows.iter().enumerate() {
        if row.player_name.trim().is_empty() {
            return Err(AnalyticsError::MalformedRow {
                index,
                message: "empty player name".to_string(),
            });
        }

        if !row.match_time.is_finite() || row.match_time < 0.0 {
            return Err(AnalyticsError::MalformedRow {
                index,
                message: format!("invalid match time {}", row.match_time),
            });
        }

        for stat in Stat::ALL {
            let value = row.value(stat);
            if !value.is_finite() || value < 0.0 {
                return Err(AnalyticsError::MalformedRow {
                    index,
                    message: format!("invalid {} value {}", stat, value),
                });
            }
        }
    }
    Ok(())
}
