//! Match analytics engine.
//!
//! Computes derived views from one map's telemetry:
//! - Snapshot and kill deduplication, per-round deltas
//! - Fight segmentation of the kill stream
//! - Population-normalized statistic comparisons
//! - Composite per-hero ratings and MVP scores
//! - Derived combat metrics

pub mod combat;
pub mod composite;
pub mod distribution;
pub mod fights;
pub mod mvp;
pub mod normalize;
pub mod round_delta;
pub mod totals;

pub use combat::{combat_metrics, roster_combat_metrics, CombatInputs};
pub use composite::{composite_rating, select_profile, WeightConfig, WeightEntry};
pub use distribution::{
    compare_to_population, estimated_sr, normal_cdf, per10, DistributionNormalizer,
    PopulationBuilder, PopulationStats,
};
pub use fights::segment_fights;
pub use mvp::{is_inverted, score_mvp};
pub use normalize::{dedup_kills, dedup_rows, validate_rows};
pub use round_delta::round_deltas;
pub use totals::{final_hero_totals, final_round_rows, roster, HeroTotals};

use thiserror::Error;

use crate::models::UnknownHero;
use crate::storage::StorageError;

/// Errors raised by the analytics engine.
///
/// Insufficient or degenerate data is not an error: it is reported as an
/// explicit unavailable result alongside the data that could be computed.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error(transparent)]
    UnknownHero(#[from] UnknownHero),

    #[error("Malformed row {index}: {message}")]
    MalformedRow { index: usize, message: String },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Player {player} not found on map {map_id}")]
    PlayerNotFound { map_id: String, player: String },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}
