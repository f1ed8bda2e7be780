//! Derived analytics records.
//!
//! Everything here is a read-only view computed per request and serialized
//! as a plain record for callers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Fight, Hero, MapId, Stat};

/// Amount of a statistic produced during one round.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoundDelta {
    pub round_number: u32,
    pub value: f64,
}

/// One player's per-10-minutes rate measured against the population for
/// the same hero and statistic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatComparison {
    pub stat: Stat,
    pub hero: Hero,
    pub input_per10: f64,
    pub hero_avg_per10: f64,
    pub stdev: f64,
    pub z_score: f64,
    /// 0.0 to 100.0
    pub estimated_percentile: f64,
    /// 1 to 5000
    pub estimated_sr: u32,
    pub population_size: usize,
}

/// Why a comparison could not be produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UnavailableReason {
    /// No usable time played backs the raw value
    ZeroTimePlayed,
    /// The player has no recorded value for the statistic
    MissingValue,
    /// The statistic has no per-10 rate
    NotARateStat,
    /// Fewer qualifying samples than the configured minimum
    InsufficientPopulation { size: usize, required: usize },
    /// Every sample has the same rate
    ZeroDeviation,
}

impl std::fmt::Display for UnavailableReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnavailableReason::ZeroTimePlayed => write!(f, "no time played"),
            UnavailableReason::MissingValue => write!(f, "no value recorded"),
            UnavailableReason::NotARateStat => write!(f, "not a rate statistic"),
            UnavailableReason::InsufficientPopulation { size, required } => {
                write!(f, "population of {} below minimum {}", size, required)
            }
            UnavailableReason::ZeroDeviation => write!(f, "population has zero deviation"),
        }
    }
}

/// Outcome of comparing one statistic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ComparisonResult {
    Available(StatComparison),
    Unavailable {
        stat: Stat,
        hero: Hero,
        reason: UnavailableReason,
    },
}

impl ComparisonResult {
    pub fn stat(&self) -> Stat {
        match self {
            ComparisonResult::Available(c) => c.stat,
            ComparisonResult::Unavailable { stat, .. } => *stat,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, ComparisonResult::Available(_))
    }
}

/// Named weight configuration used for a composite rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightProfile {
    Tank,
    Damage,
    Support,
    /// Pure-healing kit
    HealerOnly,
    /// Support kit built around damage rather than healing
    DamageSupport,
}

/// One statistic's share of a composite rating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeComponent {
    pub stat: Stat,
    pub weight: f64,
    pub inverted: bool,
    /// z-score after inversion
    pub z_score: f64,
    pub weighted_z: f64,
}

/// Composite per-hero rating built from several weighted statistics.
///
/// Statistics without data are skipped rather than counted as zero, so
/// `weight_used` below 1.0 means the rating leans on the statistics that
/// did have data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeRating {
    pub hero: Hero,
    pub profile: WeightProfile,
    pub composite_z: f64,
    /// `None` when no statistic could be compared
    pub estimated_sr: Option<u32>,
    pub weight_used: f64,
    pub components: Vec<CompositeComponent>,
    pub skipped: Vec<ComparisonResult>,
}

/// One statistic's contribution to a player's MVP score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    pub stat: Stat,
    pub hero: Hero,
    pub per10_value: f64,
    pub hero_average: f64,
    pub z_score: f64,
    pub percentile: f64,
    pub points_awarded: f64,
}

/// MVP score for one player on one map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MvpScoreResult {
    pub player_name: String,
    pub player_team: String,
    /// Order of first appearance in the map's rows
    pub roster_position: usize,
    pub total_score: f64,
    pub contributions: Vec<Contribution>,
    pub unscored: Vec<ComparisonResult>,
}

/// MVP results for a whole map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MvpReport {
    /// Sorted by score, highest first; ties by roster position
    pub results: Vec<MvpScoreResult>,
    pub mvp: Option<String>,
}

/// Kills and deaths between two specific players.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuelRecord {
    pub opponent: String,
    pub wins: u32,
    pub losses: u32,
    pub winrate: Option<f64>,
}

/// Ultimate charge and usage figures.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UltimateEconomy {
    pub ultimates_charged: u32,
    pub ultimates_used: u32,
    /// Seconds
    pub avg_charge_time: Option<f64>,
    /// Seconds between charge and use
    pub avg_time_to_use: Option<f64>,
    pub kills_per_ultimate: Option<f64>,
}

/// Derived combat metrics for one player on one map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatMetrics {
    pub player_name: String,
    pub player_team: String,
    pub fights_total: usize,
    pub first_pick_rate: Option<f64>,
    pub first_death_rate: Option<f64>,
    pub fleta_deadlift_pct: Option<f64>,
    pub fight_reversal_rate: Option<f64>,
    /// Mean seconds between final blows
    pub drought_time: Option<f64>,
    pub ultimate_economy: UltimateEconomy,
    pub ajax_count: u32,
    pub duels: Vec<DuelRecord>,
    pub duel_winrate: Option<f64>,
}

/// Full analytical product for one map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchReport {
    pub map_id: MapId,
    pub computed_at: DateTime<Utc>,
    pub rows_received: usize,
    pub rows_after_dedup: usize,
    pub fights: Vec<Fight>,
    pub mvp: MvpReport,
    pub combat: Vec<CombatMetrics>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comparison_result_accessors() {
        let unavailable = ComparisonResult::Unavailable {
            stat: Stat::Deaths,
            hero: Hero::Ana,
            reason: UnavailableReason::ZeroDeviation,
        };
        assert_eq!(unavailable.stat(), Stat::Deaths);
        assert!(!unavailable.is_available());
    }

    #[test]
    fn test_unavailable_serialization_is_explicit() {
        let unavailable = ComparisonResult::Unavailable {
            stat: Stat::HealingDealt,
            hero: Hero::Mercy,
            reason: UnavailableReason::InsufficientPopulation {
                size: 3,
                required: 10,
            },
        };
        let json = serde_json::to_value(&unavailable).unwrap();
        assert_eq!(json["status"], "unavailable");
        assert_eq!(json["stat"], "healing_dealt");
        assert_eq!(json["reason"]["kind"], "insufficient_population");
        assert_eq!(json["reason"]["required"], 10);
    }

    #[test]
    fn test_unavailable_reason_display() {
        let reason = UnavailableReason::InsufficientPopulation {
            size: 2,
            required: 10,
        };
        assert_eq!(format!("{}", reason), "population of 2 below minimum 10");
        assert_eq!(UnavailableReason::MissingValue.to_string(), "no value recorded");
        assert_eq!(
            serde_json::to_value(UnavailableReason::MissingValue).unwrap()["kind"],
            "missing_value"
        );
    }
}
