//! Distribution normalization.
//!
//! A player's raw total is converted to a per-10-minutes rate and placed
//! against the population of rates for the same hero and statistic:
//! z-score, normal-approximation percentile and a bounded rating estimate.
//! Every rating this crate produces reduces to this computation.

use std::collections::BTreeMap;
use std::sync::Arc;

use statrs::distribution::{ContinuousCDF, Normal};
use tracing::debug;

use super::totals::final_hero_totals;
use super::AnalyticsError;
use crate::cache::{CacheKey, RequestCache};
use crate::config::{AnalyticsConfig, SamplingParams};
use crate::models::{ComparisonResult, Hero, Stat, StatComparison, StatSnapshotRow, UnavailableReason};
use crate::storage::TelemetryStore;

/// Seconds in the ten-minute normalization window.
pub const PER10_SECONDS: f64 = 600.0;

/// Rating at z = 0.
pub const SR_CENTER: f64 = 2500.0;
pub const SR_MIN: u32 = 1;
pub const SR_MAX: u32 = 5000;

/// Threshold below which standard deviation is treated as zero.
const STDEV_EPSILON: f64 = 1e-9;

/// Rate of `raw` per ten minutes of `time_played_seconds`.
///
/// `None` when there is no usable time played, the raw value is not finite,
/// or the rate itself overflows.
pub fn per10(raw: f64, time_played_seconds: f64) -> Option<f64> {
    if !raw.is_finite() || !time_played_seconds.is_finite() || time_played_seconds <= 0.0 {
        return None;
    }
    Some(raw / (time_played_seconds / PER10_SECONDS)).filter(|rate| rate.is_finite())
}

/// Mean and population standard deviation of a sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PopulationStats {
    pub mean: f64,
    pub stdev: f64,
    pub size: usize,
}

impl PopulationStats {
    /// `None` for an empty sample. Non-finite values are ignored.
    pub fn from_samples(samples: &[f64]) -> Option<Self> {
        let values: Vec<f64> = samples.iter().copied().filter(|v| v.is_finite()).collect();
        if values.is_empty() {
            return None;
        }

        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

        Some(Self {
            mean,
            stdev: variance.sqrt(),
            size: values.len(),
        })
    }
}

/// Standard normal cumulative distribution function.
pub fn normal_cdf(z: f64) -> f64 {
    if z == 0.0 {
        return 0.5;
    }
    Normal::new(0.0, 1.0)
        .map(|standard| standard.cdf(z))
        .unwrap_or(0.5)
        .clamp(0.0, 1.0)
}

/// Bounded rating for a z-score.
///
/// `2500 + z * 1250 / (1 + |z| / 3)`, floored and clamped to `[1, 5000]`.
/// The divisor compresses extreme z-scores toward the bounds instead of
/// letting them grow linearly. NaN maps to the center.
pub fn estimated_sr(z: f64) -> u32 {
    let offset = if z.is_nan() {
        0.0
    } else if z.is_infinite() {
        // limit of z * 1250 / (1 + |z| / 3)
        z.signum() * 3750.0
    } else {
        z * (1250.0 / (1.0 + z.abs() / 3.0))
    };

    let sr = (SR_CENTER + offset).floor();
    sr.clamp(SR_MIN as f64, SR_MAX as f64) as u32
}

/// Compare one raw value against an already fetched population.
pub fn compare_to_population(
    hero: Hero,
    stat: Stat,
    raw_value: f64,
    time_played_seconds: f64,
    population: &[f64],
    min_population: usize,
) -> ComparisonResult {
    let unavailable = |reason| ComparisonResult::Unavailable { stat, hero, reason };

    if !stat.is_rate() {
        return unavailable(UnavailableReason::NotARateStat);
    }

    let Some(input_per10) = per10(raw_value, time_played_seconds) else {
        return unavailable(UnavailableReason::ZeroTimePlayed);
    };

    let required = min_population.max(1);
    let stats = match PopulationStats::from_samples(population) {
        Some(stats) if stats.size >= required => stats,
        Some(stats) => {
            return unavailable(UnavailableReason::InsufficientPopulation {
                size: stats.size,
                required,
            })
        }
        None => {
            return unavailable(UnavailableReason::InsufficientPopulation { size: 0, required })
        }
    };

    if stats.stdev < STDEV_EPSILON {
        return unavailable(UnavailableReason::ZeroDeviation);
    }

    let z_score = (input_per10 - stats.mean) / stats.stdev;

    ComparisonResult::Available(StatComparison {
        stat,
        hero,
        input_per10,
        hero_avg_per10: stats.mean,
        stdev: stats.stdev,
        z_score,
        estimated_percentile: normal_cdf(z_score) * 100.0,
        estimated_sr: estimated_sr(z_score),
        population_size: stats.size,
    })
}

#[derive(Debug, Default)]
struct PlayerAccumulator {
    maps: u32,
    time_played: f64,
    totals: BTreeMap<Stat, f64>,
}

/// Builds per-10 populations for one hero from many maps' rows.
///
/// Each map contributes every player's final totals on the hero; players
/// are then filtered by maps played and time played. One builder backs the
/// samples of every statistic for its hero.
#[derive(Debug)]
pub struct PopulationBuilder {
    hero: Hero,
    players: BTreeMap<String, PlayerAccumulator>,
}

impl PopulationBuilder {
    pub fn new(hero: Hero) -> Self {
        Self {
            hero,
            players: BTreeMap::new(),
        }
    }

    /// Add one map's rows.
    pub fn add_map(&mut self, rows: &[StatSnapshotRow]) {
        for totals in final_hero_totals(rows) {
            if totals.hero != self.hero {
                continue;
            }
            let player = self.players.entry(totals.player_name.clone()).or_default();
            player.maps += 1;
            player.time_played += totals.time_played();
            for stat in Stat::ALL {
                *player.totals.entry(stat).or_default() += totals.value(stat);
            }
        }
    }

    /// Players seen on the hero, qualifying or not.
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Per-10 rates of qualifying players, in player-name order, at most
    /// `params.sample_limit` of them.
    pub fn sample(&self, stat: Stat, params: SamplingParams) -> Vec<f64> {
        if !stat.is_rate() {
            return Vec::new();
        }

        self.players
            .values()
            .filter(|p| p.maps >= params.min_maps)
            .filter(|p| p.time_played >= params.min_time_seconds as f64)
            .filter_map(|p| per10(p.totals.get(&stat).copied().unwrap_or(0.0), p.time_played))
            .take(params.sample_limit)
            .collect()
    }
}

/// Compares players against populations sampled from a telemetry store.
///
/// The store is read once per hero per request: the hero's accumulated
/// totals are memoized in the request cache and every statistic's sample is
/// derived from them.
pub struct DistributionNormalizer<'a> {
    store: &'a dyn TelemetryStore,
    cache: &'a RequestCache,
    params: SamplingParams,
    min_population: usize,
}

impl<'a> DistributionNormalizer<'a> {
    pub fn new(store: &'a dyn TelemetryStore, cache: &'a RequestCache, config: &AnalyticsConfig) -> Self {
        Self {
            store,
            cache,
            params: config.sampling(),
            min_population: config.min_population,
        }
    }

    async fn hero_population(&self, hero: Hero) -> Result<Arc<PopulationBuilder>, AnalyticsError> {
        self.cache
            .get_or_try_insert(CacheKey::new("hero_population", [hero.name()]), || async move {
                let builder = self.store.hero_population(hero).await?;
                debug!("Loaded {} {} players", builder.player_count(), hero);
                Ok::<_, AnalyticsError>(builder)
            })
            .await
    }

    /// The population of per-10 rates for `(hero, stat)`.
    pub async fn population(&self, hero: Hero, stat: Stat) -> Result<Vec<f64>, AnalyticsError> {
        let sample = self.hero_population(hero).await?.sample(stat, self.params);
        debug!("Sampled {} {} rates for {}", sample.len(), stat, hero);
        Ok(sample)
    }

    /// Compare one statistic.
    pub async fn compare(
        &self,
        hero: Hero,
        stat: Stat,
        raw_value: f64,
        time_played_seconds: f64,
    ) -> Result<ComparisonResult, AnalyticsError> {
        // Skip the population read when the input alone decides the outcome
        if !stat.is_rate() || per10(raw_value, time_played_seconds).is_none() {
            return Ok(compare_to_population(
                hero,
                stat,
                raw_value,
                time_played_seconds,
                &[],
                self.min_population,
            ));
        }

        let population = self.population(hero, stat).await?;
        let result = compare_to_population(
            hero,
            stat,
            raw_value,
            time_played_seconds,
            &population,
            self.min_population,
        );

        if let ComparisonResult::Unavailable { reason, .. } = &result {
            debug!("No {} comparison for {}: {}", stat, hero, reason);
        }
        Ok(result)
    }

    /// Compare several statistics backed by the same time played.
    ///
    /// Each statistic stands alone: an unavailable one does not affect the
    /// others.
    pub async fn compare_many(
        &self,
        hero: Hero,
        values: &[(Stat, f64)],
        time_played_seconds: f64,
    ) -> Result<Vec<ComparisonResult>, AnalyticsError> {
        let mut results = Vec::with_capacity(values.len());
        for (stat, raw) in values {
            results.push(self.compare(hero, *stat, *raw, time_played_seconds).await?);
        }
        Ok(results)
    }
}
