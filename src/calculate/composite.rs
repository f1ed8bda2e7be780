//! Composite per-hero ratings from weighted, role-aware statistics.

use std::collections::BTreeMap;

use tracing::debug;

use super::distribution::{estimated_sr, DistributionNormalizer};
use super::AnalyticsError;
use crate::models::{
    ComparisonResult, CompositeComponent, CompositeRating, Hero, Role, Stat, UnavailableReason,
    WeightProfile,
};

/// One weighted statistic of a configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightEntry {
    pub stat: Stat,
    pub weight: f64,
    /// Lower raw values are better
    pub invert: bool,
}

const fn entry(stat: Stat, weight: f64) -> WeightEntry {
    WeightEntry {
        stat,
        weight,
        invert: false,
    }
}

const fn inverted(stat: Stat, weight: f64) -> WeightEntry {
    WeightEntry {
        stat,
        weight,
        invert: true,
    }
}

const TANK: &[WeightEntry] = &[
    entry(Stat::Eliminations, 0.15),
    entry(Stat::FinalBlows, 0.10),
    entry(Stat::HeroDamageDealt, 0.25),
    entry(Stat::DamageBlocked, 0.20),
    inverted(Stat::Deaths, 0.20),
    entry(Stat::UltimatesEarned, 0.10),
];

const DAMAGE: &[WeightEntry] = &[
    entry(Stat::Eliminations, 0.20),
    entry(Stat::FinalBlows, 0.20),
    entry(Stat::HeroDamageDealt, 0.30),
    inverted(Stat::Deaths, 0.20),
    entry(Stat::UltimatesEarned, 0.10),
];

const SUPPORT: &[WeightEntry] = &[
    entry(Stat::HealingDealt, 0.35),
    entry(Stat::Eliminations, 0.10),
    entry(Stat::HeroDamageDealt, 0.15),
    entry(Stat::Assists, 0.10),
    inverted(Stat::Deaths, 0.20),
    entry(Stat::UltimatesEarned, 0.10),
];

const HEALER_ONLY: &[WeightEntry] = &[
    entry(Stat::HealingDealt, 0.50),
    entry(Stat::Assists, 0.15),
    inverted(Stat::Deaths, 0.25),
    entry(Stat::UltimatesEarned, 0.10),
];

const DAMAGE_SUPPORT: &[WeightEntry] = &[
    entry(Stat::HeroDamageDealt, 0.30),
    entry(Stat::Eliminations, 0.20),
    entry(Stat::FinalBlows, 0.10),
    entry(Stat::Assists, 0.15),
    inverted(Stat::Deaths, 0.15),
    inverted(Stat::DamageTaken, 0.10),
];

/// A weight configuration: which statistics count, and how much.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightConfig {
    pub profile: WeightProfile,
    pub entries: &'static [WeightEntry],
}

impl WeightConfig {
    pub fn for_profile(profile: WeightProfile) -> Self {
        let entries = match profile {
            WeightProfile::Tank => TANK,
            WeightProfile::Damage => DAMAGE,
            WeightProfile::Support => SUPPORT,
            WeightProfile::HealerOnly => HEALER_ONLY,
            WeightProfile::DamageSupport => DAMAGE_SUPPORT,
        };
        Self { profile, entries }
    }

    pub fn total_weight(&self) -> f64 {
        self.entries.iter().map(|e| e.weight).sum()
    }
}

/// Pick the weight profile for a hero: hero exceptions first, then the
/// role default.
pub fn select_profile(hero: Hero) -> WeightProfile {
    match hero {
        Hero::Mercy => WeightProfile::HealerOnly,
        Hero::Zenyatta | Hero::Illari => WeightProfile::DamageSupport,
        _ => match hero.role() {
            Role::Tank => WeightProfile::Tank,
            Role::Damage => WeightProfile::Damage,
            Role::Support => WeightProfile::Support,
        },
    }
}

/// Composite rating for one player on one hero.
///
/// Each configured statistic is compared against its population; inverted
/// statistics have their z-score negated; the weighted sum is mapped to the
/// same bounded scale as a single comparison. Statistics without a
/// comparison (or missing from `raw_values`) are skipped, not zeroed.
pub async fn composite_rating(
    normalizer: &DistributionNormalizer<'_>,
    hero: Hero,
    raw_values: &BTreeMap<Stat, f64>,
    time_played_seconds: f64,
) -> Result<CompositeRating, AnalyticsError> {
    let config = WeightConfig::for_profile(select_profile(hero));

    let mut components = Vec::new();
    let mut skipped = Vec::new();

    for entry in config.entries {
        let Some(raw) = raw_values.get(&entry.stat).copied() else {
            skipped.push(ComparisonResult::Unavailable {
                stat: entry.stat,
                hero,
                reason: UnavailableReason::MissingValue,
            });
            continue;
        };

        match normalizer
            .compare(hero, entry.stat, raw, time_played_seconds)
            .await?
        {
            ComparisonResult::Available(comparison) => {
                let z_score = if entry.invert {
                    -comparison.z_score
                } else {
                    comparison.z_score
                };
                components.push(CompositeComponent {
                    stat: entry.stat,
                    weight: entry.weight,
                    inverted: entry.invert,
                    z_score,
                    weighted_z: entry.weight * z_score,
                });
            }
            unavailable => skipped.push(unavailable),
        }
    }

    let composite_z: f64 = components.iter().map(|c| c.weighted_z).sum();
    let weight_used: f64 = components.iter().map(|c| c.weight).sum();
    let estimated = if components.is_empty() {
        None
    } else {
        Some(estimated_sr(composite_z))
    };

    debug!(
        "Composite for {} ({:?}): z={:.3} from {} stats, {} skipped",
        hero,
        config.profile,
        composite_z,
        components.len(),
        skipped.len()
    );

    Ok(CompositeRating {
        hero,
        profile: config.profile,
        composite_z,
        estimated_sr: estimated,
        weight_used,
        components,
        skipped,
    })
}
