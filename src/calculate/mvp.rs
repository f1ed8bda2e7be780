//! MVP scoring.
//!
//! Every player is scored on their most-played hero: each catalogue
//! statistic is compared against the hero's population and earns
//! `weight * z` points. The highest total wins; ties go to the player who
//! appears first in the map's rows.

use std::collections::BTreeMap;

use tracing::{debug, info};

use super::distribution::DistributionNormalizer;
use super::totals::{final_hero_totals, roster, HeroTotals};
use super::AnalyticsError;
use crate::models::{ComparisonResult, Contribution, MvpReport, MvpScoreResult, Stat, StatSnapshotRow};

/// Statistics where a lower value is the better performance.
pub fn is_inverted(stat: Stat) -> bool {
    matches!(stat, Stat::Deaths | Stat::DamageTaken)
}

/// The hero a player spent the most time on. Ties keep the hero the player
/// appeared on first.
fn most_played<'a>(totals: &'a [HeroTotals], player: &str) -> Option<&'a HeroTotals> {
    let mut best: Option<&HeroTotals> = None;
    for candidate in totals.iter().filter(|t| t.player_name == player) {
        match best {
            Some(current) if candidate.time_played() <= current.time_played() => {}
            _ => best = Some(candidate),
        }
    }
    best
}

/// Score every player in one map's normalized rows.
pub async fn score_mvp(
    normalizer: &DistributionNormalizer<'_>,
    rows: &[StatSnapshotRow],
    weights: &BTreeMap<Stat, f64>,
) -> Result<MvpReport, AnalyticsError> {
    let totals = final_hero_totals(rows);
    let mut results = Vec::new();

    for (position, (player_name, player_team)) in roster(rows).into_iter().enumerate() {
        let mut result = MvpScoreResult {
            player_name,
            player_team,
            roster_position: position,
            total_score: 0.0,
            contributions: Vec::new(),
            unscored: Vec::new(),
        };

        let Some(hero_totals) = most_played(&totals, &result.player_name) else {
            results.push(result);
            continue;
        };

        for (&stat, &weight) in weights {
            let comparison = normalizer
                .compare(
                    hero_totals.hero,
                    stat,
                    hero_totals.value(stat),
                    hero_totals.time_played(),
                )
                .await?;

            match comparison {
                ComparisonResult::Available(c) => {
                    let z = if is_inverted(stat) { -c.z_score } else { c.z_score };
                    let points = weight * z;
                    result.total_score += points;
                    result.contributions.push(Contribution {
                        stat,
                        hero: c.hero,
                        per10_value: c.input_per10,
                        hero_average: c.hero_avg_per10,
                        z_score: c.z_score,
                        percentile: c.estimated_percentile,
                        points_awarded: points,
                    });
                }
                unavailable => result.unscored.push(unavailable),
            }
        }

        debug!(
            "{} on {}: {:.3} points from {} stats",
            result.player_name,
            hero_totals.hero,
            result.total_score,
            result.contributions.len()
        );
        results.push(result);
    }

    results.sort_by(|a, b| {
        b.total_score
            .total_cmp(&a.total_score)
            .then(a.roster_position.cmp(&b.roster_position))
    });

    let mvp = results.first().map(|r| r.player_name.clone());
    if let Some(name) = &mvp {
        info!("MVP: {} of {} players", name, results.len());
    }

    Ok(MvpReport { results, mvp })
}
