//! Per-round statistic deltas from cumulative snapshot counters.

use std::collections::BTreeMap;

use crate::models::{Hero, RoundDelta, Stat, StatSnapshotRow};

/// How much of `stat` the player produced in each round.
///
/// Rows are grouped by `(round, hero)` and each group is summed once, so a
/// mid-round hero swap is not counted twice; the per-hero sums then form
/// the round's cumulative total. Rounds without rows for the player produce
/// no entry, so round numbers in the output need not be contiguous.
pub fn round_deltas(rows: &[StatSnapshotRow], player: &str, stat: Stat) -> Vec<RoundDelta> {
    let mut per_hero: BTreeMap<(u32, Hero), f64> = BTreeMap::new();
    for row in rows.iter().filter(|r| r.player_name == player) {
        *per_hero
            .entry((row.round_number, row.player_hero))
            .or_default() += row.value(stat);
    }

    let mut cumulative: BTreeMap<u32, f64> = BTreeMap::new();
    for ((round, _), value) in per_hero {
        *cumulative.entry(round).or_default() += value;
    }

    let mut previous = 0.0;
    cumulative
        .into_iter()
        .map(|(round_number, total)| {
            let value = total - previous;
            previous = total;
            RoundDelta {
                round_number,
                value,
            }
        })
        .collect()
}
