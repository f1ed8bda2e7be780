//! Final per-hero totals and roster order.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::{Hero, Stat, StatSnapshotRow};

/// A player's final cumulative counters on one hero for one map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeroTotals {
    pub player_name: String,
    pub player_team: String,
    pub hero: Hero,
    pub round_number: u32,
    pub match_time: f64,
    pub row: StatSnapshotRow,
}

impl HeroTotals {
    pub fn value(&self, stat: Stat) -> f64 {
        self.row.value(stat)
    }

    /// Seconds played on this hero.
    pub fn time_played(&self) -> f64 {
        self.row.hero_time_played
    }
}

/// Latest snapshot of every (player, hero) lineage in one map's rows.
///
/// Counters are cumulative per hero assignment, so the row with the highest
/// `(round_number, match_time)` carries the totals; on an exact tie the
/// earlier row is kept. Output is in order of first appearance.
pub fn final_hero_totals(rows: &[StatSnapshotRow]) -> Vec<HeroTotals> {
    let mut index: HashMap<(&str, Hero), usize> = HashMap::new();
    let mut totals: Vec<HeroTotals> = Vec::new();

    for row in rows {
        let key = (row.player_name.as_str(), row.player_hero);
        match index.get(&key) {
            Some(&i) => {
                let current = &totals[i];
                let is_later = row.round_number > current.round_number
                    || (row.round_number == current.round_number
                        && row.match_time > current.match_time);
                if is_later {
                    totals[i] = to_totals(row);
                }
            }
            None => {
                index.insert(key, totals.len());
                totals.push(to_totals(row));
            }
        }
    }

    totals
}

fn to_totals(row: &StatSnapshotRow) -> HeroTotals {
    HeroTotals {
        player_name: row.player_name.clone(),
        player_team: row.player_team.clone(),
        hero: row.player_hero,
        round_number: row.round_number,
        match_time: row.match_time,
        row: row.clone(),
    }
}

/// Players in order of first appearance, with the team they first
/// appeared on.
pub fn roster(rows: &[StatSnapshotRow]) -> Vec<(String, String)> {
    let mut players: Vec<(String, String)> = Vec::new();
    for row in rows {
        if !players.iter().any(|(name, _)| *name == row.player_name) {
            players.push((row.player_name.clone(), row.player_team.clone()));
        }
    }
    players
}

/// Rows belonging to the highest round number present.
pub fn final_round_rows(rows: &[StatSnapshotRow]) -> Vec<&StatSnapshotRow> {
    match rows.iter().map(|r| r.round_number).max() {
        Some(last) => rows.iter().filter(|r| r.round_number == last).collect(),
        None => Vec::new(),
    }
}
