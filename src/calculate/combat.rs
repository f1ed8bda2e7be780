//! Derived combat metrics.
//!
//! Everything here is computed from a map's fights, kills, round
//! boundaries, ultimate events and final-round snapshot rows.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::totals::{final_hero_totals, final_round_rows, roster, HeroTotals};
use crate::cache::{CacheKey, RequestCache};
use crate::models::{
    CombatMetrics, DuelRecord, Fight, Hero, KillEvent, MapId, RoundBoundary, Stat,
    StatSnapshotRow, UltimateEconomy, UltimateEvent, UltimateEventKind,
};

/// One map's materialized inputs.
///
/// Views shared by every player (roster, final-round totals) are memoized
/// in the request cache under the map id.
#[derive(Debug, Clone, Copy)]
pub struct CombatInputs<'a> {
    pub map_id: &'a MapId,
    pub cache: &'a RequestCache,
    pub rows: &'a [StatSnapshotRow],
    pub kills: &'a [KillEvent],
    pub fights: &'a [Fight],
    pub rounds: &'a [RoundBoundary],
    pub ultimates: &'a [UltimateEvent],
    pub ajax_window_seconds: f64,
}

impl<'a> CombatInputs<'a> {
    fn round(&self, round_number: u32) -> Option<&RoundBoundary> {
        self.rounds.iter().find(|r| r.round_number == round_number)
    }

    /// Players in roster order with their teams.
    pub fn roster(&self) -> Arc<Vec<(String, String)>> {
        self.cache
            .get_or_insert_with(CacheKey::new("roster", [self.map_id]), || roster(self.rows))
    }

    /// Final totals of every (player, hero) within the highest round.
    pub fn final_round_totals(&self) -> Arc<Vec<HeroTotals>> {
        self.cache
            .get_or_insert_with(CacheKey::new("final_round_totals", [self.map_id]), || {
                let last_round: Vec<StatSnapshotRow> =
                    final_round_rows(self.rows).into_iter().cloned().collect();
                final_hero_totals(&last_round)
            })
    }

    /// The team a player belongs to: roster first, then the event streams.
    fn team_of(&self, player: &str) -> Option<String> {
        if let Some((_, team)) = self.roster().iter().find(|(name, _)| name == player) {
            return Some(team.clone());
        }
        self.kills
            .iter()
            .find_map(|k| {
                if k.attacker.name == player {
                    Some(k.attacker.team.clone())
                } else if k.victim.name == player {
                    Some(k.victim.team.clone())
                } else {
                    None
                }
            })
            .or_else(|| {
                self.ultimates
                    .iter()
                    .find(|u| u.player_name == player)
                    .map(|u| u.player_team.clone())
            })
    }
}

fn ratio(numerator: usize, denominator: usize) -> Option<f64> {
    if denominator == 0 {
        None
    } else {
        Some(numerator as f64 / denominator as f64)
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Fraction of fights opened by the player's kill, and by the player's death.
fn first_pick_and_death(fights: &[Fight], player: &str) -> (Option<f64>, Option<f64>) {
    let picks = fights
        .iter()
        .filter(|f| f.first_kill().is_some_and(|k| k.attacker.name == player))
        .count();
    let deaths = fights
        .iter()
        .filter(|f| f.first_kill().is_some_and(|k| k.victim.name == player))
        .count();
    (ratio(picks, fights.len()), ratio(deaths, fights.len()))
}

/// Player's share of the rest of the team's final blows in the last round,
/// as a percentage.
fn fleta_deadlift(inputs: &CombatInputs<'_>, player: &str, team: &str) -> Option<f64> {
    let totals = inputs.final_round_totals();

    let team_blows: f64 = totals
        .iter()
        .filter(|t| t.player_team == team)
        .map(|t| t.value(Stat::FinalBlows))
        .sum();
    let player_blows: f64 = totals
        .iter()
        .filter(|t| t.player_name == player)
        .map(|t| t.value(Stat::FinalBlows))
        .sum();

    let rest = team_blows - player_blows;
    if rest <= 0.0 {
        return None;
    }
    Some(player_blows / rest * 100.0)
}

/// Of the fights where the team died first, the fraction it still won.
fn fight_reversal(fights: &[Fight], team: &str) -> Option<f64> {
    let behind: Vec<&Fight> = fights
        .iter()
        .filter(|f| f.first_kill().is_some_and(|k| k.victim.team == team))
        .collect();
    let reversed = behind
        .iter()
        .filter(|f| f.kills_by_team(team) > f.deaths_of_team(team))
        .count();
    ratio(reversed, behind.len())
}

/// Mean gap between the player's final blows within each round.
fn drought_time(inputs: &CombatInputs<'_>, player: &str) -> Option<f64> {
    let mut by_round: BTreeMap<u32, Vec<f64>> = BTreeMap::new();
    for kill in inputs.kills.iter().filter(|k| k.attacker.name == player) {
        by_round.entry(kill.round_number).or_default().push(kill.match_time);
    }

    let mut gaps = Vec::new();
    for (round_number, mut times) in by_round {
        times.sort_by(|a, b| a.total_cmp(b));
        let mut previous = inputs.round(round_number).map(|r| r.start_time);
        for t in times {
            if let Some(p) = previous {
                gaps.push((t - p).max(0.0));
            }
            previous = Some(t);
        }
    }
    mean(&gaps)
}

/// Charge, hold and conversion figures from a player's ultimate events.
fn ultimate_economy(inputs: &CombatInputs<'_>, player: &str) -> UltimateEconomy {
    let mut events: Vec<&UltimateEvent> = inputs
        .ultimates
        .iter()
        .filter(|u| u.player_name == player)
        .collect();
    events.sort_by(|a, b| a.match_time.total_cmp(&b.match_time));

    let mut economy = UltimateEconomy::default();
    let mut charge_times = Vec::new();
    let mut hold_times = Vec::new();
    let mut windows: Vec<(f64, f64)> = Vec::new();

    let mut last_end: Option<f64> = None;
    let mut charged_at: Option<f64> = None;
    let mut started: Option<(f64, u32)> = None;

    for event in events {
        let t = event.match_time;
        match event.kind {
            UltimateEventKind::Charged => {
                economy.ultimates_charged += 1;
                let baseline = last_end
                    .or_else(|| inputs.round(event.round_number).map(|r| r.start_time))
                    .unwrap_or(0.0);
                if t >= baseline {
                    charge_times.push(t - baseline);
                }
                charged_at = Some(t);
            }
            UltimateEventKind::Start => {
                economy.ultimates_used += 1;
                if let Some(c) = charged_at.take() {
                    hold_times.push(t - c);
                }
                started = Some((t, event.round_number));
            }
            UltimateEventKind::End => {
                if let Some((s, _)) = started.take() {
                    windows.push((s, t));
                }
                last_end = Some(t);
            }
        }
    }

    // An ultimate still running at the end of the record lasts until its round ends
    if let Some((s, round_number)) = started {
        let end = inputs.round(round_number).map(|r| r.end_time).unwrap_or(s);
        windows.push((s, end.max(s)));
    }

    let ult_kills = inputs
        .kills
        .iter()
        .filter(|k| k.attacker.name == player)
        .filter(|k| windows.iter().any(|(s, e)| k.match_time >= *s && k.match_time <= *e))
        .count();

    economy.avg_charge_time = mean(&charge_times);
    economy.avg_time_to_use = mean(&hold_times);
    economy.kills_per_ultimate = ratio(ult_kills, economy.ultimates_used as usize);
    economy
}

/// Deaths as Lúcio shortly after starting an ultimate.
fn ajax_count(inputs: &CombatInputs<'_>, player: &str) -> u32 {
    let starts: Vec<f64> = inputs
        .ultimates
        .iter()
        .filter(|u| {
            u.player_name == player
                && u.player_hero == Hero::Lucio
                && u.kind == UltimateEventKind::Start
        })
        .map(|u| u.match_time)
        .collect();

    inputs
        .kills
        .iter()
        .filter(|k| k.victim.name == player && k.victim.hero == Hero::Lucio)
        .filter(|k| {
            starts
                .iter()
                .any(|s| k.match_time >= *s && k.match_time - s <= inputs.ajax_window_seconds)
        })
        .count() as u32
}

/// Head-to-head records against every opponent, plus the overall rate.
fn duels(kills: &[KillEvent], player: &str) -> (Vec<DuelRecord>, Option<f64>) {
    let mut records: BTreeMap<&str, (u32, u32)> = BTreeMap::new();
    for kill in kills {
        if kill.attacker.name == kill.victim.name {
            continue;
        }
        if kill.attacker.name == player {
            records.entry(kill.victim.name.as_str()).or_default().0 += 1;
        } else if kill.victim.name == player {
            records.entry(kill.attacker.name.as_str()).or_default().1 += 1;
        }
    }

    let (total_wins, total_losses) = records
        .values()
        .fold((0, 0), |(w, l), (rw, rl)| (w + rw, l + rl));

    let duels = records
        .into_iter()
        .map(|(opponent, (wins, losses))| DuelRecord {
            opponent: opponent.to_string(),
            wins,
            losses,
            winrate: ratio(wins as usize, (wins + losses) as usize),
        })
        .collect();

    (
        duels,
        ratio(total_wins as usize, (total_wins + total_losses) as usize),
    )
}

/// Combat metrics for one player. `None` when the player appears in none
/// of the map's data.
pub fn combat_metrics(inputs: &CombatInputs<'_>, player: &str) -> Option<CombatMetrics> {
    let team = inputs.team_of(player)?;

    let (first_pick_rate, first_death_rate) = first_pick_and_death(inputs.fights, player);
    let (duels, duel_winrate) = duels(inputs.kills, player);

    Some(CombatMetrics {
        player_name: player.to_string(),
        fights_total: inputs.fights.len(),
        first_pick_rate,
        first_death_rate,
        fleta_deadlift_pct: fleta_deadlift(inputs, player, &team),
        fight_reversal_rate: fight_reversal(inputs.fights, &team),
        drought_time: drought_time(inputs, player),
        ultimate_economy: ultimate_economy(inputs, player),
        ajax_count: ajax_count(inputs, player),
        duels,
        duel_winrate,
        player_team: team,
    })
}

/// Combat metrics for every rostered player, in roster order.
pub fn roster_combat_metrics(inputs: &CombatInputs<'_>) -> Vec<CombatMetrics> {
    inputs
        .roster()
        .iter()
        .filter_map(|(name, _)| combat_metrics(inputs, name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Combatant;

    fn kill(t: f64, round: u32, attacker: (&str, &str), victim: (&str, &str)) -> KillEvent {
        KillEvent::new(
            t,
            round,
            Combatant::new(attacker.0, Hero::Tracer, attacker.1),
            Combatant::new(victim.0, Hero::Ana, victim.1),
        )
    }

    fn ult(t: f64, player: &str, hero: Hero, kind: UltimateEventKind) -> UltimateEvent {
        UltimateEvent {
            match_time: t,
            round_number: 1,
            player_name: player.to_string(),
            player_hero: hero,
            player_team: "T1".to_string(),
            kind,
        }
    }

    /// Map id and request cache backing one test's inputs.
    struct Fixture {
        map_id: MapId,
        cache: RequestCache,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                map_id: MapId::from("m"),
                cache: RequestCache::new(),
            }
        }

        fn inputs<'a>(
            &'a self,
            rows: &'a [StatSnapshotRow],
            kills: &'a [KillEvent],
            fights: &'a [Fight],
            rounds: &'a [RoundBoundary],
            ultimates: &'a [UltimateEvent],
        ) -> CombatInputs<'a> {
            CombatInputs {
                map_id: &self.map_id,
                cache: &self.cache,
                rows,
                kills,
                fights,
                rounds,
                ultimates,
                ajax_window_seconds: 2.0,
            }
        }
    }

    fn fight(kills: &[KillEvent]) -> Fight {
        let mut fight = Fight::open(kills[0].clone());
        for k in &kills[1..] {
            fight.push(k.clone());
        }
        fight
    }

    #[test]
    fn test_first_pick_and_first_death() {
        let fx = Fixture::new();
        let kills = vec![
            kill(10.0, 1, ("A", "T1"), ("X", "T2")),
            kill(40.0, 1, ("X", "T2"), ("A", "T1")),
            kill(80.0, 1, ("B", "T1"), ("Y", "T2")),
            kill(120.0, 1, ("A", "T1"), ("Y", "T2")),
        ];
        let fights: Vec<Fight> = kills.iter().map(|k| Fight::open(k.clone())).collect();

        let metrics = combat_metrics(&fx.inputs(&[], &kills, &fights, &[], &[]), "A").unwrap();
        assert_eq!(metrics.fights_total, 4);
        assert_eq!(metrics.first_pick_rate, Some(0.5));
        assert_eq!(metrics.first_death_rate, Some(0.25));
    }

    #[test]
    fn test_rates_without_fights_are_none() {
        let fx = Fixture::new();
        let rows = vec![StatSnapshotRow::new("m".into(), 1, 0.0, "A", "T1", Hero::Ana)];
        let metrics = combat_metrics(&fx.inputs(&rows, &[], &[], &[], &[]), "A").unwrap();

        assert_eq!(metrics.first_pick_rate, None);
        assert_eq!(metrics.fight_reversal_rate, None);
        assert_eq!(metrics.drought_time, None);
        assert_eq!(metrics.duel_winrate, None);
        assert_eq!(metrics.player_team, "T1");
    }

    #[test]
    fn test_unknown_player() {
        let fx = Fixture::new();
        assert!(combat_metrics(&fx.inputs(&[], &[], &[], &[], &[]), "Nobody").is_none());
    }

    #[test]
    fn test_fleta_deadlift_uses_final_round() {
        let fx = Fixture::new();
        let row = |round: u32, player: &str, team: &str, fb: f64| {
            StatSnapshotRow::new("m".into(), round, round as f64 * 100.0, player, team, Hero::Genji)
                .with(Stat::FinalBlows, fb)
        };
        let rows = vec![
            row(1, "A", "T1", 2.0),
            row(1, "B", "T1", 5.0),
            row(2, "A", "T1", 6.0),
            row(2, "B", "T1", 4.0),
            row(2, "C", "T1", 8.0),
            row(2, "X", "T2", 20.0),
        ];

        let metrics = combat_metrics(&fx.inputs(&rows, &[], &[], &[], &[]), "A").unwrap();
        // 6 / (18 - 6)
        assert_eq!(metrics.fleta_deadlift_pct, Some(50.0));

        let alone = vec![row(1, "A", "T1", 3.0)];
        let other = Fixture::new();
        let metrics = combat_metrics(&other.inputs(&alone, &[], &[], &[], &[]), "A").unwrap();
        assert_eq!(metrics.fleta_deadlift_pct, None);
    }

    #[test]
    fn test_fight_reversal() {
        let fx = Fixture::new();
        // T1 dies first and wins 2-1
        let won = fight(&[
            kill(10.0, 1, ("X", "T2"), ("A", "T1")),
            kill(11.0, 1, ("B", "T1"), ("X", "T2")),
            kill(12.0, 1, ("B", "T1"), ("Y", "T2")),
        ]);
        // T1 dies first and loses
        let lost = fight(&[
            kill(50.0, 1, ("X", "T2"), ("B", "T1")),
            kill(51.0, 1, ("Y", "T2"), ("A", "T1")),
        ]);
        // T1 gets the first pick; does not qualify
        let ahead = fight(&[kill(90.0, 1, ("A", "T1"), ("X", "T2"))]);
        let fights = vec![won, lost, ahead];
        let kills: Vec<KillEvent> = fights.iter().flat_map(|f| f.kills.clone()).collect();

        let metrics = combat_metrics(&fx.inputs(&[], &kills, &fights, &[], &[]), "A").unwrap();
        assert_eq!(metrics.fight_reversal_rate, Some(0.5));
    }

    #[test]
    fn test_drought_time_from_round_start() {
        let fx = Fixture::new();
        let kills = vec![
            kill(30.0, 1, ("A", "T1"), ("X", "T2")),
            kill(50.0, 1, ("A", "T1"), ("Y", "T2")),
            kill(260.0, 2, ("A", "T1"), ("X", "T2")),
            kill(265.0, 2, ("X", "T2"), ("A", "T1")),
        ];
        let rounds = vec![
            RoundBoundary {
                round_number: 1,
                start_time: 0.0,
                end_time: 200.0,
            },
            RoundBoundary {
                round_number: 2,
                start_time: 220.0,
                end_time: 400.0,
            },
        ];

        let metrics = combat_metrics(&fx.inputs(&[], &kills, &[], &rounds, &[]), "A").unwrap();
        // gaps 30, 20, 40
        assert_eq!(metrics.drought_time, Some(30.0));

        let without_rounds = combat_metrics(&fx.inputs(&[], &kills, &[], &[], &[]), "A").unwrap();
        // only the gap within round 1
        assert_eq!(without_rounds.drought_time, Some(20.0));
    }

    #[test]
    fn test_ultimate_economy() {
        let fx = Fixture::new();
        let ultimates = vec![
            ult(60.0, "A", Hero::Tracer, UltimateEventKind::Charged),
            ult(70.0, "A", Hero::Tracer, UltimateEventKind::Start),
            ult(72.0, "A", Hero::Tracer, UltimateEventKind::End),
            ult(162.0, "A", Hero::Tracer, UltimateEventKind::Charged),
            ult(164.0, "A", Hero::Tracer, UltimateEventKind::Start),
            ult(165.0, "A", Hero::Tracer, UltimateEventKind::End),
        ];
        let kills = vec![
            kill(71.0, 1, ("A", "T1"), ("X", "T2")),
            kill(71.5, 1, ("A", "T1"), ("Y", "T2")),
            kill(100.0, 1, ("A", "T1"), ("Z", "T2")),
            kill(164.5, 1, ("A", "T1"), ("X", "T2")),
        ];

        let metrics = combat_metrics(&fx.inputs(&[], &kills, &[], &[], &ultimates), "A").unwrap();
        let economy = metrics.ultimate_economy;
        assert_eq!(economy.ultimates_charged, 2);
        assert_eq!(economy.ultimates_used, 2);
        // 60 from map start, then 90 from the first ultimate's end
        assert_eq!(economy.avg_charge_time, Some(75.0));
        // 10 and 2
        assert_eq!(economy.avg_time_to_use, Some(6.0));
        assert_eq!(economy.kills_per_ultimate, Some(1.5));
    }

    #[test]
    fn test_ajax_count() {
        let fx = Fixture::new();
        let lucio = |t: f64| {
            KillEvent::new(
                t,
                1,
                Combatant::new("X", Hero::Reaper, "T2"),
                Combatant::new("L", Hero::Lucio, "T1"),
            )
        };
        let ultimates = vec![
            ult(10.0, "L", Hero::Lucio, UltimateEventKind::Start),
            ult(100.0, "L", Hero::Lucio, UltimateEventKind::Start),
        ];
        let kills = vec![lucio(11.5), lucio(105.0), lucio(300.0)];

        let metrics = combat_metrics(&fx.inputs(&[], &kills, &[], &[], &ultimates), "L").unwrap();
        assert_eq!(metrics.ajax_count, 1);
    }

    #[test]
    fn test_duels() {
        let fx = Fixture::new();
        let kills = vec![
            kill(1.0, 1, ("A", "T1"), ("X", "T2")),
            kill(2.0, 1, ("A", "T1"), ("X", "T2")),
            kill(3.0, 1, ("X", "T2"), ("A", "T1")),
            kill(4.0, 1, ("Y", "T2"), ("A", "T1")),
            kill(5.0, 1, ("B", "T1"), ("Y", "T2")),
        ];

        let metrics = combat_metrics(&fx.inputs(&[], &kills, &[], &[], &[]), "A").unwrap();
        assert_eq!(
            metrics.duels,
            vec![
                DuelRecord {
                    opponent: "X".to_string(),
                    wins: 2,
                    losses: 1,
                    winrate: Some(2.0 / 3.0),
                },
                DuelRecord {
                    opponent: "Y".to_string(),
                    wins: 0,
                    losses: 1,
                    winrate: Some(0.0),
                },
            ]
        );
        assert_eq!(metrics.duel_winrate, Some(0.5));
    }

    #[test]
    fn test_roster_metrics_follow_roster_order() {
        let fx = Fixture::new();
        let rows = vec![
            StatSnapshotRow::new("m".into(), 1, 10.0, "B", "T2", Hero::Ana),
            StatSnapshotRow::new("m".into(), 1, 10.0, "A", "T1", Hero::Mei),
        ];
        let names: Vec<String> = roster_combat_metrics(&fx.inputs(&rows, &[], &[], &[], &[]))
            .into_iter()
            .map(|m| m.player_name)
            .collect();
        assert_eq!(names, vec!["B", "A"]);
    }

    #[test]
    fn test_shared_views_computed_once_per_request() {
        let fx = Fixture::new();
        let rows = vec![
            StatSnapshotRow::new("m".into(), 1, 10.0, "B", "T2", Hero::Ana),
            StatSnapshotRow::new("m".into(), 1, 10.0, "A", "T1", Hero::Mei),
        ];
        let metrics = roster_combat_metrics(&fx.inputs(&rows, &[], &[], &[], &[]));
        assert_eq!(metrics.len(), 2);

        // roster once for the listing, final-round totals once for both players
        let stats = fx.cache.stats();
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.hits, 3);
        assert_eq!(stats.entries, 2);
    }

    #[test]
    fn test_fight_without_kills_is_ignored() {
        let fx = Fixture::new();
        let kills = vec![kill(10.0, 1, ("A", "T1"), ("X", "T2"))];
        let empty: Fight =
            serde_json::from_str(r#"{"start":5.0,"end":5.0,"kills":[]}"#).unwrap();
        let fights = vec![Fight::open(kills[0].clone()), empty];

        let metrics = combat_metrics(&fx.inputs(&[], &kills, &fights, &[], &[]), "A").unwrap();
        assert_eq!(metrics.fights_total, 2);
        assert_eq!(metrics.first_pick_rate, Some(0.5));
        assert_eq!(metrics.fight_reversal_rate, None);
    }
}
