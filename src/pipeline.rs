//! Request orchestration.
//!
//! A [`MatchAnalyzer`] serves one analysis request at a time per call: it
//! fetches the map's telemetry concurrently, drops duplicated rows and
//! kills, and runs the pure calculation stages. Each call builds its own
//! [`RequestCache`].

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use crate::cache::RequestCache;
use crate::calculate::{
    combat_metrics, composite_rating, dedup_kills, dedup_rows, final_hero_totals, round_deltas,
    roster_combat_metrics, score_mvp, segment_fights, validate_rows, AnalyticsError, CombatInputs,
    DistributionNormalizer,
};
use crate::config::AnalyticsConfig;
use crate::models::{
    CombatMetrics, CompositeRating, Fight, Hero, KillEvent, MapId, MatchReport, MvpReport,
    RoundBoundary, RoundDelta, Stat, StatSnapshotRow, UltimateEvent,
};
use crate::storage::TelemetryStore;

/// One map's telemetry after row normalization.
#[derive(Debug, Clone)]
pub struct MapTelemetry {
    pub map_id: MapId,
    pub rows_received: usize,
    pub rows: Vec<StatSnapshotRow>,
    pub kills: Vec<KillEvent>,
    pub rounds: Vec<RoundBoundary>,
    pub ultimates: Vec<UltimateEvent>,
}

impl MapTelemetry {
    fn has_player(&self, player: &str) -> bool {
        self.rows.iter().any(|r| r.player_name == player)
    }
}

/// Entry point for every analytical product.
#[derive(Clone)]
pub struct MatchAnalyzer {
    store: Arc<dyn TelemetryStore>,
    config: AnalyticsConfig,
}

impl MatchAnalyzer {
    pub fn new(store: Arc<dyn TelemetryStore>, config: AnalyticsConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    /// Fetch all of a map's streams concurrently and normalize its rows
    /// and kills.
    pub async fn load(&self, map_id: &MapId) -> Result<MapTelemetry, AnalyticsError> {
        let (raw_rows, raw_kills, rounds, ultimates) = tokio::try_join!(
            self.store.stat_rows(map_id),
            self.store.kills(map_id),
            self.store.round_boundaries(map_id),
            self.store.ultimates(map_id),
        )?;

        let rows_received = raw_rows.len();
        let rows = dedup_rows(raw_rows);
        validate_rows(&rows)?;
        let kills_received = raw_kills.len();
        let kills = dedup_kills(raw_kills);

        debug!(
            "Loaded {}: {} rows ({} after dedup), {} kills ({} after dedup), {} rounds, {} ultimate events",
            map_id,
            rows_received,
            rows.len(),
            kills_received,
            kills.len(),
            rounds.len(),
            ultimates.len()
        );

        Ok(MapTelemetry {
            map_id: map_id.clone(),
            rows_received,
            rows,
            kills,
            rounds,
            ultimates,
        })
    }

    async fn load_rows(&self, map_id: &MapId) -> Result<Vec<StatSnapshotRow>, AnalyticsError> {
        let rows = dedup_rows(self.store.stat_rows(map_id).await?);
        validate_rows(&rows)?;
        Ok(rows)
    }

    /// Per-round deltas of one statistic for one player.
    pub async fn round_deltas(
        &self,
        map_id: &MapId,
        player: &str,
        stat: Stat,
    ) -> Result<Vec<RoundDelta>, AnalyticsError> {
        let rows = self.load_rows(map_id).await?;
        Ok(round_deltas(&rows, player, stat))
    }

    /// The map's kills segmented into fights.
    pub async fn fights(&self, map_id: &MapId) -> Result<Vec<Fight>, AnalyticsError> {
        let kills = dedup_kills(self.store.kills(map_id).await?);
        segment_fights(kills, self.config.fight_threshold_seconds)
    }

    /// MVP scores for every player on the map.
    pub async fn mvp(&self, map_id: &MapId) -> Result<MvpReport, AnalyticsError> {
        let rows = self.load_rows(map_id).await?;
        let cache = RequestCache::new();
        self.score(&cache, &rows).await
    }

    async fn score(
        &self,
        cache: &RequestCache,
        rows: &[StatSnapshotRow],
    ) -> Result<MvpReport, AnalyticsError> {
        let normalizer = DistributionNormalizer::new(self.store.as_ref(), cache, &self.config);
        score_mvp(&normalizer, rows, &self.config.mvp_weights).await
    }

    /// Composite ratings for a player: one per hero played, or only for
    /// `hero` when given.
    pub async fn ratings(
        &self,
        map_id: &MapId,
        player: &str,
        hero: Option<Hero>,
    ) -> Result<Vec<CompositeRating>, AnalyticsError> {
        let rows = self.load_rows(map_id).await?;
        if !rows.iter().any(|r| r.player_name == player) {
            return Err(player_not_found(map_id, player));
        }

        let mut played: Vec<(Hero, BTreeMap<Stat, f64>, f64)> = final_hero_totals(&rows)
            .into_iter()
            .filter(|t| t.player_name == player)
            .filter(|t| hero.map_or(true, |h| h == t.hero))
            .map(|t| {
                let raw = Stat::ALL.iter().map(|s| (*s, t.value(*s))).collect();
                (t.hero, raw, t.time_played())
            })
            .collect();

        // A requested hero the player never picked is rated on no data
        if let (Some(h), true) = (hero, played.is_empty()) {
            played.push((h, BTreeMap::new(), 0.0));
        }

        let cache = RequestCache::new();
        let normalizer = DistributionNormalizer::new(self.store.as_ref(), &cache, &self.config);

        let mut ratings = Vec::with_capacity(played.len());
        for (hero, raw, time) in played {
            ratings.push(composite_rating(&normalizer, hero, &raw, time).await?);
        }

        info!(
            "Rated {} on {} hero(es) for {} ({:?})",
            player,
            ratings.len(),
            map_id,
            cache.stats()
        );
        Ok(ratings)
    }

    /// Derived combat metrics for one player.
    pub async fn combat(&self, map_id: &MapId, player: &str) -> Result<CombatMetrics, AnalyticsError> {
        let telemetry = self.load(map_id).await?;
        if !telemetry.has_player(player) {
            return Err(player_not_found(map_id, player));
        }

        let fights = segment_fights(telemetry.kills.clone(), self.config.fight_threshold_seconds)?;
        let cache = RequestCache::new();
        let inputs = self.combat_inputs(&cache, &telemetry, &fights);
        combat_metrics(&inputs, player).ok_or_else(|| player_not_found(map_id, player))
    }

    fn combat_inputs<'a>(
        &self,
        cache: &'a RequestCache,
        telemetry: &'a MapTelemetry,
        fights: &'a [Fight],
    ) -> CombatInputs<'a> {
        CombatInputs {
            map_id: &telemetry.map_id,
            cache,
            rows: &telemetry.rows,
            kills: &telemetry.kills,
            fights,
            rounds: &telemetry.rounds,
            ultimates: &telemetry.ultimates,
            ajax_window_seconds: self.config.ajax_window_seconds,
        }
    }

    /// Every product for one map.
    pub async fn report(&self, map_id: &MapId) -> Result<MatchReport, AnalyticsError> {
        let telemetry = self.load(map_id).await?;
        let cache = RequestCache::new();

        let fights = segment_fights(telemetry.kills.clone(), self.config.fight_threshold_seconds)?;
        let mvp = self.score(&cache, &telemetry.rows).await?;
        let combat = roster_combat_metrics(&self.combat_inputs(&cache, &telemetry, &fights));

        info!(
            "Report for {}: {} fights, {} players, MVP {:?} ({:?})",
            map_id,
            fights.len(),
            combat.len(),
            mvp.mvp,
            cache.stats()
        );

        Ok(MatchReport {
            map_id: telemetry.map_id.clone(),
            computed_at: Utc::now(),
            rows_received: telemetry.rows_received,
            rows_after_dedup: telemetry.rows.len(),
            fights,
            mvp,
            combat,
        })
    }
}

fn player_not_found(map_id: &MapId, player: &str) -> AnalyticsError {
    AnalyticsError::PlayerNotFound {
        map_id: map_id.to_string(),
        player: player.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Combatant, ComparisonResult, UnavailableReason, WeightProfile};
    use crate::storage::{MapRecord, MemoryStore, StorageError};

    fn history(store: &mut MemoryStore) {
        for map in ["h1", "h2", "h3"] {
            let rows = (0..10)
                .map(|i| {
                    let high = i % 2 == 1;
                    StatSnapshotRow::new(map.into(), 1, 200.0, format!("H{}", i), "T1", Hero::Tracer)
                        .with(Stat::HeroTimePlayed, 200.0)
                        .with(Stat::Eliminations, if high { 20.0 } else { 40.0 / 3.0 })
                })
                .collect();
            store.insert_map(
                map.into(),
                MapRecord {
                    rows,
                    ..MapRecord::default()
                },
            );
        }
    }

    fn tracer(round: u32, time: f64, player: &str, team: &str, elims: f64) -> StatSnapshotRow {
        StatSnapshotRow::new("match".into(), round, time, player, team, Hero::Tracer)
            .with(Stat::HeroTimePlayed, time)
            .with(Stat::Eliminations, elims)
    }

    fn kill(t: f64, attacker: (&str, &str), victim: (&str, &str)) -> KillEvent {
        KillEvent::new(
            t,
            1,
            Combatant::new(attacker.0, Hero::Tracer, attacker.1),
            Combatant::new(victim.0, Hero::Tracer, victim.1),
        )
    }

    fn analyzer() -> MatchAnalyzer {
        let mut store = MemoryStore::new();
        history(&mut store);

        let a1 = tracer(1, 300.0, "A", "T1", 15.0);
        store.insert_map(
            "match".into(),
            MapRecord {
                rows: vec![
                    a1.clone(),
                    a1,
                    tracer(1, 300.0, "B", "T2", 10.0),
                    tracer(2, 600.0, "A", "T1", 60.0),
                    tracer(2, 600.0, "B", "T2", 40.0),
                ],
                kills: vec![
                    kill(10.0, ("A", "T1"), ("B", "T2")),
                    kill(12.0, ("B", "T2"), ("A", "T1")),
                    kill(40.0, ("A", "T1"), ("B", "T2")),
                    kill(41.0, ("A", "T1"), ("B", "T2")),
                ],
                ..MapRecord::default()
            },
        );

        MatchAnalyzer::new(Arc::new(store), AnalyticsConfig::default())
    }

    #[tokio::test]
    async fn test_report() {
        let report = analyzer().report(&"match".into()).await.unwrap();

        assert_eq!(report.rows_received, 5);
        assert_eq!(report.rows_after_dedup, 4);
        assert_eq!(report.fights.len(), 2);
        assert_eq!(report.mvp.mvp.as_deref(), Some("A"));

        let names: Vec<&str> = report.combat.iter().map(|c| c.player_name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert_eq!(report.combat[0].first_pick_rate, Some(1.0));
        assert_eq!(report.combat[0].duel_winrate, Some(0.75));
    }

    #[tokio::test]
    async fn test_round_deltas_see_deduplicated_rows() {
        let deltas = analyzer()
            .round_deltas(&"match".into(), "A", Stat::Eliminations)
            .await
            .unwrap();

        assert_eq!(
            deltas,
            vec![
                RoundDelta {
                    round_number: 1,
                    value: 15.0
                },
                RoundDelta {
                    round_number: 2,
                    value: 45.0
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_ratings() {
        let analyzer = analyzer();

        let ratings = analyzer.ratings(&"match".into(), "A", None).await.unwrap();
        assert_eq!(ratings.len(), 1);
        assert_eq!(ratings[0].profile, WeightProfile::Damage);
        assert!(ratings[0].estimated_sr.is_some());

        let unplayed = analyzer
            .ratings(&"match".into(), "A", Some(Hero::Mercy))
            .await
            .unwrap();
        assert_eq!(unplayed[0].hero, Hero::Mercy);
        assert_eq!(unplayed[0].estimated_sr, None);
        assert!(unplayed[0].skipped.iter().all(|s| matches!(
            s,
            ComparisonResult::Unavailable {
                reason: UnavailableReason::MissingValue,
                ..
            }
        )));
    }

    #[tokio::test]
    async fn test_duplicated_kills_count_once() {
        let store = MemoryStore::new().with_map(
            "dup",
            MapRecord {
                rows: vec![
                    tracer(1, 60.0, "A", "T1", 1.0),
                    tracer(1, 60.0, "X", "T2", 0.0),
                ],
                kills: vec![
                    kill(20.0, ("A", "T1"), ("X", "T2")),
                    kill(20.0, ("A", "T1"), ("X", "T2")),
                ],
                ..MapRecord::default()
            },
        );
        let analyzer = MatchAnalyzer::new(Arc::new(store), AnalyticsConfig::default());

        let fights = analyzer.fights(&"dup".into()).await.unwrap();
        assert_eq!(fights.len(), 1);
        assert_eq!(fights[0].kills.len(), 1);

        let combat = analyzer.combat(&"dup".into(), "A").await.unwrap();
        assert_eq!(combat.duels[0].opponent, "X");
        assert_eq!(combat.duels[0].wins, 1);

        let report = analyzer.report(&"dup".into()).await.unwrap();
        assert_eq!(report.fights[0].kills.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_player_and_map() {
        let analyzer = analyzer();

        assert!(matches!(
            analyzer.combat(&"match".into(), "Nobody").await,
            Err(AnalyticsError::PlayerNotFound { .. })
        ));
        assert!(matches!(
            analyzer.fights(&"missing".into()).await,
            Err(AnalyticsError::Storage(StorageError::MapNotFound(_)))
        ));
    }

    #[tokio::test]
    async fn test_malformed_rows_fail_loudly() {
        let store = MemoryStore::new().with_map(
            "bad",
            MapRecord {
                rows: vec![tracer(1, 10.0, "A", "T1", -3.0)],
                ..MapRecord::default()
            },
        );
        let analyzer = MatchAnalyzer::new(Arc::new(store), AnalyticsConfig::default());

        assert!(matches!(
            analyzer.report(&"bad".into()).await,
            Err(AnalyticsError::MalformedRow { index: 0, .. })
        ));
    }

    #[tokio::test]
    async fn test_repeated_requests_agree() {
        let analyzer = analyzer();
        let first = analyzer.mvp(&"match".into()).await.unwrap();
        let second = analyzer.mvp(&"match".into()).await.unwrap();
        assert_eq!(first, second);
    }
}
