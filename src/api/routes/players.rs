use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::models::{CombatMetrics, CompositeRating, Hero, MapId};

#[derive(Debug, Deserialize)]
pub struct RatingParams {
    pub hero: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RatingResponse {
    pub map_id: MapId,
    pub player: String,
    pub ratings: Vec<CompositeRating>,
}

pub async fn rating(
    State(state): State<AppState>,
    Path((map_id, player)): Path<(String, String)>,
    Query(params): Query<RatingParams>,
) -> Result<Json<RatingResponse>, ApiError> {
    let hero = params
        .hero
        .as_deref()
        .map(str::parse::<Hero>)
        .transpose()
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let map_id = MapId::new(map_id);
    let ratings = state.analyzer.ratings(&map_id, &player, hero).await?;

    Ok(Json(RatingResponse {
        map_id,
        player,
        ratings,
    }))
}

pub async fn combat(
    State(state): State<AppState>,
    Path((map_id, player)): Path<(String, String)>,
) -> Result<Json<CombatMetrics>, ApiError> {
    let metrics = state.analyzer.combat(&MapId::new(map_id), &player).await?;
    Ok(Json(metrics))
}

#[cfg(test)]
mod tests {
    use crate::api::build_router;
    use crate::api::state::AppState;
    use crate::config::AnalyticsConfig;
    use crate::models::{Combatant, Hero, KillEvent, Stat, StatSnapshotRow};
    use crate::pipeline::MatchAnalyzer;
    use crate::storage::{MapRecord, MemoryStore};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use std::sync::Arc;
    use tower::util::ServiceExt;

    fn app() -> axum::Router {
        let record = MapRecord {
            rows: vec![
                StatSnapshotRow::new("m1".into(), 1, 300.0, "A", "T1", Hero::Lucio)
                    .with(Stat::HeroTimePlayed, 300.0)
                    .with(Stat::HealingDealt, 4000.0),
                StatSnapshotRow::new("m1".into(), 1, 300.0, "X", "T2", Hero::Ashe)
                    .with(Stat::HeroTimePlayed, 300.0),
            ],
            kills: vec![KillEvent::new(
                20.0,
                1,
                Combatant::new("A", Hero::Lucio, "T1"),
                Combatant::new("X", Hero::Ashe, "T2"),
            )],
            ..MapRecord::default()
        };
        let store = MemoryStore::new().with_map("m1", record);
        let analyzer = MatchAnalyzer::new(Arc::new(store), AnalyticsConfig::default());
        build_router(AppState::new(analyzer))
    }

    async fn get_json(app: axum::Router, uri: &str) -> (StatusCode, Value) {
        let resp = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_rating_without_population_is_unavailable() {
        let (status, json) = get_json(app(), "/api/maps/m1/players/A/rating").await;
        assert_eq!(status, StatusCode::OK);

        let rating = &json["ratings"][0];
        assert_eq!(rating["hero"], "Lúcio");
        assert_eq!(rating["profile"], "support");
        assert_eq!(rating["estimated_sr"], Value::Null);
        assert_eq!(rating["skipped"][0]["status"], "unavailable");
    }

    #[tokio::test]
    async fn test_rating_hero_filter() {
        let (status, json) = get_json(app(), "/api/maps/m1/players/A/rating?hero=mercy").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["ratings"][0]["profile"], "healer_only");

        let (status, _) = get_json(app(), "/api/maps/m1/players/A/rating?hero=Gandalf").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_combat_endpoint() {
        let (status, json) = get_json(app(), "/api/maps/m1/players/A/combat").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["player_team"], "T1");
        assert_eq!(json["first_pick_rate"], 1.0);
        assert_eq!(json["duels"][0]["opponent"], "X");
    }

    #[tokio::test]
    async fn test_unknown_player_is_not_found() {
        let (status, json) = get_json(app(), "/api/maps/m1/players/Nobody/combat").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"]["code"], "NOT_FOUND");

        let (status, _) = get_json(app(), "/api/maps/m1/players/Nobody/rating").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
