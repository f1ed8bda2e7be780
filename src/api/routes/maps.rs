use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::models::{Fight, MapId, MatchReport, MvpReport, RoundDelta, Stat};
use crate::storage;

#[derive(Debug, Serialize)]
pub struct MapsResponse {
    pub maps: Vec<MapId>,
}

pub async fn list_maps(State(state): State<AppState>) -> Result<Json<MapsResponse>, ApiError> {
    let maps = match &state.storage {
        Some(config) => {
            storage::list_maps(config).map_err(|e| ApiError::Internal(e.to_string()))?
        }
        None => Vec::new(),
    };
    Ok(Json(MapsResponse { maps }))
}

#[derive(Debug, Serialize)]
pub struct FightsResponse {
    pub map_id: MapId,
    pub fights: Vec<Fight>,
    pub total_kills: usize,
}

pub async fn fights(
    State(state): State<AppState>,
    Path(map_id): Path<String>,
) -> Result<Json<FightsResponse>, ApiError> {
    let map_id = MapId::new(map_id);
    let fights = state.analyzer.fights(&map_id).await?;
    let total_kills = fights.iter().map(|f| f.kills.len()).sum();

    Ok(Json(FightsResponse {
        map_id,
        fights,
        total_kills,
    }))
}

#[derive(Debug, Deserialize)]
pub struct DeltaParams {
    pub player: Option<String>,
    pub stat: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DeltasResponse {
    pub map_id: MapId,
    pub player: String,
    pub stat: Stat,
    pub deltas: Vec<RoundDelta>,
}

pub async fn deltas(
    State(state): State<AppState>,
    Path(map_id): Path<String>,
    Query(params): Query<DeltaParams>,
) -> Result<Json<DeltasResponse>, ApiError> {
    let player = params
        .player
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("player is required".to_string()))?;
    let stat: Stat = params
        .stat
        .as_deref()
        .ok_or_else(|| ApiError::BadRequest("stat is required".to_string()))?
        .parse()
        .map_err(ApiError::BadRequest)?;

    let map_id = MapId::new(map_id);
    let deltas = state.analyzer.round_deltas(&map_id, &player, stat).await?;

    Ok(Json(DeltasResponse {
        map_id,
        player,
        stat,
        deltas,
    }))
}

pub async fn mvp(
    State(state): State<AppState>,
    Path(map_id): Path<String>,
) -> Result<Json<MvpReport>, ApiError> {
    let report = state.analyzer.mvp(&MapId::new(map_id)).await?;
    Ok(Json(report))
}

pub async fn report(
    State(state): State<AppState>,
    Path(map_id): Path<String>,
) -> Result<Json<MatchReport>, ApiError> {
    let report = state.analyzer.report(&MapId::new(map_id)).await?;
    Ok(Json(report))
}
