use axum::{extract::State, http::StatusCode, Json};

use crate::state::{
    AppState, CursorRequest, HealthResponse, JsonResult, PlaybackRequest, PlayerResponse,
};
use crate::utils::json_error;

pub async fn get_player(State(state): State<AppState>) -> JsonResult<PlayerResponse> {
    Ok(Json(PlayerResponse {
        selected: state.catalog.selected(),
        playing: state.catalog.playing(),
        is_playing: state.catalog.is_playing(),
    }))
}

pub async fn select_song(
    State(state): State<AppState>,
    Json(request): Json<CursorRequest>,
) -> JsonResult<HealthResponse> {
    if let Some(id) = &request.song_id {
        if !state.catalog.contains(id) {
            return Err(json_error(StatusCode::NOT_FOUND, "song not found"));
        }
    }
    state.catalog.set_selected(request.song_id);
    Ok(Json(HealthResponse { status: "ok" }))
}

pub async fn set_playing(
    State(state): State<AppState>,
    Json(request): Json<CursorRequest>,
) -> JsonResult<HealthResponse> {
    if let Some(id) = &request.song_id {
        if !state.catalog.contains(id) {
            return Err(json_error(StatusCode::NOT_FOUND, "song not found"));
        }
    }
    state.catalog.set_playing(request.song_id);
    Ok(Json(HealthResponse { status: "ok" }))
}

pub async fn set_playback(
    State(state): State<AppState>,
    Json(request): Json<PlaybackRequest>,
) -> JsonResult<HealthResponse> {
    state.catalog.set_playback(request.is_playing);
    Ok(Json(HealthResponse { status: "ok" }))
}
