pub mod analysis;
pub mod player;
pub mod songs;

use axum::{
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use crate::state::{AppState, HealthResponse};

pub fn api_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/songs", get(songs::list_songs).post(songs::upload_song))
        .route(
            "/songs/:song_id",
            get(songs::get_song).delete(songs::delete_song),
        )
        .route("/songs/:song_id/analyze", post(songs::analyze_song))
        .route("/analysis/similar", get(analysis::similar_songs))
        .route("/player", get(player::get_player))
        .route("/player/select", post(player::select_song))
        .route("/player/playing", post(player::set_playing))
        .route("/player/state", post(player::set_playback))
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}
