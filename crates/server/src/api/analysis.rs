use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};

use crate::state::{AppState, JsonResult, SimilarQuery};
use crate::utils::json_error;

const DEFAULT_SIMILAR_LIMIT: usize = 5;

pub async fn similar_songs(
    State(state): State<AppState>,
    Query(params): Query<SimilarQuery>,
) -> JsonResult<Vec<String>> {
    let genre = params.genre.trim();
    if genre.is_empty() {
        return Err(json_error(
            StatusCode::BAD_REQUEST,
            "genre is required".to_string(),
        ));
    }
    let limit = params.limit.unwrap_or(DEFAULT_SIMILAR_LIMIT).max(1);
    Ok(Json(state.analyzer.similar(genre, limit).await))
}
