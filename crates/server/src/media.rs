use axum::{
    body::Body,
    extract::{Path as AxumPath, State},
    http::{header, HeaderValue, StatusCode},
    response::Response,
    routing::get,
    Router,
};

use crate::state::AppState;
use crate::utils::json_error_response;

/// Serves stored object bytes. The public URLs issued at upload time all
/// point under this router, whichever backend produced them.
pub fn media_router(state: AppState) -> Router {
    Router::new()
        .route("/media/*key", get(serve_object))
        .with_state(state)
}

async fn serve_object(
    State(state): State<AppState>,
    AxumPath(key): AxumPath<String>,
) -> Response {
    let bytes = match state.objects.get(&key) {
        Ok(Some(bytes)) => bytes,
        Ok(None) => return json_error_response(StatusCode::NOT_FOUND, "file not found"),
        Err(err) => {
            return json_error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("store error: {}", err),
            )
        }
    };

    let mime = mime_guess::from_path(&key).first_or_octet_stream();
    let mut response = Response::new(Body::from(bytes));
    let content_type = HeaderValue::from_str(mime.as_ref())
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, content_type);
    response
}
