use axum::{
    extract::{multipart::Field, Multipart, Path as AxumPath, Query, State},
    http::StatusCode,
    Json,
};
use common::{Song, Tag};
use store::object_key;
use tracing::warn;

use crate::state::{AppState, ErrorResponse, HealthResponse, JsonResult, ListResponse, SongsQuery};
use crate::upload::{self, UploadRequest};
use crate::utils::json_error;

pub async fn list_songs(
    State(state): State<AppState>,
    Query(params): Query<SongsQuery>,
) -> JsonResult<ListResponse<Song>> {
    let user_id = params.user_id.trim();
    if user_id.is_empty() {
        return Err(json_error(
            StatusCode::BAD_REQUEST,
            "user_id is required".to_string(),
        ));
    }

    let songs = state
        .songs
        .list_for_user(user_id)
        .map_err(|err| json_error(StatusCode::INTERNAL_SERVER_ERROR, format!("store error: {}", err)))?;
    state.catalog.replace_all(songs);
    let items = state.catalog.snapshot();
    let total = items.len();
    Ok(Json(ListResponse { items, total }))
}

pub async fn upload_song(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> JsonResult<Song> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut user_id: Option<String> = None;
    let mut title: Option<String> = None;
    let mut artist: Option<String> = None;
    let mut album: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        match field.name().unwrap_or("") {
            "file" => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let bytes = field.bytes().await.map_err(multipart_error)?;
                file = Some((file_name, bytes.to_vec()));
            }
            "user_id" => user_id = Some(text_field(field).await?),
            "title" => title = Some(text_field(field).await?),
            "artist" => artist = Some(text_field(field).await?),
            "album" => album = Some(text_field(field).await?),
            _ => {}
        }
    }

    let (file_name, bytes) = file.ok_or_else(|| {
        json_error(StatusCode::BAD_REQUEST, "file part is required".to_string())
    })?;
    let user_id = user_id
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| {
            json_error(StatusCode::BAD_REQUEST, "user_id is required".to_string())
        })?;

    let request = UploadRequest {
        file_name,
        bytes,
        user_id,
        title,
        artist,
        album,
    };

    match upload::upload_song(&state, request).await {
        Ok(song) => Ok(Json(song)),
        Err(err) => Err(json_error(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())),
    }
}

pub async fn get_song(
    State(state): State<AppState>,
    AxumPath(song_id): AxumPath<String>,
) -> JsonResult<Song> {
    match state.songs.get(&song_id) {
        Ok(Some(song)) => Ok(Json(song)),
        Ok(None) => Err(json_error(StatusCode::NOT_FOUND, "song not found")),
        Err(err) => Err(json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("store error: {}", err),
        )),
    }
}

pub async fn delete_song(
    State(state): State<AppState>,
    AxumPath(song_id): AxumPath<String>,
) -> JsonResult<HealthResponse> {
    let song = match state.songs.get(&song_id) {
        Ok(Some(song)) => song,
        Ok(None) => return Err(json_error(StatusCode::NOT_FOUND, "song not found")),
        Err(err) => {
            return Err(json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("store error: {}", err),
            ))
        }
    };

    // A failed byte deletion still lets the record go; the object is
    // orphaned, not resurrected.
    let key = object_key(&song.user_id, &song.id, &song.file_name);
    if let Err(err) = state.objects.delete(&key) {
        warn!("Failed to delete object {}: {}", key, err);
    }

    state
        .songs
        .delete(&song_id)
        .map_err(|err| json_error(StatusCode::INTERNAL_SERVER_ERROR, format!("store error: {}", err)))?;
    state.catalog.remove(&song_id);

    Ok(Json(HealthResponse { status: "ok" }))
}

pub async fn analyze_song(
    State(state): State<AppState>,
    AxumPath(song_id): AxumPath<String>,
) -> JsonResult<Vec<Tag>> {
    match upload::reanalyze_song(&state, &song_id).await {
        Ok(Some(tags)) => Ok(Json(tags)),
        Ok(None) => Err(json_error(StatusCode::NOT_FOUND, "song not found")),
        Err(err) => Err(json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("store error: {}", err),
        )),
    }
}

fn multipart_error(err: axum::extract::multipart::MultipartError) -> (StatusCode, Json<ErrorResponse>) {
    json_error(
        StatusCode::BAD_REQUEST,
        format!("malformed multipart body: {}", err),
    )
}

async fn text_field(field: Field<'_>) -> Result<String, (StatusCode, Json<ErrorResponse>)> {
    field.text().await.map_err(multipart_error)
}
