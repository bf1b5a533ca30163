use std::path::PathBuf;
use std::sync::Arc;

use analysis::Analyzer;
use axum::http::StatusCode;
use axum::Json;
use common::Song;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use store::{ObjectStore, SongStore};

use crate::catalog::Catalog;
use crate::config::ServerConfig;

#[derive(Clone)]
pub struct AppState {
    pub config_path: PathBuf,
    pub config: Arc<RwLock<ServerConfig>>,
    pub songs: Arc<dyn SongStore>,
    pub objects: Arc<dyn ObjectStore>,
    pub catalog: Catalog,
    pub analyzer: Analyzer,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Serialize)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
    pub total: usize,
}

#[derive(Debug, Deserialize)]
pub struct SongsQuery {
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct SimilarQuery {
    pub genre: String,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct CursorRequest {
    pub song_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PlaybackRequest {
    pub is_playing: bool,
}

#[derive(Serialize)]
pub struct PlayerResponse {
    pub selected: Option<Song>,
    pub playing: Option<Song>,
    pub is_playing: bool,
}

pub type JsonResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;
