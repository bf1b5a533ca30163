use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

pub const UNKNOWN_ARTIST: &str = "Unknown Artist";
pub const UNKNOWN_ALBUM: &str = "Unknown Album";

/// One uploaded audio asset. The id is assigned at upload time and is
/// unique within a user's catalog.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Song {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub user_id: String,
    pub file_url: String,
    pub file_name: String,
    pub file_size: u64,
    pub uploaded_at: i64,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub analyzed: bool,
    #[serde(default)]
    pub cover_art: Option<String>,
    #[serde(default)]
    pub duration_secs: Option<u32>,
}

/// One classification result. The first tag in a song's list is the
/// primary tag and carries the highest confidence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    pub confidence: f64,
}

pub fn stable_id(input: &str) -> String {
    blake3::hash(input.as_bytes()).to_hex().to_string()
}

pub fn epoch_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|value| value.as_millis() as i64)
        .unwrap_or(0)
}

/// Default title for an upload without explicit metadata: everything
/// before the first dot of the file name.
pub fn title_from_file_name(file_name: &str) -> String {
    let head = file_name.split('.').next().unwrap_or(file_name);
    if head.is_empty() {
        file_name.to_string()
    } else {
        head.to_string()
    }
}
