use common::{epoch_millis, title_from_file_name, Song, UNKNOWN_ALBUM, UNKNOWN_ARTIST};
use store::{object_key, StoreError};
use tracing::{info, warn};

use crate::state::AppState;

pub struct UploadRequest {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub user_id: String,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
}

/// Failures from the first two pipeline steps. Classification failures
/// never surface here; the record just stays unanalyzed.
#[derive(Debug)]
pub enum UploadError {
    /// Byte persistence failed; nothing was committed.
    Storage(StoreError),
    /// Bytes were stored but the metadata write failed. The orphaned
    /// object stays in storage and is only logged.
    Metadata(StoreError),
}

impl std::fmt::Display for UploadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UploadError::Storage(err) => write!(f, "file upload failed: {}", err),
            UploadError::Metadata(err) => write!(f, "metadata write failed: {}", err),
        }
    }
}

impl std::error::Error for UploadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            UploadError::Storage(err) | UploadError::Metadata(err) => Some(err),
        }
    }
}

/// Runs the upload pipeline: persist bytes, persist the metadata record,
/// classify the title, persist the tags. Later steps never roll back
/// earlier ones; a record whose classification step failed is returned
/// with `analyzed == false` and can be re-analyzed later.
pub async fn upload_song(state: &AppState, request: UploadRequest) -> Result<Song, UploadError> {
    let id = state
        .objects
        .allocate_id(&request.file_name, request.bytes.len() as u64);
    let key = object_key(&request.user_id, &id, &request.file_name);

    let file_url = state
        .objects
        .put(&key, &request.bytes)
        .map_err(UploadError::Storage)?;

    let title = request
        .title
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| title_from_file_name(&request.file_name));
    let artist = request
        .artist
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| UNKNOWN_ARTIST.to_string());
    let album = request
        .album
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| UNKNOWN_ALBUM.to_string());

    let song = Song {
        id,
        title,
        artist,
        album,
        user_id: request.user_id,
        file_url,
        file_name: request.file_name,
        file_size: request.bytes.len() as u64,
        uploaded_at: epoch_millis(),
        tags: Vec::new(),
        analyzed: false,
        cover_art: None,
        duration_secs: None,
    };

    if let Err(err) = state.songs.insert(&song) {
        warn!(
            "Metadata write failed for song {}; object {} left behind: {}",
            song.id, key, err
        );
        return Err(UploadError::Metadata(err));
    }
    state.catalog.upsert(song.clone());

    Ok(finish_analysis(state, song).await)
}

/// Classification tail of the pipeline. The classifier delay suspends the
/// workflow, so the record may have been deleted by the time the result
/// arrives; a stale result is discarded rather than applied to a
/// resurrected id.
pub async fn finish_analysis(state: &AppState, mut song: Song) -> Song {
    let tags = state.analyzer.classify(&song.title).await;

    if !state.catalog.contains(&song.id) {
        info!("Discarding analysis result for removed song {}", song.id);
        return song;
    }

    match state.songs.update_tags(&song.id, &tags) {
        Ok(true) => {
            state.catalog.update_tags(&song.id, &tags);
            song.tags = tags;
            song.analyzed = true;
        }
        Ok(false) => {
            info!("Discarding analysis result for removed song {}", song.id);
        }
        Err(err) => {
            warn!(
                "Failed to persist tags for song {}; keeping it unanalyzed: {}",
                song.id, err
            );
        }
    }
    song
}

/// Explicit re-analysis of an existing record. `None` means the record
/// was absent, either up front or by the time the classifier finished.
pub async fn reanalyze_song(
    state: &AppState,
    id: &str,
) -> Result<Option<Vec<common::Tag>>, StoreError> {
    let Some(song) = state.songs.get(id)? else {
        return Ok(None);
    };
    let tags = state.analyzer.classify(&song.title).await;
    if !state.songs.update_tags(id, &tags)? {
        info!("Discarding analysis result for removed song {}", id);
        return Ok(None);
    }
    state.catalog.update_tags(id, &tags);
    Ok(Some(tags))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::Arc;

    use analysis::Analyzer;
    use common::{Song, Tag};
    use parking_lot::RwLock;
    use store::{MemoryObjectStore, MemorySongStore, SongStore, StoreError};

    use super::{upload_song, UploadError, UploadRequest};
    use crate::catalog::Catalog;
    use crate::config::ServerConfig;
    use crate::state::AppState;
    use crate::upload::finish_analysis;

    fn memory_state() -> AppState {
        AppState {
            config_path: PathBuf::from("config.yaml"),
            config: Arc::new(RwLock::new(ServerConfig::default())),
            songs: Arc::new(MemorySongStore::new()),
            objects: Arc::new(MemoryObjectStore::new("/media")),
            catalog: Catalog::new(),
            analyzer: Analyzer::instant(),
        }
    }

    fn request(file_name: &str, title: Option<&str>) -> UploadRequest {
        UploadRequest {
            file_name: file_name.to_string(),
            bytes: b"not really audio".to_vec(),
            user_id: "u1".to_string(),
            title: title.map(|value| value.to_string()),
            artist: None,
            album: None,
        }
    }

    #[tokio::test]
    async fn upload_runs_full_pipeline() {
        let state = memory_state();
        let song = upload_song(&state, request("test.mp3", Some("Test")))
            .await
            .unwrap();

        // "Test" sums to 416 → primary Indie plus three tails.
        assert!(song.analyzed);
        assert_eq!(song.tags.len(), 4);
        assert_eq!(song.tags[0].name, "Indie");
        assert_eq!(song.tags[0].confidence, 0.95);
        assert_eq!(song.artist, "Unknown Artist");
        assert_eq!(song.album, "Unknown Album");
        assert!(song.file_url.starts_with("/media/u1/"));

        let stored = state.songs.get(&song.id).unwrap().unwrap();
        assert!(stored.analyzed);
        assert_eq!(stored.tags, song.tags);
        assert_eq!(state.catalog.get(&song.id).unwrap().tags, song.tags);
    }

    #[tokio::test]
    async fn title_defaults_to_file_stem() {
        let state = memory_state();
        let song = upload_song(&state, request("evening rain.mp3", None))
            .await
            .unwrap();
        assert_eq!(song.title, "evening rain");
    }

    #[tokio::test]
    async fn reupload_of_same_file_replaces_record() {
        let state = memory_state();
        let first = upload_song(&state, request("test.mp3", Some("Test")))
            .await
            .unwrap();
        let second = upload_song(&state, request("test.mp3", Some("Test")))
            .await
            .unwrap();

        // The memory backend derives ids from the file, so the second
        // upload lands on the same record instead of duplicating it.
        assert_eq!(first.id, second.id);
        assert_eq!(state.catalog.len(), 1);
        assert_eq!(state.songs.list_for_user("u1").unwrap().len(), 1);
    }

    #[tokio::test]
    async fn stale_analysis_result_is_discarded() {
        let state = memory_state();
        let mut song = upload_song(&state, request("test.mp3", Some("Test")))
            .await
            .unwrap();
        song.tags = Vec::new();
        song.analyzed = false;

        // The record disappears while a re-analysis is in flight.
        state.songs.delete(&song.id).unwrap();
        state.catalog.remove(&song.id);

        let result = finish_analysis(&state, song.clone()).await;
        assert!(!result.analyzed);
        assert!(result.tags.is_empty());
        assert!(state.songs.get(&song.id).unwrap().is_none());
    }

    struct FailingTagStore {
        inner: MemorySongStore,
    }

    impl SongStore for FailingTagStore {
        fn insert(&self, song: &Song) -> Result<(), StoreError> {
            self.inner.insert(song)
        }

        fn get(&self, id: &str) -> Result<Option<Song>, StoreError> {
            self.inner.get(id)
        }

        fn list_for_user(&self, user_id: &str) -> Result<Vec<Song>, StoreError> {
            self.inner.list_for_user(user_id)
        }

        fn update_tags(&self, _id: &str, _tags: &[Tag]) -> Result<bool, StoreError> {
            Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "tag write rejected",
            )))
        }

        fn delete(&self, id: &str) -> Result<bool, StoreError> {
            self.inner.delete(id)
        }
    }

    #[tokio::test]
    async fn tag_persistence_failure_keeps_record_unanalyzed() {
        let mut state = memory_state();
        state.songs = Arc::new(FailingTagStore {
            inner: MemorySongStore::new(),
        });

        let song = upload_song(&state, request("test.mp3", Some("Test")))
            .await
            .unwrap();

        assert!(!song.analyzed);
        assert!(song.tags.is_empty());
        // the record survived both in the store and the catalog
        assert!(state.songs.get(&song.id).unwrap().is_some());
        assert!(state.catalog.contains(&song.id));
    }

    #[tokio::test]
    async fn reanalyze_refreshes_tags() {
        let state = memory_state();
        let song = upload_song(&state, request("test.mp3", Some("Test")))
            .await
            .unwrap();

        let tags = super::reanalyze_song(&state, &song.id).await.unwrap().unwrap();
        assert_eq!(tags, song.tags);
        assert!(state.catalog.get(&song.id).unwrap().analyzed);

        assert!(super::reanalyze_song(&state, "missing")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn metadata_failure_surfaces_and_leaves_object() {
        struct RejectingStore;

        impl SongStore for RejectingStore {
            fn insert(&self, _song: &Song) -> Result<(), StoreError> {
                Err(StoreError::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "insert rejected",
                )))
            }

            fn get(&self, _id: &str) -> Result<Option<Song>, StoreError> {
                Ok(None)
            }

            fn list_for_user(&self, _user_id: &str) -> Result<Vec<Song>, StoreError> {
                Ok(Vec::new())
            }

            fn update_tags(&self, _id: &str, _tags: &[Tag]) -> Result<bool, StoreError> {
                Ok(false)
            }

            fn delete(&self, _id: &str) -> Result<bool, StoreError> {
                Ok(false)
            }
        }

        let objects = MemoryObjectStore::new("/media");
        let mut state = memory_state();
        state.songs = Arc::new(RejectingStore);
        state.objects = Arc::new(objects.clone());

        let err = upload_song(&state, request("test.mp3", Some("Test")))
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::Metadata(_)));
        assert!(state.catalog.is_empty());
        // step (1) is not rolled back
        assert_eq!(objects.len(), 1);
    }
}
