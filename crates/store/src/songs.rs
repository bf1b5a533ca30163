use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use common::{Song, Tag};
use parking_lot::RwLock;
use redb::{Database, ReadableTable, TableDefinition, TableError};
use serde::{Deserialize, Serialize};

use crate::StoreError;

const SONGS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("songs");

/// Metadata record boundary. One canonical `Song` shape crosses it in both
/// directions; whatever a backend stores internally is its own business.
pub trait SongStore: Send + Sync {
    fn insert(&self, song: &Song) -> Result<(), StoreError>;

    fn get(&self, id: &str) -> Result<Option<Song>, StoreError>;

    /// All songs owned by the user, newest upload first.
    fn list_for_user(&self, user_id: &str) -> Result<Vec<Song>, StoreError>;

    /// Overwrites the tag list and flips `analyzed` on. Returns false when
    /// no record with the id exists; nothing else is touched either way.
    fn update_tags(&self, id: &str, tags: &[Tag]) -> Result<bool, StoreError>;

    fn delete(&self, id: &str) -> Result<bool, StoreError>;
}

#[derive(Clone)]
pub struct RedbSongStore {
    db: Arc<Database>,
}

impl RedbSongStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn init_tables(&self) -> Result<(), StoreError> {
        let write_txn = self.db.begin_write()?;
        {
            let _ = write_txn.open_table(SONGS_TABLE)?;
        }
        write_txn.commit()?;
        Ok(())
    }
}

impl SongStore for RedbSongStore {
    fn insert(&self, song: &Song) -> Result<(), StoreError> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(SONGS_TABLE)?;
            let bytes = encode_value(song)?;
            table.insert(song.id.as_str(), bytes.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<Song>, StoreError> {
        let read_txn = self.db.begin_read()?;
        let table = match read_txn.open_table(SONGS_TABLE) {
            Ok(table) => table,
            Err(TableError::TableDoesNotExist(_)) => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let song = match table.get(id)? {
            Some(value) => Some(decode_value(value.value())?),
            None => None,
        };
        Ok(song)
    }

    fn list_for_user(&self, user_id: &str) -> Result<Vec<Song>, StoreError> {
        let read_txn = self.db.begin_read()?;
        let table = match read_txn.open_table(SONGS_TABLE) {
            Ok(table) => table,
            Err(TableError::TableDoesNotExist(_)) => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        let mut items: Vec<Song> = Vec::new();
        for entry in table.iter()? {
            let entry = entry?;
            let song: Song = decode_value(entry.1.value())?;
            if song.user_id == user_id {
                items.push(song);
            }
        }
        items.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        Ok(items)
    }

    fn update_tags(&self, id: &str, tags: &[Tag]) -> Result<bool, StoreError> {
        let write_txn = self.db.begin_write()?;
        let updated = {
            let mut table = match write_txn.open_table(SONGS_TABLE) {
                Ok(table) => table,
                Err(TableError::TableDoesNotExist(_)) => return Ok(false),
                Err(err) => return Err(err.into()),
            };
            let mut song: Song = match table.get(id)? {
                Some(value) => decode_value(value.value())?,
                None => return Ok(false),
            };
            song.tags = tags.to_vec();
            song.analyzed = true;
            let bytes = encode_value(&song)?;
            table.insert(id, bytes.as_slice())?;
            true
        };
        write_txn.commit()?;
        Ok(updated)
    }

    fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let write_txn = self.db.begin_write()?;
        let deleted = {
            let mut table = match write_txn.open_table(SONGS_TABLE) {
                Ok(table) => table,
                Err(TableError::TableDoesNotExist(_)) => return Ok(false),
                Err(err) => return Err(err.into()),
            };
            let removed = table.remove(id)?.is_some();
            removed
        };
        write_txn.commit()?;
        Ok(deleted)
    }
}

/// In-memory fake for the metadata side of the boundary.
#[derive(Clone, Default)]
pub struct MemorySongStore {
    inner: Arc<RwLock<HashMap<String, Song>>>,
}

impl MemorySongStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SongStore for MemorySongStore {
    fn insert(&self, song: &Song) -> Result<(), StoreError> {
        self.inner.write().insert(song.id.clone(), song.clone());
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<Song>, StoreError> {
        Ok(self.inner.read().get(id).cloned())
    }

    fn list_for_user(&self, user_id: &str) -> Result<Vec<Song>, StoreError> {
        let mut items: Vec<Song> = self
            .inner
            .read()
            .values()
            .filter(|song| song.user_id == user_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        Ok(items)
    }

    fn update_tags(&self, id: &str, tags: &[Tag]) -> Result<bool, StoreError> {
        let mut guard = self.inner.write();
        let Some(song) = guard.get_mut(id) else {
            return Ok(false);
        };
        song.tags = tags.to_vec();
        song.analyzed = true;
        Ok(true)
    }

    fn delete(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.inner.write().remove(id).is_some())
    }
}

pub fn open_or_create_db(path: &Path) -> Result<Database, StoreError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    if path.exists() {
        Ok(Database::open(path)?)
    } else {
        Ok(Database::create(path)?)
    }
}

fn encode_value<T: Serialize>(value: &T) -> Result<Vec<u8>, StoreError> {
    Ok(bincode::serialize(value)?)
}

fn decode_value<T: for<'de> Deserialize<'de>>(bytes: &[u8]) -> Result<T, StoreError> {
    Ok(bincode::deserialize(bytes)?)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use common::{Song, Tag};

    use super::{open_or_create_db, MemorySongStore, RedbSongStore, SongStore};

    fn song(id: &str, user_id: &str, uploaded_at: i64) -> Song {
        Song {
            id: id.to_string(),
            title: format!("Title {}", id),
            artist: "Unknown Artist".to_string(),
            album: "Unknown Album".to_string(),
            user_id: user_id.to_string(),
            file_url: format!("/media/{}/{}-f.mp3", user_id, id),
            file_name: "f.mp3".to_string(),
            file_size: 42,
            uploaded_at,
            tags: Vec::new(),
            analyzed: false,
            cover_art: None,
            duration_secs: None,
        }
    }

    fn exercise(store: &dyn SongStore) {
        store.insert(&song("a", "u1", 10)).unwrap();
        store.insert(&song("b", "u1", 30)).unwrap();
        store.insert(&song("c", "u2", 20)).unwrap();

        let listed = store.list_for_user("u1").unwrap();
        let ids: Vec<&str> = listed.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);

        let tags = vec![Tag {
            name: "Jazz".to_string(),
            confidence: 0.95,
        }];
        assert!(store.update_tags("a", &tags).unwrap());
        let fetched = store.get("a").unwrap().unwrap();
        assert!(fetched.analyzed);
        assert_eq!(fetched.tags, tags);
        assert_eq!(fetched.title, "Title a");

        assert!(!store.update_tags("missing", &tags).unwrap());

        assert!(store.delete("a").unwrap());
        assert!(!store.delete("a").unwrap());
        assert!(store.get("a").unwrap().is_none());
    }

    #[test]
    fn memory_store_contract() {
        let store = MemorySongStore::new();
        exercise(&store);
    }

    #[test]
    fn redb_store_contract() {
        let dir = tempfile::tempdir().unwrap();
        let db = open_or_create_db(&dir.path().join("songs.redb")).unwrap();
        let store = RedbSongStore::new(Arc::new(db));
        store.init_tables().unwrap();
        exercise(&store);
    }

    #[test]
    fn redb_insert_replaces_same_id() {
        let dir = tempfile::tempdir().unwrap();
        let db = open_or_create_db(&dir.path().join("songs.redb")).unwrap();
        let store = RedbSongStore::new(Arc::new(db));
        store.init_tables().unwrap();

        store.insert(&song("a", "u1", 10)).unwrap();
        let mut replacement = song("a", "u1", 99);
        replacement.title = "Replaced".to_string();
        store.insert(&replacement).unwrap();

        let listed = store.list_for_user("u1").unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].title, "Replaced");
    }
}
