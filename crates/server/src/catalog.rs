use std::collections::HashMap;
use std::sync::Arc;

use common::{Song, Tag};
use parking_lot::RwLock;

/// Authoritative in-memory set of song records for the running server,
/// plus the two playback cursors the player endpoints operate on. Every
/// mutation happens inside one write-lock critical section, so handlers
/// never observe a half-applied change.
#[derive(Clone)]
pub struct Catalog {
    inner: Arc<RwLock<CatalogInner>>,
}

#[derive(Default)]
struct CatalogInner {
    songs: Vec<Song>,
    selected: Option<String>,
    playing: Option<String>,
    is_playing: bool,
}

impl Catalog {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(CatalogInner::default())),
        }
    }

    /// Replace-in-place on id conflict, append otherwise. No duplicate ids
    /// survive the call.
    pub fn upsert(&self, song: Song) {
        let mut guard = self.inner.write();
        match guard.songs.iter().position(|s| s.id == song.id) {
            Some(index) => guard.songs[index] = song,
            None => guard.songs.push(song),
        }
    }

    /// Removes the record if present. A cursor referencing the removed id
    /// is cleared in the same critical section, and the playback flag
    /// drops when the playing record goes away.
    pub fn remove(&self, id: &str) -> bool {
        let mut guard = self.inner.write();
        let Some(index) = guard.songs.iter().position(|s| s.id == id) else {
            return false;
        };
        guard.songs.remove(index);
        if guard.selected.as_deref() == Some(id) {
            guard.selected = None;
        }
        if guard.playing.as_deref() == Some(id) {
            guard.playing = None;
            guard.is_playing = false;
        }
        true
    }

    /// Overwrites the tag list and marks the record analyzed; everything
    /// else is untouched. False when the id is not in the catalog.
    pub fn update_tags(&self, id: &str, tags: &[Tag]) -> bool {
        let mut guard = self.inner.write();
        let Some(song) = guard.songs.iter_mut().find(|s| s.id == id) else {
            return false;
        };
        song.tags = tags.to_vec();
        song.analyzed = true;
        true
    }

    /// Bulk load after a store fetch. Duplicates collapse by id with the
    /// later upload timestamp winning; cursors pointing at ids that did
    /// not survive the load are cleared.
    pub fn replace_all(&self, songs: Vec<Song>) {
        let deduped = dedup_by_id(songs);
        let mut guard = self.inner.write();
        guard.songs = deduped;
        if let Some(id) = guard.selected.clone() {
            if !guard.songs.iter().any(|s| s.id == id) {
                guard.selected = None;
            }
        }
        if let Some(id) = guard.playing.clone() {
            if !guard.songs.iter().any(|s| s.id == id) {
                guard.playing = None;
                guard.is_playing = false;
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<Song> {
        self.inner.read().songs.iter().find(|s| s.id == id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.inner.read().songs.iter().any(|s| s.id == id)
    }

    /// Read path handed to the UI; unique ids guaranteed even if the
    /// underlying list ever picked up a duplicate from a racing fetch.
    pub fn snapshot(&self) -> Vec<Song> {
        dedup_by_id(self.inner.read().songs.clone())
    }

    pub fn len(&self) -> usize {
        self.inner.read().songs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().songs.is_empty()
    }

    pub fn set_selected(&self, id: Option<String>) {
        self.inner.write().selected = id;
    }

    pub fn set_playing(&self, id: Option<String>) {
        self.inner.write().playing = id;
    }

    pub fn set_playback(&self, is_playing: bool) {
        self.inner.write().is_playing = is_playing;
    }

    pub fn selected(&self) -> Option<Song> {
        let guard = self.inner.read();
        let id = guard.selected.as_deref()?;
        guard.songs.iter().find(|s| s.id == id).cloned()
    }

    pub fn playing(&self) -> Option<Song> {
        let guard = self.inner.read();
        let id = guard.playing.as_deref()?;
        guard.songs.iter().find(|s| s.id == id).cloned()
    }

    pub fn is_playing(&self) -> bool {
        self.inner.read().is_playing
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

fn dedup_by_id(songs: Vec<Song>) -> Vec<Song> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut out: Vec<Song> = Vec::with_capacity(songs.len());
    for song in songs {
        match seen.get(&song.id) {
            Some(&index) => {
                if song.uploaded_at > out[index].uploaded_at {
                    out[index] = song;
                }
            }
            None => {
                seen.insert(song.id.clone(), out.len());
                out.push(song);
            }
        }
    }
    out
}
