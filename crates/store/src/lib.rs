mod objects;
mod songs;

pub use objects::{FsObjectStore, MemoryObjectStore, ObjectStore};
pub use songs::{open_or_create_db, MemorySongStore, RedbSongStore, SongStore};

/// Storage key for an uploaded file, namespaced by owner. The id and the
/// original file name are both kept in the key so a record alone is enough
/// to locate its bytes later.
pub fn object_key(user_id: &str, id: &str, file_name: &str) -> String {
    format!("{}/{}-{}", user_id, id, file_name)
}

#[derive(Debug)]
pub enum StoreError {
    Io(std::io::Error),
    Database(redb::DatabaseError),
    Table(redb::TableError),
    Transaction(redb::TransactionError),
    Storage(redb::StorageError),
    Commit(redb::CommitError),
    Bincode(Box<bincode::ErrorKind>),
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err)
    }
}

impl From<redb::DatabaseError> for StoreError {
    fn from(err: redb::DatabaseError) -> Self {
        StoreError::Database(err)
    }
}

impl From<redb::TableError> for StoreError {
    fn from(err: redb::TableError) -> Self {
        StoreError::Table(err)
    }
}

impl From<redb::TransactionError> for StoreError {
    fn from(err: redb::TransactionError) -> Self {
        StoreError::Transaction(err)
    }
}

impl From<redb::StorageError> for StoreError {
    fn from(err: redb::StorageError) -> Self {
        StoreError::Storage(err)
    }
}

impl From<redb::CommitError> for StoreError {
    fn from(err: redb::CommitError) -> Self {
        StoreError::Commit(err)
    }
}

impl From<Box<bincode::ErrorKind>> for StoreError {
    fn from(err: Box<bincode::ErrorKind>) -> Self {
        StoreError::Bincode(err)
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Io(err) => write!(f, "io error: {}", err),
            StoreError::Database(err) => write!(f, "redb database error: {}", err),
            StoreError::Table(err) => write!(f, "redb table error: {}", err),
            StoreError::Transaction(err) => write!(f, "redb transaction error: {}", err),
            StoreError::Storage(err) => write!(f, "redb storage error: {}", err),
            StoreError::Commit(err) => write!(f, "redb commit error: {}", err),
            StoreError::Bincode(err) => write!(f, "bincode error: {}", err),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Io(err) => Some(err),
            StoreError::Database(err) => Some(err),
            StoreError::Table(err) => Some(err),
            StoreError::Transaction(err) => Some(err),
            StoreError::Storage(err) => Some(err),
            StoreError::Commit(err) => Some(err),
            StoreError::Bincode(err) => Some(err),
        }
    }
}
