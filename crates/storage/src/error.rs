use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rocksdb::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),
    #[error("Missing column family: {0}")]
    MissingColumnFamily(&'static str),
    #[error("Failed to acquire database lock: {0}")]
    Lock(String),
    #[error("Environment variable {0} must be set")]
    MissingEnv(&'static str),
    #[error("Malformed key of length {0}")]
    MalformedKey(usize),
}

pub type Result<T, E = StorageError> = std::result::Result<T, E>;
