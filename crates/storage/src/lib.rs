use rocksdb::{ColumnFamilyDescriptor, Options};

pub mod error;
pub mod snapshot;

pub use error::{Result, StorageError};
pub use snapshot::ExitTreeSnapshotStore;

// every storage module should implement this trait
pub trait Storage: Sized {
    fn from_env() -> Result<Self>;
    fn get_cfs() -> Vec<ColumnFamilyDescriptor>;
    fn get_opts() -> Options;
}
