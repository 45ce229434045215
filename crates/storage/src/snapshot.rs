// This module contains the ExitTreeSnapshotStore, a wrapper around the RocksDB database.
// It stores the state of each network's local exit tree after every deposit, so
// claim proofs can be rebuilt against any root that was ever published, and
// keeps the claim proofs that were already generated.
//
// Snapshots live in the "snapshots" column family, keyed by network id followed
// by the deposit count of the tree (both big endian, so keys sort by network
// and then by age). Claim proofs live in "claims", keyed by the 32-byte global index.

use std::env;
use std::path::Path;
use std::sync::{Arc, RwLock};

use alloy_primitives::B256;
use dotenvy::dotenv;
use exit_tree_types::{ClaimProof, ExitTree, GlobalIndex};
use rocksdb::{ColumnFamilyDescriptor, DB, Direction, IteratorMode, Options};
use tracing::{debug, info};

use crate::Storage;
use crate::error::{Result, StorageError};

const CF_SNAPSHOTS: &str = "snapshots";
const CF_CLAIMS: &str = "claims";
const SNAPSHOT_KEY_LENGTH: usize = 12;

pub const SNAPSHOT_STORE_ENV: &str = "EXIT_TREE_SNAPSHOT_STORE";

pub struct ExitTreeSnapshotStore {
    pub db: Arc<RwLock<DB>>,
}

impl Storage for ExitTreeSnapshotStore {
    fn from_env() -> Result<Self> {
        dotenv().ok();
        let path = env::var(SNAPSHOT_STORE_ENV).map_err(|_| StorageError::MissingEnv(SNAPSHOT_STORE_ENV))?;
        Self::new(path)
    }

    fn get_cfs() -> Vec<ColumnFamilyDescriptor> {
        vec![
            ColumnFamilyDescriptor::new(CF_SNAPSHOTS, Options::default()),
            ColumnFamilyDescriptor::new(CF_CLAIMS, Options::default()),
        ]
    }

    fn get_opts() -> Options {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);
        opts
    }
}

fn snapshot_key(network_id: u32, deposit_count: u64) -> [u8; SNAPSHOT_KEY_LENGTH] {
    let mut key = [0u8; SNAPSHOT_KEY_LENGTH];
    key[..4].copy_from_slice(&network_id.to_be_bytes());
    key[4..].copy_from_slice(&deposit_count.to_be_bytes());
    key
}

fn claim_key(global_index: GlobalIndex) -> B256 {
    B256::from(global_index.to_u256())
}

impl ExitTreeSnapshotStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = DB::open_cf_descriptors(&Self::get_opts(), path.as_ref(), Self::get_cfs())?;
        info!(path = %path.as_ref().display(), "opened exit tree snapshot store");
        Ok(Self {
            db: Arc::new(RwLock::new(db)),
        })
    }

    /// Stores the tree under its current deposit count, replacing any earlier
    /// snapshot of the same size.
    pub fn insert_snapshot(&self, network_id: u32, tree: &ExitTree) -> Result<()> {
        // Serialize outside the lock to minimize lock duration
        let serialized = bincode::serialize(tree)?;
        let key = snapshot_key(network_id, tree.count());

        let write_lock = self.db.write().map_err(|e| StorageError::Lock(e.to_string()))?;
        let cf = write_lock
            .cf_handle(CF_SNAPSHOTS)
            .ok_or(StorageError::MissingColumnFamily(CF_SNAPSHOTS))?;
        write_lock.put_cf(cf, key, serialized)?;
        debug!(network_id, deposit_count = tree.count(), "stored exit tree snapshot");
        Ok(())
    }

    pub fn get_snapshot(&self, network_id: u32, deposit_count: u64) -> Result<Option<ExitTree>> {
        let read_lock = self.db.read().map_err(|e| StorageError::Lock(e.to_string()))?;
        let cf = read_lock
            .cf_handle(CF_SNAPSHOTS)
            .ok_or(StorageError::MissingColumnFamily(CF_SNAPSHOTS))?;
        match read_lock.get_cf(cf, snapshot_key(network_id, deposit_count))? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Snapshot with the highest deposit count recorded for `network_id`.
    pub fn latest_snapshot(&self, network_id: u32) -> Result<Option<ExitTree>> {
        let read_lock = self.db.read().map_err(|e| StorageError::Lock(e.to_string()))?;
        let cf = read_lock
            .cf_handle(CF_SNAPSHOTS)
            .ok_or(StorageError::MissingColumnFamily(CF_SNAPSHOTS))?;
        let upper = snapshot_key(network_id, u64::MAX);
        let mut iter = read_lock.iterator_cf(cf, IteratorMode::From(&upper, Direction::Reverse));
        let Some(entry) = iter.next() else {
            return Ok(None);
        };
        let (key, value) = entry?;
        if key.len() != SNAPSHOT_KEY_LENGTH {
            return Err(StorageError::MalformedKey(key.len()));
        }
        if key[..4] != network_id.to_be_bytes() {
            return Ok(None);
        }
        Ok(Some(bincode::deserialize(&value)?))
    }

    pub fn insert_claim(&self, proof: &ClaimProof) -> Result<()> {
        let serialized = bincode::serialize(proof)?;

        let write_lock = self.db.write().map_err(|e| StorageError::Lock(e.to_string()))?;
        let cf = write_lock
            .cf_handle(CF_CLAIMS)
            .ok_or(StorageError::MissingColumnFamily(CF_CLAIMS))?;
        write_lock.put_cf(cf, claim_key(proof.global_index), serialized)?;
        debug!(global_index = %proof.global_index, "stored claim proof");
        Ok(())
    }

    pub fn get_claim(&self, global_index: GlobalIndex) -> Result<Option<ClaimProof>> {
        let read_lock = self.db.read().map_err(|e| StorageError::Lock(e.to_string()))?;
        let cf = read_lock
            .cf_handle(CF_CLAIMS)
            .ok_or(StorageError::MissingColumnFamily(CF_CLAIMS))?;
        match read_lock.get_cf(cf, claim_key(global_index))? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn prune_all(&self) -> Result<()> {
        let mut write_lock = self.db.write().map_err(|e| StorageError::Lock(e.to_string()))?;
        for name in [CF_SNAPSHOTS, CF_CLAIMS] {
            write_lock.drop_cf(name)?;
            write_lock.create_cf(name, &Options::default())?;
        }
        info!("pruned exit tree snapshot store");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::B256;
    use exit_tree_types::{ExitRootAccumulator, Origin};
    use tempfile::TempDir;

    use super::*;

    fn leaf(byte: u8) -> B256 {
        B256::repeat_byte(byte)
    }

    fn open() -> (TempDir, ExitTreeSnapshotStore) {
        let dir = TempDir::new().unwrap();
        let store = ExitTreeSnapshotStore::new(dir.path()).unwrap();
        (dir, store)
    }

    #[test]
    fn test_insert_snapshot() {
        let (_dir, store) = open();
        let mut tree = ExitTree::new(32).unwrap();
        for i in 1..=3 {
            tree.insert(leaf(i)).unwrap();
            store.insert_snapshot(1, &tree).unwrap();
        }

        let second = store.get_snapshot(1, 2).unwrap().unwrap();
        assert_eq!(second.count(), 2);
        assert_eq!(second.root(), ExitTree::from_leaves(32, [leaf(1), leaf(2)]).unwrap().root());
        assert_eq!(store.get_snapshot(1, 4).unwrap(), None);
        assert_eq!(store.get_snapshot(2, 2).unwrap(), None);
    }

    #[test]
    fn test_latest_snapshot_per_network() {
        let (_dir, store) = open();
        assert_eq!(store.latest_snapshot(0).unwrap(), None);

        let mut mainnet = ExitTree::new(32).unwrap();
        let mut rollup = ExitTree::new(32).unwrap();
        for i in 0..5 {
            mainnet.insert(leaf(i)).unwrap();
            store.insert_snapshot(0, &mainnet).unwrap();
        }
        rollup.insert(leaf(9)).unwrap();
        store.insert_snapshot(1, &rollup).unwrap();

        assert_eq!(store.latest_snapshot(0).unwrap(), Some(mainnet));
        assert_eq!(store.latest_snapshot(1).unwrap(), Some(rollup));
        // network 2 sorts after network 1 but has nothing stored
        assert_eq!(store.latest_snapshot(2).unwrap(), None);
    }

    #[test]
    fn test_insert_claim() {
        let (_dir, store) = open();
        let mut acc = ExitRootAccumulator::new(32).unwrap();
        let rollup = acc.add_rollup().unwrap();
        acc.insert(Origin::Mainnet, leaf(1)).unwrap();
        let index = acc.insert(Origin::Rollup(rollup), leaf(2)).unwrap();
        let proof = acc.claim_proof(index).unwrap();

        assert_eq!(store.get_claim(index).unwrap(), None);
        store.insert_claim(&proof).unwrap();
        let stored = store.get_claim(index).unwrap().unwrap();
        assert_eq!(stored, proof);
        assert!(stored.verify(leaf(2)).unwrap());
        assert_eq!(store.get_claim(GlobalIndex::mainnet(0)).unwrap(), None);
    }

    #[test]
    fn test_prune_all() {
        let (_dir, store) = open();
        let tree = ExitTree::from_leaves(32, [leaf(1)]).unwrap();
        store.insert_snapshot(0, &tree).unwrap();
        let mut acc = ExitRootAccumulator::new(32).unwrap();
        let index = acc.insert(Origin::Mainnet, leaf(1)).unwrap();
        store.insert_claim(&acc.claim_proof(index).unwrap()).unwrap();

        store.prune_all().unwrap();
        assert_eq!(store.latest_snapshot(0).unwrap(), None);
        assert_eq!(store.get_claim(index).unwrap(), None);

        store.insert_snapshot(0, &tree).unwrap();
        assert_eq!(store.latest_snapshot(0).unwrap(), Some(tree));
    }

    #[test]
    fn test_corrupt_snapshot_is_an_error() {
        let (_dir, store) = open();
        // height 8 with a single node level
        let corrupt = bincode::serialize(&(8usize, vec![vec![leaf(1)]])).unwrap();
        {
            let db = store.db.write().unwrap();
            let cf = db.cf_handle(CF_SNAPSHOTS).unwrap();
            db.put_cf(cf, snapshot_key(0, 1), corrupt).unwrap();
        }
        assert!(matches!(store.get_snapshot(0, 1), Err(StorageError::Serialization(_))));
        assert!(matches!(store.latest_snapshot(0), Err(StorageError::Serialization(_))));
    }

    #[test]
    fn test_from_env() {
        let dir = TempDir::new().unwrap();
        // SAFETY: no other test touches this variable
        unsafe { env::set_var(SNAPSHOT_STORE_ENV, dir.path()) };
        let tree = ExitTree::from_leaves(32, [leaf(4)]).unwrap();
        {
            let store = ExitTreeSnapshotStore::from_env().unwrap();
            store.insert_snapshot(0, &tree).unwrap();
        }
        assert_eq!(
            ExitTreeSnapshotStore::new(dir.path()).unwrap().latest_snapshot(0).unwrap(),
            Some(tree)
        );

        unsafe { env::remove_var(SNAPSHOT_STORE_ENV) };
        assert!(matches!(
            ExitTreeSnapshotStore::from_env(),
            Err(StorageError::MissingEnv(SNAPSHOT_STORE_ENV))
        ));
    }

    #[test]
    fn test_reopen_keeps_snapshots() {
        let dir = TempDir::new().unwrap();
        let tree = ExitTree::from_leaves(32, [leaf(1), leaf(2)]).unwrap();
        {
            let store = ExitTreeSnapshotStore::new(dir.path()).unwrap();
            store.insert_snapshot(3, &tree).unwrap();
        }
        let store = ExitTreeSnapshotStore::new(dir.path()).unwrap();
        assert_eq!(store.get_snapshot(3, 2).unwrap(), Some(tree));
    }
}
