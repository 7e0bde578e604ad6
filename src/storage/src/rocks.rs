//! RocksDB implementation of the versioned key-value store.

use mintledger_core::{ChangeSet, KvStore, LedgerError, Versioned};
use rocksdb::{IteratorMode, Options, WriteBatch, DB};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::errors::StorageError;

/// A versioned store on disk.
///
/// Each value is kept as a bincode [`Versioned`] envelope. Commits take the
/// database lock, check the read-set and apply the write-set as one
/// [`WriteBatch`], so a commit is all-or-nothing even across a crash.
#[derive(Clone)]
pub struct RocksStore {
    /// The RocksDB instance
    db: Arc<Mutex<DB>>,
    /// Where the database lives
    path: PathBuf,
}

impl RocksStore {
    /// Opens the store at `path`, creating the directory if it is missing.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let mut opts = Options::default();
        opts.create_if_missing(true);
        std::fs::create_dir_all(&path)?;

        let db = DB::open(&opts, &path)?;
        info!("Opened ledger store at {}", path.display());

        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            path,
        })
    }

    /// The database directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Copies every key and its raw value.
    pub fn snapshot(&self) -> Result<BTreeMap<String, Vec<u8>>, StorageError> {
        let db = self.lock()?;
        let mut entries = BTreeMap::new();
        for item in db.iterator(IteratorMode::Start) {
            let (key, bytes) = item?;
            let key = String::from_utf8(key.to_vec()).map_err(|e| StorageError::Corrupt {
                key: format!("{:?}", e.as_bytes()),
                reason: "key is not UTF-8".to_string(),
            })?;
            let envelope = decode_envelope(&key, &bytes)?;
            entries.insert(key, envelope.value);
        }
        Ok(entries)
    }

    fn lock(&self) -> Result<MutexGuard<'_, DB>, StorageError> {
        self.db.lock().map_err(|_| StorageError::LockPoisoned)
    }

    fn read(db: &DB, key: &str) -> Result<Option<Versioned>, StorageError> {
        match db.get(key.as_bytes())? {
            Some(bytes) => Ok(Some(decode_envelope(key, &bytes)?)),
            None => Ok(None),
        }
    }
}

fn decode_envelope(key: &str, bytes: &[u8]) -> Result<Versioned, StorageError> {
    bincode::deserialize(bytes).map_err(|e| StorageError::Corrupt {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

impl KvStore for RocksStore {
    fn get(&self, key: &str) -> Result<Option<Versioned>, LedgerError> {
        let db = self.lock()?;
        Ok(Self::read(&db, key)?)
    }

    fn commit(&self, changes: ChangeSet) -> Result<(), LedgerError> {
        let db = self.lock()?;

        for (key, observed) in &changes.reads {
            let current = Self::read(&db, key)?.map(|v| v.version);
            if current != *observed {
                warn!(key = key.as_str(), ?observed, ?current, "commit rejected");
                return Err(LedgerError::Conflict { key: key.clone() });
            }
        }
        if changes.is_read_only() {
            return Ok(());
        }

        let mut batch = WriteBatch::default();
        let count = changes.writes.len();
        for (key, value) in changes.writes {
            let version = Self::read(&db, &key)?.map_or(1, |v| v.version + 1);
            let envelope = bincode::serialize(&Versioned { version, value })
                .map_err(|e| StorageError::Serialization(e.to_string()))?;
            batch.put(key.as_bytes(), envelope);
        }
        db.write(batch).map_err(StorageError::from)?;

        debug!(writes = count, "committed");
        Ok(())
    }
}
