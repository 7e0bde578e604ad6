//! Key-value store seam and the per-invocation read/write buffer.
//!
//! The engine never writes to a store directly. Each operation runs inside an
//! [`Invocation`], which remembers the version of every key it read and
//! buffers every write. [`Invocation::commit`] hands both sets to the store,
//! which must apply the writes atomically and only if none of the read keys
//! changed in the meantime.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use tracing::{debug, warn};

use crate::codec;
use crate::errors::LedgerError;

/// Version of a stored key. Bumped on every committed write.
pub type Version = u64;

/// A stored value together with its version.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Versioned {
    /// Version of this value, starting at 1
    pub version: Version,
    /// The encoded record
    pub value: Vec<u8>,
}

/// Everything one invocation read and wants to write.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChangeSet {
    /// Keys read and the version observed; `None` means the key was absent
    pub reads: Vec<(String, Option<Version>)>,
    /// Keys to write and their new values
    pub writes: Vec<(String, Vec<u8>)>,
}

impl ChangeSet {
    /// Whether the invocation staged no writes.
    pub fn is_read_only(&self) -> bool {
        self.writes.is_empty()
    }
}

/// A versioned key-value store with optimistic commit.
pub trait KvStore {
    /// Reads the current value and version of `key`.
    fn get(&self, key: &str) -> Result<Option<Versioned>, LedgerError>;

    /// Applies `changes.writes` as one atomic unit.
    ///
    /// Must fail with [`LedgerError::Conflict`] and apply nothing if any key
    /// in `changes.reads` is no longer at the observed version.
    fn commit(&self, changes: ChangeSet) -> Result<(), LedgerError>;
}

/// The read-set and write-set of one engine operation.
pub struct Invocation<'s, S: KvStore + ?Sized> {
    store: &'s S,
    reads: BTreeMap<String, Option<Versioned>>,
    writes: BTreeMap<String, Vec<u8>>,
}

impl<'s, S: KvStore + ?Sized> Invocation<'s, S> {
    /// Starts an invocation against `store`.
    pub fn begin(store: &'s S) -> Self {
        Self {
            store,
            reads: BTreeMap::new(),
            writes: BTreeMap::new(),
        }
    }

    /// Reads `key`, preferring this invocation's own staged write.
    ///
    /// The first read of a key pins the observed version; later reads of the
    /// same key return the pinned value.
    pub fn get(&mut self, key: &str) -> Result<Option<Vec<u8>>, LedgerError> {
        if let Some(value) = self.writes.get(key) {
            return Ok(Some(value.clone()));
        }
        if let Some(observed) = self.reads.get(key) {
            return Ok(observed.as_ref().map(|v| v.value.clone()));
        }

        let observed = self.store.get(key)?;
        debug!(
            key,
            version = observed.as_ref().map(|v| v.version),
            "read"
        );
        let value = observed.as_ref().map(|v| v.value.clone());
        self.reads.insert(key.to_string(), observed);
        Ok(value)
    }

    /// Reads and decodes the record under `key`.
    pub fn get_record<T: DeserializeOwned>(&mut self, key: &str) -> Result<Option<T>, LedgerError> {
        match self.get(key)? {
            Some(bytes) => Ok(Some(codec::decode(key, &bytes)?)),
            None => Ok(None),
        }
    }

    /// Stages a raw write.
    pub fn put(&mut self, key: impl Into<String>, value: Vec<u8>) {
        let key = key.into();
        debug!(key = key.as_str(), bytes = value.len(), "staged write");
        self.writes.insert(key, value);
    }

    /// Encodes and stages a record write.
    pub fn put_record<T: Serialize>(
        &mut self,
        key: impl Into<String>,
        record: &T,
    ) -> Result<(), LedgerError> {
        let bytes = codec::encode(record)?;
        self.put(key, bytes);
        Ok(())
    }

    /// The read-set and write-set gathered so far.
    pub fn change_set(&self) -> ChangeSet {
        ChangeSet {
            reads: self
                .reads
                .iter()
                .map(|(key, observed)| (key.clone(), observed.as_ref().map(|v| v.version)))
                .collect(),
            writes: self
                .writes
                .iter()
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
        }
    }

    /// Hands the buffered writes to the store. Read-only invocations commit
    /// nothing.
    pub fn commit(self) -> Result<(), LedgerError> {
        let changes = self.change_set();
        if changes.is_read_only() {
            return Ok(());
        }
        self.store.commit(changes)
    }

    /// Submits the read-set even when nothing was written, so the store
    /// confirms every value read is still current.
    pub fn validate(self) -> Result<(), LedgerError> {
        self.store.commit(self.change_set())
    }
}

/// An in-process store. Commits are checked and applied under one mutex.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Versioned>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies every key and its raw value.
    pub fn snapshot(&self) -> Result<BTreeMap<String, Vec<u8>>, LedgerError> {
        let entries = self.lock()?;
        Ok(entries
            .iter()
            .map(|(key, v)| (key.clone(), v.value.clone()))
            .collect())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Versioned>>, LedgerError> {
        self.entries
            .lock()
            .map_err(|_| LedgerError::Storage("memory store lock poisoned".to_string()))
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Versioned>, LedgerError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn commit(&self, changes: ChangeSet) -> Result<(), LedgerError> {
        let mut entries = self.lock()?;

        for (key, observed) in &changes.reads {
            let current = entries.get(key).map(|v| v.version);
            if current != *observed {
                warn!(key = key.as_str(), ?observed, ?current, "commit rejected");
                return Err(LedgerError::Conflict { key: key.clone() });
            }
        }

        for (key, value) in changes.writes {
            let version = entries.get(&key).map_or(1, |v| v.version + 1);
            entries.insert(key, Versioned { version, value });
        }

        Ok(())
    }
}

impl<S: KvStore + ?Sized> KvStore for std::sync::Arc<S> {
    fn get(&self, key: &str) -> Result<Option<Versioned>, LedgerError> {
        (**self).get(key)
    }

    fn commit(&self, changes: ChangeSet) -> Result<(), LedgerError> {
        (**self).commit(changes)
    }
}
