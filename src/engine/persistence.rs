//! The durable key-value boundary the store writes through.
//!
//! Each collection lives in its own slot as an opaque serialized blob. A read
//! distinguishes "absent" (never written) from "present but empty" so the
//! store can tell a first run apart from an initialized store with zero
//! entries.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::{Error, Result};

/// Opaque, byte-oriented durable storage for the store's slots.
#[async_trait]
pub trait PersistenceAdapter: Send + Sync {
    /// Reads one slot. `Ok(None)` means the slot has never been written.
    async fn load(&self, slot: &str) -> Result<Option<Vec<u8>>>;
    /// Overwrites one slot in full.
    async fn store(&self, slot: &str, bytes: Vec<u8>) -> Result<()>;
    /// Removes the named slots. Attempts every slot even when one fails and
    /// reports the first failure.
    async fn remove(&self, slots: &[&str]) -> Result<()>;
}

/// File-per-slot adapter.
///
/// Writes use an atomic write-then-rename strategy: bytes land in a temporary
/// file first and are renamed over the final destination, so a crash mid-write
/// never leaves a half-written slot behind.
pub struct FileAdapter {
    data_dir: PathBuf,
}

impl FileAdapter {
    /// Initializes the adapter in the specified directory, creating it if it
    /// does not exist.
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        if !dir.exists() {
            fs::create_dir_all(&dir)?;
        }
        Ok(Self { data_dir: dir })
    }

    fn slot_path(&self, slot: &str) -> PathBuf {
        self.data_dir.join(format!("{slot}.json"))
    }
}

#[async_trait]
impl PersistenceAdapter for FileAdapter {
    async fn load(&self, slot: &str) -> Result<Option<Vec<u8>>> {
        let path = self.slot_path(slot);
        let bytes = tokio::task::spawn_blocking(move || match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::from(e)),
        })
        .await
        .map_err(|e| Error::StorageUnavailable(e.to_string()))??;
        Ok(bytes)
    }

    async fn store(&self, slot: &str, bytes: Vec<u8>) -> Result<()> {
        let path = self.slot_path(slot);
        let temp_path = path.with_extension("json.tmp");
        tokio::task::spawn_blocking(move || -> Result<()> {
            fs::write(&temp_path, bytes)?;
            fs::rename(&temp_path, &path)?;
            Ok(())
        })
        .await
        .map_err(|e| Error::StorageUnavailable(e.to_string()))?
    }

    async fn remove(&self, slots: &[&str]) -> Result<()> {
        let paths: Vec<PathBuf> = slots.iter().map(|s| self.slot_path(s)).collect();
        tokio::task::spawn_blocking(move || {
            let mut first_err = None;
            for path in paths {
                match fs::remove_file(&path) {
                    Ok(()) => {}
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                    Err(e) => {
                        if first_err.is_none() {
                            first_err = Some(Error::from(e));
                        }
                    }
                }
            }
            match first_err {
                Some(e) => Err(e),
                None => Ok(()),
            }
        })
        .await
        .map_err(|e| Error::StorageUnavailable(e.to_string()))?
    }
}

/// In-memory adapter for embedded use and tests. Slots survive a simulated
/// process restart as long as the adapter itself is shared.
#[derive(Default)]
pub struct MemoryAdapter {
    slots: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-writes a slot, used to simulate pre-existing (or corrupt) state.
    pub fn preload(&self, slot: &str, bytes: Vec<u8>) {
        self.slots
            .lock()
            .expect("memory adapter lock poisoned")
            .insert(slot.to_string(), bytes);
    }

    pub fn contains(&self, slot: &str) -> bool {
        self.slots
            .lock()
            .expect("memory adapter lock poisoned")
            .contains_key(slot)
    }

    pub fn slot_count(&self) -> usize {
        self.slots
            .lock()
            .expect("memory adapter lock poisoned")
            .len()
    }
}

#[async_trait]
impl PersistenceAdapter for MemoryAdapter {
    async fn load(&self, slot: &str) -> Result<Option<Vec<u8>>> {
        Ok(self
            .slots
            .lock()
            .expect("memory adapter lock poisoned")
            .get(slot)
            .cloned())
    }

    async fn store(&self, slot: &str, bytes: Vec<u8>) -> Result<()> {
        self.slots
            .lock()
            .expect("memory adapter lock poisoned")
            .insert(slot.to_string(), bytes);
        Ok(())
    }

    async fn remove(&self, slots: &[&str]) -> Result<()> {
        let mut guard = self.slots.lock().expect("memory adapter lock poisoned");
        for slot in slots {
            guard.remove(*slot);
        }
        Ok(())
    }
}
