//! sled-backed durable tier for [`ResultCache`](crate::utils::cache::ResultCache).

use crate::domain::ports::DurableStore;
use crate::utils::error::Result;
use sled::Db;
use std::path::Path;

pub struct SledStore {
    db: Db,
}

impl SledStore {
    /// Opens or creates a sled database at the given path.
    pub fn open_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    /// Throwaway database, removed when dropped.
    pub fn temporary() -> Result<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(Self { db })
    }

    pub fn flush(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.db.len()
    }

    pub fn is_empty(&self) -> bool {
        self.db.is_empty()
    }
}

impl DurableStore for SledStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.db.get(key.as_bytes())?.map(|value| value.to_vec()))
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<()> {
        self.db.insert(key.as_bytes(), value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.db.remove(key.as_bytes())?;
        Ok(())
    }

    fn remove_prefix(&self, prefix: &str) -> Result<usize> {
        let mut removed = 0;
        for entry in self.db.scan_prefix(prefix.as_bytes()) {
            let (key, _) = entry?;
            self.db.remove(key)?;
            removed += 1;
        }
        Ok(removed)
    }
}
