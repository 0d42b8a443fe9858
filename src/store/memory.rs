// In-memory guest store, used by tests and ephemeral runs

use async_trait::async_trait;
use chrono::Utc;
use std::sync::{Arc, RwLock};

use super::GuestStore;
use crate::error::StoreError;
use crate::guest::{GuestInput, GuestPatch, GuestRecord};

/// Records kept in insertion order; `list_all` returns them newest first.
#[derive(Clone, Default)]
pub struct MemoryGuestStore {
    records: Arc<RwLock<Vec<GuestRecord>>>,
}

impl MemoryGuestStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with existing records (oldest first).
    pub fn with_records(records: Vec<GuestRecord>) -> Self {
        MemoryGuestStore {
            records: Arc::new(RwLock::new(records)),
        }
    }

    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Vec<GuestRecord>>, StoreError> {
        self.records
            .read()
            .map_err(|_| StoreError::Unavailable("guest registry lock poisoned".to_string()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Vec<GuestRecord>>, StoreError> {
        self.records
            .write()
            .map_err(|_| StoreError::Unavailable("guest registry lock poisoned".to_string()))
    }
}

#[async_trait]
impl GuestStore for MemoryGuestStore {
    async fn list_all(&self) -> Result<Vec<GuestRecord>, StoreError> {
        let records = self.read()?;
        Ok(records.iter().rev().cloned().collect())
    }

    async fn insert(&self, input: GuestInput) -> Result<String, StoreError> {
        let id = uuid::Uuid::new_v4().to_string();
        let record = GuestRecord::from_input(id.clone(), input, Utc::now());
        self.write()?.push(record);
        Ok(id)
    }

    async fn update(&self, id: &str, patch: GuestPatch) -> Result<(), StoreError> {
        let mut records = self.write()?;
        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        record.apply(&patch);
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let mut records = self.write()?;
        let before = records.len();
        records.retain(|r| r.id != id);
        if records.len() == before {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }
}
