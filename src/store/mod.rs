// 🗄️ Guest Store - the collection contract the directory runs on
//
// Any document or relational backend works as long as it can list every
// record, insert, patch and delete by id.

pub mod document;
pub mod memory;
pub mod sqlite;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::guest::{GuestInput, GuestPatch, GuestRecord};

pub use document::GuestDocument;
pub use memory::MemoryGuestStore;
pub use sqlite::SqliteGuestStore;

/// Persistence port for guest records.
#[async_trait]
pub trait GuestStore: Send + Sync {
    /// Every record, newest first.
    async fn list_all(&self) -> Result<Vec<GuestRecord>, StoreError>;

    /// Persist a new record; the store assigns `id` and `created_at`.
    async fn insert(&self, input: GuestInput) -> Result<String, StoreError>;

    /// Apply a partial update to an existing record.
    async fn update(&self, id: &str, patch: GuestPatch) -> Result<(), StoreError>;

    /// Remove a record. Unknown ids are `NotFound`.
    async fn delete(&self, id: &str) -> Result<(), StoreError>;
}
