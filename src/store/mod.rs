/*!
 * Content Store
 * Durable home of every portfolio document plus uploaded files
 */
pub mod blob;
pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

pub use blob::{BlobStore, Bucket, DiskBlobStore, MemoryBlobStore};
pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("document encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("blob storage error: {0}")]
    Blob(#[from] std::io::Error),

    #[error("unknown {table} id {id}")]
    UnknownId { table: &'static str, id: Uuid },
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Tables holding ordered or timestamped documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Projects,
    Experience,
    Skills,
    SocialLinks,
    Messages,
}

/// Read order of a table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOrder {
    DisplayOrder,
    NewestFirst,
}

impl Table {
    pub const ALL: [Table; 5] = [
        Table::Projects,
        Table::Experience,
        Table::Skills,
        Table::SocialLinks,
        Table::Messages,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Table::Projects => "projects",
            Table::Experience => "experience",
            Table::Skills => "skills",
            Table::SocialLinks => "social_links",
            Table::Messages => "messages",
        }
    }

    pub fn read_order(self) -> ReadOrder {
        match self {
            Table::Messages => ReadOrder::NewestFirst,
            _ => ReadOrder::DisplayOrder,
        }
    }
}

/// One stored row: store-owned envelope around the entity document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Document {
    pub id: Uuid,
    pub display_order: i32,
    pub data: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The singleton profile row of one owner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProfileDocument {
    pub owner_id: String,
    pub data: Value,
    pub updated_at: DateTime<Utc>,
}

/// Category rename to cascade over `skills.category`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRename {
    pub from: String,
    pub to: String,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Short backend name for health output
    fn backend(&self) -> &'static str;

    /// Round-trip latency to the backend
    async fn health_check(&self) -> StoreResult<Duration>;

    /// All documents of a table in its read order
    async fn list(&self, table: Table) -> StoreResult<Vec<Document>>;

    async fn get(&self, table: Table, id: Uuid) -> StoreResult<Option<Document>>;

    /// Insert a document at the end of the table's display order
    async fn insert(&self, table: Table, data: Value) -> StoreResult<Document>;

    /// Replace a whole document; `None` when the id does not exist
    async fn update(&self, table: Table, id: Uuid, data: Value) -> StoreResult<Option<Document>>;

    /// Delete by id and close the gap in display order. Returns whether a row was removed.
    async fn delete(&self, table: Table, id: Uuid) -> StoreResult<bool>;

    /// Rewrite every listed row's display order to its 1-based position, atomically
    async fn reorder(&self, table: Table, ids: &[Uuid]) -> StoreResult<()>;

    /// Write a single top-level field of a document
    async fn set_field(
        &self,
        table: Table,
        id: Uuid,
        field: &str,
        value: Value,
    ) -> StoreResult<Option<Document>>;

    async fn get_profile(&self, owner_id: &str) -> StoreResult<Option<ProfileDocument>>;

    /// Upsert the owner's profile document
    async fn put_profile(&self, owner_id: &str, data: Value) -> StoreResult<ProfileDocument>;

    /// Replace the profile's `skill_categories` and, when a rename is given, move every
    /// skill of the old category to the new name in the same transaction.
    /// Returns the number of skills rewritten.
    async fn save_categories(
        &self,
        owner_id: &str,
        categories: Value,
        rename: Option<CategoryRename>,
    ) -> StoreResult<u64>;
}
