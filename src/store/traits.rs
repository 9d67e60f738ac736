use async_trait::async_trait;
use thiserror::Error;

use crate::domain::EventRecord;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("{code}: {message}")]
    Rejected { code: String, message: String },
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Destination table for event records.
///
/// One handle is created per process and shared by every invocation.
#[async_trait]
pub trait EventStore: Send + Sync {
    fn table_name(&self) -> &str;

    /// Unconditional insert-or-replace keyed by `record.id`.
    async fn put_event(&self, record: &EventRecord) -> StoreResult<()>;
}
