use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{EventStore, StoreResult};
use crate::domain::EventRecord;

/// Process-local store used for dry runs and tests.
#[derive(Default)]
pub struct InMemoryEventStore {
    table_name: String,
    records: RwLock<Vec<EventRecord>>,
}

impl InMemoryEventStore {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            records: RwLock::new(Vec::new()),
        }
    }

    pub async fn records(&self) -> Vec<EventRecord> {
        self.records.read().await.clone()
    }

    pub async fn get(&self, id: &str) -> Option<EventRecord> {
        self.records
            .read()
            .await
            .iter()
            .find(|record| record.id == id)
            .cloned()
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    fn table_name(&self) -> &str {
        &self.table_name
    }

    async fn put_event(&self, record: &EventRecord) -> StoreResult<()> {
        let mut records = self.records.write().await;
        match records.iter_mut().find(|existing| existing.id == record.id) {
            Some(existing) => *existing = record.clone(),
            None => records.push(record.clone()),
        }
        Ok(())
    }
}
