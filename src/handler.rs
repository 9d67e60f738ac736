use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::domain::{
    CreateEventRequest, EventRecord, RequestEnvelope, ResponseEnvelope, REQUIRED_FIELDS,
};
use crate::error::IngestError;
use crate::store::EventStore;

/// Turns an invocation envelope into a stored event and a response.
pub struct EventHandler {
    store: Arc<dyn EventStore>,
}

impl EventHandler {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self { store }
    }

    pub async fn handle(&self, envelope: RequestEnvelope) -> ResponseEnvelope {
        self.handle_at(envelope, Utc::now()).await
    }

    /// Same as [`handle`](Self::handle) with an explicit invocation time, used
    /// for defaulted timestamps.
    pub async fn handle_at(&self, envelope: RequestEnvelope, now: DateTime<Utc>) -> ResponseEnvelope {
        match self.create_event(&envelope, now).await {
            Ok(event_id) => {
                tracing::info!(%event_id, "returning 201 Created");
                ResponseEnvelope::created(&event_id)
            }
            Err(err) => err.into_response(),
        }
    }

    async fn create_event(
        &self,
        envelope: &RequestEnvelope,
        now: DateTime<Utc>,
    ) -> Result<String, IngestError> {
        if tracing::enabled!(tracing::Level::DEBUG) {
            let event = serde_json::to_string(envelope).unwrap_or_default();
            tracing::debug!(%event, "received invocation");
        }

        let request = decode_body(envelope.body())?;
        tracing::info!("body parsed successfully");

        let fields = request.validate().map_err(|field| {
            tracing::warn!(field, "missing required field");
            IngestError::MissingField(field)
        })?;
        tracing::debug!(fields = ?REQUIRED_FIELDS, "all required fields present");

        let record = EventRecord::new(fields, now);
        if tracing::enabled!(tracing::Level::DEBUG) {
            let item = serde_json::to_string(&record).unwrap_or_default();
            tracing::debug!(%item, "constructed item");
        }

        let table = self.store.table_name();
        if let Err(err) = self.store.put_event(&record).await {
            tracing::error!(table, id = %record.id, error = %err, "failed to write item");
            return Err(err.into());
        }
        tracing::info!(table, id = %record.id, "wrote item");

        Ok(record.id)
    }
}

/// Parses the raw body into a request. Anything other than a JSON object is
/// rejected as malformed.
pub fn decode_body(body: &str) -> Result<CreateEventRequest, IngestError> {
    let value: Value = serde_json::from_str(body).map_err(|e| {
        tracing::warn!(error = %e, "could not parse body as JSON");
        IngestError::InvalidPayload(e.to_string())
    })?;

    if !value.is_object() {
        tracing::warn!("body is JSON but not an object");
        return Err(IngestError::InvalidPayload(
            "expected a JSON object".to_string(),
        ));
    }

    serde_json::from_value(value).map_err(|e| IngestError::InvalidPayload(e.to_string()))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use aws_sdk_dynamodb::types::AttributeValue;
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;
    use crate::store::{to_attribute, InMemoryEventStore, StoreError, StoreResult};

    struct FailingStore {
        attempts: AtomicUsize,
    }

    #[async_trait]
    impl EventStore for FailingStore {
        fn table_name(&self) -> &str {
            "events"
        }

        async fn put_event(&self, _record: &EventRecord) -> StoreResult<()> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(StoreError::Unavailable("connection reset".to_string()))
        }
    }

    fn handler() -> (EventHandler, Arc<InMemoryEventStore>) {
        let store = Arc::new(InMemoryEventStore::new("events"));
        (EventHandler::new(store.clone()), store)
    }

    fn valid_body() -> String {
        json!({
            "status": "open",
            "schedule": "2024-01-01",
            "content": "review",
            "person_in_charge": "alice"
        })
        .to_string()
    }

    #[tokio::test]
    async fn creates_event_and_returns_id() {
        let (handler, store) = handler();

        let response = handler.handle(RequestEnvelope::with_body(valid_body())).await;
        let body = response.parse_body().unwrap();

        assert_eq!(response.status_code, 201);
        assert_eq!(body.message, "Event created");
        let event_id = body.event_id.expect("event id");
        assert!(uuid::Uuid::parse_str(&event_id).is_ok());

        let stored = store.get(&event_id).await.expect("record stored");
        assert_eq!(stored.status, json!("open"));
        assert_eq!(stored.person_in_charge, json!("alice"));
    }

    #[tokio::test]
    async fn identical_requests_create_distinct_records() {
        let (handler, store) = handler();

        let first = handler.handle(RequestEnvelope::with_body(valid_body())).await;
        let second = handler.handle(RequestEnvelope::with_body(valid_body())).await;

        assert_ne!(
            first.parse_body().unwrap().event_id,
            second.parse_body().unwrap().event_id
        );
        assert_eq!(store.records().await.len(), 2);
    }

    #[tokio::test]
    async fn ignores_caller_supplied_id() {
        let (handler, store) = handler();
        let mut body: Value = serde_json::from_str(&valid_body()).unwrap();
        body["id"] = json!("caller-chosen");

        let response = handler
            .handle(RequestEnvelope::with_body(body.to_string()))
            .await;

        let event_id = response.parse_body().unwrap().event_id.unwrap();
        assert_ne!(event_id, "caller-chosen");
        assert!(store.get("caller-chosen").await.is_none());
    }

    #[tokio::test]
    async fn defaults_timestamps_to_invocation_time() {
        let (handler, store) = handler();
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();

        handler
            .handle_at(RequestEnvelope::with_body(valid_body()), now)
            .await;

        let record = &store.records().await[0];
        assert_eq!(record.create_time, json!("2024-06-01T12:00:00Z"));
        assert_eq!(record.update_time, record.create_time);
    }

    #[tokio::test]
    async fn keeps_large_integers_exact() {
        let (handler, store) = handler();
        let body = r#"{"status":12345678901234567890123,"schedule":"s","content":"c","person_in_charge":"p"}"#;

        let response = handler.handle(RequestEnvelope::with_body(body)).await;
        assert_eq!(response.status_code, 201);

        let record = &store.records().await[0];
        assert_eq!(record.status.to_string(), "12345678901234567890123");
        assert_eq!(
            to_attribute(&record.status),
            AttributeValue::N("12345678901234567890123".to_string())
        );
    }

    #[tokio::test]
    async fn rejects_unparseable_body() {
        let (handler, store) = handler();

        for raw in ["not-json", "[1, 2]", "\"status\""] {
            let response = handler.handle(RequestEnvelope::with_body(raw)).await;

            assert_eq!(response.status_code, 400, "body {raw}");
            assert_eq!(
                response.parse_body().unwrap().message,
                "Invalid JSON payload"
            );
        }
        assert!(store.records().await.is_empty());
    }

    #[tokio::test]
    async fn reports_first_missing_field() {
        let (handler, store) = handler();

        let response = handler
            .handle(RequestEnvelope::with_body(r#"{"status":"open"}"#))
            .await;

        assert_eq!(response.status_code, 400);
        assert_eq!(
            response.parse_body().unwrap().message,
            "Missing field: schedule"
        );
        assert!(store.records().await.is_empty());
    }

    #[tokio::test]
    async fn missing_body_reports_status() {
        let (handler, _) = handler();

        let response = handler.handle(RequestEnvelope::default()).await;

        assert_eq!(response.status_code, 400);
        assert_eq!(response.parse_body().unwrap().message, "Missing field: status");
    }

    #[tokio::test]
    async fn each_single_missing_field_is_named() {
        let (handler, store) = handler();

        for field in REQUIRED_FIELDS {
            let mut body: Value = serde_json::from_str(&valid_body()).unwrap();
            body.as_object_mut().unwrap().remove(field);

            let response = handler
                .handle(RequestEnvelope::with_body(body.to_string()))
                .await;

            assert_eq!(response.status_code, 400);
            assert_eq!(
                response.parse_body().unwrap().message,
                format!("Missing field: {}", field)
            );
        }
        assert!(store.records().await.is_empty());
    }

    #[tokio::test]
    async fn store_failure_returns_500_without_retry() {
        let store = Arc::new(FailingStore {
            attempts: AtomicUsize::new(0),
        });
        let handler = EventHandler::new(store.clone());

        let response = handler.handle(RequestEnvelope::with_body(valid_body())).await;
        let body = response.parse_body().unwrap();

        assert_eq!(response.status_code, 500);
        assert_eq!(body.message, "Internal server error");
        assert_eq!(
            body.error.as_deref(),
            Some("store unavailable: connection reset")
        );
        assert_eq!(store.attempts.load(Ordering::SeqCst), 1);
    }
}
