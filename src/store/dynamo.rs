use std::collections::HashMap;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_dynamodb::config::Region;
use aws_sdk_dynamodb::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_dynamodb::operation::put_item::PutItemError;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use serde_json::Value;

use super::{EventStore, StoreError, StoreResult};
use crate::domain::EventRecord;

pub struct DynamoEventStore {
    client: Client,
    table_name: String,
}

impl DynamoEventStore {
    /// Loads AWS configuration from the environment, optionally overriding the
    /// region and endpoint (LocalStack, DynamoDB Local).
    pub async fn connect(
        table_name: String,
        region: Option<String>,
        endpoint_url: Option<String>,
    ) -> Self {
        tracing::info!("Initializing DynamoDB client for table {}", table_name);

        let mut config_builder = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = region {
            config_builder = config_builder.region(Region::new(region));
        }
        if let Some(ref endpoint) = endpoint_url {
            tracing::info!("Using custom DynamoDB endpoint {}", endpoint);
            config_builder = config_builder.endpoint_url(endpoint);
        }

        let config = config_builder.load().await;
        Self::from_client(Client::new(&config), table_name)
    }

    pub fn from_client(client: Client, table_name: String) -> Self {
        Self { client, table_name }
    }
}

#[async_trait]
impl EventStore for DynamoEventStore {
    fn table_name(&self) -> &str {
        &self.table_name
    }

    async fn put_event(&self, record: &EventRecord) -> StoreResult<()> {
        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(to_item(record)))
            .send()
            .await
            .map_err(|err| {
                tracing::error!(
                    table = %self.table_name,
                    id = %record.id,
                    error = %DisplayErrorContext(&err),
                    "PutItem failed"
                );
                put_error(err)
            })?;
        Ok(())
    }
}

fn put_error(err: SdkError<PutItemError>) -> StoreError {
    match err.as_service_error() {
        Some(service) => StoreError::Rejected {
            code: service.code().unwrap_or("Unknown").to_string(),
            message: service.message().unwrap_or("no message").to_string(),
        },
        None => StoreError::Unavailable(DisplayErrorContext(&err).to_string()),
    }
}

/// Attribute map for a record; `id` is always a string attribute.
pub fn to_item(record: &EventRecord) -> HashMap<String, AttributeValue> {
    HashMap::from([
        ("id".to_string(), AttributeValue::S(record.id.clone())),
        ("status".to_string(), to_attribute(&record.status)),
        ("schedule".to_string(), to_attribute(&record.schedule)),
        ("content".to_string(), to_attribute(&record.content)),
        (
            "person_in_charge".to_string(),
            to_attribute(&record.person_in_charge),
        ),
        ("create_time".to_string(), to_attribute(&record.create_time)),
        ("update_time".to_string(), to_attribute(&record.update_time)),
    ])
}

pub fn to_attribute(value: &Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(b) => AttributeValue::Bool(*b),
        Value::Number(n) => AttributeValue::N(n.to_string()),
        Value::String(s) => AttributeValue::S(s.clone()),
        Value::Array(items) => AttributeValue::L(items.iter().map(to_attribute).collect()),
        Value::Object(map) => AttributeValue::M(
            map.iter()
                .map(|(k, v)| (k.clone(), to_attribute(v)))
                .collect(),
        ),
    }
}
