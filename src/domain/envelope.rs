use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Body used when the invocation carries none.
pub const EMPTY_BODY: &str = "{}";

/// API-gateway style invocation event. Only `body` is read; everything else
/// the runtime sends is kept in `extra` for logging.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestEnvelope {
    #[serde(default)]
    pub body: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RequestEnvelope {
    pub fn with_body(body: impl Into<String>) -> Self {
        Self {
            body: Some(body.into()),
            extra: Map::new(),
        }
    }

    /// Raw body text; absent and `null` bodies read as `{}`.
    pub fn body(&self) -> &str {
        self.body.as_deref().unwrap_or(EMPTY_BODY)
    }
}

/// Status code plus JSON-serialized body returned to the runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    pub status_code: u16,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseBody {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResponseBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            event_id: None,
            error: None,
        }
    }

    pub fn with_error(mut self, detail: impl Into<String>) -> Self {
        self.error = Some(detail.into());
        self
    }
}

impl ResponseEnvelope {
    pub fn json(status_code: u16, body: &ResponseBody) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        Self {
            status_code,
            headers,
            // A struct of strings always serializes.
            body: serde_json::to_string(body).unwrap_or_default(),
        }
    }

    pub fn created(event_id: &str) -> Self {
        Self::json(
            201,
            &ResponseBody {
                event_id: Some(event_id.to_string()),
                ..ResponseBody::new("Event created")
            },
        )
    }

    /// Decodes `body` back into a [`ResponseBody`].
    pub fn parse_body(&self) -> serde_json::Result<ResponseBody> {
        serde_json::from_str(&self.body)
    }
}
