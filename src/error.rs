use thiserror::Error;

use crate::domain::{ResponseBody, ResponseEnvelope};
use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("invalid JSON payload: {0}")]
    InvalidPayload(String),
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IngestError {
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidPayload(_) | Self::MissingField(_) => 400,
            Self::Store(_) => 500,
        }
    }

    /// Client-facing response. Decode details stay in the logs; store
    /// details are returned to the caller.
    pub fn into_response(self) -> ResponseEnvelope {
        let status_code = self.status_code();
        let body = match self {
            Self::InvalidPayload(_) => ResponseBody::new("Invalid JSON payload"),
            Self::MissingField(field) => ResponseBody::new(format!("Missing field: {}", field)),
            Self::Store(err) => ResponseBody::new("Internal server error").with_error(err.to_string()),
        };
        ResponseEnvelope::json(status_code, &body)
    }
}
