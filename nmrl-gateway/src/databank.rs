//! Client for the Databank API's record validation endpoint

use nmrl_common::api::ErrorEnvelope;
use serde_json::{Map, Value};
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum DatabankError {
    #[error("Databank API unreachable: {0}")]
    Network(String),

    #[error("Databank API returned {status}: {message}")]
    Unavailable { status: u16, message: String },
}

/// Databank API client
#[derive(Debug, Clone)]
pub struct DatabankClient {
    http: reqwest::Client,
    base_url: String,
}

impl DatabankClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, DatabankError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DatabankError::Network(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Validate an info record
    ///
    /// `Ok(None)` means valid; `Ok(Some(reason))` carries the Databank's
    /// explanation of why not (any 4xx). No answer or a 5xx is an `Err`.
    pub async fn validate_record(
        &self,
        record: &Map<String, Value>,
    ) -> Result<Option<String>, DatabankError> {
        info!("Validating info yml");
        let response = self
            .http
            .post(format!("{}/info-valid-check", self.base_url))
            .json(record)
            .send()
            .await
            .map_err(|e| DatabankError::Network(e.to_string()))?;

        if response.status().is_success() {
            return Ok(None);
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_client_error() {
            return Err(DatabankError::Unavailable {
                status: status.as_u16(),
                message: ErrorEnvelope::from_body(&body).error,
            });
        }

        let reason = ErrorEnvelope::from_body(&body).error;
        error!("Validation failed: {}", reason);
        Ok(Some(reason))
    }
}
