//! Admin check against the GitHub gateway

use nmrl_common::api::ErrorEnvelope;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AdminCheckError {
    /// The gateway answered with an error; relayed as-is
    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("Could not reach admin-check service: {0}")]
    Unreachable(String),

    #[error("Insufficient privileges")]
    NotAuthorized,
}

#[derive(Debug, Deserialize)]
struct AdminCheckResponse {
    #[serde(default)]
    authorized: bool,
}

#[derive(Debug, Clone)]
pub struct GatewayClient {
    http: reqwest::Client,
    base_url: String,
}

impl GatewayClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, AdminCheckError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AdminCheckError::Unreachable(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Ask the gateway whether the caller behind `authorization` is an admin
    ///
    /// `authorization` is the caller's own `Authorization` header value,
    /// forwarded unchanged.
    pub async fn check_admin(&self, authorization: &str) -> Result<(), AdminCheckError> {
        info!("Checking user admin status");
        let response = self
            .http
            .post(format!("{}/user-admin-check", self.base_url))
            .header("Authorization", authorization)
            .send()
            .await
            .map_err(|e| {
                error!("HTTP error during admin check: {}", e);
                AdminCheckError::Unreachable(e.to_string())
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AdminCheckError::Unreachable(e.to_string()))?;

        if !status.is_success() {
            let message = ErrorEnvelope::from_body(&body).error;
            error!("User admin check failed ({}): {}", status, message);
            return Err(AdminCheckError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let authorized = serde_json::from_str::<AdminCheckResponse>(&body)
            .map(|r| r.authorized)
            .unwrap_or(false);
        if authorized {
            Ok(())
        } else {
            Err(AdminCheckError::NotAuthorized)
        }
    }
}
