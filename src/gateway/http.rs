use std::time::Duration;

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;

use super::{GatewayError, RecordGateway};
use crate::models::{Doctor, LookupKey, Patient, Visit};

/// HTTP client for the REST record service.
///
/// Endpoints, relative to the base URL:
/// - `GET /patient/{id}`
/// - `GET /doctor/{id}`
/// - `GET /visit/patient/{id}`
/// - `GET /visit/doctor/{id}`
#[derive(Debug, Clone)]
pub struct HttpRecordGateway {
    base_url: Url,
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpRecordGateway {
    /// Create a gateway whose every call is bounded by `timeout`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, GatewayError> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))
            .map_err(|e| GatewayError::InvalidBaseUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(GatewayError::InvalidBaseUrl(base_url.to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Transport {
                url: base_url.to_string(),
                reason: format!("cannot build HTTP client: {e}"),
            })?;

        Ok(Self {
            base_url,
            client,
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, GatewayError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| GatewayError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        key: LookupKey,
        segments: &[&str],
    ) -> Result<T, GatewayError> {
        let url = self.endpoint(segments)?;
        tracing::trace!(%url, %key, "Record service request");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| self.transport_error(&url, e))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(GatewayError::NotFound(key));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(&url, e))?;

        // The record service answers unknown ids with an empty 200.
        let trimmed = body.trim();
        if trimmed.is_empty() || trimmed == "null" {
            return Err(GatewayError::NotFound(key));
        }

        serde_json::from_str(trimmed).map_err(|e| GatewayError::Decode {
            key,
            reason: e.to_string(),
        })
    }

    fn transport_error(&self, url: &Url, err: reqwest::Error) -> GatewayError {
        if err.is_timeout() {
            GatewayError::Timeout {
                url: url.to_string(),
                timeout_ms: self.timeout.as_millis() as u64,
            }
        } else {
            GatewayError::Transport {
                url: url.to_string(),
                reason: err.to_string(),
            }
        }
    }
}

#[async_trait]
impl RecordGateway for HttpRecordGateway {
    async fn fetch_doctor(&self, id: &str) -> Result<Doctor, GatewayError> {
        self.get_json(LookupKey::doctor(id), &["doctor", id]).await
    }

    async fn fetch_patient(&self, id: &str) -> Result<Patient, GatewayError> {
        self.get_json(LookupKey::patient(id), &["patient", id]).await
    }

    async fn fetch_visits_by_patient(&self, id: &str) -> Result<Vec<Visit>, GatewayError> {
        self.get_json(LookupKey::visits_by_patient(id), &["visit", "patient", id])
            .await
    }

    async fn fetch_visits_by_doctor(&self, id: &str) -> Result<Vec<Visit>, GatewayError> {
        self.get_json(LookupKey::visits_by_doctor(id), &["visit", "doctor", id])
            .await
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
