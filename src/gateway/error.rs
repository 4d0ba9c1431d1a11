use thiserror::Error;

use crate::models::LookupKey;

/// Coarse failure class surfaced to GraphQL clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCategory {
    Transport,
    Decode,
    NotFound,
}

impl FailureCategory {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Transport => "TRANSPORT_FAILURE",
            Self::Decode => "DECODE_FAILURE",
            Self::NotFound => "NOT_FOUND",
        }
    }
}

/// Errors from a single record-service lookup.
///
/// Cloneable: one outcome fans out to every requester of the same key.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Record service unreachable at {url}: {reason}")]
    Transport { url: String, reason: String },

    #[error("Record service timed out after {timeout_ms}ms: {url}")]
    Timeout { url: String, timeout_ms: u64 },

    #[error("Record service returned error (status {status}): {body}")]
    Upstream { status: u16, body: String },

    #[error("Malformed record service response for {key}: {reason}")]
    Decode { key: LookupKey, reason: String },

    #[error("Not found: {0}")]
    NotFound(LookupKey),

    #[error("Invalid record service base URL: {0}")]
    InvalidBaseUrl(String),
}

impl GatewayError {
    pub fn category(&self) -> FailureCategory {
        match self {
            Self::Transport { .. }
            | Self::Timeout { .. }
            | Self::Upstream { .. }
            | Self::InvalidBaseUrl(_) => FailureCategory::Transport,
            Self::Decode { .. } => FailureCategory::Decode,
            Self::NotFound(_) => FailureCategory::NotFound,
        }
    }

    /// Whether a repeated attempt could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { .. } | Self::Timeout { .. } => true,
            Self::Upstream { status, .. } => *status >= 500,
            _ => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
