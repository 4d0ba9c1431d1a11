use thiserror::Error;

use crate::gateway::{FailureCategory, GatewayError};
use crate::models::LookupKey;

/// Outcome of a scheduled lookup that did not produce a record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("Lookup task failed: {0}")]
    TaskFailed(String),

    #[error("Batch response did not include {0}")]
    MissingFromBatch(LookupKey),

    #[error("Record service answered {0} with the wrong record type")]
    KindMismatch(LookupKey),

    #[error("Scheduler state lock poisoned")]
    LockPoisoned,
}

impl LoadError {
    /// Client-facing failure class. `None` for faults inside this process.
    pub fn category(&self) -> Option<FailureCategory> {
        match self {
            Self::Gateway(err) => Some(err.category()),
            Self::MissingFromBatch(_) | Self::KindMismatch(_) => Some(FailureCategory::Decode),
            Self::TaskFailed(_) | Self::LockPoisoned => None,
        }
    }

    pub fn code(&self) -> &'static str {
        self.category().map(|c| c.code()).unwrap_or("INTERNAL")
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Gateway(err) if err.is_not_found())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_not_found_passes_through() {
        let err: LoadError = GatewayError::NotFound(LookupKey::patient("x")).into();
        assert!(err.is_not_found());
        assert_eq!(err.code(), "NOT_FOUND");
        assert_eq!(err.to_string(), "Not found: patient:x");
    }

    #[test]
    fn malformed_batches_are_decode_failures() {
        assert_eq!(
            LoadError::KindMismatch(LookupKey::doctor("1")).code(),
            "DECODE_FAILURE"
        );
        assert_eq!(LoadError::LockPoisoned.code(), "INTERNAL");
    }
}
