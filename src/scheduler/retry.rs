use std::collections::HashMap;
use std::time::Duration;

use crate::gateway::{GatewayError, RecordGateway};
use crate::models::{LookupKind, Record};

/// Caller-side retry for transient record-service failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per key, including the first.
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    /// Single attempt, failures surface immediately.
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Fetch `ids` of one kind, re-requesting only the ids whose failure is
    /// retryable until they succeed or attempts run out.
    pub(crate) async fn run(
        &self,
        gateway: &dyn RecordGateway,
        kind: LookupKind,
        ids: Vec<String>,
    ) -> HashMap<String, Result<Record, GatewayError>> {
        let mut results = HashMap::with_capacity(ids.len());
        let mut remaining = ids;
        let mut attempt = 1;

        while !remaining.is_empty() {
            let mut again = Vec::new();
            for (id, outcome) in gateway.fetch_many(kind, &remaining).await {
                match outcome {
                    Err(ref err) if err.is_retryable() && attempt < self.max_attempts => {
                        tracing::warn!(%kind, %id, attempt, error = %err, "Retrying record lookup");
                        again.push(id);
                    }
                    outcome => {
                        results.insert(id, outcome);
                    }
                }
            }

            if again.is_empty() {
                break;
            }
            if !self.backoff.is_zero() {
                tokio::time::sleep(self.backoff).await;
            }
            attempt += 1;
            remaining = again;
        }

        results
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}
