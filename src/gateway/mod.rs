//! Record service access.
//!
//! `RecordGateway` is the single seam between the resolver graph and the
//! remote record service. One call per lookup, no retries, no caching:
//! deduplication and retry policy belong to the request-scoped scheduler.

pub mod error;
pub mod http;
pub mod memory;

pub use error::*;
pub use http::HttpRecordGateway;
pub use memory::InMemoryGateway;

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::join_all;

use crate::models::{Doctor, LookupKey, LookupKind, Patient, Record, Visit};

/// Record service client abstraction (allows in-memory doubles).
#[async_trait]
pub trait RecordGateway: Send + Sync {
    async fn fetch_doctor(&self, id: &str) -> Result<Doctor, GatewayError>;

    async fn fetch_patient(&self, id: &str) -> Result<Patient, GatewayError>;

    async fn fetch_visits_by_patient(&self, id: &str) -> Result<Vec<Visit>, GatewayError>;

    async fn fetch_visits_by_doctor(&self, id: &str) -> Result<Vec<Visit>, GatewayError>;

    /// Fetch one key, dispatching on its kind.
    async fn fetch(&self, key: &LookupKey) -> Result<Record, GatewayError> {
        let id = key.id.as_str();
        match key.kind {
            LookupKind::Doctor => self.fetch_doctor(id).await.map(Record::Doctor),
            LookupKind::Patient => self.fetch_patient(id).await.map(Record::Patient),
            LookupKind::VisitsByPatient => self
                .fetch_visits_by_patient(id)
                .await
                .map(|v| Record::Visits(Arc::new(v))),
            LookupKind::VisitsByDoctor => self
                .fetch_visits_by_doctor(id)
                .await
                .map(|v| Record::Visits(Arc::new(v))),
        }
    }

    /// Fetch a window's worth of unique ids of one kind.
    ///
    /// The record service has no multi-get, so the default issues one call
    /// per id concurrently. A backend with a multi-id endpoint overrides this
    /// to make a single request.
    async fn fetch_many(
        &self,
        kind: LookupKind,
        ids: &[String],
    ) -> Vec<(String, Result<Record, GatewayError>)> {
        let lookups = ids.iter().map(|id| async move {
            let key = LookupKey::new(kind, id.clone());
            let outcome = self.fetch(&key).await;
            (id.clone(), outcome)
        });
        join_all(lookups).await
    }
}
