//! GraphQL resolver graph.
//!
//! `GraphService` owns the process-wide pieces (schema, gateway handle,
//! appointment store) and creates a fresh `QueryContext` for every request.
//! Resolvers reach the record service only through that context's scheduler.

pub mod context;
pub mod errors;
pub mod mutation;
pub mod query;
pub mod relations;
pub mod types;

pub use context::QueryContext;
pub use mutation::MutationRoot;
pub use query::QueryRoot;

use std::sync::Arc;

use async_graphql::{EmptySubscription, Request, Response, Schema};
use tracing::Instrument;

use crate::appointments::AppointmentStore;
use crate::gateway::RecordGateway;
use crate::scheduler::RetryPolicy;

/// Maximum selection depth accepted from clients.
pub const MAX_QUERY_DEPTH: usize = 10;

pub type AppSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

pub fn build_schema(appointments: Arc<AppointmentStore>) -> AppSchema {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .data(appointments)
        .limit_depth(MAX_QUERY_DEPTH)
        .finish()
}

#[derive(Clone)]
pub struct GraphService {
    schema: AppSchema,
    gateway: Arc<dyn RecordGateway>,
    retry: RetryPolicy,
}

impl GraphService {
    pub fn new(
        gateway: Arc<dyn RecordGateway>,
        appointments: Arc<AppointmentStore>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            schema: build_schema(appointments),
            gateway,
            retry,
        }
    }

    pub fn schema(&self) -> &AppSchema {
        &self.schema
    }

    /// Execute one logical query with its own scheduler.
    pub async fn execute(&self, request: impl Into<Request>) -> Response {
        let query = Arc::new(QueryContext::new(Arc::clone(&self.gateway), self.retry));
        let query_id = query.query_id;
        let request = request.into().data(Arc::clone(&query));

        let response = self
            .schema
            .execute(request)
            .instrument(tracing::info_span!("graphql", %query_id))
            .await;

        let stats = query.scheduler().stats();
        tracing::debug!(
            %query_id,
            requests = stats.requests,
            deduplicated = stats.deduplicated,
            dispatched = stats.dispatched_keys,
            batches = stats.batches,
            errors = response.errors.len(),
            "GraphQL query finished"
        );
        response
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
