use std::sync::Arc;

use async_graphql::Context;
use uuid::Uuid;

use crate::gateway::RecordGateway;
use crate::scheduler::{RetryPolicy, Scheduler};

/// State owned by exactly one logical query.
///
/// Created by `GraphService::execute` and attached to the request data;
/// dropped when the query's response is returned, taking its scheduler
/// cache with it.
pub struct QueryContext {
    pub query_id: Uuid,
    scheduler: Scheduler,
}

impl QueryContext {
    pub fn new(gateway: Arc<dyn RecordGateway>, retry: RetryPolicy) -> Self {
        Self {
            query_id: Uuid::new_v4(),
            scheduler: Scheduler::with_retry(gateway, retry),
        }
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// The query context attached to the request being resolved.
    pub fn from_ctx<'a>(ctx: &Context<'a>) -> async_graphql::Result<&'a QueryContext> {
        ctx.data::<Arc<QueryContext>>().map(|query| query.as_ref())
    }
}
