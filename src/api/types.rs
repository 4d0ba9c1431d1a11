use std::time::Instant;

use crate::graph::GraphService;

/// Shared context for all API routes and middleware.
#[derive(Clone)]
pub struct ApiContext {
    pub graph: GraphService,
    pub started_at: Instant,
}

impl ApiContext {
    pub fn new(graph: GraphService) -> Self {
        Self {
            graph,
            started_at: Instant::now(),
        }
    }
}
