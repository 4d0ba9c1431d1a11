//! API middleware stack.
//!
//! Execution order (outermost → innermost):
//! 1. CORS — browser clients and the GraphiQL explorer
//! 2. Access logger — method, path, status, latency

pub mod access_log;
