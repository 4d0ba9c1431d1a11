//! API endpoint handlers.

pub mod graphql;
pub mod health;
