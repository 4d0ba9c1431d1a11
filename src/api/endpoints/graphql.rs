//! GraphQL endpoints.
//!
//! - `POST /graphql` — execute one query or mutation
//! - `GET /graphql` — GraphiQL explorer

use async_graphql::http::GraphiQLSource;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::Html;
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;

/// `POST /graphql` — every call is one logical query with its own scheduler.
pub async fn execute(
    State(ctx): State<ApiContext>,
    payload: Result<Json<async_graphql::Request>, JsonRejection>,
) -> Result<Json<async_graphql::Response>, ApiError> {
    let Json(request) = payload?;
    Ok(Json(ctx.graph.execute(request).await))
}

/// `GET /graphql` — interactive explorer pointed at this server.
pub async fn explorer() -> Html<String> {
    Html(GraphiQLSource::build().endpoint("/graphql").finish())
}
