//! API router.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//!
//! Middleware stack (outermost → innermost):
//! 1. CORS → 2. Access log → Handler

use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::api::endpoints;
use crate::api::error::ApiError;
use crate::api::middleware;
use crate::api::types::ApiContext;

/// Build the API router.
///
/// - `GET /health`
/// - `GET /graphql` (explorer), `POST /graphql` (execute)
pub fn api_router(ctx: ApiContext) -> Router {
    Router::new()
        .route("/health", get(endpoints::health::check))
        .route(
            "/graphql",
            get(endpoints::graphql::explorer).post(endpoints::graphql::execute),
        )
        .fallback(not_found)
        .with_state(ctx)
        // Layers apply bottom-up: CORS wraps the access log.
        .layer(axum::middleware::from_fn(middleware::access_log::log_access))
        .layer(CorsLayer::permissive())
}

async fn not_found(uri: axum::http::Uri) -> ApiError {
    ApiError::NotFound(format!("No route for {}", uri.path()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::appointments::AppointmentStore;
    use crate::gateway::InMemoryGateway;
    use crate::graph::GraphService;
    use crate::scheduler::RetryPolicy;

    fn test_router() -> Router {
        let gateway = Arc::new(
            InMemoryGateway::new()
                .with_patient("5", "Sanjay Dutt")
                .with_doctor("1", "Dr. X")
                .with_visit("5", "1"),
        );
        let graph = GraphService::new(
            gateway,
            Arc::new(AppointmentStore::new()),
            RetryPolicy::none(),
        );
        api_router(ApiContext::new(graph))
    }

    fn graphql_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/graphql")
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_reports_version() {
        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let response = test_router().oneshot(req).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["version"], crate::config::APP_VERSION);
    }

    #[tokio::test]
    async fn post_graphql_executes_query() {
        let body = json!({
            "query": "query Patient($id: ID!) { patient(id: $id) { name doctors { id name } } }",
            "variables": {"id": "5"}
        });
        let response = test_router()
            .oneshot(graphql_request(&body.to_string()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(
            json["data"],
            json!({"patient": {"name": "Sanjay Dutt", "doctors": [{"id": "1", "name": "Dr. X"}]}})
        );
        assert!(json.get("errors").is_none());
    }

    #[tokio::test]
    async fn field_errors_still_return_200() {
        let body = json!({"query": "{ patient(id: \"5\") { nope } }"});
        let response = test_router()
            .oneshot(graphql_request(&body.to_string()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert!(!json["errors"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn malformed_body_returns_400() {
        let response = test_router()
            .oneshot(graphql_request("{not json"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn get_graphql_serves_explorer() {
        let req = Request::builder()
            .uri("/graphql")
            .body(Body::empty())
            .unwrap();
        let response = test_router().oneshot(req).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains("/graphql"));
    }

    #[tokio::test]
    async fn unknown_route_returns_404() {
        let req = Request::builder()
            .uri("/api/v1/patient/5")
            .body(Body::empty())
            .unwrap();
        let response = test_router().oneshot(req).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "NOT_FOUND");
    }
}
