//! REST API layer: route handlers, DTOs, middleware, and router composition.
//!
//! All resource endpoints are mounted under `/api/v1`; Swagger UI (behind
//! the `swagger-ui` feature) lives at `/api/swagger`.

pub mod doc;
pub mod dto;
pub mod handlers;
pub mod middleware;

use axum::Router;
use axum::body::Body;
use axum::http::Request;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::Span;

use crate::app_state::AppState;
use crate::context::REQUEST_ID_HEADER;

/// Builds the complete application: `/api/v1` routes with request-metric
/// recording, docs, request ids, tracing and CORS.
pub fn build_app(state: AppState) -> Router {
    let api = handlers::routes().route_layer(axum::middleware::from_fn_with_state(
        state.clone(),
        middleware::record_request_metric,
    ));
    let router = Router::new().nest("/api/v1", api);
    let service_name = state.service_name.clone();

    #[cfg(feature = "swagger-ui")]
    let router = {
        use utoipa::OpenApi;
        router.merge(
            utoipa_swagger_ui::SwaggerUi::new("/api/swagger")
                .url("/api/openapi.json", doc::ApiDoc::openapi()),
        )
    };

    router
        .layer(CorsLayer::permissive())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(move |request: &Request<Body>| request_span(&service_name, request)),
        )
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(state)
}

fn request_span(service: &str, request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    tracing::info_span!(
        "http_request",
        service,
        method = %request.method(),
        uri = %request.uri(),
        request_id,
    )
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use axum::body::to_bytes;
    use axum::http::{Method, StatusCode, header};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::persistence::{FarmStore, MemoryStore, PondStore};

    fn app() -> Router {
        let store = Arc::new(MemoryStore::new());
        build_app(AppState::new(
            Arc::clone(&store) as Arc<dyn FarmStore>,
            Arc::clone(&store) as Arc<dyn PondStore>,
            store,
            Duration::from_secs(5),
        ))
    }

    async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::USER_AGENT, "router-test");
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        };
        let Ok(request) = request else {
            panic!("bad request builder");
        };
        let response = app
            .clone()
            .oneshot(request)
            .await
            .unwrap_or_else(|never| match never {});
        let status = response.status();
        let Ok(bytes) = to_bytes(response.into_body(), usize::MAX).await else {
            panic!("body read failed");
        };
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn ping_says_hello_world() {
        let app = app();
        let (status, body) = call(&app, Method::GET, "/api/v1/misc/ping", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"data": "hello world", "error": null}));
    }

    #[tokio::test]
    async fn response_carries_request_id() {
        let app = app();
        let Ok(request) = Request::builder()
            .uri("/api/v1/misc/ping")
            .header(REQUEST_ID_HEADER, "abc-123")
            .body(Body::empty())
        else {
            panic!("bad request builder");
        };
        let response = app.oneshot(request).await.unwrap_or_else(|never| match never {});
        assert_eq!(
            response.headers().get(REQUEST_ID_HEADER).and_then(|v| v.to_str().ok()),
            Some("abc-123")
        );
    }

    #[tokio::test]
    async fn farm_lifecycle_over_http() {
        let app = app();

        let (status, body) = call(&app, Method::GET, "/api/v1/farms", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], 404_015);
        assert_eq!(body["data"], Value::Null);

        let (status, body) = call(&app, Method::POST, "/api/v1/farms", Some(json!({"name": "Farm A"}))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body, json!({"data": null, "error": null}));

        let (status, body) = call(&app, Method::POST, "/api/v1/farms", Some(json!({"name": "Farm A"}))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], 409_016);

        let (status, body) = call(&app, Method::GET, "/api/v1/farms?limit=1000&page=0", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["farms"], json!([{"id": 1, "name": "Farm A"}]));
        assert_eq!(body["data"]["meta"], json!({"limit": 100, "page": 1, "total_page": 0}));

        let (status, _) = call(&app, Method::PUT, "/api/v1/farms/1", Some(json!({"name": "Farm B"}))).await;
        assert_eq!(status, StatusCode::OK);
        let (_, body) = call(&app, Method::GET, "/api/v1/farms/1", None).await;
        assert_eq!(body["data"], json!({"id": 1, "name": "Farm B"}));

        let (status, _) = call(&app, Method::DELETE, "/api/v1/farms/1", None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = call(&app, Method::DELETE, "/api/v1/farms/1", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn input_errors_map_to_codes() {
        let app = app();

        let (status, body) = call(&app, Method::POST, "/api/v1/farms", Some(json!({"name": "  "}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], 400_012);

        let (status, body) = call(&app, Method::GET, "/api/v1/farms/abc", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], 400_011);

        let (status, body) = call(&app, Method::GET, "/api/v1/farms?limit=ten", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], 400_011);

        let (status, body) = call(&app, Method::POST, "/api/v1/farms", Some(json!({"name": 7}))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], 422_017);
        assert_eq!(body["error"]["message"], "invalid request");
    }

    #[tokio::test]
    async fn ponds_expose_farm_name_and_pond_name() {
        let app = app();
        let _ = call(&app, Method::POST, "/api/v1/farms", Some(json!({"name": "Farm A"}))).await;

        let (status, _) = call(&app, Method::POST, "/api/v1/farms/9/ponds", Some(json!({"name": "Pond X"}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = call(&app, Method::POST, "/api/v1/farms/1/ponds", Some(json!({"name": "Pond A"}))).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = call(&app, Method::GET, "/api/v1/farms/1/ponds/1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["data"],
            json!({"id": 1, "farm_id": 1, "farm_name": "Farm A", "pond_name": "Pond A"})
        );

        let (_, body) = call(&app, Method::GET, "/api/v1/farms/1/ponds?limit=1", None).await;
        assert_eq!(body["data"]["meta"], json!({"limit": 1, "page": 1, "total_page": 1}));
    }

    #[tokio::test]
    async fn requests_are_recorded_by_route_template() {
        let app = app();
        let (status, _) = call(&app, Method::GET, "/api/v1/telemetry/request-metrics", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let _ = call(&app, Method::GET, "/api/v1/farms/1", None).await;
        let _ = call(&app, Method::GET, "/api/v1/farms/2", None).await;

        let (status, body) = call(&app, Method::GET, "/api/v1/telemetry/request-metrics", None).await;
        assert_eq!(status, StatusCode::OK);
        let Some(metrics) = body["data"]["request_metrics"].as_array() else {
            panic!("no metrics in {body}");
        };
        let Some(farm) = metrics
            .iter()
            .find(|m| m["endpoint"] == "GET /api/v1/farms/{farm_id}")
        else {
            panic!("farm lookups not recorded: {body}");
        };
        assert_eq!(farm["count"], 2);
        assert_eq!(farm["unique_user_agent"], 1);
        assert!(
            metrics
                .iter()
                .any(|m| m["endpoint"] == "GET /api/v1/telemetry/request-metrics")
        );
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn text(&self) -> String {
            self.0
                .lock()
                .map(|buf| String::from_utf8_lossy(&buf).into_owned())
                .unwrap_or_default()
        }
    }

    impl io::Write for CapturedLogs {
        fn write(&mut self, data: &[u8]) -> io::Result<usize> {
            let Ok(mut buf) = self.0.lock() else {
                return Err(io::Error::other("log buffer poisoned"));
            };
            buf.extend_from_slice(data);
            Ok(data.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn each_request_writes_an_info_access_line() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let app = app();
        let (status, _) = call(&app, Method::POST, "/api/v1/farms", Some(json!({"name": "Farm A"}))).await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, _) = call(&app, Method::GET, "/api/v1/farms/7", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let text = logs.text();
        let lines: Vec<&str> = text
            .lines()
            .filter(|l| l.contains("request completed"))
            .collect();
        assert_eq!(lines.len(), 2, "{text}");
        assert!(lines.iter().all(|l| l.contains(" INFO ")), "{text}");
        assert!(
            lines
                .iter()
                .any(|l| l.contains("route=/api/v1/farms ") && l.contains("status=201")),
            "{text}"
        );
        assert!(
            lines.iter().any(|l| l.contains("route=/api/v1/farms/{farm_id}")
                && l.contains("status=404")
                && l.contains("user_agent=router-test")),
            "{text}"
        );
    }
}
