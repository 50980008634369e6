//! REST routes over the stream registry
//!
//! ```text
//! GET    /v1/streams/             list
//! POST   /v1/streams/             create (201)
//! POST   /v1/streams/{id}/start   start
//! POST   /v1/streams/{id}/stop    interrupt
//! DELETE /v1/streams/{id}         delete
//! ```

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use super::config::ServerConfig;
use super::jsonapi::{ApiError, JsonApi};
use super::middleware::{self, AppInfo};
use crate::registry::{StreamId, StreamRegistry};

/// Build the application router
///
/// Layers, outermost first: request id, app-info headers, ping, tracing,
/// request timeout, panic recovery.
pub fn router(registry: Arc<StreamRegistry>, config: &ServerConfig) -> Router {
    let info = AppInfo::new(&config.org, &config.app_name, &config.version);

    let streams = Router::new()
        .route("/v1/streams", get(list_streams).post(create_stream))
        .route("/v1/streams/", get(list_streams).post(create_stream))
        .route("/v1/streams/{stream_id}/start", post(start_stream))
        .route("/v1/streams/{stream_id}/stop", post(stop_stream))
        .route("/v1/streams/{stream_id}", delete(delete_stream))
        .layer(CatchPanicLayer::custom(middleware::panic_response))
        .layer(TimeoutLayer::new(config.request_timeout))
        .layer(TraceLayer::new_for_http())
        .with_state(registry);

    Router::new()
        .merge(streams)
        .fallback(not_found)
        .layer(axum::middleware::from_fn(middleware::ping))
        .layer(axum::middleware::from_fn_with_state(
            info,
            middleware::app_info,
        ))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

async fn list_streams(State(registry): State<Arc<StreamRegistry>>) -> JsonApi {
    JsonApi::many(StatusCode::OK, &registry.list())
}

async fn create_stream(State(registry): State<Arc<StreamRegistry>>) -> JsonApi {
    let stream = registry.create();
    JsonApi::one(StatusCode::CREATED, &stream)
}

async fn start_stream(
    State(registry): State<Arc<StreamRegistry>>,
    Path(stream_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    registry
        .start(&StreamId::from(stream_id))
        .map_err(|e| ApiError::registry("start_stream", e))?;
    Ok(StatusCode::OK)
}

async fn stop_stream(
    State(registry): State<Arc<StreamRegistry>>,
    Path(stream_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    registry
        .interrupt(&StreamId::from(stream_id))
        .map_err(|e| ApiError::registry("stop_stream", e))?;
    Ok(StatusCode::OK)
}

async fn delete_stream(
    State(registry): State<Arc<StreamRegistry>>,
    Path(stream_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    registry
        .delete(&StreamId::from(stream_id))
        .map_err(|e| ApiError::registry("delete_stream", e))?;
    Ok(StatusCode::OK)
}

async fn not_found() -> ApiError {
    ApiError::new(StatusCode::NOT_FOUND, "not_found", "no such route")
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{header, Method, Request};
    use axum::response::Response;
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::registry::{RegistryConfig, StreamState};
    use crate::server::jsonapi::CONTENT_TYPE;

    const UNKNOWN_ID: &str = "8dff7c72-3edb-4718-87e9-6d60f653b4cf";

    fn setup() -> (Arc<StreamRegistry>, Router) {
        let registry = Arc::new(StreamRegistry::with_config(
            RegistryConfig::default().finish_after(Duration::from_secs(3)),
        ));
        let config = ServerConfig::default().version("test");
        let app = router(Arc::clone(&registry), &config);
        (registry, app)
    }

    async fn send(app: &Router, method: Method, uri: &str) -> Response {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        app.clone().oneshot(request).await.unwrap()
    }

    async fn body_string(response: Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn create(app: &Router) -> String {
        let response = send(app, Method::POST, "/v1/streams/").await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let json: Value = serde_json::from_str(&body_string(response).await).unwrap();
        json["data"]["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_ping() {
        let (_registry, app) = setup();

        let response = send(&app, Method::GET, "/ping").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/plain");
        assert_eq!(body_string(response).await, "pong");
    }

    #[tokio::test]
    async fn test_app_info_headers() {
        let (_registry, app) = setup();

        let response = send(&app, Method::GET, "/v1/streams/").await;
        assert_eq!(response.headers()["org"], "stream-api");
        assert_eq!(response.headers()["app-name"], "stream-api");
        assert_eq!(response.headers()["app-version"], "test");
    }

    #[tokio::test]
    async fn test_list_empty() {
        let (_registry, app) = setup();

        let response = send(&app, Method::GET, "/v1/streams/").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], CONTENT_TYPE);
        assert_eq!(body_string(response).await, r#"{"data":[]}"#);
    }

    #[tokio::test]
    async fn test_create() {
        let (registry, app) = setup();

        let response = send(&app, Method::POST, "/v1/streams/").await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let json: Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(json["data"]["type"], "stream");
        assert_eq!(json["data"]["attributes"]["state"], "created");
        assert!(json["data"]["attributes"]["created"].is_string());
        assert_eq!(registry.stream_count(), 1);
    }

    #[tokio::test]
    async fn test_list() {
        let (_registry, app) = setup();
        let id = create(&app).await;

        let response = send(&app, Method::GET, "/v1/streams").await;
        assert_eq!(response.status(), StatusCode::OK);

        let json: Value = serde_json::from_str(&body_string(response).await).unwrap();
        let data = json["data"].as_array().unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(data[0]["id"], id.as_str());
        assert_eq!(data[0]["attributes"]["state"], "created");
    }

    #[tokio::test]
    async fn test_start() {
        let (registry, app) = setup();
        let id = create(&app).await;

        let response = send(&app, Method::POST, &format!("/v1/streams/{}/start", id)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "");

        let stream = registry.get(&StreamId::from(id)).unwrap();
        assert_eq!(stream.state, StreamState::Active);
    }

    #[tokio::test]
    async fn test_start_not_found() {
        let (_registry, app) = setup();

        let uri = format!("/v1/streams/{}/start", UNKNOWN_ID);
        let response = send(&app, Method::POST, &uri).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_string(response).await,
            format!(
                r#"{{"errors":[{{"title":"start_stream","detail":"could not find stream with id {}","status":"400"}}]}}"#,
                UNKNOWN_ID
            )
        );
    }

    #[tokio::test]
    async fn test_stop() {
        let (registry, app) = setup();
        let id = create(&app).await;

        let response = send(&app, Method::POST, &format!("/v1/streams/{}/start", id)).await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = send(&app, Method::POST, &format!("/v1/streams/{}/stop", id)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "");

        let stream = registry.get(&StreamId::from(id)).unwrap();
        assert_eq!(stream.state, StreamState::Interrupted);
    }

    #[tokio::test]
    async fn test_stop_not_found() {
        let (_registry, app) = setup();

        let uri = format!("/v1/streams/{}/stop", UNKNOWN_ID);
        let response = send(&app, Method::POST, &uri).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json: Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(json["errors"][0]["title"], "stop_stream");
        assert_eq!(json["errors"][0]["status"], "400");
    }

    #[tokio::test]
    async fn test_stop_created_is_rejected() {
        let (_registry, app) = setup();
        let id = create(&app).await;

        let response = send(&app, Method::POST, &format!("/v1/streams/{}/stop", id)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json: Value = serde_json::from_str(&body_string(response).await).unwrap();
        let detail = json["errors"][0]["detail"].as_str().unwrap();
        assert!(detail.contains("stream is not active"));
    }

    #[tokio::test]
    async fn test_delete() {
        let (_registry, app) = setup();
        let id = create(&app).await;

        let response = send(&app, Method::DELETE, &format!("/v1/streams/{}", id)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "");

        let response = send(&app, Method::GET, "/v1/streams/").await;
        assert_eq!(body_string(response).await, r#"{"data":[]}"#);
    }

    #[tokio::test]
    async fn test_delete_not_found() {
        let (_registry, app) = setup();

        let uri = format!("/v1/streams/{}", UNKNOWN_ID);
        let response = send(&app, Method::DELETE, &uri).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json: Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(json["errors"][0]["title"], "delete_stream");
    }

    #[tokio::test]
    async fn test_broken_invariant_returns_500() {
        let (registry, app) = setup();
        let id = create(&app).await;
        let stream_id = StreamId::from(id.as_str());
        registry.start(&stream_id).unwrap();
        registry.interrupt(&stream_id).unwrap();
        assert!(registry.forget_timer(&stream_id));

        let response = send(&app, Method::POST, &format!("/v1/streams/{}/start", id)).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let json: Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(json["errors"][0]["title"], "server_error");
        assert_eq!(json["errors"][0]["status"], "500");

        // Still serving
        let response = send(&app, Method::GET, "/v1/streams/").await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_request_id_generated() {
        let (_registry, app) = setup();

        let response = send(&app, Method::GET, "/v1/streams/").await;
        let request_id = response.headers()["x-request-id"].to_str().unwrap();
        assert!(uuid::Uuid::parse_str(request_id).is_ok());
    }

    #[tokio::test]
    async fn test_request_id_propagated() {
        let (_registry, app) = setup();

        let request = Request::builder()
            .method(Method::GET)
            .uri("/v1/streams/")
            .header("x-request-id", "req-42")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.headers()["x-request-id"], "req-42");
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let (_registry, app) = setup();

        let response = send(&app, Method::GET, "/v2/nothing").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
