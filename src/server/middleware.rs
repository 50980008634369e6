//! Request middleware: app-info headers, the `/ping` health check and panic recovery

use std::any::Any;

use axum::extract::{Request, State};
use axum::http::{header, HeaderName, HeaderValue, Method, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use super::jsonapi::ApiError;

/// Values of the headers added to every response
#[derive(Debug, Clone)]
pub struct AppInfo {
    org: HeaderValue,
    app_name: HeaderValue,
    version: HeaderValue,
}

impl AppInfo {
    pub fn new(org: &str, app_name: &str, version: &str) -> Self {
        Self {
            org: header_value(org),
            app_name: header_value(app_name),
            version: header_value(version),
        }
    }
}

fn header_value(value: &str) -> HeaderValue {
    HeaderValue::from_str(value).unwrap_or_else(|_| {
        tracing::warn!(value = value, "Invalid header value, reporting as unknown");
        HeaderValue::from_static("unknown")
    })
}

/// Add `Org`, `App-Name` and `App-Version` headers to the response
pub async fn app_info(State(info): State<AppInfo>, request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;

    let headers = response.headers_mut();
    headers.insert(HeaderName::from_static("org"), info.org);
    headers.insert(HeaderName::from_static("app-name"), info.app_name);
    headers.insert(HeaderName::from_static("app-version"), info.version);

    response
}

/// Answer `GET .../ping` with `pong`, short-circuiting the rest of the stack
pub async fn ping(request: Request, next: Next) -> Response {
    let is_ping = request.method() == Method::GET
        && request.uri().path().to_ascii_lowercase().ends_with("/ping");

    if is_ping {
        return (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain")],
            "pong",
        )
            .into_response();
    }

    next.run(request).await
}

/// Turn a handler panic into a JSON:API 500
///
/// The panic message is logged, never sent to the client.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        *s
    } else {
        "unknown panic"
    };
    tracing::error!(panic = message, "Handler panicked");

    ApiError::new(
        StatusCode::INTERNAL_SERVER_ERROR,
        "server_error",
        "internal server error",
    )
    .into_response()
}
