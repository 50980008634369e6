//! JSON:API encoding of streams and errors

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use chrono::SecondsFormat;
use serde::Serialize;

use crate::registry::{RegistryError, Stream, StreamState};

/// Media type of every JSON:API body
pub const CONTENT_TYPE: &str = "application/vnd.api+json; charset=utf-8";

const RESOURCE_TYPE: &str = "stream";

#[derive(Debug, Serialize)]
struct Resource<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    id: &'a str,
    attributes: Attributes,
}

#[derive(Debug, Serialize)]
struct Attributes {
    state: StreamState,
    created: String,
}

impl<'a> From<&'a Stream> for Resource<'a> {
    fn from(stream: &'a Stream) -> Self {
        Self {
            kind: RESOURCE_TYPE,
            id: stream.id.as_str(),
            attributes: Attributes {
                state: stream.state,
                // 0, 3, 6 or 9 fractional digits; Go's RFC3339Nano trims all trailing zeros
                created: stream
                    .created_at
                    .to_rfc3339_opts(SecondsFormat::AutoSi, true),
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct Document<T> {
    data: T,
}

#[derive(Debug, Serialize)]
struct ErrorObject {
    title: &'static str,
    detail: String,
    status: String,
}

#[derive(Debug, Serialize)]
struct ErrorDocument {
    errors: Vec<ErrorObject>,
}

/// A serialized JSON:API body with its status code
#[derive(Debug)]
pub struct JsonApi {
    status: StatusCode,
    body: serde_json::Result<Vec<u8>>,
}

impl JsonApi {
    /// Single-resource document
    pub fn one(status: StatusCode, stream: &Stream) -> Self {
        Self::encode(status, &Document {
            data: Resource::from(stream),
        })
    }

    /// Collection document; `data` is `[]` when empty
    pub fn many(status: StatusCode, streams: &[Stream]) -> Self {
        let data: Vec<Resource<'_>> = streams.iter().map(Resource::from).collect();
        Self::encode(status, &Document { data })
    }

    fn encode<T: Serialize>(status: StatusCode, document: &T) -> Self {
        Self {
            status,
            body: serde_json::to_vec(document),
        }
    }
}

impl IntoResponse for JsonApi {
    fn into_response(self) -> Response {
        match self.body {
            Ok(body) => (self.status, [(header::CONTENT_TYPE, CONTENT_TYPE)], body).into_response(),
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode JSON:API document");
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
            }
        }
    }
}

/// A JSON:API error response
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    title: &'static str,
    detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, title: &'static str, detail: impl Into<String>) -> Self {
        Self {
            status,
            title,
            detail: detail.into(),
        }
    }

    /// 400 response for a rejected registry operation
    pub fn registry(title: &'static str, err: RegistryError) -> Self {
        Self::new(StatusCode::BAD_REQUEST, title, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::debug!(
            status = self.status.as_u16(),
            title = self.title,
            detail = %self.detail,
            "Request failed"
        );

        let document = ErrorDocument {
            errors: vec![ErrorObject {
                title: self.title,
                detail: self.detail,
                status: self.status.as_u16().to_string(),
            }],
        };
        JsonApi::encode(self.status, &document).into_response()
    }
}
