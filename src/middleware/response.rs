use axum::{
    body::Body,
    http::{header, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::ApiError;

pub const ALLOW_HEADERS: &str = "Content-Type,Authorization";
pub const ALLOW_METHODS: &str = "GET,POST,PUT,DELETE,OPTIONS";

/// Transport-neutral response: status, headers and a JSON body.
/// Rendered either as an axum response or as a gateway proxy result.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub headers: Vec<(String, String)>,
    pub body: Value,
}

impl ApiResponse {
    /// Create a response with the JSON content type set
    pub fn with_status(body: Value, status: StatusCode) -> Self {
        Self {
            status,
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body,
        }
    }

    /// 200 OK with the serialized payload as the body
    pub fn success<T: Serialize>(data: T) -> Result<Self, ApiError> {
        Ok(Self::with_status(serde_json::to_value(data)?, StatusCode::OK))
    }

    /// 201 Created
    pub fn created<T: Serialize>(data: T) -> Result<Self, ApiError> {
        Ok(Self::with_status(serde_json::to_value(data)?, StatusCode::CREATED))
    }

    /// CORS preflight answer
    pub fn preflight() -> Self {
        Self::with_status(json!({}), StatusCode::OK)
    }

    pub fn from_error(err: &ApiError) -> Self {
        Self::with_status(err.to_json(), err.status_code())
    }

    /// Attach the fixed CORS header set
    pub fn with_cors(mut self, origin: &str) -> Self {
        self.headers.extend([
            ("Access-Control-Allow-Origin".to_string(), origin.to_string()),
            ("Access-Control-Allow-Headers".to_string(), ALLOW_HEADERS.to_string()),
            ("Access-Control-Allow-Methods".to_string(), ALLOW_METHODS.to_string()),
        ]);
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn body_string(&self) -> String {
        self.body.to_string()
    }
}

impl From<ApiError> for ApiResponse {
    fn from(err: ApiError) -> Self {
        ApiResponse::from_error(&err)
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body.to_string()));
        *response.status_mut() = self.status;

        let headers = response.headers_mut();
        for (name, value) in &self.headers {
            match (HeaderName::try_from(name.as_str()), HeaderValue::from_str(value)) {
                (Ok(name), Ok(value)) => {
                    headers.insert(name, value);
                }
                _ => tracing::warn!("Dropping invalid response header {}", name),
            }
        }
        headers
            .entry(header::CONTENT_TYPE)
            .or_insert(HeaderValue::from_static("application/json"));

        response
    }
}

pub type ApiResult = Result<ApiResponse, ApiError>;
