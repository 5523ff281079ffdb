use axum::{
    body::to_bytes,
    extract::{Request, State},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde_json::{json, Value};
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

use super::request::{parse_query, ApiRequest};
use crate::error::ApiError;
use crate::middleware::claims_from_headers;
use crate::state::AppState;

/// HTTP adapter: every path except `/health` goes through the dispatcher
pub fn app(state: AppState) -> Router {
    let limit = state.max_request_size;

    Router::new()
        .route("/health", get(health))
        .fallback(dispatch)
        .layer(RequestBodyLimitLayer::new(limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now(),
    }))
}

async fn dispatch(State(state): State<AppState>, request: Request) -> Response {
    let (parts, body) = request.into_parts();

    let body = match to_bytes(body, state.max_request_size).await {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::warn!("Rejected request body for {} {}: {}", parts.method, parts.uri, err);
            let too_large = ApiError::payload_too_large(format!(
                "Request body exceeds {} bytes",
                state.max_request_size
            ));
            return state.dispatcher.reject(&too_large).into_response();
        }
    };

    let headers = parts
        .headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();

    let request = ApiRequest {
        claims: claims_from_headers(&parts.headers, &state.security),
        method: parts.method,
        path: parts.uri.path().to_string(),
        headers,
        query: parse_query(parts.uri.query()),
        body,
    };

    state.dispatcher.dispatch(request).await.into_response()
}
