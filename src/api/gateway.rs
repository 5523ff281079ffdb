use std::collections::HashMap;

use bytes::Bytes;
use lambda_http::{service_fn, Body, Error, Request, RequestExt, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::request::ApiRequest;
use super::router::Dispatcher;
use crate::auth::Claims;
use crate::error::ApiError;
use crate::middleware::ApiResponse;

/// Where authorizer claims sit in the serialized request context, for
/// REST (Cognito), HTTP API (JWT) and Lambda authorizers in that order
const CLAIM_POINTERS: [&str; 3] = ["/authorizer/claims", "/authorizer/jwt/claims", "/authorizer/lambda/claims"];

/// Proxy integration result, as printed by `roster invoke`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyResponse {
    pub status_code: u16,
    pub headers: HashMap<String, String>,
    pub body: String,
    pub is_base64_encoded: bool,
}

impl From<ApiResponse> for ProxyResponse {
    fn from(response: ApiResponse) -> Self {
        ProxyResponse {
            status_code: response.status.as_u16(),
            body: response.body_string(),
            headers: response.headers.into_iter().collect(),
            is_base64_encoded: false,
        }
    }
}

fn authorizer_claims(request: &Request) -> Option<Claims> {
    let context = serde_json::to_value(request.request_context_ref()?).ok()?;
    CLAIM_POINTERS
        .iter()
        .find_map(|pointer| context.pointer(pointer))
        .and_then(Claims::from_value)
}

/// Map a Lambda HTTP request onto the transport-neutral request. The body
/// arrives already base64-decoded.
pub fn into_api_request(request: &Request) -> ApiRequest {
    let path = match request.raw_http_path() {
        "" => request.uri().path(),
        raw => raw,
    };

    let headers = request
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
        })
        .collect();

    let query = request
        .query_string_parameters_ref()
        .map(|params| {
            params
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect()
        })
        .unwrap_or_default();

    ApiRequest {
        method: request.method().clone(),
        path: path.to_string(),
        headers,
        query,
        body: Bytes::copy_from_slice(request.body().as_ref()),
        claims: authorizer_claims(request),
    }
}

pub fn into_lambda_response(response: ApiResponse) -> Result<Response<Body>, Error> {
    let mut builder = Response::builder().status(response.status.as_u16());
    let body = response.body_string();
    for (name, value) in &response.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    Ok(builder.body(Body::from(body))?)
}

/// Lambda handler: one request through the dispatcher
pub async fn handle_request(dispatcher: &Dispatcher, request: Request) -> Result<Response<Body>, Error> {
    let response = dispatcher.dispatch(into_api_request(&request)).await;
    into_lambda_response(response)
}

/// Serve Lambda invocations until the runtime shuts down
pub async fn run(dispatcher: Dispatcher) -> Result<(), Error> {
    lambda_http::run(service_fn(|request| handle_request(&dispatcher, request))).await
}

/// Replay a raw proxy event (REST or HTTP API payload) through the dispatcher
pub async fn handle_event(dispatcher: &Dispatcher, event: Value) -> ProxyResponse {
    let response = match lambda_http::request::from_str(&event.to_string()) {
        Ok(request) => dispatcher.dispatch(into_api_request(&request)).await,
        Err(e) => {
            let err = ApiError::bad_request(format!("Invalid proxy event: {}", e));
            tracing::warn!("Rejected proxy event: {}", err);
            dispatcher.reject(&err)
        }
    };
    response.into()
}
