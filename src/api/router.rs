use std::any::Any;
use std::panic::AssertUnwindSafe;

use axum::http::Method;
use futures::FutureExt;

use super::request::ApiRequest;
use crate::database::LookupKind;
use crate::error::ApiError;
use crate::handlers;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::MemberService;

const ROOT_SEGMENT: &str = "members";

/// Operation selected for a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route<'a> {
    ListMembers,
    GetMember(&'a str),
    CreateMember,
    UpdateMember(&'a str),
    ReplaceImage(&'a str),
    DeleteMember(&'a str),
    Characters,
    Lookup(LookupKind),
    Sessions(&'a str),
    SessionCount(&'a str),
}

fn missing_id(what: &str) -> ApiError {
    ApiError::bad_request(format!("{} id is required", what))
}

fn no_route(method: &Method, segments: &[&str]) -> ApiError {
    ApiError::not_found(format!("No route for {} /{}", method, segments.join("/")))
}

/// Map (method, segments) to an operation
pub fn resolve<'a>(method: &Method, segments: &[&'a str]) -> Result<Route<'a>, ApiError> {
    match segments.first() {
        Some(&ROOT_SEGMENT) => {}
        _ => return Err(no_route(method, segments)),
    }

    let route = match (method.as_str(), &segments[1..]) {
        ("GET", []) => Route::ListMembers,
        ("GET", ["member", id]) => Route::GetMember(*id),
        ("GET", ["characters"]) => Route::Characters,
        ("GET", ["sessions", member_id]) => Route::Sessions(*member_id),
        ("GET", ["sessions", member_id, "count"]) => Route::SessionCount(*member_id),
        ("GET", [resource]) => match LookupKind::from_segment(resource) {
            Some(kind) => Route::Lookup(kind),
            None if matches!(*resource, "member" | "sessions") => return Err(missing_id("Member")),
            None => return Err(no_route(method, segments)),
        },
        ("POST", ["member"]) => Route::CreateMember,
        ("PUT", ["member", id]) => Route::UpdateMember(*id),
        ("PUT", ["member", id, "image"]) => Route::ReplaceImage(*id),
        ("DELETE", ["member", id]) => Route::DeleteMember(*id),
        ("PUT" | "DELETE", ["member"]) => return Err(missing_id("Member")),
        _ => return Err(no_route(method, segments)),
    };
    Ok(route)
}

fn is_supported(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET | Method::POST | Method::PUT | Method::DELETE | Method::OPTIONS
    )
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "Unexpected failure while handling request".to_string()
    }
}

/// Top-level entry point shared by every transport
#[derive(Clone)]
pub struct Dispatcher {
    service: MemberService,
    cors_origin: String,
}

impl Dispatcher {
    pub fn new(service: MemberService, cors_origin: impl Into<String>) -> Self {
        Self {
            service,
            cors_origin: cors_origin.into(),
        }
    }

    /// Error response for failures that happen before dispatch
    pub fn reject(&self, err: &ApiError) -> ApiResponse {
        ApiResponse::from_error(err).with_cors(&self.cors_origin)
    }

    /// Handle one request. Never fails: errors and panics become responses.
    pub async fn dispatch(&self, request: ApiRequest) -> ApiResponse {
        if request.method == Method::OPTIONS {
            return ApiResponse::preflight().with_cors(&self.cors_origin);
        }

        let response = if !is_supported(&request.method) {
            ApiResponse::from_error(&ApiError::method_not_allowed(format!(
                "Method {} not allowed",
                request.method
            )))
        } else {
            match AssertUnwindSafe(self.route(&request)).catch_unwind().await {
                Ok(Ok(response)) => response,
                Ok(Err(err)) => {
                    if err.status_code().is_server_error() {
                        tracing::error!("{} {} failed: {}", request.method, request.path, err);
                    } else {
                        tracing::debug!("{} {} rejected: {}", request.method, request.path, err);
                    }
                    ApiResponse::from_error(&err)
                }
                Err(panic) => {
                    let message = panic_message(panic.as_ref());
                    tracing::error!("{} {} panicked: {}", request.method, request.path, message);
                    ApiResponse::from_error(&ApiError::internal(message))
                }
            }
        };

        response.with_cors(&self.cors_origin)
    }

    async fn route(&self, request: &ApiRequest) -> ApiResult {
        let segments = request.segments();
        let route = resolve(&request.method, &segments)?;
        tracing::debug!("{} {} -> {:?}", request.method, request.path, route);

        let service = &self.service;
        match route {
            Route::ListMembers => handlers::member_list(service).await,
            Route::GetMember(id) => handlers::member_get(service, id).await,
            Route::CreateMember => handlers::member_post(service, request).await,
            Route::UpdateMember(id) => handlers::member_put(service, request, id).await,
            Route::ReplaceImage(id) => handlers::member_put_image(service, request, id).await,
            Route::DeleteMember(id) => handlers::member_delete(service, request, id).await,
            Route::Characters => handlers::characters_list(service, request).await,
            Route::Lookup(kind) => handlers::lookup_list(service, kind).await,
            Route::Sessions(member_id) => handlers::sessions_list(service, member_id).await,
            Route::SessionCount(member_id) => handlers::sessions_count(service, member_id).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(method: Method, path: &str) -> Result<Route<'_>, ApiError> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        resolve(&method, &segments)
    }

    #[test]
    fn routes_member_operations() {
        assert_eq!(route(Method::GET, "/members").unwrap(), Route::ListMembers);
        assert_eq!(route(Method::GET, "/members/member/42").unwrap(), Route::GetMember("42"));
        assert_eq!(route(Method::POST, "/members/member").unwrap(), Route::CreateMember);
        assert_eq!(route(Method::PUT, "/members/member/42").unwrap(), Route::UpdateMember("42"));
        assert_eq!(route(Method::PUT, "/members/member/42/image").unwrap(), Route::ReplaceImage("42"));
        assert_eq!(route(Method::DELETE, "/members/member/42").unwrap(), Route::DeleteMember("42"));
    }

    #[test]
    fn routes_lookups_and_sessions() {
        assert_eq!(route(Method::GET, "/members/characters").unwrap(), Route::Characters);
        assert_eq!(route(Method::GET, "/members/auras").unwrap(), Route::Lookup(LookupKind::Auras));
        assert_eq!(route(Method::GET, "/members/sessions/7").unwrap(), Route::Sessions("7"));
        assert_eq!(route(Method::GET, "/members/sessions/7/count").unwrap(), Route::SessionCount("7"));
    }

    #[test]
    fn unroutable_paths() {
        assert_eq!(route(Method::GET, "/heroes").unwrap_err().error_code(), "NOT_FOUND");
        assert_eq!(route(Method::GET, "/").unwrap_err().error_code(), "NOT_FOUND");
        assert_eq!(route(Method::GET, "/members/weapons").unwrap_err().error_code(), "NOT_FOUND");
        assert_eq!(route(Method::POST, "/members/member/42").unwrap_err().error_code(), "NOT_FOUND");
        assert_eq!(route(Method::PUT, "/members/member").unwrap_err().error_code(), "BAD_REQUEST");
        assert_eq!(route(Method::GET, "/members/sessions").unwrap_err().error_code(), "BAD_REQUEST");
    }
}
