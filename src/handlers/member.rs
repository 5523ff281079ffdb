use serde_json::json;

use crate::api::multipart::read_payload;
use crate::api::ApiRequest;
use crate::auth::authorize_mutation;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::MemberService;

/// GET /members - roster listing (projected)
pub async fn list(service: &MemberService) -> ApiResult {
    let members = service.get_all().await?;
    ApiResponse::success(members)
}

/// GET /members/member/:id - single member
pub async fn get(service: &MemberService, id: &str) -> ApiResult {
    let member = service.get_by_id(id).await?;
    ApiResponse::success(member)
}

/// POST /members/member - create from JSON or multipart with an image
pub async fn post(service: &MemberService, request: &ApiRequest) -> ApiResult {
    authorize_mutation(request.claims.as_ref())?;
    let payload = read_payload(request).await?;
    let member = service.create(&payload.data, payload.image).await?;
    ApiResponse::created(member)
}

/// PUT /members/member/:id - sparse update, optionally with a new image
pub async fn put(service: &MemberService, request: &ApiRequest, id: &str) -> ApiResult {
    authorize_mutation(request.claims.as_ref())?;
    let payload = read_payload(request).await?;
    let member = service.update(id, &payload.data, payload.image).await?;
    ApiResponse::success(member)
}

/// PUT /members/member/:id/image - replace only the image
pub async fn put_image(service: &MemberService, request: &ApiRequest, id: &str) -> ApiResult {
    authorize_mutation(request.claims.as_ref())?;
    let payload = read_payload(request).await?;
    let upload = payload
        .image
        .ok_or_else(|| ApiError::validation_error("Image file is required"))?;
    let member = service.replace_image(id, upload).await?;
    ApiResponse::success(member)
}

/// DELETE /members/member/:id
pub async fn delete(service: &MemberService, request: &ApiRequest, id: &str) -> ApiResult {
    authorize_mutation(request.claims.as_ref())?;
    let member = service.delete(id).await?;
    ApiResponse::success(json!({
        "id": member.id,
        "deleted": true,
        "message": format!("Member {} deleted", member.id)
    }))
}
