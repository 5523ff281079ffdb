use crate::api::ApiRequest;
use crate::auth::authorize_character_list;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::MemberService;

/// GET /members/characters[?sub=] - characters owned by the caller, or by
/// another subject for privileged callers
pub async fn list(service: &MemberService, request: &ApiRequest) -> ApiResult {
    let owner = authorize_character_list(request.claims.as_ref(), request.query_param("sub"))?;
    let members = service.get_by_owner(&owner).await?;
    ApiResponse::success(members)
}
