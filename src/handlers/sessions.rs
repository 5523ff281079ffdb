use crate::middleware::{ApiResponse, ApiResult};
use crate::services::MemberService;

/// GET /members/sessions/:member_id
pub async fn list(service: &MemberService, member_id: &str) -> ApiResult {
    let sessions = service.get_sessions_by_member_id(member_id).await?;
    ApiResponse::success(sessions)
}

/// GET /members/sessions/:member_id/count
pub async fn count(service: &MemberService, member_id: &str) -> ApiResult {
    let count = service.count_sessions_by_member_id(member_id).await?;
    ApiResponse::success(count)
}
