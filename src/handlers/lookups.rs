use crate::database::LookupKind;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::MemberService;

/// GET /members/{classes,races,auras,groups}
pub async fn list(service: &MemberService, kind: LookupKind) -> ApiResult {
    let entities = service.get_lookup(kind).await?;
    ApiResponse::success(entities)
}
