pub mod auth;
pub mod response;

pub use auth::{claims_from_headers, extract_bearer_token};
pub use response::{ApiResponse, ApiResult};
