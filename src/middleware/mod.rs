pub mod admin;
pub mod auth;
pub mod extract;
pub mod response;

pub use admin::require_admin;
pub use auth::{bearer_token, require_authenticated};
pub use extract::ApiJson;
pub use response::{ApiResponse, ApiResult};
