pub mod auth;
pub mod response;

pub use auth::{authenticate, require_admin, require_staff};
pub use response::{json_body, query_params, ApiResponse, ApiResult};
