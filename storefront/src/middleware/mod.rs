//! Authentication, authorization and request tracking middleware

pub mod jwt;
pub mod permission;
pub mod request_tracking;
pub mod token;

pub use jwt::JwtAuth;
pub use permission::{Access, RequirePermission, RolePolicy, SelfAccess};
pub use request_tracking::{
    request_id_layer, request_id_propagation_layer, sensitive_headers_layer, MakeRequestUuid,
    REQUEST_ID_HEADER, SENSITIVE_HEADERS,
};
pub use token::{extract_token, Claims, TokenValidator};
