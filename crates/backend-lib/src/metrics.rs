// ==============
// crates/backend-lib/src/metrics.rs

//! Central place for metric keys
pub const SIGNUP_CREATED: &str = "auth.signup.created";
pub const SIGNUP_CONFLICT: &str = "auth.signup.conflict";
pub const LOGIN_SUCCESS: &str = "auth.login.success";
pub const LOGIN_FAILURE: &str = "auth.login.failure";
pub const GATEWAY_FORWARDED: &str = "gateway.forwarded";
pub const GATEWAY_ROUTE_NOT_FOUND: &str = "gateway.route_not_found";
pub const GATEWAY_UPSTREAM_ERROR: &str = "gateway.upstream_error";
