//! Fixed endpoint and logging defaults. None of these are read from the
//! environment except the log filter, which honours `RUST_LOG`.

pub const API_BASE_URL: &str = "http://localhost:3000";

pub const USER_ID: &str = "clea42ofr0000vkdk27zyc99u";

pub const DEFAULT_LOG_FILTER: &str = "info";

/// `{base}/api/v1/users/{user_id}/records`
pub fn records_url(base: &str, user_id: &str) -> String {
    format!("{}/api/v1/users/{user_id}/records", base.trim_end_matches('/'))
}

pub fn default_endpoint() -> String {
    records_url(API_BASE_URL, USER_ID)
}
