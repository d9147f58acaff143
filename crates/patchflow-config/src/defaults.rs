//! Built-in configuration values.
//!
//! # Design
//! - Keep every default in one place so the browser and CLI agree.
//! - Bounds used by validation live next to the defaults they constrain.

/// API endpoint used when nothing else is configured.
pub const API_BASE_URL: &str = "http://127.0.0.1:8080/main.php";
/// Number of rows per list page.
pub const PAGE_SIZE: u32 = 10;
/// Largest page size the server accepts.
pub const MAX_PAGE_SIZE: u32 = 100;
/// Seconds between two freshness checks.
pub const POLL_INTERVAL_SECS: u64 = 15;
/// Shortest allowed polling interval.
pub const MIN_POLL_INTERVAL_SECS: u64 = 1;
/// Longest allowed polling interval.
pub const MAX_POLL_INTERVAL_SECS: u64 = 3_600;
/// Per-request timeout for the native HTTP client.
pub const REQUEST_TIMEOUT_SECS: u64 = 10;
/// Longest allowed request timeout.
pub const MAX_REQUEST_TIMEOUT_SECS: u64 = 300;
/// Default tracing filter.
pub const LOG_LEVEL: &str = "info";
