#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls
)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::multiple_crate_versions)]
//! Patchflow browser client core.
//!
//! Holds the paged list cache, the per-role list registry, review tracking, the
//! freshness poller and the session slice. Everything outside `services` is
//! DOM-free and runs natively under test; browser glue is gated on wasm32.

pub mod core;
pub mod features;

#[cfg(target_arch = "wasm32")]
pub mod services;

pub use crate::core::api::{ApiClient, ApiError};
pub use crate::core::store::{AppStore, LocalStore, StoreHandle};
pub use crate::core::transport::{
    HttpMethod, HttpRequest, HttpResponse, HttpTransport, TransportError,
};
