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

//! Client configuration for the Patchflow browser app and CLI.
//!
//! Layout: `defaults.rs` (built-in values), `model.rs` (typed configuration and
//! the raw document), `loader.rs` (layering and validation), `error.rs`.

pub mod defaults;
pub mod error;
pub mod loader;
pub mod model;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ENV_PREFIX, load, load_from_env};
pub use model::{ClientConfig, ConfigDocument, LogFormatChoice};
