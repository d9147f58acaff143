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

//! Shared test helpers used across integration suites.
//! Layout: fixtures.rs (items and payloads), mocks.rs (scripted transport, manual timer),
//! assert.rs (state assertions).

pub mod assert;
pub mod fixtures;
pub mod mocks;
