//! Core, DOM-free primitives shared by every feature.
pub mod api;
pub mod auth;
pub mod logic;
pub mod navigation;
pub mod store;
pub mod transport;
