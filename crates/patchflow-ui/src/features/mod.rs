//! Feature surfaces: paged lists, session flows and send request drafting.
pub mod lists;
pub mod send_requests;
pub mod session;
