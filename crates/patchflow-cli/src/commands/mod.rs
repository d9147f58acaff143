//! Command handlers grouped by concern.

pub(crate) mod lists;
pub(crate) mod session;
