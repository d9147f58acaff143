//! Paged lists: query state, cache reducer, registry, review tracking and polling.

pub mod checker;
pub mod controller;
pub mod dispatcher;
pub mod query;
pub mod registry;
pub mod review;
pub mod state;
