//! Browser bindings: fetch transport, timers and the yewdux store handle.

pub mod http;
pub mod runtime;
pub mod timer;
