//! Synchronization helpers for lifecycle hooks.
//!
//! - [`ReadyGate`]: block an `on_encode_start` hook until another thread
//!   finished producing the object's state.

mod ready;

pub use ready::ReadyGate;
