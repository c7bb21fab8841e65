//! AWS-oriented adapters and Lambda handlers for the button event pipeline.
//!
//! This crate owns runtime integration details (Lambda handlers and the
//! queue, notification, secret, and warehouse adapters) for the binaries
//! under `src/bin`. Deterministic domain logic lives in `button_events_core`.

pub mod adapters;
pub mod handlers;
