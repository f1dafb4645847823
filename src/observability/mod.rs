//! Observability subsystem.
//!
//! Structured logging only: `tracing` events from every module, request spans
//! from `tower_http::trace`, each tagged with the request ID.

pub mod logging;
