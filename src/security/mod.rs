//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Outgoing request:
//!     → headers.rs (drop edge metadata, hop-by-hop headers)
//!
//! Returned response:
//!     → headers.rs (drop CSP / frame options, force attachment download)
//! ```
//!
//! # Design Decisions
//! - Every response is a download; no content type is rendered by the browser
//! - No trust in client input: the target host is the only thing taken from the path

pub mod headers;
