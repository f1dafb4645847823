//! Download proxy library.
//!
//! Forwards `/<host>/<path>` to `https://<host>/<path>` and hands the response
//! back as an attachment.

pub mod config;
pub mod error;
pub mod forward;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::schema::ProxyConfig;
pub use error::{ProxyError, ProxyResult};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
