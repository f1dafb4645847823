//! Target decoding.
//!
//! # Responsibilities
//! - Split the inbound path into upstream host and upstream path
//! - Reject paths without a host segment and hosts without a dot
//! - Compose the `https://` upstream URL
//!
//! # Design Decisions
//! - Host is used verbatim; no DNS or syntax checks beyond the dot
//! - Scheme is always https
//! - No regex; a single scan for the second `/`

use crate::error::{ProxyError, ProxyResult};

/// Fallback name offered to the client when the path has no file name.
pub const DEFAULT_DOWNLOAD_NAME: &str = "download";

/// Upstream host and path decoded from an inbound request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTarget {
    host: String,
    path: String,
}

impl ParsedTarget {
    /// Decode `/<host>[/<rest>]`.
    ///
    /// `<host>` must be non-empty and free of `/`. When `<rest>` is absent the
    /// upstream path is `/`.
    pub fn from_path(path: &str) -> ProxyResult<Self> {
        let tail = path.strip_prefix('/').ok_or(ProxyError::MalformedPath)?;

        let (host, rest) = match tail.find('/') {
            Some(idx) => (&tail[..idx], &tail[idx..]),
            None => (tail, "/"),
        };

        if host.is_empty() {
            return Err(ProxyError::MalformedPath);
        }
        if !host.contains('.') {
            return Err(ProxyError::InvalidDomain);
        }

        Ok(Self {
            host: host.to_string(),
            path: rest.to_string(),
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Text after the last `/` of the upstream path, or `download` when empty.
    pub fn download_name(&self) -> &str {
        match self.path.rsplit('/').next() {
            Some(name) if !name.is_empty() => name,
            _ => DEFAULT_DOWNLOAD_NAME,
        }
    }

    /// Upstream URL with an optional query. An empty query adds no `?`.
    pub fn url(&self, query: Option<&str>) -> String {
        match query.filter(|q| !q.is_empty()) {
            Some(q) => format!("https://{}{}?{}", self.host, self.path, q),
            None => format!("https://{}{}", self.host, self.path),
        }
    }
}
