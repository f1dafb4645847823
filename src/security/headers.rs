//! Header manipulation and download-forcing response headers.
//!
//! # Responsibilities
//! - Strip edge/platform metadata from the forwarded request (configurable list)
//! - Strip hop-by-hop headers in both directions
//! - Drop response headers that would constrain how the payload is embedded
//! - Force every response to be an opaque attachment
//!
//! # Design Decisions
//! - Matching is case-insensitive (`HeaderName` is always lowercase)
//! - Everything not listed passes through untouched, including cookies and
//!   authorization
//! - Content-Type is overridden for every response, whatever the upstream sent

use axum::http::{
    header::{
        CONTENT_DISPOSITION, CONTENT_SECURITY_POLICY, CONTENT_TYPE, X_CONTENT_TYPE_OPTIONS,
        X_FRAME_OPTIONS, CONNECTION,
    },
    HeaderMap, HeaderName, HeaderValue,
};

/// Request headers removed before forwarding when the config does not say otherwise.
pub const DEFAULT_STRIPPED_REQUEST_HEADERS: &[&str] = &[
    "host",
    "cf-connecting-ip",
    "cf-ipcountry",
    "cf-ray",
    "cf-visitor",
    "x-forwarded-proto",
    "x-real-ip",
];

/// Connection-scoped headers (RFC 9110 §7.6.1).
pub(crate) const HOP_BY_HOP_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Response headers removed before the download headers are applied.
pub const STRIPPED_RESPONSE_HEADERS: [HeaderName; 2] = [CONTENT_SECURITY_POLICY, X_FRAME_OPTIONS];

pub const OCTET_STREAM: &str = "application/octet-stream";
pub const NOSNIFF: &str = "nosniff";

/// Remove hop-by-hop headers, including any named in `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let named: Vec<HeaderName> = headers
        .get_all(CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|token| HeaderName::from_bytes(token.trim().as_bytes()).ok())
        .collect();

    for name in named {
        headers.remove(name);
    }
    for name in HOP_BY_HOP_HEADERS {
        headers.remove(*name);
    }
}

/// Copy of `inbound` suitable for sending upstream.
pub fn filter_request_headers(inbound: &HeaderMap, stripped: &[HeaderName]) -> HeaderMap {
    let mut headers = inbound.clone();
    strip_hop_by_hop(&mut headers);
    for name in stripped {
        headers.remove(name);
    }
    headers
}

/// Copy of `upstream` rewritten so the client downloads the payload as `filename`.
pub fn download_headers(upstream: &HeaderMap, filename: &str) -> HeaderMap {
    let mut headers = upstream.clone();
    strip_hop_by_hop(&mut headers);
    for name in &STRIPPED_RESPONSE_HEADERS {
        headers.remove(name);
    }

    headers.insert(CONTENT_DISPOSITION, attachment(filename));
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static(NOSNIFF));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(OCTET_STREAM));
    headers
}

fn attachment(filename: &str) -> HeaderValue {
    HeaderValue::from_str(&format!("attachment; filename=\"{}\"", filename)).unwrap_or_else(|_| {
        tracing::debug!(filename = %filename, "Filename not representable in header, using default");
        HeaderValue::from_static("attachment; filename=\"download\"")
    })
}

/// Parse configured header names, skipping (and logging) any that are invalid.
pub fn parse_header_names(names: &[String]) -> Vec<HeaderName> {
    names
        .iter()
        .filter_map(|name| match HeaderName::from_bytes(name.trim().as_bytes()) {
            Ok(parsed) => Some(parsed),
            Err(_) => {
                tracing::warn!(header = %name, "Ignoring invalid header name");
                None
            }
        })
        .collect()
}
