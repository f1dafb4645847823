//! Response assembly.
//!
//! # Responsibilities
//! - Keep the upstream status code as is (no remapping)
//! - Apply the download headers
//! - Stream the body through, or buffer and rewrite it when pairs were requested
//!
//! # Design Decisions
//! - Passthrough never buffers and leaves Content-Length alone
//! - A rewritten body gets a Content-Length matching the new text exactly
//! - A body still carrying a Content-Encoding was not decoded by the client
//!   and is passed through untouched instead of being rewritten

use axum::{
    body::Body,
    http::{
        header::{CONTENT_ENCODING, CONTENT_LENGTH},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::Response,
};

use crate::error::ProxyResult;
use crate::forward::replace::{read_body_limited, rewrite_body, ReplacementPair};
use crate::forward::target::ParsedTarget;
use crate::security::headers::download_headers;

/// Turn an upstream response into the response returned to the client.
pub async fn into_download(
    upstream: reqwest::Response,
    target: &ParsedTarget,
    pairs: &[ReplacementPair],
    max_rewrite_bytes: usize,
) -> ProxyResult<Response> {
    let status = upstream.status();
    let mut headers = download_headers(upstream.headers(), target.download_name());

    if pairs.is_empty() || is_encoded(upstream.headers()) {
        if !pairs.is_empty() {
            tracing::warn!(
                encoding = ?upstream.headers().get(CONTENT_ENCODING),
                "Upstream body is encoded, skipping rewrite"
            );
        }
        let body = Body::from_stream(upstream.bytes_stream());
        return Ok(assemble(status, headers, body));
    }

    let raw = read_body_limited(upstream, max_rewrite_bytes).await?;
    let text = rewrite_body(&raw, pairs);
    headers.insert(CONTENT_LENGTH, HeaderValue::from(text.len()));

    tracing::debug!(
        original_bytes = raw.len(),
        rewritten_bytes = text.len(),
        pairs = pairs.len(),
        "Rewrote upstream body"
    );

    Ok(assemble(status, headers, Body::from(text)))
}

fn is_encoded(headers: &HeaderMap) -> bool {
    headers
        .get_all(CONTENT_ENCODING)
        .iter()
        .any(|value| !value.as_bytes().eq_ignore_ascii_case(b"identity"))
}

fn assemble(status: StatusCode, headers: HeaderMap, body: Body) -> Response {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}
