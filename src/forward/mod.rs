//! Request forwarding subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request
//!     → target.rs (decode /<host>/<path>, validate host)
//!     → replace.rs (rewrite mode: pull __sr pairs out of the query)
//!     → security/headers.rs (strip edge + hop-by-hop headers)
//!     → upstream.rs (send over https, follow redirects)
//!     → http/response.rs (download headers, optional body rewrite)
//! ```
//!
//! # Design Decisions
//! - Stateless per request; the only shared value is the policy snapshot
//! - Request bodies are streamed, never buffered
//! - The request timeout covers the wait for upstream headers only; bodies
//!   stream (or buffer, for rewrites) without a deadline
//! - Policy is swapped atomically on config reload; in-flight requests keep
//!   the snapshot they started with

pub mod replace;
pub mod target;
pub mod upstream;

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use axum::{
    body::{Body, HttpBody},
    http::{header::ACCEPT_ENCODING, HeaderName, Request},
    response::Response,
};

use crate::config::ProxyConfig;
use crate::error::{ProxyError, ProxyResult};
use crate::http::response::into_download;
use crate::security::headers::{filter_request_headers, parse_header_names};

pub use replace::ReplacementPair;
pub use target::ParsedTarget;
pub use upstream::Upstream;

/// Per-request settings derived from the configuration.
#[derive(Debug, Clone)]
pub struct ForwardPolicy {
    /// Request headers never forwarded upstream.
    pub stripped_request_headers: Vec<HeaderName>,
    /// Whether `__sr` query parameters drive body replacement.
    pub rewrite_enabled: bool,
    /// Buffer limit for rewritten bodies.
    pub max_rewrite_bytes: usize,
}

impl ForwardPolicy {
    pub fn from_config(config: &ProxyConfig) -> Self {
        Self {
            stripped_request_headers: parse_header_names(&config.forwarding.strip_request_headers),
            rewrite_enabled: config.rewrite.enabled,
            max_rewrite_bytes: config.rewrite.max_body_bytes,
        }
    }
}

impl Default for ForwardPolicy {
    fn default() -> Self {
        Self::from_config(&ProxyConfig::default())
    }
}

/// Upstream request prepared from an inbound one.
#[derive(Debug)]
pub struct Prepared {
    pub target: ParsedTarget,
    pub pairs: Vec<ReplacementPair>,
    pub request: reqwest::Request,
}

/// Forwards inbound requests to the host named in their path.
pub struct Forwarder {
    upstream: Arc<dyn Upstream>,
    policy: Arc<ArcSwap<ForwardPolicy>>,
    request_timeout: Duration,
}

impl Forwarder {
    pub fn new(
        upstream: Arc<dyn Upstream>,
        policy: Arc<ArcSwap<ForwardPolicy>>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            upstream,
            policy,
            request_timeout,
        }
    }

    /// Current policy snapshot.
    pub fn policy(&self) -> Arc<ForwardPolicy> {
        self.policy.load_full()
    }

    /// Build the upstream request without sending it.
    pub fn prepare(&self, request: Request<Body>, policy: &ForwardPolicy) -> ProxyResult<Prepared> {
        let (parts, body) = request.into_parts();
        let target = ParsedTarget::from_path(parts.uri.path())?;

        let (query, pairs) = if policy.rewrite_enabled {
            let split = replace::split_query(parts.uri.query());
            (split.forwarded, split.pairs)
        } else {
            (parts.uri.query().map(str::to_string), Vec::new())
        };

        let target_url = target.url(query.as_deref());
        let url = reqwest::Url::parse(&target_url)
            .map_err(|_| ProxyError::InvalidTarget(target_url.clone()))?;

        let mut outbound = reqwest::Request::new(parts.method, url);
        *outbound.headers_mut() = filter_request_headers(&parts.headers, &policy.stripped_request_headers);
        if !pairs.is_empty() {
            // Let the client negotiate an encoding it can decode before rewriting.
            outbound.headers_mut().remove(ACCEPT_ENCODING);
        }
        if body.size_hint().exact() != Some(0) {
            *outbound.body_mut() = Some(reqwest::Body::wrap_stream(body.into_data_stream()));
        }

        Ok(Prepared {
            target,
            pairs,
            request: outbound,
        })
    }

    /// Forward `request` and build the download response.
    pub async fn forward(&self, request: Request<Body>) -> ProxyResult<Response> {
        let policy = self.policy();
        let prepared = self.prepare(request, &policy)?;

        tracing::debug!(
            url = %prepared.request.url(),
            method = %prepared.request.method(),
            pairs = prepared.pairs.len(),
            "Forwarding upstream"
        );

        let response = tokio::time::timeout(self.request_timeout, self.upstream.send(prepared.request))
            .await
            .map_err(|_| ProxyError::UpstreamTimeout {
                secs: self.request_timeout.as_secs(),
            })?
            .map_err(ProxyError::Upstream)?;

        tracing::debug!(status = %response.status(), "Upstream responded");

        into_download(response, &prepared.target, &prepared.pairs, policy.max_rewrite_bytes).await
    }
}
