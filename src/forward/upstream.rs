//! Upstream transport.
//!
//! The forwarder only needs "send this request, give me the response". That seam
//! is the [`Upstream`] trait; production uses a `reqwest::Client` with redirect
//! following, tests plug in a scripted implementation.

use std::time::Duration;

use futures_util::future::BoxFuture;
use reqwest::redirect::Policy;

use crate::config::{TimeoutConfig, UpstreamConfig};
use crate::error::BoxError;

/// Sends one prepared request to the target server.
pub trait Upstream: Send + Sync + 'static {
    fn send(&self, request: reqwest::Request) -> BoxFuture<'static, Result<reqwest::Response, BoxError>>;
}

impl Upstream for reqwest::Client {
    fn send(&self, request: reqwest::Request) -> BoxFuture<'static, Result<reqwest::Response, BoxError>> {
        let client = self.clone();
        Box::pin(async move { client.execute(request).await.map_err(BoxError::from) })
    }
}

/// Build the outbound HTTP client.
///
/// Redirects are followed up to `max_redirects` hops. There is no overall
/// request timeout here; time-to-headers is bounded by the forwarder and bodies
/// stream for as long as the upstream keeps sending.
pub fn build_client(
    upstream: &UpstreamConfig,
    timeouts: &TimeoutConfig,
) -> Result<reqwest::Client, reqwest::Error> {
    let redirect = if upstream.max_redirects == 0 {
        Policy::none()
    } else {
        Policy::limited(upstream.max_redirects)
    };

    reqwest::Client::builder()
        .redirect(redirect)
        .connect_timeout(Duration::from_secs(timeouts.connect_secs))
        .build()
}
