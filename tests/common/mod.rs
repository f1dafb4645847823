//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, Response};
use download_proxy::config::ProxyConfig;
use download_proxy::error::BoxError;
use download_proxy::forward::Upstream;
use download_proxy::HttpServer;
use futures_util::future::BoxFuture;
use futures_util::StreamExt;
use tower::ServiceExt;

/// What the proxy sent upstream.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub has_body: bool,
}

#[derive(Debug, Clone)]
enum Reply {
    Respond {
        status: u16,
        headers: Vec<(&'static str, &'static str)>,
        body: Vec<u8>,
    },
    Trickle {
        headers: Vec<(&'static str, &'static str)>,
        chunks: Vec<&'static str>,
        interval: Duration,
    },
    Stall,
    Fail,
}

/// Upstream that records requests and answers with a fixed reply.
#[derive(Debug)]
pub struct ScriptedUpstream {
    reply: Reply,
    seen: Mutex<Vec<SeenRequest>>,
}

impl ScriptedUpstream {
    pub fn respond(status: u16, headers: &[(&'static str, &'static str)], body: impl Into<Vec<u8>>) -> Arc<Self> {
        Arc::new(Self {
            reply: Reply::Respond {
                status,
                headers: headers.to_vec(),
                body: body.into(),
            },
            seen: Mutex::new(Vec::new()),
        })
    }

    /// 200 with headers sent at once and each chunk after `interval`.
    pub fn trickle(
        headers: &[(&'static str, &'static str)],
        chunks: &[&'static str],
        interval: Duration,
    ) -> Arc<Self> {
        Self::with_reply(Reply::Trickle {
            headers: headers.to_vec(),
            chunks: chunks.to_vec(),
            interval,
        })
    }

    /// Never answers.
    pub fn stalled() -> Arc<Self> {
        Self::with_reply(Reply::Stall)
    }

    pub fn failing() -> Arc<Self> {
        Self::with_reply(Reply::Fail)
    }

    fn with_reply(reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            reply,
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn seen(&self) -> Vec<SeenRequest> {
        self.seen.lock().unwrap().clone()
    }

    pub fn last(&self) -> SeenRequest {
        self.seen().pop().expect("no upstream request recorded")
    }
}

impl Upstream for ScriptedUpstream {
    fn send(&self, request: reqwest::Request) -> BoxFuture<'static, Result<reqwest::Response, BoxError>> {
        self.seen.lock().unwrap().push(SeenRequest {
            method: request.method().clone(),
            url: request.url().to_string(),
            headers: request.headers().clone(),
            has_body: request.body().is_some(),
        });

        let reply = self.reply.clone();
        Box::pin(async move {
            match reply {
                Reply::Respond { status, headers, body } => {
                    let mut builder = Response::builder().status(status);
                    for (name, value) in headers {
                        builder = builder.header(name, value);
                    }
                    let response = builder.body(body)?;
                    Ok(reqwest::Response::from(response))
                }
                Reply::Trickle { headers, chunks, interval } => {
                    let mut builder = Response::builder().status(200);
                    for (name, value) in headers {
                        builder = builder.header(name, value);
                    }
                    let stream = futures_util::stream::iter(chunks).then(move |chunk| async move {
                        tokio::time::sleep(interval).await;
                        Ok::<_, std::io::Error>(chunk)
                    });
                    let response = builder.body(reqwest::Body::wrap_stream(stream))?;
                    Ok(reqwest::Response::from(response))
                }
                Reply::Stall => futures_util::future::pending().await,
                Reply::Fail => Err(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    "connection refused",
                )
                .into()),
            }
        })
    }
}

/// Config with rewrite mode switched on or off.
pub fn config(rewrite: bool) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.rewrite.enabled = rewrite;
    config
}

/// Config with a one-second wait for upstream headers.
pub fn short_timeout_config(rewrite: bool) -> ProxyConfig {
    let mut config = config(rewrite);
    config.timeouts.request_secs = 1;
    config
}

/// Send one request through the full middleware stack.
pub async fn send(server: &HttpServer, request: Request<Body>) -> Response<Body> {
    server.router().oneshot(request).await.unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8_lossy(&bytes).into_owned()
}
