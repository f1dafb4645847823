//! Query-driven body text replacement.
//!
//! Clients ask for substitutions with repeated `__sr=old:new` query parameters.
//! Pairs are applied in the order they appear, each one over the output of the
//! previous one, so `__sr=foo:bar&__sr=bar:baz` turns `foo` into `baz`.

use futures_util::StreamExt;
use url::form_urlencoded;

use crate::error::{ProxyError, ProxyResult};

/// Query parameter carrying one `old:new` pair.
pub const REPLACE_PARAM: &str = "__sr";

/// A literal substitution requested by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplacementPair {
    pub old: String,
    pub new: String,
}

impl ReplacementPair {
    /// Split on the first `:`. Returns `None` when there is no colon or the
    /// colon is the first character.
    pub fn parse(value: &str) -> Option<Self> {
        match value.find(':') {
            Some(idx) if idx > 0 => Some(Self {
                old: value[..idx].to_string(),
                new: value[idx + 1..].to_string(),
            }),
            _ => None,
        }
    }
}

/// Inbound query split into replacement pairs and the part sent upstream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitQuery {
    pub pairs: Vec<ReplacementPair>,
    /// Remaining parameters in original order and original encoding.
    pub forwarded: Option<String>,
}

/// Pull every `__sr` parameter out of `query`.
///
/// Parameter names and values are form-decoded for matching; parameters that are
/// forwarded keep their raw text. Empty `&&` segments are dropped.
pub fn split_query(query: Option<&str>) -> SplitQuery {
    let Some(query) = query else {
        return SplitQuery::default();
    };

    let mut pairs = Vec::new();
    let mut kept = Vec::new();

    for piece in query.split('&').filter(|p| !p.is_empty()) {
        match form_urlencoded::parse(piece.as_bytes()).next() {
            Some((name, value)) if name == REPLACE_PARAM => {
                if let Some(pair) = ReplacementPair::parse(&value) {
                    pairs.push(pair);
                }
            }
            _ => kept.push(piece),
        }
    }

    let forwarded = if kept.is_empty() {
        None
    } else {
        Some(kept.join("&"))
    };

    SplitQuery { pairs, forwarded }
}

/// Apply `pairs` to `text` one after another.
pub fn apply_pairs(text: &str, pairs: &[ReplacementPair]) -> String {
    pairs.iter().fold(text.to_string(), |acc, pair| {
        if acc.contains(pair.old.as_str()) {
            acc.replace(pair.old.as_str(), &pair.new)
        } else {
            acc
        }
    })
}

/// Buffer an upstream body, failing once it grows past `limit` bytes.
pub async fn read_body_limited(response: reqwest::Response, limit: usize) -> ProxyResult<Vec<u8>> {
    if let Some(declared) = response.content_length() {
        if declared > limit as u64 {
            return Err(ProxyError::BodyTooLarge { limit });
        }
    }

    let mut buf = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(ProxyError::UpstreamBody)?;
        if buf.len() + chunk.len() > limit {
            return Err(ProxyError::BodyTooLarge { limit });
        }
        buf.extend_from_slice(&chunk);
    }

    Ok(buf)
}

/// Decode a buffered body as UTF-8 (lossy) and rewrite it.
pub fn rewrite_body(raw: &[u8], pairs: &[ReplacementPair]) -> String {
    apply_pairs(&String::from_utf8_lossy(raw), pairs)
}
