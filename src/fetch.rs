//! Metadata Fetcher: resolves a token's metadata URI to a document.
//!
//! Two transport encodings exist in the wild. Badge tokens embed their whole
//! document in the URI as base64 JSON (`data:application/json;base64,...`);
//! mood tokens point at a pinned JSON document (`ipfs://<cid>`) that must be
//! fetched over an HTTP gateway. [`MetadataSource`] is the tagged union that
//! resolves both through a single decode step, so the inline/remote
//! conditional lives here and nowhere else.
//!
//! Inline documents never touch the network; remote ones cost exactly one
//! outbound GET.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use once_cell::sync::Lazy;
use serde_json::Value;

use crate::config::{PipelineConfig, INLINE_JSON_PREFIX};
use crate::error::FetchError;
use crate::types::MetadataDocument;

// Process-wide HTTP client with pooled connections. Building the client can
// only fail on TLS backend misconfiguration, which is unrecoverable anyway.
pub(crate) static HTTP_CLIENT: Lazy<reqwest::Client> = Lazy::new(|| {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .pool_max_idle_per_host(8)
        .build()
        .expect("failed to build HTTP client")
});

/// Where a metadata document lives, resolved from its URI scheme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataSource {
    /// Base64 payload embedded in the URI itself; decodes locally.
    Inline(String),
    /// Directly fetchable HTTP(S) URL (gateway-rewritten when the URI was
    /// content-addressed).
    Remote(String),
}

impl MetadataSource {
    /// Classify a token URI. Inline data URIs keep their payload; `ipfs://`
    /// URIs are rewritten to the configured gateway; anything else is
    /// treated as an already-fetchable URL.
    pub fn parse(uri: &str, cfg: &PipelineConfig) -> Self {
        match uri.strip_prefix(INLINE_JSON_PREFIX) {
            Some(payload) => MetadataSource::Inline(payload.to_string()),
            None => MetadataSource::Remote(cfg.to_gateway_url(uri)),
        }
    }

    pub fn is_inline(&self) -> bool {
        matches!(self, MetadataSource::Inline(_))
    }
}

/// Fetches JSON documents over HTTP. The seam exists so enumeration and
/// badge summaries run against in-memory fakes in tests.
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    async fn fetch_json(&self, url: &str) -> Result<Value, FetchError>;
}

/// Production [`DocumentFetcher`] backed by the shared reqwest client.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpFetcher;

#[async_trait]
impl DocumentFetcher for HttpFetcher {
    async fn fetch_json(&self, url: &str) -> Result<Value, FetchError> {
        let response = HTTP_CLIENT
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::RemoteFetchFailed(status.as_u16()));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| FetchError::MalformedRemoteMetadata(e.to_string()))
    }
}

/// In-memory [`DocumentFetcher`] mapping URLs to canned JSON documents.
///
/// Unknown URLs answer 404. Used throughout the test suites.
#[derive(Debug, Clone, Default)]
pub struct StaticFetcher {
    documents: std::collections::HashMap<String, Value>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(mut self, url: impl Into<String>, document: Value) -> Self {
        self.documents.insert(url.into(), document);
        self
    }
}

#[async_trait]
impl DocumentFetcher for StaticFetcher {
    async fn fetch_json(&self, url: &str) -> Result<Value, FetchError> {
        self.documents
            .get(url)
            .cloned()
            .ok_or(FetchError::RemoteFetchFailed(404))
    }
}

/// Decode an inline base64 JSON payload into a document.
pub fn decode_inline(payload: &str) -> Result<MetadataDocument, FetchError> {
    let bytes = BASE64
        .decode(payload.trim())
        .map_err(|e| FetchError::MalformedInlineMetadata(format!("base64 decode: {e}")))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| FetchError::MalformedInlineMetadata(format!("json parse: {e}")))
}

/// Resolve a [`MetadataSource`] to its document.
///
/// In batch enumeration, callers catch the error and skip the single token;
/// this function itself reports every failure faithfully.
pub async fn fetch_metadata(
    source: &MetadataSource,
    fetcher: &dyn DocumentFetcher,
) -> Result<MetadataDocument, FetchError> {
    match source {
        MetadataSource::Inline(payload) => decode_inline(payload),
        MetadataSource::Remote(url) => {
            let value = fetcher.fetch_json(url).await?;
            serde_json::from_value(value)
                .map_err(|e| FetchError::MalformedRemoteMetadata(e.to_string()))
        }
    }
}
