//! Runtime configuration for the aggregation pipeline.
//!
//! [`PipelineConfig`] carries the knobs every stage reads: the content
//! gateway used to rewrite `ipfs://` URIs, the placeholder image for
//! documents that arrive without one, the reserved badge document locations,
//! and the text-generation settings. It is cheap to clone and serializes to
//! JSON/TOML for external configuration.
//!
//! Wallet address and session state are deliberately *not* part of the
//! config: callers pass the address into each pipeline invocation so the
//! pipeline is callable with any session snapshot, including in tests with
//! no live wallet.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// URI scheme prefix for content-addressed documents.
pub const IPFS_SCHEME: &str = "ipfs://";

/// URI prefix for inline base64-encoded JSON documents (badge tokenURIs).
pub const INLINE_JSON_PREFIX: &str = "data:application/json;base64,";

/// Inline SVG shown when a document carries no image or the image is broken.
pub const PLACEHOLDER_IMAGE: &str = "data:image/svg+xml;base64,PHN2ZyB3aWR0aD0iMjAwIiBoZWlnaHQ9IjIwMCIgeG1sbnM9Imh0dHA6Ly93d3cudzMub3JnLzIwMDAvc3ZnIj48cmVjdCB3aWR0aD0iMTAwJSIgaGVpZ2h0PSIxMDAlIiBmaWxsPSIjZGRkIi8+PHRleHQgeD0iNTAlIiB5PSI1MCUiIGZvbnQtc2l6ZT0iMTgiIHRleHQtYW5jaG9yPSJtaWRkbGUiIGR5PSIuM2VtIj5CYWRnZTwvdGV4dD48L3N2Zz4=";

/// Runtime configuration shared by all pipeline stages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PipelineConfig {
    /// HTTP base the `ipfs://` scheme is rewritten to. Must end with `/`.
    ///
    /// Default: `https://ipfs.io/ipfs/`
    pub gateway_base: String,

    /// Image substituted when a document has no `image` field.
    pub placeholder_image: String,

    /// Reserved badge document locations. A token whose resolved metadata
    /// URI exactly matches one of these is tagged as a badge candidate
    /// regardless of its attributes. Typically resolved from the ledger's
    /// badge URI getters at startup.
    #[serde(default)]
    pub known_badge_uris: Vec<String>,

    /// Text-generation endpoint for review text. `None` disables the remote
    /// call, so reviews always use the deterministic fallback.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation_endpoint: Option<String>,

    /// Bound on the generated review length, passed as `max_new_tokens`.
    ///
    /// Default: `50`
    pub max_new_tokens: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            gateway_base: "https://ipfs.io/ipfs/".to_string(),
            placeholder_image: PLACEHOLDER_IMAGE.to_string(),
            known_badge_uris: Vec::new(),
            generation_endpoint: None,
            max_new_tokens: 50,
        }
    }
}

impl PipelineConfig {
    /// Replace the content gateway base URL.
    pub fn with_gateway_base(mut self, base: impl Into<String>) -> Self {
        self.gateway_base = base.into();
        self
    }

    /// Replace the reserved badge location set.
    pub fn with_known_badge_uris(mut self, uris: Vec<String>) -> Self {
        self.known_badge_uris = uris;
        self
    }

    /// Set the remote text-generation endpoint.
    pub fn with_generation_endpoint(mut self, url: impl Into<String>) -> Self {
        self.generation_endpoint = Some(url.into());
        self
    }

    /// Validate invariants that would otherwise surface as confusing
    /// runtime fetch failures. Call once at startup.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.gateway_base.starts_with("http://") && !self.gateway_base.starts_with("https://") {
            return Err(ConfigError::InvalidGatewayBase(format!(
                "expected http(s) url, got {:?}",
                self.gateway_base
            )));
        }
        if !self.gateway_base.ends_with('/') {
            return Err(ConfigError::InvalidGatewayBase(format!(
                "must end with '/', got {:?}",
                self.gateway_base
            )));
        }
        if let Some(endpoint) = &self.generation_endpoint {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err(ConfigError::InvalidGenerationEndpoint(format!(
                    "expected http(s) url, got {endpoint:?}"
                )));
            }
        }
        Ok(())
    }

    /// Rewrite an `ipfs://<cid>` URI to its gateway form; other URIs pass
    /// through unchanged.
    pub fn to_gateway_url(&self, uri: &str) -> String {
        match uri.strip_prefix(IPFS_SCHEME) {
            Some(cid) => format!("{}{cid}", self.gateway_base),
            None => uri.to_string(),
        }
    }

    /// True when `uri` exactly matches a reserved badge document location.
    pub fn is_known_badge_uri(&self, uri: &str) -> bool {
        self.known_badge_uris.iter().any(|known| known == uri)
    }
}
