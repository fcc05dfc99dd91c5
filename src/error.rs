//! Error types for the aggregation pipeline.
//!
//! The taxonomy separates failures by how they are recovered:
//!
//! - [`EnumerateError::CollectionUnavailable`] is pipeline-level: the
//!   upstream count/ownership read failed and aggregation yields no items.
//! - [`FetchError`] and [`SkipReason`] are per-item: one broken token is
//!   skipped (logged, counted) and enumeration continues. They are never
//!   surfaced individually.
//! - [`GenerateError`] is always recovered locally via the deterministic
//!   fallback text; it never reaches a caller of the review engine.
//! - [`StoreError`] only costs the trigger decision for one session; the
//!   review simply re-triggers next time.

use thiserror::Error;

/// Errors resolving a single token's metadata document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum FetchError {
    /// Inline data URI whose base64 payload or embedded JSON is broken.
    #[error("malformed inline metadata: {0}")]
    MalformedInlineMetadata(String),

    /// Gateway returned a body that failed JSON parsing or shape validation.
    #[error("malformed remote metadata: {0}")]
    MalformedRemoteMetadata(String),

    /// Gateway answered with a non-2xx status.
    #[error("remote fetch failed with status {0}")]
    RemoteFetchFailed(u16),

    /// Request never produced a response (connect failure, timeout).
    #[error("transport error: {0}")]
    Transport(String),
}

/// Errors from the external ledger read interface.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LedgerError {
    #[error("ledger read failed: {0}")]
    Read(String),
}

/// Why a single token was dropped during enumeration.
///
/// Skips are a deliberate best-effort policy: one corrupt or unreachable
/// token must not abort the whole collection view. The enumerator logs each
/// skip and exposes only an aggregate count.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SkipReason {
    /// The ledger could not resolve this token's metadata URI.
    #[error("token uri unresolvable: {0}")]
    UriUnavailable(String),

    /// The owner-enumeration index read failed; the token id is unknown.
    #[error("owner index unresolvable: {0}")]
    IndexUnavailable(String),

    /// The metadata document could not be fetched or decoded.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The document was fetched but fails validity (empty name/description).
    #[error("invalid metadata document")]
    InvalidDocument,

    /// The token id was already yielded within this enumeration pass.
    #[error("duplicate token id")]
    Duplicate,
}

/// Collection-level enumeration failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EnumerateError {
    /// The upstream total-supply or ownership count read failed. Distinct
    /// from an empty-but-successful result.
    #[error("collection unavailable: {0}")]
    CollectionUnavailable(String),
}

/// Errors from the remote text-generation call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum GenerateError {
    #[error("generation request failed: {0}")]
    Http(String),

    #[error("generation endpoint returned status {0}")]
    BadStatus(u16),

    #[error("malformed generation response: {0}")]
    MalformedResponse(String),

    #[error("generation returned empty text")]
    EmptyResponse,
}

/// Errors from the key-value persistence backing the trigger store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StoreError {
    #[error("key-value store unavailable: {0}")]
    Unavailable(String),
}

/// Configuration validation failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("invalid gateway base url: {0}")]
    InvalidGatewayBase(String),

    #[error("invalid generation endpoint: {0}")]
    InvalidGenerationEndpoint(String),
}

/// Top-level error surfaced by the review-cycle orchestration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PipelineError {
    #[error(transparent)]
    Collection(#[from] EnumerateError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
