//! MintMyMood aggregation and review pipeline.
//!
//! Reads mood NFTs and achievement badges from an external ledger,
//! normalizes their metadata documents for display, and derives periodic
//! mood reviews. The pipeline stitches together enumeration, fetching,
//! classification, review composition, and trigger persistence so callers
//! drive everything through a single entry point.

pub mod badges;
pub mod classify;
pub mod config;
pub mod enumerate;
pub mod error;
pub mod fetch;
pub mod generate;
pub mod ledger;
pub mod review;
pub mod trigger;
pub mod types;

pub use badges::{badge_summary, BadgeKind, BadgeProgress, BadgeStatus};
pub use config::{PipelineConfig, INLINE_JSON_PREFIX, IPFS_SCHEME, PLACEHOLDER_IMAGE};
pub use enumerate::{enumerate, CollectionScope};
pub use error::{
    ConfigError, EnumerateError, FetchError, GenerateError, LedgerError, PipelineError,
    SkipReason, StoreError,
};
pub use fetch::{DocumentFetcher, HttpFetcher, MetadataSource, StaticFetcher};
pub use generate::{
    build_mood_prompt, fallback_review, generate_with_fallback, HttpGenerator, TextGenerator,
};
pub use ledger::{badge_locations, LedgerRead, MemoryLedger};
pub use review::{compose_review, within_window, MIXED_MOOD};
pub use trigger::{
    last_review, record_review, should_trigger, KeyValueStore, MemoryStore,
};
pub use types::{
    Attribute, CollectionView, MetadataDocument, MoodCount, MoodReview, MoodTally,
    NormalizedItem, ReviewPeriod, TokenId,
};

use tracing::{info, warn};

/// Current wall-clock time in epoch milliseconds.
///
/// The pipeline functions all take `now_ms` explicitly; this is the one
/// place production callers get it from.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Run one review cycle for a wallet and period.
///
/// Consults the trigger store first and returns `Ok(None)` when the review
/// is not yet due. When due: enumerates the wallet's mood tokens, composes
/// the review (infallible past enumeration), then records the trigger
/// timestamp. A trigger-store write failure is logged and the review is
/// still returned; worst case the next session re-reviews.
#[allow(clippy::too_many_arguments)]
pub async fn run_review_cycle(
    ledger: &dyn LedgerRead,
    fetcher: &dyn DocumentFetcher,
    store: &dyn KeyValueStore,
    generator: Option<&dyn TextGenerator>,
    address: &str,
    period: ReviewPeriod,
    cfg: &PipelineConfig,
    now_ms: i64,
) -> Result<Option<MoodReview>, PipelineError> {
    cfg.validate()?;

    let last = last_review(store, period, address).await;
    if !should_trigger(last, period, now_ms) {
        info!(address, period = %period, "review_not_due");
        return Ok(None);
    }

    let scope = CollectionScope::Owner(address.to_string());
    let view = enumerate(ledger, fetcher, &scope, cfg).await?;
    let review = compose_review(view.moods(), period, now_ms, generator).await;

    if let Err(err) = record_review(store, period, address, now_ms).await {
        warn!(address, period = %period, error = %err, "trigger_record_failed");
    }

    Ok(Some(review))
}
