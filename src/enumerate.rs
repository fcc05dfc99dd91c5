//! Collection Enumerator: walks token ids and assembles a collection view.
//!
//! Drives the ledger and fetcher once per candidate token, in ascending
//! id (or index) order, one token at a time. Sequential on purpose: it
//! bounds concurrent outbound calls against the public gateway and keeps
//! per-item error isolation trivial.
//!
//! Failure policy is two-tier. If the upstream count/ownership read fails,
//! the whole pass fails with [`EnumerateError::CollectionUnavailable`].
//! Any error after that — URI resolution, fetch, decode, validity — skips
//! only the offending token: it is logged and counted, and enumeration
//! continues. A single corrupt token must not abort the whole view.

use std::collections::HashSet;
use std::time::Instant;

use tracing::{info, warn};

use crate::classify;
use crate::config::PipelineConfig;
use crate::error::{EnumerateError, SkipReason};
use crate::fetch::{fetch_metadata, DocumentFetcher, MetadataSource};
use crate::ledger::LedgerRead;
use crate::types::{CollectionView, NormalizedItem, TokenId};

/// Which token set one enumeration pass inspects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionScope {
    /// Every minted token, dense ids `[1, total_supply]`.
    Global,
    /// Tokens owned by one address, in owner-index order.
    Owner(String),
}

impl CollectionScope {
    fn label(&self) -> &str {
        match self {
            CollectionScope::Global => "global",
            CollectionScope::Owner(_) => "owner",
        }
    }
}

/// Run one enumeration pass over `scope`.
///
/// The returned view preserves ascending id order and yields each id at
/// most once. Not restartable: call again for a fresh pass.
pub async fn enumerate(
    ledger: &dyn LedgerRead,
    fetcher: &dyn DocumentFetcher,
    scope: &CollectionScope,
    cfg: &PipelineConfig,
) -> Result<CollectionView, EnumerateError> {
    let start = Instant::now();

    let (candidates, mut skipped) = match candidate_ids(ledger, scope).await {
        Ok(result) => result,
        Err(err) => {
            warn!(
                scope = scope.label(),
                error = %err,
                elapsed_micros = start.elapsed().as_micros() as u64,
                "enumerate_failure"
            );
            return Err(err);
        }
    };

    let mut items: Vec<NormalizedItem> = Vec::new();
    let mut seen: HashSet<TokenId> = HashSet::new();

    for token in candidates {
        if !seen.insert(token) {
            skip(token, &SkipReason::Duplicate, &mut skipped);
            continue;
        }
        match resolve_one(ledger, fetcher, token, cfg).await {
            Ok(Some(item)) => items.push(item),
            Ok(None) => skip(token, &SkipReason::InvalidDocument, &mut skipped),
            Err(reason) => skip(token, &reason, &mut skipped),
        }
    }

    info!(
        scope = scope.label(),
        items = items.len(),
        skipped,
        elapsed_micros = start.elapsed().as_micros() as u64,
        "enumerate_success"
    );
    Ok(CollectionView { items, skipped })
}

/// Candidate token ids for a scope, ascending, plus the number of tokens
/// already lost to owner-index holes.
///
/// A failed count/ownership read here is the one collection-level error;
/// a failed index read drops one token and counts toward the skip total.
async fn candidate_ids(
    ledger: &dyn LedgerRead,
    scope: &CollectionScope,
) -> Result<(Vec<TokenId>, usize), EnumerateError> {
    match scope {
        CollectionScope::Global => {
            let supply = ledger
                .total_supply()
                .await
                .map_err(|e| EnumerateError::CollectionUnavailable(e.to_string()))?;
            Ok(((1..=supply).collect(), 0))
        }
        CollectionScope::Owner(address) => {
            let balance = ledger
                .balance_of(address)
                .await
                .map_err(|e| EnumerateError::CollectionUnavailable(e.to_string()))?;
            let mut ids = Vec::with_capacity(balance as usize);
            let mut skipped = 0usize;
            for index in 0..balance {
                match ledger.token_of_owner_by_index(address, index).await {
                    Ok(id) => ids.push(id),
                    Err(err) => {
                        skipped += 1;
                        let reason = SkipReason::IndexUnavailable(err.to_string());
                        warn!(index, reason = %reason, "token_skipped");
                    }
                }
            }
            Ok((ids, skipped))
        }
    }
}

/// Resolve, fetch, and classify one token. `Ok(None)` means the document
/// was fetched but discarded by the classifier.
async fn resolve_one(
    ledger: &dyn LedgerRead,
    fetcher: &dyn DocumentFetcher,
    token: TokenId,
    cfg: &PipelineConfig,
) -> Result<Option<NormalizedItem>, SkipReason> {
    let uri = ledger
        .token_uri(token)
        .await
        .map_err(|e| SkipReason::UriUnavailable(e.to_string()))?;

    let known_badge_location = cfg.is_known_badge_uri(&uri);
    let source = MetadataSource::parse(&uri, cfg);
    let from_inline = source.is_inline();

    let doc = fetch_metadata(&source, fetcher).await?;
    Ok(classify::normalize(
        token,
        doc,
        from_inline,
        known_badge_location,
        cfg,
    ))
}

fn skip(token: TokenId, reason: &SkipReason, skipped: &mut usize) {
    *skipped += 1;
    warn!(token, reason = %reason, "token_skipped");
}
