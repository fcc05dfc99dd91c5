//! Review Trigger Store: decides when a periodic review is due.
//!
//! Persistence is a flat string key-value store keyed per wallet and
//! period (`lastWeeklyReview_<address>` / `lastMonthlyReview_<address>`),
//! holding the epoch-ms timestamp of the last completed review. The store
//! is best-effort: a failed read is treated as "never reviewed" so the
//! review runs (worst case, one extra review), and a failed write only
//! loses the trigger decision for this session. No locking across
//! concurrent sessions; last write wins.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::warn;

use crate::error::StoreError;
use crate::types::ReviewPeriod;

/// Persisted key for one wallet/period pair.
pub fn review_key(period: ReviewPeriod, address: &str) -> String {
    format!("last{}Review_{address}", period.key_fragment())
}

/// Pure trigger predicate: due when no prior review exists or the window
/// has fully elapsed since it.
pub fn should_trigger(last_review_ms: Option<i64>, period: ReviewPeriod, now_ms: i64) -> bool {
    match last_review_ms {
        Some(last) => now_ms - last >= period.window_ms(),
        None => true,
    }
}

/// Flat string key-value persistence. The seam exists so the orchestration
/// tests run against [`MemoryStore`] instead of a browser's local storage
/// or a file.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// Last review timestamp for a wallet/period, or `None` when unset.
///
/// A store read failure or an unparseable persisted value degrade to
/// `None`: the review re-triggers rather than being silently suppressed.
pub async fn last_review(
    store: &dyn KeyValueStore,
    period: ReviewPeriod,
    address: &str,
) -> Option<i64> {
    let key = review_key(period, address);
    match store.get(&key).await {
        Ok(Some(raw)) => match raw.trim().parse::<i64>() {
            Ok(ts) => Some(ts),
            Err(_) => {
                warn!(key = %key, value = %raw, "trigger_timestamp_unparseable");
                None
            }
        },
        Ok(None) => None,
        Err(err) => {
            warn!(key = %key, error = %err, "trigger_store_read_failed");
            None
        }
    }
}

/// Persist `now_ms` as the last review timestamp. Overwrites any prior
/// value; callers treat failure as non-fatal.
pub async fn record_review(
    store: &dyn KeyValueStore,
    period: ReviewPeriod,
    address: &str,
    now_ms: i64,
) -> Result<(), StoreError> {
    store
        .set(&review_key(period, address), &now_ms.to_string())
        .await
}

/// In-memory [`KeyValueStore`] for tests and demos, with a failure toggle
/// simulating unavailable persistence.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
    unavailable: Option<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every read and write fail with this message.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            unavailable: Some(message.into()),
        }
    }

    fn check_available(&self) -> Result<(), StoreError> {
        match &self.unavailable {
            Some(message) => Err(StoreError::Unavailable(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.check_available()?;
        Ok(self.entries.lock().expect("memory store lock poisoned").get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.check_available()?;
        self.entries
            .lock()
            .expect("memory store lock poisoned")
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}
