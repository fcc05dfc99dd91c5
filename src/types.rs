//! Core data model for the aggregation pipeline.
//!
//! These types mirror the shape of on-chain mood NFTs as minted by the
//! MintMyMood contract: a token id, a metadata document pinned at mint time,
//! and the normalized item the pipeline hands to presentation. They are
//! serializable, cheap to clone, and comparable for testing.
//!
//! ```text
//! TokenId ──tokenURI──▶ MetadataDocument ──normalize──▶ NormalizedItem
//!                                                            │
//!                                              window filter + tally
//!                                                            ▼
//!                                                       MoodReview
//! ```

use serde::{Deserialize, Serialize};

/// Identifier of one minted unit in the external ledger.
///
/// Assigned strictly increasing at mint time; used as an enumeration key only.
pub type TokenId = u64;

/// A single `trait_type`/`value` pair from a metadata document.
///
/// The minting flow writes `Mood`, `Title`, and `Timestamp` attributes for
/// mood entries; badge documents carry `Badge` or `Badge Type`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Attribute {
    pub trait_type: String,
    pub value: String,
}

impl Attribute {
    pub fn new(trait_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            trait_type: trait_type.into(),
            value: value.into(),
        }
    }
}

/// Metadata document produced once at mint time.
///
/// Immutable once fetched, though re-fetchable. `image` is a URI in one of
/// two schemes: content-addressed (`ipfs://<cid>`) or an inline data URI.
/// Documents with an empty `name` or `description` are considered invalid
/// and are discarded during classification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct MetadataDocument {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
}

impl MetadataDocument {
    /// Value of the first attribute with the given `trait_type`, if any.
    pub fn attribute(&self, trait_type: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.trait_type == trait_type)
            .map(|attr| attr.value.as_str())
    }

    /// Mood category attribute, when present.
    pub fn mood(&self) -> Option<&str> {
        self.attribute("Mood")
    }

    /// Mint timestamp in epoch milliseconds, parsed from the `Timestamp`
    /// attribute. `None` when the attribute is missing or not a number.
    pub fn timestamp_ms(&self) -> Option<i64> {
        self.attribute("Timestamp")?.trim().parse().ok()
    }

    /// A document is valid when both `name` and `description` are non-empty.
    pub fn is_valid(&self) -> bool {
        !self.name.trim().is_empty() && !self.description.trim().is_empty()
    }
}

/// A metadata document normalized for display.
///
/// Produced by the classifier from a [`MetadataDocument`]: `image` has been
/// rewritten to a directly fetchable URL (or a placeholder substituted) and
/// `is_badge` derived. Held in memory only; discarded on the next
/// enumeration pass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NormalizedItem {
    pub token_id: TokenId,
    pub name: String,
    pub description: String,
    /// Directly fetchable HTTP(S) or inline data URL.
    pub image: String,
    pub attributes: Vec<Attribute>,
    pub is_badge: bool,
}

impl NormalizedItem {
    /// Value of the first attribute with the given `trait_type`, if any.
    pub fn attribute(&self, trait_type: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.trait_type == trait_type)
            .map(|attr| attr.value.as_str())
    }

    /// Mood category: the `Mood` attribute when present, else the item name.
    pub fn mood_category(&self) -> &str {
        self.attribute("Mood").unwrap_or(&self.name)
    }

    /// Mint timestamp in epoch milliseconds, when parseable.
    pub fn timestamp_ms(&self) -> Option<i64> {
        self.attribute("Timestamp")?.trim().parse().ok()
    }
}

/// Fixed aggregation window for mood statistics.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ReviewPeriod {
    Weekly,
    Monthly,
}

impl ReviewPeriod {
    /// Window length in milliseconds: 7 days weekly, 30 days monthly.
    pub fn window_ms(self) -> i64 {
        match self {
            ReviewPeriod::Weekly => 7 * 24 * 60 * 60 * 1000,
            ReviewPeriod::Monthly => 30 * 24 * 60 * 60 * 1000,
        }
    }

    /// Lowercase period name as embedded in prompts and review text.
    pub fn as_str(self) -> &'static str {
        match self {
            ReviewPeriod::Weekly => "weekly",
            ReviewPeriod::Monthly => "monthly",
        }
    }

    /// Capitalized fragment used in persisted trigger keys
    /// (`lastWeeklyReview_<address>`).
    pub(crate) fn key_fragment(self) -> &'static str {
        match self {
            ReviewPeriod::Weekly => "Weekly",
            ReviewPeriod::Monthly => "Monthly",
        }
    }
}

impl std::fmt::Display for ReviewPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One mood category and its occurrence count within a window.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MoodCount {
    pub mood: String,
    pub count: u32,
}

/// Insertion-ordered mapping from mood category to occurrence count.
///
/// Categories keep the order in which they were first tallied, which makes
/// the dominant-mood tie-break deterministic: the scan uses strict `>`, so
/// for equal counts the first-inserted category wins on every run given the
/// same input ordering.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MoodTally {
    entries: Vec<MoodCount>,
}

impl MoodTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment the count for `mood`, inserting it at the end on first sight.
    pub fn add(&mut self, mood: &str) {
        match self.entries.iter_mut().find(|entry| entry.mood == mood) {
            Some(entry) => entry.count += 1,
            None => self.entries.push(MoodCount {
                mood: mood.to_string(),
                count: 1,
            }),
        }
    }

    /// Count for `mood`, zero when absent.
    pub fn count(&self, mood: &str) -> u32 {
        self.entries
            .iter()
            .find(|entry| entry.mood == mood)
            .map_or(0, |entry| entry.count)
    }

    /// Category with the strictly greatest count; first-inserted wins ties.
    pub fn dominant(&self) -> Option<&str> {
        let mut best: Option<&MoodCount> = None;
        for entry in &self.entries {
            if best.is_none_or(|current| entry.count > current.count) {
                best = Some(entry);
            }
        }
        best.map(|entry| entry.mood.as_str())
    }

    /// Iterate `(category, count)` pairs in first-tallied order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.entries
            .iter()
            .map(|entry| (entry.mood.as_str(), entry.count))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Derived mood statistics for one period.
///
/// Ephemeral; regenerated whenever the trigger store says a review is due.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MoodReview {
    pub period: ReviewPeriod,
    pub mood_counts: MoodTally,
    pub dominant_mood: String,
    pub review_text: String,
}

/// Aggregated result of one enumeration pass.
///
/// `items` preserves ascending token-id (or index) order; `skipped` counts
/// tokens dropped by per-item failure isolation. An empty view with zero
/// skips is a successful result, distinct from a collection-level error.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CollectionView {
    pub items: Vec<NormalizedItem>,
    pub skipped: usize,
}

impl CollectionView {
    /// Mood entries only (badges filtered out).
    pub fn moods(&self) -> impl Iterator<Item = &NormalizedItem> {
        self.items.iter().filter(|item| !item.is_badge)
    }

    /// Badge entries only.
    pub fn badges(&self) -> impl Iterator<Item = &NormalizedItem> {
        self.items.iter().filter(|item| item.is_badge)
    }
}
