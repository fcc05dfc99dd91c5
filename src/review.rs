//! Mood Review Engine: window filter, tally, dominant mood, review text.
//!
//! Consumes normalized mood items (badges are not moods and never enter a
//! tally), keeps the ones minted inside the period window, and derives the
//! per-category counts and the dominant category. Review text comes from
//! the generator with the local template as backstop, so composing a review
//! cannot fail — an unavailable collection is the caller's problem, an
//! unavailable generator is not.

use std::time::Instant;

use tracing::info;

use crate::generate::{generate_with_fallback, TextGenerator};
use crate::types::{MoodReview, MoodTally, NormalizedItem, ReviewPeriod};

/// Dominant mood reported when the window holds no entries.
pub const MIXED_MOOD: &str = "Mixed";

/// Whether an item's mint timestamp falls inside the period window ending
/// at `now_ms`. Boundary inclusive; items without a parseable timestamp
/// are outside every window.
pub fn within_window(item: &NormalizedItem, period: ReviewPeriod, now_ms: i64) -> bool {
    match item.timestamp_ms() {
        Some(ts) => ts >= now_ms - period.window_ms(),
        None => false,
    }
}

/// Tally mood categories over an item stream, in encounter order.
pub fn tally_moods<'a>(items: impl Iterator<Item = &'a NormalizedItem>) -> MoodTally {
    let mut tally = MoodTally::new();
    for item in items {
        tally.add(item.mood_category());
    }
    tally
}

/// Compose the review for one period from a stream of mood items.
///
/// Filters to the window, tallies, picks the dominant category (or
/// [`MIXED_MOOD`] when empty), and produces the review text. Infallible.
pub async fn compose_review<'a>(
    moods: impl Iterator<Item = &'a NormalizedItem>,
    period: ReviewPeriod,
    now_ms: i64,
    generator: Option<&dyn TextGenerator>,
) -> MoodReview {
    let start = Instant::now();

    let counts = tally_moods(moods.filter(|item| within_window(item, period, now_ms)));
    let dominant_mood = counts.dominant().unwrap_or(MIXED_MOOD).to_string();
    let review_text = generate_with_fallback(generator, &counts, &dominant_mood, period).await;

    info!(
        period = %period,
        categories = counts.len(),
        dominant = %dominant_mood,
        elapsed_micros = start.elapsed().as_micros() as u64,
        "review_composed"
    );

    MoodReview {
        period,
        mood_counts: counts,
        dominant_mood,
        review_text,
    }
}
