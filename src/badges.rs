//! Achievement badge progress.
//!
//! Three achievements exist: first mint, daily streak, and mood maestro
//! (lifetime mint milestone). [`badge_summary`] reads a wallet's counters
//! and milestones from the ledger and derives earned/eligible state plus
//! `current/required` progress per badge. Badge document metadata is
//! fetched best-effort from each badge URI; when the fetch fails the badge
//! falls back to its built-in name, description, and the placeholder image.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::PipelineConfig;
use crate::error::LedgerError;
use crate::fetch::{fetch_metadata, DocumentFetcher, MetadataSource};
use crate::ledger::LedgerRead;
use crate::types::MetadataDocument;

/// The three achievement badges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BadgeKind {
    FirstMint,
    Streak,
    MoodMaestro,
}

impl BadgeKind {
    pub const ALL: [BadgeKind; 3] = [
        BadgeKind::FirstMint,
        BadgeKind::Streak,
        BadgeKind::MoodMaestro,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BadgeKind::FirstMint => "first-mint",
            BadgeKind::Streak => "streak",
            BadgeKind::MoodMaestro => "mood-maestro",
        }
    }

    /// Built-in display name used when the badge document is unreachable.
    fn fallback_name(self, required: u64) -> String {
        match self {
            BadgeKind::FirstMint => "First Mint".to_string(),
            BadgeKind::Streak => format!("{required}-Day Streaker"),
            BadgeKind::MoodMaestro => "Mood Maestro".to_string(),
        }
    }

    fn fallback_description(self, required: u64) -> String {
        match self {
            BadgeKind::FirstMint => "Awarded for your first mood mint!".to_string(),
            BadgeKind::Streak => format!("Awarded for maintaining a {required}-day streak!"),
            BadgeKind::MoodMaestro => format!("Awarded for minting {required} moods!"),
        }
    }
}

impl std::fmt::Display for BadgeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress toward an unearned badge.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BadgeProgress {
    pub current: u64,
    pub required: u64,
    /// Integer percentage, clamped to 100.
    pub percent: u8,
}

impl BadgeProgress {
    fn new(current: u64, required: u64) -> Self {
        // required >= 1: milestones are positive and first-mint is 1.
        let percent = (current.saturating_mul(100) / required.max(1)).min(100) as u8;
        Self {
            current,
            required,
            percent,
        }
    }
}

/// Resolved state of one achievement badge for one wallet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BadgeStatus {
    pub kind: BadgeKind,
    pub name: String,
    pub description: String,
    pub image: String,
    pub earned: bool,
    /// Requirement met but badge not yet claimed on the ledger.
    pub eligible: bool,
    /// Absent once the badge is earned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<BadgeProgress>,
}

/// Compute the full badge summary for a wallet.
///
/// Ledger counter reads are required and fail the summary; badge document
/// fetches are best-effort and fall back per badge. Order is fixed:
/// first-mint, streak, mood-maestro.
pub async fn badge_summary(
    ledger: &dyn LedgerRead,
    fetcher: &dyn DocumentFetcher,
    address: &str,
    cfg: &PipelineConfig,
) -> Result<Vec<BadgeStatus>, LedgerError> {
    let start = Instant::now();

    let mint_count = ledger.mint_count(address).await?;
    let streak_count = ledger.streak_count(address).await?;
    let streak_required = ledger.streak_milestone().await?;
    let maestro_required = ledger.mood_maestro_milestone().await?;

    let mut statuses = Vec::with_capacity(BadgeKind::ALL.len());
    for kind in BadgeKind::ALL {
        let (current, required) = match kind {
            BadgeKind::FirstMint => (mint_count, 1),
            BadgeKind::Streak => (streak_count, streak_required),
            BadgeKind::MoodMaestro => (mint_count, maestro_required),
        };
        let earned = ledger.has_badge(address, kind).await?;
        let doc = badge_document(ledger, fetcher, kind, cfg).await;
        statuses.push(assemble(kind, current, required, earned, doc, cfg));
    }

    info!(
        address,
        earned = statuses.iter().filter(|s| s.earned).count(),
        elapsed_micros = start.elapsed().as_micros() as u64,
        "badge_summary_complete"
    );
    Ok(statuses)
}

/// Fetch one badge's document, best-effort. Empty URI, fetch failure, and
/// invalid document all degrade to `None`.
async fn badge_document(
    ledger: &dyn LedgerRead,
    fetcher: &dyn DocumentFetcher,
    kind: BadgeKind,
    cfg: &PipelineConfig,
) -> Option<MetadataDocument> {
    let uri = match ledger.badge_uri(kind).await {
        Ok(uri) if !uri.trim().is_empty() => uri,
        Ok(_) => return None,
        Err(err) => {
            warn!(badge = %kind, error = %err, "badge_uri_read_failed");
            return None;
        }
    };

    let source = MetadataSource::parse(&uri, cfg);
    match fetch_metadata(&source, fetcher).await {
        Ok(doc) if doc.is_valid() => Some(doc),
        Ok(_) => None,
        Err(err) => {
            warn!(badge = %kind, error = %err, "badge_metadata_fetch_failed");
            None
        }
    }
}

fn assemble(
    kind: BadgeKind,
    current: u64,
    required: u64,
    earned: bool,
    doc: Option<MetadataDocument>,
    cfg: &PipelineConfig,
) -> BadgeStatus {
    let (name, description, image) = match doc {
        Some(doc) => {
            let image = match doc.image {
                Some(uri) if !uri.trim().is_empty() => cfg.to_gateway_url(&uri),
                _ => cfg.placeholder_image.clone(),
            };
            (doc.name, doc.description, image)
        }
        None => (
            kind.fallback_name(required),
            kind.fallback_description(required),
            cfg.placeholder_image.clone(),
        ),
    };

    BadgeStatus {
        kind,
        name,
        description,
        image,
        earned,
        eligible: current >= required,
        progress: if earned {
            None
        } else {
            Some(BadgeProgress::new(current, required))
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::StaticFetcher;
    use crate::ledger::MemoryLedger;
    use serde_json::json;

    const ADDRESS: &str = "0xabc";

    fn find(statuses: &[BadgeStatus], kind: BadgeKind) -> &BadgeStatus {
        statuses.iter().find(|s| s.kind == kind).unwrap()
    }

    #[tokio::test]
    async fn summary_covers_all_badges_in_fixed_order() {
        let ledger = MemoryLedger::new();
        let statuses = badge_summary(
            &ledger,
            &StaticFetcher::new(),
            ADDRESS,
            &PipelineConfig::default(),
        )
        .await
        .unwrap();

        let kinds: Vec<_> = statuses.iter().map(|s| s.kind).collect();
        assert_eq!(kinds, BadgeKind::ALL.to_vec());
    }

    #[tokio::test]
    async fn fresh_wallet_has_zero_progress_everywhere() {
        let ledger = MemoryLedger::new();
        let statuses = badge_summary(
            &ledger,
            &StaticFetcher::new(),
            ADDRESS,
            &PipelineConfig::default(),
        )
        .await
        .unwrap();

        for status in &statuses {
            assert!(!status.earned);
            assert!(!status.eligible);
            let progress = status.progress.as_ref().unwrap();
            assert_eq!(progress.current, 0);
            assert_eq!(progress.percent, 0);
        }
    }

    #[tokio::test]
    async fn first_mint_eligible_after_one_mint() {
        let ledger = MemoryLedger::new().with_mint_count(ADDRESS, 1);
        let statuses = badge_summary(
            &ledger,
            &StaticFetcher::new(),
            ADDRESS,
            &PipelineConfig::default(),
        )
        .await
        .unwrap();

        let first = find(&statuses, BadgeKind::FirstMint);
        assert!(first.eligible);
        assert!(!first.earned);
        assert_eq!(first.progress.as_ref().unwrap().percent, 100);
    }

    #[tokio::test]
    async fn percent_is_clamped_at_100() {
        let ledger = MemoryLedger::new()
            .with_mint_count(ADDRESS, 80)
            .with_milestones(7, 50);
        let statuses = badge_summary(
            &ledger,
            &StaticFetcher::new(),
            ADDRESS,
            &PipelineConfig::default(),
        )
        .await
        .unwrap();

        let maestro = find(&statuses, BadgeKind::MoodMaestro);
        assert!(maestro.eligible);
        let progress = maestro.progress.as_ref().unwrap();
        assert_eq!(progress.current, 80);
        assert_eq!(progress.required, 50);
        assert_eq!(progress.percent, 100);
    }

    #[tokio::test]
    async fn streak_progress_tracks_milestone() {
        let ledger = MemoryLedger::new()
            .with_streak(ADDRESS, 3)
            .with_milestones(7, 50);
        let statuses = badge_summary(
            &ledger,
            &StaticFetcher::new(),
            ADDRESS,
            &PipelineConfig::default(),
        )
        .await
        .unwrap();

        let streak = find(&statuses, BadgeKind::Streak);
        assert!(!streak.eligible);
        let progress = streak.progress.as_ref().unwrap();
        assert_eq!(progress.current, 3);
        assert_eq!(progress.required, 7);
        assert_eq!(progress.percent, 42);
    }

    #[tokio::test]
    async fn earned_badge_drops_progress() {
        let ledger = MemoryLedger::new()
            .with_mint_count(ADDRESS, 5)
            .with_earned_badge(ADDRESS, BadgeKind::FirstMint);
        let statuses = badge_summary(
            &ledger,
            &StaticFetcher::new(),
            ADDRESS,
            &PipelineConfig::default(),
        )
        .await
        .unwrap();

        let first = find(&statuses, BadgeKind::FirstMint);
        assert!(first.earned);
        assert!(first.progress.is_none());
    }

    #[tokio::test]
    async fn fetched_document_overrides_fallback_text() {
        let ledger = MemoryLedger::new()
            .with_badge_uri(BadgeKind::FirstMint, "https://badges.example/first.json");
        let fetcher = StaticFetcher::new().with_document(
            "https://badges.example/first.json",
            json!({
                "name": "Genesis Minter",
                "description": "Minted a mood before anyone else believed.",
                "image": "ipfs://bafybadge"
            }),
        );
        let statuses = badge_summary(&ledger, &fetcher, ADDRESS, &PipelineConfig::default())
            .await
            .unwrap();

        let first = find(&statuses, BadgeKind::FirstMint);
        assert_eq!(first.name, "Genesis Minter");
        assert_eq!(first.image, "https://ipfs.io/ipfs/bafybadge");
    }

    #[tokio::test]
    async fn failed_metadata_fetch_falls_back_per_badge() {
        let ledger = MemoryLedger::new()
            .with_milestones(7, 50)
            .with_badge_uri(BadgeKind::Streak, "https://badges.example/gone.json");
        // Fetcher answers 404 for the configured URI.
        let statuses = badge_summary(
            &ledger,
            &StaticFetcher::new(),
            ADDRESS,
            &PipelineConfig::default(),
        )
        .await
        .unwrap();

        let streak = find(&statuses, BadgeKind::Streak);
        assert_eq!(streak.name, "7-Day Streaker");
        assert_eq!(
            streak.description,
            "Awarded for maintaining a 7-day streak!"
        );
        assert_eq!(streak.image, PipelineConfig::default().placeholder_image);
    }

    #[tokio::test]
    async fn fallback_text_embeds_milestones() {
        let ledger = MemoryLedger::new().with_milestones(14, 100);
        let statuses = badge_summary(
            &ledger,
            &StaticFetcher::new(),
            ADDRESS,
            &PipelineConfig::default(),
        )
        .await
        .unwrap();

        assert_eq!(find(&statuses, BadgeKind::Streak).name, "14-Day Streaker");
        assert_eq!(
            find(&statuses, BadgeKind::MoodMaestro).description,
            "Awarded for minting 100 moods!"
        );
    }
}
