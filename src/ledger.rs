//! Read-only ledger interface.
//!
//! The pipeline never talks to a chain client directly; it consumes this
//! trait, which mirrors the read surface of the MintMyMood contract
//! (`totalSupply`, `balanceOf`, `tokenOfOwnerByIndex`, `tokenURI`, plus the
//! achievement getters). Production wires it to an RPC client; tests use
//! [`MemoryLedger`].
//!
//! The ledger is assumed eventually consistent with on-chain state. The
//! pipeline does not assume read-your-writes.

use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;

use crate::badges::BadgeKind;
use crate::error::LedgerError;
use crate::types::TokenId;

/// Read-only view of the mood NFT contract.
#[async_trait]
pub trait LedgerRead: Send + Sync {
    /// Total number of minted tokens; ids are dense in `[1, total_supply]`.
    async fn total_supply(&self) -> Result<u64, LedgerError>;

    /// Number of tokens owned by `address`.
    async fn balance_of(&self, address: &str) -> Result<u64, LedgerError>;

    /// Token id at `index` within the owner's enumeration, `0 <= index < balance_of`.
    async fn token_of_owner_by_index(
        &self,
        address: &str,
        index: u64,
    ) -> Result<TokenId, LedgerError>;

    /// Metadata URI for a token (inline data URI or `ipfs://` document).
    async fn token_uri(&self, token: TokenId) -> Result<String, LedgerError>;

    /// Lifetime mint count for `address` (drives first-mint and maestro progress).
    async fn mint_count(&self, address: &str) -> Result<u64, LedgerError>;

    /// Current daily-mint streak for `address`.
    async fn streak_count(&self, address: &str) -> Result<u64, LedgerError>;

    /// Streak length required for the streak badge.
    async fn streak_milestone(&self) -> Result<u64, LedgerError>;

    /// Mint count required for the mood-maestro badge.
    async fn mood_maestro_milestone(&self) -> Result<u64, LedgerError>;

    /// Whether `address` already holds the given achievement badge.
    async fn has_badge(&self, address: &str, kind: BadgeKind) -> Result<bool, LedgerError>;

    /// Document URI describing the given achievement badge. May be empty
    /// when the contract has no document configured for it.
    async fn badge_uri(&self, kind: BadgeKind) -> Result<String, LedgerError>;
}

/// Collect the non-empty badge document URIs from the ledger.
///
/// These are the reserved badge locations handed to
/// [`PipelineConfig::known_badge_uris`](crate::PipelineConfig::known_badge_uris).
pub async fn badge_locations(ledger: &dyn LedgerRead) -> Result<Vec<String>, LedgerError> {
    let mut uris = Vec::with_capacity(BadgeKind::ALL.len());
    for kind in BadgeKind::ALL {
        let uri = ledger.badge_uri(kind).await?;
        if !uri.trim().is_empty() {
            uris.push(uri);
        }
    }
    Ok(uris)
}

/// In-memory [`LedgerRead`] implementation.
///
/// Used by the test suites and demos; failure toggles simulate an
/// unreachable RPC endpoint or individually broken tokens.
#[derive(Debug, Clone, Default)]
pub struct MemoryLedger {
    tokens: BTreeMap<TokenId, String>,
    owners: HashMap<String, Vec<TokenId>>,
    mint_counts: HashMap<String, u64>,
    streak_counts: HashMap<String, u64>,
    streak_milestone: Option<u64>,
    maestro_milestone: Option<u64>,
    earned: HashSet<(String, BadgeKind)>,
    badge_uris: HashMap<BadgeKind, String>,
    /// When set, count/ownership reads fail with this message.
    supply_unavailable: Option<String>,
    /// Token ids whose `token_uri` read fails.
    broken_uris: HashSet<TokenId>,
    /// `(address, index)` pairs whose owner-enumeration read fails.
    broken_owner_indexes: HashSet<(String, u64)>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a minted token with its metadata URI and owner.
    pub fn with_token(mut self, id: TokenId, uri: impl Into<String>, owner: &str) -> Self {
        self.tokens.insert(id, uri.into());
        self.owners.entry(owner.to_string()).or_default().push(id);
        self
    }

    pub fn with_mint_count(mut self, address: &str, count: u64) -> Self {
        self.mint_counts.insert(address.to_string(), count);
        self
    }

    pub fn with_streak(mut self, address: &str, streak: u64) -> Self {
        self.streak_counts.insert(address.to_string(), streak);
        self
    }

    pub fn with_milestones(mut self, streak: u64, maestro: u64) -> Self {
        self.streak_milestone = Some(streak);
        self.maestro_milestone = Some(maestro);
        self
    }

    pub fn with_earned_badge(mut self, address: &str, kind: BadgeKind) -> Self {
        self.earned.insert((address.to_string(), kind));
        self
    }

    pub fn with_badge_uri(mut self, kind: BadgeKind, uri: impl Into<String>) -> Self {
        self.badge_uris.insert(kind, uri.into());
        self
    }

    /// Make all count/ownership reads fail, simulating a dead RPC endpoint.
    pub fn with_unavailable_supply(mut self, message: impl Into<String>) -> Self {
        self.supply_unavailable = Some(message.into());
        self
    }

    /// Make `token_uri` fail for one token id.
    pub fn with_broken_uri(mut self, id: TokenId) -> Self {
        self.broken_uris.insert(id);
        self
    }

    /// Make `token_of_owner_by_index` fail for one `(address, index)` pair.
    pub fn with_broken_owner_index(mut self, address: &str, index: u64) -> Self {
        self.broken_owner_indexes.insert((address.to_string(), index));
        self
    }

    fn check_available(&self) -> Result<(), LedgerError> {
        match &self.supply_unavailable {
            Some(message) => Err(LedgerError::Read(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl LedgerRead for MemoryLedger {
    async fn total_supply(&self) -> Result<u64, LedgerError> {
        self.check_available()?;
        Ok(self.tokens.keys().next_back().copied().unwrap_or(0))
    }

    async fn balance_of(&self, address: &str) -> Result<u64, LedgerError> {
        self.check_available()?;
        Ok(self.owners.get(address).map_or(0, |ids| ids.len() as u64))
    }

    async fn token_of_owner_by_index(
        &self,
        address: &str,
        index: u64,
    ) -> Result<TokenId, LedgerError> {
        if self
            .broken_owner_indexes
            .contains(&(address.to_string(), index))
        {
            return Err(LedgerError::Read(format!(
                "tokenOfOwnerByIndex reverted at index {index} for {address}"
            )));
        }
        self.owners
            .get(address)
            .and_then(|ids| ids.get(index as usize))
            .copied()
            .ok_or_else(|| LedgerError::Read(format!("no token at index {index} for {address}")))
    }

    async fn token_uri(&self, token: TokenId) -> Result<String, LedgerError> {
        if self.broken_uris.contains(&token) {
            return Err(LedgerError::Read(format!("tokenURI reverted for {token}")));
        }
        self.tokens
            .get(&token)
            .cloned()
            .ok_or_else(|| LedgerError::Read(format!("unknown token {token}")))
    }

    async fn mint_count(&self, address: &str) -> Result<u64, LedgerError> {
        Ok(self.mint_counts.get(address).copied().unwrap_or(0))
    }

    async fn streak_count(&self, address: &str) -> Result<u64, LedgerError> {
        Ok(self.streak_counts.get(address).copied().unwrap_or(0))
    }

    async fn streak_milestone(&self) -> Result<u64, LedgerError> {
        Ok(self.streak_milestone.unwrap_or(7))
    }

    async fn mood_maestro_milestone(&self) -> Result<u64, LedgerError> {
        Ok(self.maestro_milestone.unwrap_or(50))
    }

    async fn has_badge(&self, address: &str, kind: BadgeKind) -> Result<bool, LedgerError> {
        Ok(self.earned.contains(&(address.to_string(), kind)))
    }

    async fn badge_uri(&self, kind: BadgeKind) -> Result<String, LedgerError> {
        Ok(self.badge_uris.get(&kind).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_ledger_tracks_tokens_and_owners() {
        let ledger = MemoryLedger::new()
            .with_token(1, "ipfs://a", "0xabc")
            .with_token(2, "ipfs://b", "0xabc")
            .with_token(3, "ipfs://c", "0xdef");

        assert_eq!(ledger.total_supply().await.unwrap(), 3);
        assert_eq!(ledger.balance_of("0xabc").await.unwrap(), 2);
        assert_eq!(ledger.balance_of("0xnobody").await.unwrap(), 0);
        assert_eq!(ledger.token_of_owner_by_index("0xabc", 1).await.unwrap(), 2);
        assert_eq!(ledger.token_uri(3).await.unwrap(), "ipfs://c");
    }

    #[tokio::test]
    async fn unavailable_supply_fails_count_reads_only() {
        let ledger = MemoryLedger::new()
            .with_token(1, "ipfs://a", "0xabc")
            .with_unavailable_supply("rpc down");

        assert!(ledger.total_supply().await.is_err());
        assert!(ledger.balance_of("0xabc").await.is_err());
        // Per-token reads are independent of the count read.
        assert_eq!(ledger.token_uri(1).await.unwrap(), "ipfs://a");
    }

    #[tokio::test]
    async fn broken_uri_fails_single_token() {
        let ledger = MemoryLedger::new()
            .with_token(1, "ipfs://a", "0xabc")
            .with_token(2, "ipfs://b", "0xabc")
            .with_broken_uri(2);

        assert!(ledger.token_uri(1).await.is_ok());
        assert!(ledger.token_uri(2).await.is_err());
    }

    #[tokio::test]
    async fn broken_owner_index_fails_single_read() {
        let ledger = MemoryLedger::new()
            .with_token(1, "ipfs://a", "0xabc")
            .with_token(2, "ipfs://b", "0xabc")
            .with_broken_owner_index("0xabc", 0);

        // Balance still reports both; only the poisoned index read fails.
        assert_eq!(ledger.balance_of("0xabc").await.unwrap(), 2);
        assert!(ledger.token_of_owner_by_index("0xabc", 0).await.is_err());
        assert_eq!(ledger.token_of_owner_by_index("0xabc", 1).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn badge_locations_skip_empty_uris() {
        let ledger = MemoryLedger::new()
            .with_badge_uri(BadgeKind::FirstMint, "https://badges.example/first.json")
            .with_badge_uri(BadgeKind::Streak, "");

        let uris = badge_locations(&ledger).await.unwrap();
        assert_eq!(uris, vec!["https://badges.example/first.json".to_string()]);
    }

    #[tokio::test]
    async fn milestones_default_when_unset() {
        let ledger = MemoryLedger::new();
        assert_eq!(ledger.streak_milestone().await.unwrap(), 7);
        assert_eq!(ledger.mood_maestro_milestone().await.unwrap(), 50);
    }
}
