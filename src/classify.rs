//! Classifier/Normalizer: turns a fetched document into a display-ready item.
//!
//! Pure transformation, no network calls. Three independent signals mark an
//! item as a badge, and any true signal wins:
//!
//! 1. the token's metadata URI matched a reserved badge location,
//! 2. the document arrived via the inline data scheme,
//! 3. an attribute carries `trait_type` `"Badge"` or `"Badge Type"`.
//!
//! Documents with an empty `name` or `description` are discarded rather
//! than emitted.

use crate::config::PipelineConfig;
use crate::types::{MetadataDocument, NormalizedItem, TokenId};

/// Attribute trait types that mark an item as a badge.
const BADGE_TRAITS: [&str; 2] = ["Badge", "Badge Type"];

/// Badge decision over the three detection signals.
pub fn is_badge(doc: &MetadataDocument, from_inline: bool, known_badge_location: bool) -> bool {
    known_badge_location
        || from_inline
        || doc
            .attributes
            .iter()
            .any(|attr| BADGE_TRAITS.contains(&attr.trait_type.as_str()))
}

/// Normalize a fetched document, or return `None` to discard it.
///
/// `from_inline` records whether the document was sourced via the inline
/// data scheme; `known_badge_location` whether its URI matched a reserved
/// badge location. The image is rewritten to a fetchable URL: `ipfs://`
/// goes through the gateway, a missing image gets the placeholder, anything
/// else passes through unchanged.
pub fn normalize(
    token_id: TokenId,
    doc: MetadataDocument,
    from_inline: bool,
    known_badge_location: bool,
    cfg: &PipelineConfig,
) -> Option<NormalizedItem> {
    if !doc.is_valid() {
        return None;
    }

    let badge = is_badge(&doc, from_inline, known_badge_location);
    let image = match &doc.image {
        Some(uri) if !uri.trim().is_empty() => cfg.to_gateway_url(uri),
        _ => cfg.placeholder_image.clone(),
    };

    Some(NormalizedItem {
        token_id,
        name: doc.name,
        description: doc.description,
        image,
        attributes: doc.attributes,
        is_badge: badge,
    })
}
