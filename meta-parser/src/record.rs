//! Typed records produced by the extractor.

use serde::{Deserialize, Serialize};

/// One extracted post, the unit of output.
///
/// Optional fields always serialize, as `null` when absent, so the JSON shape is identical for
/// every record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedRecord {
    /// Stable identifier derived from the canonical URL.
    pub record_id: Option<String>,
    /// Canonical URL the record was extracted from.
    pub source_url: String,
    /// Primary textual content.
    pub text: Option<String>,
    /// UNIX seconds at extraction time (not the document's publish time).
    pub captured_at: i64,
    /// Mined comment count.
    pub comment_count: u64,
    /// Mined reaction count.
    pub reaction_count: u64,
    /// Page or profile that owns the post.
    pub author: AuthorInfo,
    /// Preview image.
    pub image: MediaRef,
    /// Attached video.
    pub video: MediaRef,
    /// Shared or attached post detected on the page.
    pub linked_record_url: Option<String>,
}

/// Owner of an extracted post.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorInfo {
    /// Explicit identifier or a hash of `profile_url`.
    pub id: Option<String>,
    /// Display name.
    pub name: Option<String>,
    /// Profile or page URL.
    pub profile_url: Option<String>,
}

/// Reference to a media asset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRef {
    /// Asset location, when the page advertises one.
    pub url: Option<String>,
}

impl MediaRef {
    /// Wraps an optional asset location.
    pub fn new(url: Option<String>) -> Self {
        Self { url }
    }
}
