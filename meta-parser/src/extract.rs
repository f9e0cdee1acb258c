//! Field-by-field record extraction with ordered fallbacks.

use crate::counts::{mine_count, COMMENT_KEYWORDS, REACTION_KEYWORDS};
use crate::document::Document;
use crate::record::{AuthorInfo, ExtractedRecord, MediaRef};
use crate::site::{infer_profile_url, SiteProfile};
use crate::timestamp::CaptureClock;
use tracing::debug;
use url::Url;

const OG_URL: &str = "og:url";
const OG_TITLE: &str = "og:title";
const OG_DESCRIPTION: &str = "og:description";
const OG_SITE_NAME: &str = "og:site_name";
const OG_IMAGE: &str = "og:image";
const OG_VIDEO: &str = "og:video";

/// Ordered derivation strategies for one field; the first present value wins.
struct FallbackChain<'a, T> {
    attempts: Vec<Box<dyn Fn() -> Option<T> + 'a>>,
}

impl<'a, T> FallbackChain<'a, T> {
    fn new() -> Self {
        Self {
            attempts: Vec::new(),
        }
    }

    fn then(mut self, attempt: impl Fn() -> Option<T> + 'a) -> Self {
        self.attempts.push(Box::new(attempt));
        self
    }

    fn resolve(&self) -> Option<T> {
        self.attempts.iter().find_map(|attempt| attempt())
    }
}

/// Stateless extractor turning fetched pages into records.
#[derive(Debug, Clone, Default)]
pub struct Extractor {
    site: SiteProfile,
    clock: CaptureClock,
}

impl Extractor {
    /// Builds an extractor for `site`, stamping records with `clock`.
    pub fn new(site: SiteProfile, clock: CaptureClock) -> Self {
        Self { site, clock }
    }

    /// Extracts the records contained in `html`, fetched from `url`.
    ///
    /// A page holds a single post, so the result has one record, or none when no non-empty
    /// source URL can be established.
    pub fn extract(&self, url: &str, html: &str) -> Vec<ExtractedRecord> {
        let document = Document::parse(html);
        let record = self.extract_document(url, &document);
        if record.source_url.is_empty() {
            debug!(url, "no source url for document, skipping");
            return Vec::new();
        }
        vec![record]
    }

    /// Derives every record field from an already parsed document.
    pub fn extract_document(&self, url: &str, document: &Document) -> ExtractedRecord {
        let source_url = document
            .meta_property(OG_URL)
            .unwrap_or_else(|| url.to_string());

        let text = FallbackChain::new()
            .then(|| document.meta_property(OG_DESCRIPTION))
            .then(|| document.meta_property(OG_TITLE))
            .then(|| document.title())
            .resolve();

        let profile_url = FallbackChain::new()
            .then(|| self.profile_link(document))
            .then(|| infer_profile_url(&source_url))
            .resolve();

        let base = Url::parse(&source_url).ok();
        let author = AuthorInfo {
            id: profile_url
                .as_deref()
                .map(|profile| self.site.author_id(profile, base.as_ref())),
            name: document.meta_property(OG_SITE_NAME),
            profile_url,
        };

        let visible_text = document.visible_text();
        let record = ExtractedRecord {
            record_id: Some(self.site.record_id(&source_url)),
            text,
            captured_at: self.clock.now(),
            comment_count: mine_count(&visible_text, COMMENT_KEYWORDS),
            reaction_count: mine_count(&visible_text, REACTION_KEYWORDS),
            author,
            image: MediaRef::new(document.meta_property(OG_IMAGE)),
            video: MediaRef::new(document.meta_property(OG_VIDEO)),
            linked_record_url: self.linked_record(document),
            source_url,
        };

        debug!(
            url,
            record_id = record.record_id.as_deref().unwrap_or_default(),
            comments = record.comment_count,
            reactions = record.reaction_count,
            "extracted record"
        );
        record
    }

    fn profile_link(&self, document: &Document) -> Option<String> {
        document
            .find_links(|href| self.site.is_profile_link(href))
            .into_iter()
            .next()
    }

    fn linked_record(&self, document: &Document) -> Option<String> {
        document
            .find_links(|href| self.site.is_shared_item_link(href))
            .into_iter()
            .next()
    }
}
