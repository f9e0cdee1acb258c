//! Site-family conventions and URL-derived identifiers.

use sha2::{Digest, Sha256};
use url::{Position, Url};

/// Hex characters kept from a SHA-256 digest for derived identifiers.
const SHORT_HASH_LEN: usize = 16;

/// URL conventions of the site family being scraped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteProfile {
    /// Domain every profile and shared-item link must reference.
    pub domain: String,
    /// Href fragments marking a profile link (numeric profile or named page).
    pub profile_markers: Vec<String>,
    /// Href fragments marking a link to a shared post.
    pub shared_item_markers: Vec<String>,
    /// Query keys carrying a post identifier, in priority order.
    pub record_id_params: Vec<String>,
    /// Query key carrying an explicit profile identifier.
    pub author_id_param: String,
}

impl Default for SiteProfile {
    fn default() -> Self {
        Self {
            domain: "facebook.com".to_string(),
            profile_markers: strings(&["profile.php", "/pages/"]),
            shared_item_markers: strings(&["story_fbid=", "/posts/"]),
            record_id_params: strings(&["story_fbid", "fbid"]),
            author_id_param: "id".to_string(),
        }
    }
}

impl SiteProfile {
    /// Default conventions scoped to another domain family.
    pub fn with_domain(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            ..Self::default()
        }
    }

    /// Whether `href` points into the site family.
    pub fn references_site(&self, href: &str) -> bool {
        href.contains(self.domain.as_str())
    }

    /// Whether `href` looks like a profile or page link.
    pub fn is_profile_link(&self, href: &str) -> bool {
        self.references_site(href) && contains_any(href, &self.profile_markers)
    }

    /// Whether `href` looks like a shared post.
    pub fn is_shared_item_link(&self, href: &str) -> bool {
        self.references_site(href) && contains_any(href, &self.shared_item_markers)
    }

    /// Post identifier from the URL query, else its last numeric path segment, else a hash.
    pub fn record_id(&self, canonical_url: &str) -> String {
        Url::parse(canonical_url)
            .ok()
            .and_then(|url| {
                self.record_id_params
                    .iter()
                    .find_map(|key| query_value(&url, key))
                    .or_else(|| last_numeric_segment(&url))
            })
            .unwrap_or_else(|| short_hash(canonical_url))
    }

    /// Explicit identifier from the profile URL query, else a hash of the profile URL.
    ///
    /// Relative profile hrefs are resolved against `base` before reading the query.
    pub fn author_id(&self, profile_url: &str, base: Option<&Url>) -> String {
        Url::options()
            .base_url(base)
            .parse(profile_url)
            .ok()
            .and_then(|url| query_value(&url, &self.author_id_param))
            .unwrap_or_else(|| short_hash(profile_url))
    }
}

/// Scheme, authority and first path segment of `url`.
///
/// `https://example.com/entity/items/123` becomes `https://example.com/entity`.
pub fn infer_profile_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let first = parsed
        .path_segments()?
        .find(|segment| !segment.is_empty())?
        .to_string();
    Some(format!("{}/{}", &parsed[..Position::BeforePath], first))
}

/// First 16 hex characters of the SHA-256 digest of `value`.
pub fn short_hash(value: &str) -> String {
    let mut encoded = hex::encode(Sha256::digest(value.as_bytes()));
    encoded.truncate(SHORT_HASH_LEN);
    encoded
}

fn query_value(url: &Url, key: &str) -> Option<String> {
    url.query_pairs()
        .find(|(name, value)| name == key && !value.is_empty())
        .map(|(_, value)| value.into_owned())
}

fn last_numeric_segment(url: &Url) -> Option<String> {
    url.path_segments()?
        .rev()
        .find(|segment| !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()))
        .map(str::to_string)
}

fn contains_any(href: &str, markers: &[String]) -> bool {
    markers.iter().any(|marker| href.contains(marker.as_str()))
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn short_hash_is_sha256_prefix() {
        assert_eq!(short_hash(""), "e3b0c44298fc1c14");
        assert_eq!(short_hash("abc"), "ba7816bf8f01cfea");
    }

    #[test]
    fn record_id_prefers_query_keys_in_order() {
        let site = SiteProfile::default();
        assert_eq!(
            site.record_id("https://www.facebook.com/permalink.php?fbid=2&story_fbid=1&id=9"),
            "1"
        );
        assert_eq!(
            site.record_id("https://www.facebook.com/photo.php?fbid=77&set=a.1"),
            "77"
        );
    }

    #[test]
    fn record_id_skips_blank_query_values() {
        let site = SiteProfile::default();
        assert_eq!(
            site.record_id("https://www.facebook.com/story.php?story_fbid=&fbid=5"),
            "5"
        );
    }

    #[test]
    fn record_id_uses_last_numeric_segment() {
        let site = SiteProfile::default();
        assert_eq!(
            site.record_id("https://www.facebook.com/100/posts/200/"),
            "200"
        );
        assert_eq!(
            site.record_id("https://www.facebook.com/somepage/posts/pfbid0abc"),
            short_hash("https://www.facebook.com/somepage/posts/pfbid0abc")
        );
    }

    #[test]
    fn record_id_is_deterministic() {
        let site = SiteProfile::default();
        let url = "https://example.com/no-digits-here";
        assert_eq!(site.record_id(url), site.record_id(url));
        assert_eq!(site.record_id(url), short_hash(url));
        assert_eq!(site.record_id("not a url"), short_hash("not a url"));
    }

    #[test]
    fn author_id_reads_query_or_hashes() {
        let site = SiteProfile::default();
        assert_eq!(
            site.author_id("https://www.facebook.com/profile.php?id=4242", None),
            "4242"
        );
        let named = "https://www.facebook.com/pages/Some-Cafe/123";
        assert_eq!(site.author_id(named, None), short_hash(named));
        assert_eq!(site.author_id(named, None), site.author_id(named, None));
    }

    #[test]
    fn author_id_resolves_protocol_relative_hrefs() {
        let site = SiteProfile::default();
        let base = Url::parse("https://www.facebook.com/somepage/posts/1").unwrap();
        assert_eq!(
            site.author_id("//www.facebook.com/profile.php?id=7", Some(&base)),
            "7"
        );
    }

    #[test]
    fn infers_profile_from_first_segment() {
        assert_eq!(
            infer_profile_url("https://example.com/entity/items/123").as_deref(),
            Some("https://example.com/entity")
        );
        assert_eq!(
            infer_profile_url("https://example.com:8443//entity/").as_deref(),
            Some("https://example.com:8443/entity")
        );
        assert_eq!(infer_profile_url("https://example.com/"), None);
        assert_eq!(infer_profile_url("not a url"), None);
    }

    #[test]
    fn link_classification_requires_domain() {
        let site = SiteProfile::default();
        assert!(site.is_profile_link("https://www.facebook.com/profile.php?id=1"));
        assert!(site.is_profile_link("https://facebook.com/pages/Cafe/9"));
        assert!(!site.is_profile_link("https://example.com/profile.php?id=1"));
        assert!(site.is_shared_item_link("https://www.facebook.com/a/posts/3"));
        assert!(site.is_shared_item_link("https://m.facebook.com/story.php?story_fbid=3&id=1"));
        assert!(!site.is_shared_item_link("https://www.facebook.com/a/photos/3"));

        let other = SiteProfile::with_domain("example.org");
        assert!(other.is_shared_item_link("https://example.org/team/posts/8"));
    }
}
