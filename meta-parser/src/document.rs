//! Typed view over a parsed HTML document.
//!
//! The extractor only talks to [`Document`]; everything `scraper` specific stays in this module.

use ego_tree::NodeRef;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use std::sync::OnceLock;

/// Elements whose text never reaches the rendered page.
const HIDDEN_TAGS: &[&str] = &["script", "style", "template"];

struct Selectors {
    meta: Selector,
    title: Selector,
    anchor: Selector,
}

impl Selectors {
    fn new() -> Self {
        Self {
            meta: Selector::parse("meta").expect("meta selector"),
            title: Selector::parse("title").expect("title selector"),
            anchor: Selector::parse("a[href]").expect("anchor selector"),
        }
    }
}

fn selectors() -> &'static Selectors {
    static SELECTORS: OnceLock<Selectors> = OnceLock::new();
    SELECTORS.get_or_init(Selectors::new)
}

/// A parsed HTML page.
pub struct Document {
    html: Html,
}

impl Document {
    /// Parses `source`, recovering from malformed markup the way browsers do.
    pub fn parse(source: &str) -> Self {
        Self {
            html: Html::parse_document(source),
        }
    }

    /// Returns the trimmed `content` of the first `<meta property=name>`, or of the first
    /// `<meta name=name>` when no property form exists.
    pub fn meta_property(&self, name: &str) -> Option<String> {
        let tag = self
            .find_meta("property", name)
            .or_else(|| self.find_meta("name", name))?;
        non_empty(tag.value().attr("content")?)
    }

    /// Text of the `<title>` element.
    pub fn title(&self) -> Option<String> {
        let title = self.html.select(&selectors().title).next()?;
        non_empty(&title.text().collect::<String>())
    }

    /// All rendered text nodes, trimmed and joined with single spaces.
    pub fn visible_text(&self) -> String {
        let mut pieces: Vec<&str> = Vec::new();
        for node in self.html.tree.root().descendants() {
            let Node::Text(text) = node.value() else {
                continue;
            };
            let trimmed = text.trim();
            if trimmed.is_empty() || is_hidden(&node) {
                continue;
            }
            pieces.push(trimmed);
        }
        pieces.join(" ")
    }

    /// Every non-empty anchor `href`, in document order.
    pub fn links(&self) -> impl Iterator<Item = &str> + '_ {
        self.html
            .select(&selectors().anchor)
            .filter_map(|anchor| anchor.value().attr("href"))
            .filter(|href| !href.is_empty())
    }

    /// Anchor targets accepted by `predicate`, in document order.
    pub fn find_links<P>(&self, predicate: P) -> Vec<String>
    where
        P: Fn(&str) -> bool,
    {
        self.links()
            .filter(|href| predicate(href))
            .map(str::to_string)
            .collect()
    }

    fn find_meta(&self, attr: &str, name: &str) -> Option<ElementRef<'_>> {
        self.html
            .select(&selectors().meta)
            .find(|tag| tag.value().attr(attr) == Some(name))
    }
}

fn is_hidden(node: &NodeRef<'_, Node>) -> bool {
    node.ancestors().any(|ancestor| {
        ancestor
            .value()
            .as_element()
            .is_some_and(|element| HIDDEN_TAGS.contains(&element.name()))
    })
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
