//! HTML link-extraction strategies.

use scraper::{ElementRef, Html, Selector};
use url::Url;

/// A way of pulling candidate links out of a parsed page.
///
/// Strategies never fail: markup they do not recognise yields an empty list.
pub trait LinkExtractor {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Returns absolute links in document order.
    fn extract(&self, document: &Html, page_url: &Url) -> Vec<Url>;
}

/// Runs `extractors` in order and returns the first non-empty result.
#[must_use]
pub fn first_match(extractors: &[&dyn LinkExtractor], document: &Html, page_url: &Url) -> Vec<Url> {
    for extractor in extractors {
        let links = extractor.extract(document, page_url);
        if !links.is_empty() {
            log::debug!(
                "{} strategy found {} link(s) on {page_url}",
                extractor.name(),
                links.len()
            );
            return links;
        }
        log::debug!("{} strategy found nothing on {page_url}", extractor.name());
    }
    Vec::new()
}

/// Parses a selector that is part of the program text.
fn builtin_selector(css: &'static str) -> Selector {
    Selector::parse(css).expect("built-in selector is valid")
}

/// Collapses whitespace across all text nodes and lower-cases the result.
pub fn normalize_text<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    parts
        .into_iter()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn resolve_href(anchor: ElementRef<'_>, page_url: &Url) -> Option<Url> {
    let href = anchor.value().attr("href")?.trim();
    if href.is_empty() {
        return None;
    }
    page_url.join(href).ok()
}

/// Structured lookup: labelled download blocks holding one primary anchor.
pub struct DownloadBlocks {
    block: Selector,
    label: Selector,
    preferred_anchor: Selector,
    any_anchor: Selector,
    marker: String,
}

impl DownloadBlocks {
    /// Matches blocks whose normalised label starts with `marker`.
    #[must_use]
    pub fn new(
        block: &'static str,
        label: &'static str,
        preferred_anchor: &'static str,
        marker: &str,
    ) -> Self {
        Self {
            block: builtin_selector(block),
            label: builtin_selector(label),
            preferred_anchor: builtin_selector(preferred_anchor),
            any_anchor: builtin_selector("a[href]"),
            marker: normalize_text([marker]),
        }
    }

    fn block_link(&self, block: ElementRef<'_>, page_url: &Url) -> Option<Url> {
        let label = block.select(&self.label).next()?;
        if !normalize_text(label.text()).starts_with(&self.marker) {
            return None;
        }
        let anchor = block
            .select(&self.preferred_anchor)
            .next()
            .or_else(|| block.select(&self.any_anchor).next())?;
        resolve_href(anchor, page_url)
    }
}

impl LinkExtractor for DownloadBlocks {
    fn name(&self) -> &'static str {
        "download-block"
    }

    fn extract(&self, document: &Html, page_url: &Url) -> Vec<Url> {
        document
            .select(&self.block)
            .filter_map(|block| self.block_link(block, page_url))
            .collect()
    }
}

/// Generic scan: anchors whose visible text contains a call-to-action phrase.
pub struct AnchorText {
    anchor: Selector,
    phrase: String,
}

impl AnchorText {
    /// Matches anchors containing `phrase`, case-insensitively.
    #[must_use]
    pub fn new(phrase: &str) -> Self {
        Self {
            anchor: builtin_selector("a[href]"),
            phrase: normalize_text([phrase]),
        }
    }
}

impl LinkExtractor for AnchorText {
    fn name(&self) -> &'static str {
        "anchor-text"
    }

    fn extract(&self, document: &Html, page_url: &Url) -> Vec<Url> {
        document
            .select(&self.anchor)
            .filter(|a| normalize_text(a.text()).contains(&self.phrase))
            .filter_map(|a| resolve_href(a, page_url))
            .collect()
    }
}

/// Generic scan: every link whose path contains a given segment.
///
/// Fragments and trailing slashes are stripped; the page itself is excluded.
pub struct PathSegment {
    anchor: Selector,
    segment: String,
}

impl PathSegment {
    /// Matches links whose path contains `segment` (e.g. `/multitrack/`).
    #[must_use]
    pub fn new(segment: &str) -> Self {
        Self {
            anchor: builtin_selector("a[href]"),
            segment: segment.to_string(),
        }
    }

    fn normalize(&self, mut url: Url, page: &str) -> Option<Url> {
        if !matches!(url.scheme(), "http" | "https") {
            return None;
        }
        url.set_fragment(None);
        let trimmed = url.as_str().trim_end_matches('/');
        if trimmed == page {
            return None;
        }
        let url = Url::parse(trimmed).ok()?;
        url.path().contains(&self.segment).then_some(url)
    }
}

impl LinkExtractor for PathSegment {
    fn name(&self) -> &'static str {
        "path-segment"
    }

    fn extract(&self, document: &Html, page_url: &Url) -> Vec<Url> {
        let page = page_url.as_str().trim_end_matches('/');
        document
            .select(&self.anchor)
            .filter_map(|a| resolve_href(a, page_url))
            .filter_map(|url| self.normalize(url, page))
            .collect()
    }
}
