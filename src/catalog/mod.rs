//! Catalog discovery: turning vendor listing pages into archive download links.
//!
//! Each vendor implements [`CatalogSource`]. Link extraction is expressed as
//! ordered [`extract::LinkExtractor`] strategies so that a markup change on one
//! path falls through to the next instead of failing outright.

pub mod cambridge;
pub mod extract;
pub mod telefunken;

use std::collections::HashSet;

use async_trait::async_trait;
use percent_encoding::percent_decode_str;
use url::Url;

use crate::error::Result;
use crate::http::HttpClient;

pub use cambridge::Cambridge;
pub use telefunken::Telefunken;

/// One downloadable archive found on a vendor site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Archive file name derived from the download URL.
    pub filename: String,
    /// Absolute URL of the archive.
    pub download_url: Url,
    /// Page the link was found on, when it is not the index itself.
    pub detail_page_url: Option<Url>,
}

impl CatalogEntry {
    /// Builds an entry from a download URL, deriving the file name from its path.
    ///
    /// Returns `None` when no usable file name can be derived.
    #[must_use]
    pub fn from_url(download_url: Url, detail_page_url: Option<Url>) -> Option<Self> {
        let filename = infer_filename(&download_url)?;
        Some(Self {
            filename,
            download_url,
            detail_page_url,
        })
    }

    /// Case-insensitive identity of the entry.
    #[must_use]
    pub fn key(&self) -> String {
        self.filename.to_lowercase()
    }
}

/// Archives discovered on one vendor site, in discovery order.
///
/// File names are unique case-insensitively; the first URL seen for a name wins.
#[derive(Debug, Clone)]
pub struct Catalog {
    index_url: Url,
    entries: Vec<CatalogEntry>,
    keys: HashSet<String>,
}

impl Catalog {
    /// Creates an empty catalog for the given listing page.
    #[must_use]
    pub fn new(index_url: Url) -> Self {
        Self {
            index_url,
            entries: Vec::new(),
            keys: HashSet::new(),
        }
    }

    /// Adds an entry unless one with the same file name is already present.
    ///
    /// Returns `true` if the entry was added.
    pub fn insert(&mut self, entry: CatalogEntry) -> bool {
        if self.keys.insert(entry.key()) {
            self.entries.push(entry);
            true
        } else {
            log::debug!(
                "Ignoring duplicate {} from {}",
                entry.filename,
                entry.download_url
            );
            false
        }
    }

    /// Listing page the catalog was built from.
    #[must_use]
    pub const fn index_url(&self) -> &Url {
        &self.index_url
    }

    /// Entries in discovery order.
    #[must_use]
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Iterates over entries in discovery order.
    pub fn iter(&self) -> std::slice::Iter<'_, CatalogEntry> {
        self.entries.iter()
    }

    /// Number of distinct archives.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing was discovered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a CatalogEntry;
    type IntoIter = std::slice::Iter<'a, CatalogEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// A catalog entry that could not be resolved. The run continues without it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogWarning {
    /// Page that failed.
    pub page: Url,
    /// Human-readable cause.
    pub reason: String,
}

/// Result of crawling one vendor site.
#[derive(Debug, Clone)]
pub struct FetchedCatalog {
    /// Discovered archives.
    pub catalog: Catalog,
    /// Entries skipped because their detail page was unusable.
    pub warnings: Vec<CatalogWarning>,
    /// Raw HTML of the index page, when the source fetched one.
    pub raw_index: Option<String>,
    /// Detail pages named by the listing, for sources that visit one page per entry.
    pub pages_listed: Option<usize>,
}

/// A vendor site that can be crawled for downloadable archives.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Display name of the vendor.
    fn name(&self) -> &'static str;

    /// Listing page the crawl starts from.
    fn index_url(&self) -> &Url;

    /// Crawls the site.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing itself cannot be fetched or is a
    /// verification challenge. Per-entry problems are reported as warnings.
    async fn fetch(&self, client: &HttpClient) -> Result<FetchedCatalog>;
}

/// Derives an archive file name from the last non-empty path segment of `url`.
///
/// The query string and fragment never take part; percent-escapes are decoded.
/// Names that could escape the target directory are rejected.
#[must_use]
pub fn infer_filename(url: &Url) -> Option<String> {
    let segment = url.path_segments()?.rev().find(|s| !s.is_empty())?;
    let decoded = percent_decode_str(segment).decode_utf8().ok()?;
    let name = decoded.trim();
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return None;
    }
    Some(name.to_string())
}
