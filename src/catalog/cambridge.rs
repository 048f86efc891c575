//! Cambridge MT: "Full Multitrack" archives listed on a single index page.

use async_trait::async_trait;
use scraper::Html;
use url::Url;

use super::extract::{AnchorText, DownloadBlocks, LinkExtractor, first_match};
use super::{Catalog, CatalogEntry, CatalogSource, FetchedCatalog};
use crate::error::Result;
use crate::http::HttpClient;

/// Vendor display name.
pub const NAME: &str = "Cambridge MT";
/// Default listing page.
pub const DEFAULT_INDEX_URL: &str = "https://cambridge-mt.com/ms3/mtk/";
/// Default local directory.
pub const DEFAULT_TARGET_DIR: &str = "data/cambridge";

const BLOCK: &str = ".m-mtk-download";
const BLOCK_LABEL: &str = ".m-mtk-download__type";
const BLOCK_ANCHOR: &str = ".m-mtk-download__links a[href]";
const MARKER: &str = "full multitrack";

/// Crawler for the Cambridge MT multitrack library.
#[derive(Debug, Clone)]
pub struct Cambridge {
    index_url: Url,
}

impl Cambridge {
    /// Crawls the given index page.
    #[must_use]
    pub const fn new(index_url: Url) -> Self {
        Self { index_url }
    }
}

/// Extracts full-multitrack archive links from the index HTML.
///
/// Download blocks labelled "Full Multitrack" are preferred; pages without
/// them fall back to anchors whose text says "Full Multitrack".
#[must_use]
pub fn parse_index(html: &str, page_url: &Url) -> Catalog {
    let document = Html::parse_document(html);
    let blocks = DownloadBlocks::new(BLOCK, BLOCK_LABEL, BLOCK_ANCHOR, MARKER);
    let anchors = AnchorText::new(MARKER);
    let strategies: [&dyn LinkExtractor; 2] = [&blocks, &anchors];

    let mut catalog = Catalog::new(page_url.clone());
    for link in first_match(&strategies, &document, page_url) {
        match CatalogEntry::from_url(link, None) {
            Some(entry) => {
                catalog.insert(entry);
            }
            None => log::debug!("No file name in link on {page_url}"),
        }
    }
    catalog
}

#[async_trait]
impl CatalogSource for Cambridge {
    fn name(&self) -> &'static str {
        NAME
    }

    fn index_url(&self) -> &Url {
        &self.index_url
    }

    async fn fetch(&self, client: &HttpClient) -> Result<FetchedCatalog> {
        log::info!("Fetching {NAME} index {}", self.index_url);
        let html = client
            .get_page(&self.index_url, Some(&self.index_url))
            .await?;

        let catalog = parse_index(&html, &self.index_url);
        if catalog.is_empty() && !html.trim().is_empty() {
            log::warn!(
                "No \"Full Multitrack\" links in {} bytes of index HTML; the page structure may have changed",
                html.len()
            );
        }

        Ok(FetchedCatalog {
            catalog,
            warnings: Vec::new(),
            raw_index: Some(html),
            pages_listed: None,
        })
    }
}
