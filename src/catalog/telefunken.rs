//! TELEFUNKEN Elektroakustik: one detail page per session, each holding the
//! real "Download Audio Files" link.

use std::collections::BTreeSet;

use async_trait::async_trait;
use scraper::Html;
use url::Url;

use super::extract::{AnchorText, LinkExtractor, PathSegment};
use super::{Catalog, CatalogEntry, CatalogSource, CatalogWarning, FetchedCatalog};
use crate::error::{Error, Result};
use crate::http::HttpClient;

/// Vendor display name.
pub const NAME: &str = "TELEFUNKEN";
/// Default listing page.
pub const DEFAULT_INDEX_URL: &str = "https://www.telefunken-elektroakustik.com/multitracks/";
/// Default local directory.
pub const DEFAULT_TARGET_DIR: &str = "data/telefunken";

const API_PATH: &str = "/wp-json/wp/v2/multitrack";
const API_PAGE_SIZE: &str = "100";
const DETAIL_SEGMENT: &str = "/multitrack/";
const CALL_TO_ACTION: &str = "download audio files";

/// Crawler for the TELEFUNKEN multitrack sessions.
#[derive(Debug, Clone)]
pub struct Telefunken {
    index_url: Url,
}

impl Telefunken {
    /// Crawls the given listing page.
    #[must_use]
    pub const fn new(index_url: Url) -> Self {
        Self { index_url }
    }

    fn api_url(&self) -> Result<Url> {
        let mut url = self.index_url.join(API_PATH)?;
        url.query_pairs_mut()
            .append_pair("per_page", API_PAGE_SIZE)
            .append_pair("orderby", "date")
            .append_pair("order", "desc");
        Ok(url)
    }

    async fn detail_links_from_api(&self, client: &HttpClient) -> Result<Vec<Url>> {
        let value = client.get_json(&self.api_url()?).await?;
        Ok(links_from_api(&value))
    }

    /// Lists session detail pages, newest-first from the API, or scraped from
    /// the listing page when the API is unusable.
    ///
    /// # Errors
    ///
    /// Returns an error only if the listing page fallback fails as well.
    pub async fn detail_links(&self, client: &HttpClient) -> Result<Vec<Url>> {
        match self.detail_links_from_api(client).await {
            Ok(links) if !links.is_empty() => {
                log::info!("{NAME} API listed {} session(s)", links.len());
                return Ok(links);
            }
            Ok(_) => log::info!("{NAME} API listed no sessions; scanning listing page"),
            Err(e) => log::info!("{NAME} API unavailable ({e}); scanning listing page"),
        }

        let html = client.get_page(&self.index_url, None).await?;
        Ok(scan_listing(&html, &self.index_url))
    }

    async fn resolve_detail(&self, client: &HttpClient, detail_url: &Url) -> Result<CatalogEntry> {
        let html = client.get_page(detail_url, Some(detail_url)).await?;
        find_download_link(&html, detail_url).ok_or_else(|| Error::MissingDownloadLink {
            url: detail_url.to_string(),
        })
    }
}

/// Extracts the sorted, de-duplicated `link` fields of an API response.
///
/// Anything but a non-empty array of objects yields an empty list.
#[must_use]
pub fn links_from_api(value: &serde_json::Value) -> Vec<Url> {
    let Some(items) = value.as_array() else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| item.get("link")?.as_str())
        .map(|link| link.trim_end_matches('/'))
        .filter(|link| !link.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .filter_map(|link| Url::parse(link).ok())
        .collect()
}

/// Scrapes session detail links from the listing page, sorted and de-duplicated.
#[must_use]
pub fn scan_listing(html: &str, page_url: &Url) -> Vec<Url> {
    let document = Html::parse_document(html);
    PathSegment::new(DETAIL_SEGMENT)
        .extract(&document, page_url)
        .into_iter()
        .map(String::from)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .filter_map(|link| Url::parse(&link).ok())
        .collect()
}

/// Finds the first "Download Audio Files" anchor on a detail page that
/// yields a usable file name.
#[must_use]
pub fn find_download_link(html: &str, detail_url: &Url) -> Option<CatalogEntry> {
    let document = Html::parse_document(html);
    AnchorText::new(CALL_TO_ACTION)
        .extract(&document, detail_url)
        .into_iter()
        .find_map(|link| CatalogEntry::from_url(link, Some(detail_url.clone())))
}

#[async_trait]
impl CatalogSource for Telefunken {
    fn name(&self) -> &'static str {
        NAME
    }

    fn index_url(&self) -> &Url {
        &self.index_url
    }

    async fn fetch(&self, client: &HttpClient) -> Result<FetchedCatalog> {
        let detail_links = self.detail_links(client).await?;
        let pages_listed = detail_links.len();
        if detail_links.is_empty() {
            log::warn!("No session links found on the {NAME} catalogue page");
        }

        let mut catalog = Catalog::new(self.index_url.clone());
        let mut warnings = Vec::new();
        for link in detail_links {
            match self.resolve_detail(client, &link).await {
                Ok(entry) => {
                    catalog.insert(entry);
                }
                Err(e) => {
                    log::warn!("Skipping session {link}: {e}");
                    warnings.push(CatalogWarning {
                        page: link,
                        reason: e.to_string(),
                    });
                }
            }
        }

        Ok(FetchedCatalog {
            catalog,
            warnings,
            raw_index: None,
            pages_listed: Some(pages_listed),
        })
    }
}
