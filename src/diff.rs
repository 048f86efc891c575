//! Work planning: which catalog entries still need downloading.

use url::Url;

use crate::catalog::{Catalog, CatalogEntry};
use crate::inventory::Inventory;

/// A catalog entry scheduled for download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    /// The archive to fetch.
    pub entry: CatalogEntry,
    /// Referer sent with the download request.
    pub referer: Url,
}

impl WorkItem {
    /// Schedules `entry`, using its detail page (or the index page) as referer.
    #[must_use]
    pub fn new(entry: CatalogEntry, index_url: &Url) -> Self {
        let referer = entry
            .detail_page_url
            .clone()
            .unwrap_or_else(|| index_url.clone());
        Self { entry, referer }
    }

    /// Archive file name.
    #[must_use]
    pub fn filename(&self) -> &str {
        &self.entry.filename
    }
}

/// Outcome of comparing a catalog with the local inventory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkPlan {
    /// Entries to download, in catalog order.
    pub to_process: Vec<WorkItem>,
    /// Archives discovered on the site.
    pub total: usize,
    /// Discovered archives already stored locally.
    pub present: usize,
    /// Entries scheduled; equals `to_process.len()`.
    pub missing: usize,
}

impl WorkPlan {
    /// Returns true if nothing needs downloading.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.to_process.is_empty()
    }
}

/// Subtracts the inventory from the catalog.
///
/// With `overwrite`, every entry is scheduled regardless of presence, so
/// `present + missing` may exceed `total`.
#[must_use]
pub fn plan(catalog: &Catalog, inventory: &Inventory, overwrite: bool) -> WorkPlan {
    let mut present = 0;
    let mut to_process = Vec::new();

    for entry in catalog {
        let stored = inventory.contains(&entry.filename);
        if stored {
            present += 1;
        }
        if overwrite || !stored {
            to_process.push(WorkItem::new(entry.clone(), catalog.index_url()));
        }
    }

    WorkPlan {
        missing: to_process.len(),
        total: catalog.len(),
        present,
        to_process,
    }
}
