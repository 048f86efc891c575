//! multitrack-dl - A library for mirroring multitrack archive catalogues.
//!
//! This library discovers the archives a vendor publishes, compares them with
//! what is already stored locally, and downloads the missing ones one at a
//! time, abstracted from any specific UI or display framework.
//!
//! # Example
//!
//! ```no_run
//! use multitrack_dl::{
//!     CatalogSource, DownloadConfig, Downloader, HttpClient, HttpConfig, Inventory,
//!     NoProgress, RequestProfile, TokioFileSystem, catalog::Cambridge, diff, inventory,
//! };
//! use std::path::Path;
//!
//! # async fn example() -> multitrack_dl::Result<()> {
//! let profile = RequestProfile::new(multitrack_dl::http::DEFAULT_USER_AGENT, None)?;
//! let client = HttpClient::new(profile, HttpConfig::default())?;
//!
//! let source = Cambridge::new(url::Url::parse("https://cambridge-mt.com/ms3/mtk/")?);
//! let fetched = source.fetch(&client).await?;
//!
//! let target = Path::new("data/cambridge");
//! let present = Inventory::scan(&TokioFileSystem, &inventory::candidate_dirs(target)).await;
//! let plan = diff::plan(&fetched.catalog, &present, false);
//!
//! let downloader = Downloader::new(client, DownloadConfig::default());
//! let report = downloader.download_all(&plan.to_process, target, &NoProgress).await;
//! println!("Downloaded {} files", report.stats.files_downloaded);
//! # Ok(())
//! # }
//! ```

#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod catalog;
pub mod config;
pub mod credentials;
pub mod diff;
pub mod download;
pub mod error;
pub mod format;
pub mod fs;
pub mod http;
pub mod inventory;
pub mod stats;

#[cfg(feature = "cli")]
pub mod cli;

// Re-export main types for convenience
pub use catalog::{Catalog, CatalogEntry, CatalogSource, CatalogWarning, FetchedCatalog};
pub use config::{AppConfig, DownloadConfig, HttpConfig, VendorConfig};
pub use credentials::{CredentialSources, Credentials, NonInteractive, Prompter, resolve_credentials};
pub use diff::{WorkItem, WorkPlan};
pub use download::{
    BatchReport, DownloadProgress, DownloadResult, Downloader, NoProgress, Outcome,
};
pub use error::{Error, Result};
pub use format::{format_bytes, format_duration};
pub use fs::{FileSystem, TokioFileSystem};
pub use http::{HttpClient, RequestProfile};
pub use inventory::Inventory;
pub use stats::{DownloadStatsTracker, FileStats, SessionStats, SessionStatsBuilder};
