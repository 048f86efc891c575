//! Core download logic and abstractions.

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures::StreamExt;
use tokio::io::{AsyncWriteExt, BufWriter};

use crate::config::DownloadConfig;
use crate::diff::WorkItem;
use crate::error::{Error, Result};
use crate::fs::{FileSystem, TokioFileSystem};
use crate::http::HttpClient;
use crate::stats::{DownloadStatsTracker, FileStats, SessionStats, SessionStatsBuilder};

/// Trait for receiving download progress updates.
///
/// Implement this trait to receive callbacks during download operations.
/// All methods have default no-op implementations for convenience.
pub trait DownloadProgress: Send + Sync {
    /// Called when the response headers arrived; `total` comes from Content-Length.
    fn on_file_start(&self, _name: &str, _total: Option<u64>) {}

    /// Called after each chunk with the cumulative byte count.
    fn on_progress(&self, _name: &str, _downloaded: u64, _total: Option<u64>) {}

    /// Called when a file download completes successfully.
    fn on_file_complete(&self, _name: &str, _stats: &FileStats) {}

    /// Called when a file is left alone because it already exists.
    fn on_skipped(&self, _name: &str, _path: &Path) {}

    /// Called when a file download fails.
    fn on_error(&self, _name: &str, _error: &str) {}

    /// Called before pausing between two downloads.
    fn on_pause(&self, _delay: Duration) {}
}

/// A null progress implementation that ignores all events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl DownloadProgress for NoProgress {}

/// Terminal state of one work item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The archive was fetched and written.
    Downloaded,
    /// The destination already existed; nothing was fetched.
    Skipped,
    /// The transfer failed; see the result detail.
    Failed,
}

impl Outcome {
    /// Display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Downloaded => "Downloaded",
            Self::Skipped => "Skipped",
            Self::Failed => "Failed",
        }
    }
}

/// Record of what happened to one work item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadResult {
    /// Archive file name.
    pub filename: String,
    /// Terminal state.
    pub outcome: Outcome,
    /// Destination path, or the error message for failures.
    pub detail: String,
    /// Bytes written to disk.
    pub bytes_written: u64,
}

/// Results of a batch, in work-list order, plus the session totals.
#[derive(Debug, Clone)]
pub struct BatchReport {
    /// One record per attempted item.
    pub results: Vec<DownloadResult>,
    /// Aggregated counters.
    pub stats: SessionStats,
}

impl BatchReport {
    /// Returns true if any item failed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.failed_count() > 0
    }

    /// Number of failed items.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.outcome == Outcome::Failed)
            .count()
    }
}

/// Returns the `.part` file path for a given final path.
fn part_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

/// Joins `filename` onto `dir`, refusing names that would leave it.
fn destination_path(dir: &Path, filename: &str) -> Result<PathBuf> {
    let usable = !filename.is_empty()
        && filename != "."
        && filename != ".."
        && !filename.contains(['/', '\\']);
    if usable {
        Ok(dir.join(filename))
    } else {
        Err(Error::InvalidFileName(filename.to_string()))
    }
}

/// Sequential downloader for a work list.
pub struct Downloader<F: FileSystem = TokioFileSystem> {
    client: HttpClient,
    config: DownloadConfig,
    fs: F,
}

impl Downloader<TokioFileSystem> {
    /// Creates a new downloader with the default file system.
    #[must_use]
    pub const fn new(client: HttpClient, config: DownloadConfig) -> Self {
        Self {
            client,
            config,
            fs: TokioFileSystem,
        }
    }
}

impl<F: FileSystem> Downloader<F> {
    /// Creates a new downloader with a custom file system implementation.
    #[must_use]
    pub const fn with_fs(client: HttpClient, config: DownloadConfig, fs: F) -> Self {
        Self { client, config, fs }
    }

    /// Returns the HTTP session.
    #[must_use]
    pub const fn client(&self) -> &HttpClient {
        &self.client
    }

    /// Returns a reference to the download configuration.
    #[must_use]
    pub const fn config(&self) -> &DownloadConfig {
        &self.config
    }

    /// Ensures the parent directory exists for a file path.
    async fn ensure_parent_dir(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            self.fs.create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Streams the response body into `part`, one buffered chunk at a time.
    async fn stream_to_file(
        &self,
        response: reqwest::Response,
        part: &Path,
        name: &str,
        progress: &dyn DownloadProgress,
    ) -> Result<FileStats> {
        let total = response.content_length();
        progress.on_file_start(name, total);

        let file = self.fs.create_file(part).await?;
        let mut writer = BufWriter::with_capacity(self.config.chunk_size, file);
        let mut tracker = DownloadStatsTracker::new();
        let mut body = response.bytes_stream();

        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            if chunk.is_empty() {
                continue;
            }
            writer.write_all(&chunk).await?;
            tracker.record_bytes(chunk.len() as u64);
            progress.on_progress(name, tracker.downloaded(), total);
        }
        writer.flush().await?;

        Ok(tracker.into_file_stats())
    }

    /// Downloads one archive using atomic `.part` file semantics.
    ///
    /// Writes to `{destination}.part` during download, then renames to
    /// `{destination}` on success. On error the `.part` file is removed if
    /// `cleanup_on_error` is enabled.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the server answers with an error
    /// status, or the file cannot be written.
    pub async fn download_file(
        &self,
        item: &WorkItem,
        destination: &Path,
        progress: &dyn DownloadProgress,
    ) -> Result<FileStats> {
        let name = item.filename();
        let part = part_path(destination);

        let result: Result<FileStats> = async {
            self.ensure_parent_dir(destination).await?;
            let response = self
                .client
                .get_stream(&item.entry.download_url, Some(&item.referer))
                .await?;
            let stats = self.stream_to_file(response, &part, name, progress).await?;
            self.fs.rename_file(&part, destination).await?;
            Ok(stats)
        }
        .await;

        match result {
            Ok(stats) => {
                progress.on_file_complete(name, &stats);
                Ok(stats)
            }
            Err(e) => {
                if self.config.cleanup_on_error && self.fs.file_exists(&part).await {
                    let _ = self.fs.remove_file(&part).await;
                }
                progress.on_error(name, &e.to_string());
                Err(e)
            }
        }
    }

    /// Downloads every item in order, one at a time.
    ///
    /// Existing destinations are skipped without a request unless overwrite is
    /// enabled. A failed item is recorded and the batch moves on. The configured
    /// delay separates consecutive network fetches.
    pub async fn download_all(
        &self,
        items: &[WorkItem],
        target_dir: &Path,
        progress: &dyn DownloadProgress,
    ) -> BatchReport {
        let mut builder = SessionStatsBuilder::new();
        let mut results = Vec::with_capacity(items.len());
        let mut fetched_before = false;

        for item in items {
            let name = item.filename().to_string();

            let destination = match destination_path(target_dir, &name) {
                Ok(path) => path,
                Err(e) => {
                    log::error!("Download failed: {e}");
                    progress.on_error(&name, &e.to_string());
                    builder.add_failed();
                    results.push(failure(name, item, &e));
                    continue;
                }
            };

            if !self.config.force_overwrite && self.fs.file_exists(&destination).await {
                log::info!("Skipping {name}: {} exists", destination.display());
                progress.on_skipped(&name, &destination);
                builder.add_skipped();
                results.push(DownloadResult {
                    filename: name,
                    outcome: Outcome::Skipped,
                    detail: destination.display().to_string(),
                    bytes_written: 0,
                });
                continue;
            }

            if fetched_before && !self.config.delay.is_zero() {
                progress.on_pause(self.config.delay);
                tokio::time::sleep(self.config.delay).await;
            }
            fetched_before = true;

            match self.download_file(item, &destination, progress).await {
                Ok(stats) => {
                    builder.add_download(&stats);
                    results.push(DownloadResult {
                        filename: name,
                        outcome: Outcome::Downloaded,
                        detail: destination.display().to_string(),
                        bytes_written: stats.size,
                    });
                }
                Err(e) => {
                    log::error!("Download of {name} failed: {e}");
                    builder.add_failed();
                    results.push(failure(name, item, &e));
                }
            }
        }

        BatchReport {
            results,
            stats: builder.build(),
        }
    }
}

/// Failure record; detail-page entries name the page they came from.
fn failure(filename: String, item: &WorkItem, error: &Error) -> DownloadResult {
    let detail = match &item.entry.detail_page_url {
        Some(page) => format!("{page} | {error}"),
        None => error.to_string(),
    };
    DownloadResult {
        filename,
        outcome: Outcome::Failed,
        detail,
        bytes_written: 0,
    }
}
