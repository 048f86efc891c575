//! Transfer statistics for single archives and whole batches.

use std::time::{Duration, Instant};

/// Bytes per second over `elapsed`; zero when no time has passed.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn bytes_per_sec(bytes: u64, elapsed: Duration) -> u64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        (bytes as f64 / secs) as u64
    } else {
        0
    }
}

/// Statistics for a single archive transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStats {
    /// Bytes written to disk.
    pub size: u64,
    /// Time from the first byte request to the last byte written.
    pub elapsed: Duration,
    /// Average speed in bytes per second.
    pub average_speed: u64,
    /// Highest running speed observed, in bytes per second.
    pub peak_speed: u64,
}

/// Totals for one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Archives fetched and written.
    pub files_downloaded: usize,
    /// Archives left alone because they already existed.
    pub files_skipped: usize,
    /// Archives whose transfer failed.
    pub files_failed: usize,
    /// Bytes written across all downloads.
    pub total_bytes: u64,
    /// Wall-clock time of the batch, pauses included.
    pub elapsed: Duration,
    /// Highest per-file peak speed in bytes per second.
    pub peak_speed: u64,
}

impl SessionStats {
    /// Average speed over the whole batch in bytes per second.
    #[must_use]
    pub fn average_speed(&self) -> u64 {
        bytes_per_sec(self.total_bytes, self.elapsed)
    }
}

/// Running counters for the archive currently streaming in.
#[derive(Debug)]
pub struct DownloadStatsTracker {
    started: Instant,
    downloaded: u64,
    peak_speed: u64,
}

impl Default for DownloadStatsTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl DownloadStatsTracker {
    /// Starts the clock.
    #[must_use]
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            downloaded: 0,
            peak_speed: 0,
        }
    }

    /// Adds a chunk and returns the running speed in bytes per second.
    pub fn record_bytes(&mut self, bytes: u64) -> u64 {
        self.downloaded = self.downloaded.saturating_add(bytes);
        let speed = bytes_per_sec(self.downloaded, self.started.elapsed());
        self.peak_speed = self.peak_speed.max(speed);
        speed
    }

    /// Bytes recorded so far.
    #[must_use]
    pub const fn downloaded(&self) -> u64 {
        self.downloaded
    }

    #[must_use]
    pub const fn peak_speed(&self) -> u64 {
        self.peak_speed
    }

    /// Stops the clock.
    #[must_use]
    pub fn into_file_stats(self) -> FileStats {
        let elapsed = self.started.elapsed();
        FileStats {
            size: self.downloaded,
            elapsed,
            average_speed: bytes_per_sec(self.downloaded, elapsed),
            peak_speed: self.peak_speed,
        }
    }
}

/// Accumulates per-item outcomes into [`SessionStats`].
#[derive(Debug)]
pub struct SessionStatsBuilder {
    started: Instant,
    stats: SessionStats,
}

impl Default for SessionStatsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStatsBuilder {
    /// Starts the batch clock.
    #[must_use]
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            stats: SessionStats::default(),
        }
    }

    /// Records a completed download.
    pub fn add_download(&mut self, file: &FileStats) {
        self.stats.files_downloaded += 1;
        self.stats.total_bytes += file.size;
        self.stats.peak_speed = self.stats.peak_speed.max(file.peak_speed);
    }

    pub const fn add_skipped(&mut self) {
        self.stats.files_skipped += 1;
    }

    pub const fn add_failed(&mut self) {
        self.stats.files_failed += 1;
    }

    /// Stops the batch clock.
    #[must_use]
    pub fn build(self) -> SessionStats {
        SessionStats {
            elapsed: self.started.elapsed(),
            ..self.stats
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(size: u64, peak_speed: u64) -> FileStats {
        FileStats {
            size,
            elapsed: Duration::from_secs(1),
            average_speed: size,
            peak_speed,
        }
    }

    #[test]
    fn speed_is_zero_without_elapsed_time() {
        assert_eq!(bytes_per_sec(1000, Duration::ZERO), 0);
        let stats = SessionStats {
            total_bytes: 1000,
            ..SessionStats::default()
        };
        assert_eq!(stats.average_speed(), 0);
    }

    #[test]
    fn session_average_speed() {
        let stats = SessionStats {
            total_bytes: 3000,
            elapsed: Duration::from_millis(1500),
            ..SessionStats::default()
        };
        assert_eq!(stats.average_speed(), 2000);
    }

    #[test]
    fn tracker_counts_every_chunk() {
        let mut tracker = DownloadStatsTracker::new();
        tracker.record_bytes(100);
        std::thread::sleep(Duration::from_millis(2));
        tracker.record_bytes(400);
        assert_eq!(tracker.downloaded(), 500);
        assert!(tracker.peak_speed() > 0);

        let stats = tracker.into_file_stats();
        assert_eq!(stats.size, 500);
        assert!(stats.elapsed >= Duration::from_millis(2));
    }

    #[test]
    fn builder_tallies_each_outcome() {
        let mut builder = SessionStatsBuilder::new();
        builder.add_skipped();
        builder.add_failed();
        builder.add_download(&file(500, 600));
        builder.add_download(&file(250, 300));

        let stats = builder.build();
        assert_eq!(stats.files_downloaded, 2);
        assert_eq!(stats.files_skipped, 1);
        assert_eq!(stats.files_failed, 1);
        assert_eq!(stats.total_bytes, 750);
        assert_eq!(stats.peak_speed, 600);
    }

    #[test]
    fn empty_batch_is_all_zero() {
        let stats = SessionStatsBuilder::default().build();
        assert_eq!(
            stats,
            SessionStats {
                elapsed: stats.elapsed,
                ..SessionStats::default()
            }
        );
    }
}
