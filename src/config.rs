//! Configuration types for catalog fetching and download operations.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default pause between consecutive downloads.
pub const DEFAULT_DELAY_SECS: f64 = 1.0;

/// Default write buffer size for streamed downloads (1 MiB).
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;

/// Configuration for download operations.
#[derive(Debug, Clone)]
pub struct DownloadConfig {
    /// Pause inserted between consecutive network downloads.
    pub delay: Duration,
    /// Whether to overwrite existing files.
    pub force_overwrite: bool,
    /// Size of the write buffer the response body is flushed through.
    pub chunk_size: usize,
    /// Whether to clean up `.part` files on download error.
    pub cleanup_on_error: bool,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            delay: delay_from_secs(DEFAULT_DELAY_SECS),
            force_overwrite: false,
            chunk_size: DEFAULT_CHUNK_SIZE,
            cleanup_on_error: true,
        }
    }
}

impl DownloadConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the pause between downloads.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Sets whether to force overwrite existing files.
    #[must_use]
    pub const fn with_force_overwrite(mut self, force: bool) -> Self {
        self.force_overwrite = force;
        self
    }

    /// Sets the write buffer size. Zero is bumped to one byte.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Sets whether to clean up `.part` files on download error.
    #[must_use]
    pub const fn with_cleanup_on_error(mut self, cleanup: bool) -> Self {
        self.cleanup_on_error = cleanup;
        self
    }
}

/// Converts a user-supplied delay in seconds to a [`Duration`].
///
/// Zero, negative and non-finite values disable the pause.
#[must_use]
pub fn delay_from_secs(secs: f64) -> Duration {
    if secs.is_finite() && secs > 0.0 {
        Duration::from_secs_f64(secs)
    } else {
        Duration::ZERO
    }
}

/// Timeouts and pooling for the shared HTTP client.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Total time allowed for catalog pages and API calls.
    pub metadata_timeout: Duration,
    /// Maximum silence between body reads while streaming an archive.
    pub read_timeout: Duration,
    /// Time allowed to establish a connection.
    pub connect_timeout: Duration,
    /// How long idle pooled connections are kept.
    pub pool_idle_timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            metadata_timeout: Duration::from_secs(30),
            read_timeout: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(30),
            pool_idle_timeout: Duration::from_secs(60),
        }
    }
}

/// Per-vendor overrides read from the configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VendorConfig {
    /// Listing page to crawl instead of the built-in one.
    pub index_url: Option<String>,
    /// Directory archives are stored in.
    pub target_dir: Option<PathBuf>,
}

/// Application defaults loaded from `config.toml`.
///
/// Every field is optional; command-line flags take precedence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// User-Agent sent with every request.
    pub user_agent: Option<String>,
    /// Pause between downloads in seconds.
    pub delay_secs: Option<f64>,
    /// Cambridge MT settings.
    pub cambridge: VendorConfig,
    /// TELEFUNKEN settings.
    pub telefunken: VendorConfig,
}

impl AppConfig {
    /// Location of the user configuration file, if a config directory exists.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("multitrack-dl").join("config.toml"))
    }

    /// Loads the user configuration file, falling back to defaults when absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Loads configuration from `path`. A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No config file at {}", path.display());
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };
        toml::from_str(&content).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_download_config() {
        let config = DownloadConfig::default();
        assert_eq!(config.delay, Duration::from_secs(1));
        assert_eq!(config.chunk_size, 1024 * 1024);
        assert!(!config.force_overwrite);
        assert!(config.cleanup_on_error);
    }

    #[test]
    fn download_config_builder_pattern() {
        let config = DownloadConfig::new()
            .with_delay(Duration::from_millis(250))
            .with_force_overwrite(true)
            .with_chunk_size(0)
            .with_cleanup_on_error(false);

        assert_eq!(config.delay, Duration::from_millis(250));
        assert!(config.force_overwrite);
        assert_eq!(config.chunk_size, 1);
        assert!(!config.cleanup_on_error);
    }

    #[test]
    fn non_positive_delay_disables_pause() {
        assert_eq!(delay_from_secs(0.0), Duration::ZERO);
        assert_eq!(delay_from_secs(-2.5), Duration::ZERO);
        assert_eq!(delay_from_secs(f64::NAN), Duration::ZERO);
        assert_eq!(delay_from_secs(2.0), Duration::from_secs(2));
    }

    #[test]
    fn http_timeouts_give_streams_more_room() {
        let config = HttpConfig::default();
        assert!(config.read_timeout > config.metadata_timeout);
    }

    #[test]
    fn missing_config_file_is_default() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn config_file_parses_vendor_tables() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
user_agent = "Mozilla/5.0 Test"
delay_secs = 2.5

[telefunken]
target_dir = "/srv/multitracks/telefunken"
"#,
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.user_agent.as_deref(), Some("Mozilla/5.0 Test"));
        assert_eq!(config.delay_secs, Some(2.5));
        assert_eq!(
            config.telefunken.target_dir,
            Some(PathBuf::from("/srv/multitracks/telefunken"))
        );
        assert_eq!(config.cambridge, VendorConfig::default());
    }

    #[test]
    fn malformed_config_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "delay_secs = \"soon\"").unwrap();

        let err = AppConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }
}
