//! Error types for the multitrack-dl library.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while building a catalog or downloading archives.
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP transport failure or error status.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON API response could not be decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A header value (User-Agent or Cookie) contains forbidden characters.
    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    /// A URL could not be parsed or resolved.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// The configuration file is malformed.
    #[error("Invalid configuration in {path}: {message}")]
    Config {
        /// Path of the offending file.
        path: PathBuf,
        /// Parser message.
        message: String,
    },

    /// The cookie file could not be read.
    #[error("Failed to read cookie file {path}: {source}")]
    CookieFile {
        /// Path of the cookie file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The site answered with a bot-protection interstitial instead of content.
    #[error(
        "Site returned a human-verification page for {url}. Open it in a browser, \
         complete the verification, copy the Cookie header, and pass it via --cookie."
    )]
    VerificationChallenge {
        /// Page that returned the challenge.
        url: String,
    },

    /// A detail page had no recognisable download anchor.
    #[error("No download link found on detail page: {url}")]
    MissingDownloadLink {
        /// Detail page URL.
        url: String,
    },

    /// A catalog file name cannot be used as a local file name.
    #[error("Unusable file name: {0:?}")]
    InvalidFileName(String),
}

/// A specialized `Result` type for multitrack-dl operations.
pub type Result<T> = std::result::Result<T, Error>;
