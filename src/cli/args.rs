//! Command-line arguments and the settings they resolve to.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use url::Url;

use crate::catalog::{Cambridge, CatalogSource, Telefunken, cambridge, telefunken};
use crate::config::{AppConfig, DEFAULT_DELAY_SECS, VendorConfig, delay_from_secs};
use crate::credentials::CredentialSources;
use crate::fs::expand_home;
use crate::http::DEFAULT_USER_AGENT;

/// Mirror vendor multitrack catalogues into local folders.
#[derive(Debug, Parser)]
#[command(name = "mtdl", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: VendorCommand,
}

/// One subcommand per vendor.
#[derive(Debug, Subcommand)]
pub enum VendorCommand {
    /// Download missing "Full Multitrack" archives from Cambridge MT.
    Cambridge {
        #[command(flatten)]
        common: CommonArgs,
        /// Save the fetched index HTML to this file for troubleshooting.
        #[arg(long, value_name = "PATH")]
        dump_index: Option<PathBuf>,
    },
    /// Download missing TELEFUNKEN multitrack sessions.
    Telefunken {
        #[command(flatten)]
        common: CommonArgs,
    },
}

/// Options shared by every vendor.
#[derive(Debug, Clone, Default, Args)]
pub struct CommonArgs {
    /// Catalogue page to crawl.
    #[arg(long, value_name = "URL")]
    pub index_url: Option<String>,
    /// Directory archives are stored in.
    #[arg(long, value_name = "DIR")]
    pub target_dir: Option<PathBuf>,
    /// Seconds to wait between downloads (0 disables the pause).
    #[arg(long, value_name = "SECONDS", allow_negative_numbers = true)]
    pub delay: Option<f64>,
    /// Cookie header copied from a browser session.
    #[arg(long)]
    pub cookie: Option<String>,
    /// File containing the Cookie header; overrides --cookie.
    #[arg(long, value_name = "PATH")]
    pub cookie_file: Option<PathBuf>,
    /// User-Agent to send; should match the browser the cookie came from.
    #[arg(long)]
    pub user_agent: Option<String>,
    /// List the missing archives without downloading them.
    #[arg(long)]
    pub dry_run: bool,
    /// Download every archive, replacing existing files.
    #[arg(long)]
    pub overwrite: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vendor {
    Cambridge,
    Telefunken,
}

impl Vendor {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Cambridge => cambridge::NAME,
            Self::Telefunken => telefunken::NAME,
        }
    }

    const fn default_index_url(self) -> &'static str {
        match self {
            Self::Cambridge => cambridge::DEFAULT_INDEX_URL,
            Self::Telefunken => telefunken::DEFAULT_INDEX_URL,
        }
    }

    const fn default_target_dir(self) -> &'static str {
        match self {
            Self::Cambridge => cambridge::DEFAULT_TARGET_DIR,
            Self::Telefunken => telefunken::DEFAULT_TARGET_DIR,
        }
    }

    const fn section(self, config: &AppConfig) -> &VendorConfig {
        match self {
            Self::Cambridge => &config.cambridge,
            Self::Telefunken => &config.telefunken,
        }
    }

    /// Shown when the catalogue yields nothing.
    pub const fn nothing_found(self) -> &'static str {
        match self {
            Self::Cambridge => {
                "No \"Full Multitrack\" links found. The page structure may have changed."
            }
            Self::Telefunken => "Unable to locate any \"Download Audio Files\" buttons.",
        }
    }

    /// Shown when the listing names no pages to visit.
    pub const fn nothing_listed(self) -> &'static str {
        match self {
            Self::Cambridge => self.nothing_found(),
            Self::Telefunken => "No session links found on the TELEFUNKEN catalogue page.",
        }
    }

    pub const fn work_list_title(self) -> &'static str {
        match self {
            Self::Cambridge => "Missing Full Multitrack Downloads",
            Self::Telefunken => "Missing TELEFUNKEN Downloads",
        }
    }

    pub fn source(self, index_url: Url) -> Box<dyn CatalogSource> {
        match self {
            Self::Cambridge => Box::new(Cambridge::new(index_url)),
            Self::Telefunken => Box::new(Telefunken::new(index_url)),
        }
    }
}

/// Fully resolved run settings: flags, then config file, then built-ins.
#[derive(Debug, Clone)]
pub struct Settings {
    pub vendor: Vendor,
    pub index_url: Url,
    pub target_dir: PathBuf,
    pub delay: Duration,
    pub dry_run: bool,
    pub overwrite: bool,
    pub dump_index: Option<PathBuf>,
    pub credentials: CredentialSources,
}

impl Settings {
    /// Merges the parsed command with the configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the index URL cannot be parsed.
    pub fn resolve(command: VendorCommand, config: &AppConfig) -> crate::Result<Self> {
        let (vendor, common, dump_index) = match command {
            VendorCommand::Cambridge { common, dump_index } => {
                (Vendor::Cambridge, common, dump_index)
            }
            VendorCommand::Telefunken { common } => (Vendor::Telefunken, common, None),
        };
        let section = vendor.section(config);

        let index_url = common
            .index_url
            .as_deref()
            .or(section.index_url.as_deref())
            .unwrap_or_else(|| vendor.default_index_url());
        let target_dir = common
            .target_dir
            .or_else(|| section.target_dir.clone())
            .unwrap_or_else(|| PathBuf::from(vendor.default_target_dir()));
        let delay = common
            .delay
            .or(config.delay_secs)
            .unwrap_or(DEFAULT_DELAY_SECS);

        Ok(Self {
            vendor,
            index_url: Url::parse(index_url)?,
            target_dir: expand_home(&target_dir),
            delay: delay_from_secs(delay),
            dry_run: common.dry_run,
            overwrite: common.overwrite,
            dump_index: dump_index.as_deref().map(expand_home),
            credentials: CredentialSources {
                cookie: common.cookie,
                cookie_file: common.cookie_file.as_deref().map(expand_home),
                user_agent: common.user_agent.or_else(|| config.user_agent.clone()),
                default_user_agent: DEFAULT_USER_AGENT.to_string(),
            },
        })
    }
}
