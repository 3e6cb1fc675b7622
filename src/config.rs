//! TOML configuration.
//!
//! ```toml
//! [paths]
//! records = "src/_data/zenodo.json"
//! index_output = "dist/assets/search-index.json"
//!
//! [zenodo]
//! community = "clir"
//! page_size = 25
//!
//! [site]
//! path_prefix = "/"
//! # base_url = "https://reports.example.org"
//!
//! [citation]
//! publisher = "Council on Library and Information Resources"
//! ```
//!
//! `ZENODO_COMMUNITY`, `ZENODO_PAGE_SIZE` and `ZENODO_TOKEN` override the
//! file after parsing. The token is only ever read from the environment.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const DEFAULT_CONFIG_PATH: &str = "./config/pubcat.toml";

/// Largest page size Zenodo serves to unauthenticated clients.
pub const ANONYMOUS_PAGE_SIZE_LIMIT: usize = 25;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub zenodo: ZenodoConfig,
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub citation: CitationConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PathsConfig {
    #[serde(default = "default_records_path")]
    pub records: PathBuf,
    #[serde(default = "default_index_output")]
    pub index_output: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            records: default_records_path(),
            index_output: default_index_output(),
        }
    }
}

fn default_records_path() -> PathBuf {
    PathBuf::from("src/_data/zenodo.json")
}
fn default_index_output() -> PathBuf {
    PathBuf::from("dist/assets/search-index.json")
}

#[derive(Debug, Deserialize, Clone)]
pub struct ZenodoConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_community")]
    pub community: String,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(skip)]
    pub token: Option<String>,
}

impl Default for ZenodoConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            community: default_community(),
            page_size: default_page_size(),
            timeout_secs: default_timeout_secs(),
            token: None,
        }
    }
}

fn default_base_url() -> String {
    "https://zenodo.org/api/records".to_string()
}
fn default_community() -> String {
    "clir".to_string()
}
fn default_page_size() -> usize {
    ANONYMOUS_PAGE_SIZE_LIMIT
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct SiteConfig {
    #[serde(default = "default_path_prefix")]
    pub path_prefix: String,
    /// Origin of the deployed site, used when searching over HTTP.
    #[serde(default)]
    pub base_url: Option<String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            path_prefix: default_path_prefix(),
            base_url: None,
        }
    }
}

fn default_path_prefix() -> String {
    "/".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct CitationConfig {
    #[serde(default = "default_publisher")]
    pub publisher: String,
}

impl Default for CitationConfig {
    fn default() -> Self {
        Self {
            publisher: default_publisher(),
        }
    }
}

fn default_publisher() -> String {
    pubcat_core::citation::DEFAULT_PUBLISHER.to_string()
}

impl Config {
    /// Apply environment overrides. `lookup` is `std::env::var` in
    /// production and a map in tests.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(community) = lookup("ZENODO_COMMUNITY").filter(|c| !c.trim().is_empty()) {
            self.zenodo.community = community.trim().to_string();
        }
        if let Some(raw) = lookup("ZENODO_PAGE_SIZE") {
            self.zenodo.page_size = match parse_page_size(&raw) {
                Some(size) => size,
                None => {
                    warn!(value = %raw, "ignoring invalid ZENODO_PAGE_SIZE");
                    default_page_size()
                }
            };
        }
        self.zenodo.token = lookup("ZENODO_TOKEN").filter(|t| !t.is_empty());
    }

    pub fn validate(&self) -> Result<()> {
        if self.zenodo.page_size == 0 {
            anyhow::bail!("zenodo.page_size must be > 0");
        }
        if self.zenodo.token.is_none() && self.zenodo.page_size > ANONYMOUS_PAGE_SIZE_LIMIT {
            anyhow::bail!(
                "zenodo.page_size {} exceeds {} for unauthenticated requests. Set ZENODO_TOKEN for larger page sizes.",
                self.zenodo.page_size,
                ANONYMOUS_PAGE_SIZE_LIMIT
            );
        }
        if self.zenodo.timeout_secs == 0 {
            anyhow::bail!("zenodo.timeout_secs must be > 0");
        }
        if self.zenodo.base_url.trim().is_empty() {
            anyhow::bail!("zenodo.base_url must not be empty");
        }
        Ok(())
    }
}

/// Positive numeric page size, fractional values floored.
fn parse_page_size(raw: &str) -> Option<usize> {
    let n: f64 = raw.trim().parse().ok()?;
    if n.is_finite() && n >= 1.0 {
        Some(n.floor() as usize)
    } else {
        None
    }
}

/// Load configuration from `path`, or from [`DEFAULT_CONFIG_PATH`] when
/// `None`. A missing default file yields built-in defaults; a missing
/// explicit file is an error.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let mut config = match path {
        Some(p) => parse_file(p)?,
        None => {
            let default = Path::new(DEFAULT_CONFIG_PATH);
            if default.exists() {
                parse_file(default)?
            } else {
                debug!("no config at {}, using defaults", DEFAULT_CONFIG_PATH);
                Config::default()
            }
        }
    };

    config.apply_env(|key| std::env::var(key).ok());
    config.validate()?;
    Ok(config)
}

fn parse_file(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}
