use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::constants::{
    DEFAULT_PAGE_SIZE, DEFAULT_REFRESH_INTERVAL_SECS, METADATA_CONCURRENCY, SEARCH_DEBOUNCE_MS,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Mail accounts, in display order. Index is the account identity.
    #[serde(default)]
    pub accounts: Vec<AccountConfig>,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    /// Desktop notification settings
    #[serde(default)]
    pub notifications: NotificationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    /// Short label shown next to each thread (e.g. "Work")
    pub name: String,
    pub email: String,
    /// Per-account notification override (None = use global setting)
    #[serde(default)]
    pub notifications: Option<bool>,
}

impl AccountConfig {
    /// Get the account name or fall back to email
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.email
        } else {
            &self.name
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Background refresh interval in seconds; 0 disables it
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Where attachments are saved; the system downloads folder when unset
    #[serde(default)]
    pub download_dir: Option<PathBuf>,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: default_refresh_interval_secs(),
            page_size: default_page_size(),
            download_dir: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Worker pool size for hydrating visible rows
    #[serde(default = "default_metadata_concurrency")]
    pub metadata_concurrency: usize,
    #[serde(default = "default_search_debounce_ms")]
    pub search_debounce_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            metadata_concurrency: default_metadata_concurrency(),
            search_debounce_ms: default_search_debounce_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Enable desktop notifications for new mail
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Show the newest subject in the notification
    #[serde(default = "default_true")]
    pub show_preview: bool,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            show_preview: true,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_refresh_interval_secs() -> u64 {
    DEFAULT_REFRESH_INTERVAL_SECS
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_metadata_concurrency() -> usize {
    METADATA_CONCURRENCY
}

fn default_search_debounce_ms() -> u64 {
    SEARCH_DEBOUNCE_MS
}

impl Config {
    pub fn config_dir() -> Result<PathBuf> {
        let dir = dirs::config_dir()
            .context("Could not find config directory")?
            .join("inbox");
        Ok(dir)
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Location of the stored access token for an account
    pub fn token_path(email: &str) -> Result<PathBuf> {
        Ok(Self::config_dir()?
            .join("tokens")
            .join(format!("{}.json", email)))
    }

    /// Check if notifications are enabled for an account
    pub fn notifications_enabled_for(&self, account: &AccountConfig) -> bool {
        // Per-account setting overrides global
        account.notifications.unwrap_or(self.notifications.enabled)
    }

    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            anyhow::bail!(
                "Configuration file not found at {}\n\
                 Please create a config file. Example:\n\n\
                 [[accounts]]\n\
                 name = \"Personal\"\n\
                 email = \"you@example.com\"\n\n\
                 [ui]\n\
                 refresh_interval_secs = 120",
                path.display()
            );
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let mut config: Config = toml::from_str(content)?;
        if config.sync.metadata_concurrency == 0 {
            tracing::warn!("metadata_concurrency = 0 is invalid, using 1");
            config.sync.metadata_concurrency = 1;
        }
        if config.ui.page_size == 0 {
            config.ui.page_size = DEFAULT_PAGE_SIZE;
        }
        Ok(config)
    }

    pub fn ensure_dirs(&self) -> Result<()> {
        fs::create_dir_all(Self::config_dir()?)?;
        Ok(())
    }
}
