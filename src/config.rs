use std::path::{Path, PathBuf};
use std::time::Duration;

use color_eyre::eyre::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::spotify_rs::client::SPOTIFY_API_BASE_URL;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Name of the playlist whose tracks are copied, matched exactly.
    pub source_playlist_name: String,
    /// Playlist that collects the tracks. Can also come from `SPOTIFY_AGGREGATION_LIST_ID`.
    pub destination_playlist_id: Option<String>,
    /// How often to sync, e.g. "10m" or "1h 30m".
    pub sync_interval: String,
    /// Timeout for each Spotify API request.
    pub request_timeout: String,
    pub api_base_url: String,
    pub redirect_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_playlist_name: "Discover Weekly".to_string(),
            destination_playlist_id: None,
            sync_interval: "10m".to_string(),
            request_timeout: "10s".to_string(),
            api_base_url: SPOTIFY_API_BASE_URL.to_string(),
            redirect_url: "http://localhost:8080/callback".to_string(),
        }
    }
}

impl Config {
    /// Load config from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .wrap_err(format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .wrap_err(format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Get the default config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|path| path.join("playlist-aggregator").join("config.toml"))
    }

    /// Load the config from the default path, or the defaults when there is no file there
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => {
                tracing::debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Create a default config file at the default path, if it doesn't exist
    pub fn create_default() -> Result<PathBuf> {
        let path = Self::config_path()
            .ok_or_else(|| color_eyre::eyre::eyre!("No config directory on this platform"))?;
        Self::create_default_at(&path)?;
        Ok(path)
    }

    pub fn create_default_at(path: &Path) -> Result<()> {
        if path.exists() {
            tracing::info!("Config file already exists at {}", path.display());
            return Ok(());
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .wrap_err(format!("Failed to create directory: {}", parent.display()))?;
        }
        let contents =
            toml::to_string_pretty(&Self::default()).wrap_err("Failed to serialize config")?;
        std::fs::write(path, contents)
            .wrap_err(format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    pub fn sync_interval(&self) -> Result<Duration> {
        let interval = humantime::parse_duration(&self.sync_interval)
            .wrap_err(format!("Invalid sync_interval: {:?}", self.sync_interval))?;
        if interval.is_zero() {
            bail!("sync_interval must be greater than zero");
        }
        Ok(interval)
    }

    pub fn request_timeout(&self) -> Result<Duration> {
        humantime::parse_duration(&self.request_timeout)
            .wrap_err(format!("Invalid request_timeout: {:?}", self.request_timeout))
    }

    pub fn api_base_url(&self) -> Result<Url> {
        Url::parse(&self.api_base_url)
            .wrap_err(format!("Invalid api_base_url: {}", self.api_base_url))
    }
}
