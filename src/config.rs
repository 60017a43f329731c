use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;
use crate::store::ArtifactStore;

pub const DEFAULT_ARTIFACT_DIR: &str = "data/artists";
pub const DEFAULT_MASTER_PATH: &str = "data/master_data.csv";
pub const DEFAULT_BATCH_SIZE: u32 = 5;
pub const DEFAULT_PAUSE_MIN_SECS: f64 = 4.0;
pub const DEFAULT_PAUSE_MAX_SECS: f64 = 6.0;
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_REQUEST_INTERVAL_MS: u64 = 100;

/// Configuration defaults that can be saved to a file.
///
/// Every field is optional; [`Config::settings`] fills the gaps with defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_dir: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub master_path: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pause_min_secs: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pause_max_secs: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_interval_ms: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub market: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_popularity: Option<u32>,
}

/// Fully resolved settings used by the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub artifact_dir: PathBuf,
    pub master_path: PathBuf,
    pub batch_size: u32,
    pub pause_min: Duration,
    pub pause_max: Duration,
    pub max_retries: u32,
    pub request_interval: Duration,
    pub market: Option<String>,
    pub min_popularity: Option<u32>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// `~/.state/catalog-harvest/defaults.toml`
    pub fn get_config_path() -> Result<PathBuf, ConfigError> {
        let home = std::env::var_os("HOME").ok_or(ConfigError::NoHome)?;
        Ok(Path::new(&home)
            .join(".state")
            .join("catalog-harvest")
            .join("defaults.toml"))
    }

    /// Load from the default location; a missing file yields an empty config.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Config::new());
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let toml_string = toml::to_string_pretty(self)?;
        fs::write(path, toml_string).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Merge this config with another, preferring values from other.
    pub fn merge(&mut self, other: &Config) {
        if other.artifact_dir.is_some() {
            self.artifact_dir = other.artifact_dir.clone();
        }
        if other.master_path.is_some() {
            self.master_path = other.master_path.clone();
        }
        if other.batch_size.is_some() {
            self.batch_size = other.batch_size;
        }
        if other.pause_min_secs.is_some() {
            self.pause_min_secs = other.pause_min_secs;
        }
        if other.pause_max_secs.is_some() {
            self.pause_max_secs = other.pause_max_secs;
        }
        if other.max_retries.is_some() {
            self.max_retries = other.max_retries;
        }
        if other.request_interval_ms.is_some() {
            self.request_interval_ms = other.request_interval_ms;
        }
        if other.market.is_some() {
            self.market = other.market.clone();
        }
        if other.min_popularity.is_some() {
            self.min_popularity = other.min_popularity;
        }
    }

    /// Apply defaults and validate.
    pub fn settings(&self) -> Result<Settings, ConfigError> {
        let min = self.pause_min_secs.unwrap_or(DEFAULT_PAUSE_MIN_SECS).max(0.0);
        let max = self.pause_max_secs.unwrap_or(DEFAULT_PAUSE_MAX_SECS).max(0.0);
        if min > max {
            return Err(ConfigError::InvalidPauseRange { min, max });
        }

        let artifact_dir = self
            .artifact_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ARTIFACT_DIR));
        let master_path = self
            .master_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_MASTER_PATH));
        if ArtifactStore::new(&artifact_dir).holds(&master_path) {
            return Err(ConfigError::MasterInsideArtifactDir {
                master: master_path,
                dir: artifact_dir,
            });
        }

        Ok(Settings {
            artifact_dir,
            master_path,
            batch_size: self.batch_size.unwrap_or(DEFAULT_BATCH_SIZE),
            pause_min: Duration::from_secs_f64(min),
            pause_max: Duration::from_secs_f64(max),
            max_retries: self.max_retries.unwrap_or(DEFAULT_MAX_RETRIES).max(1),
            request_interval: Duration::from_millis(
                self.request_interval_ms.unwrap_or(DEFAULT_REQUEST_INTERVAL_MS),
            ),
            market: self.market.clone(),
            min_popularity: self.min_popularity,
        })
    }

    /// Print the config in a human-readable format
    pub fn print(&self, title: &str) {
        println!("{}:", title);

        if let Some(dir) = &self.artifact_dir {
            println!("  Artifact directory: {}", dir.display());
        }
        if let Some(path) = &self.master_path {
            println!("  Master dataset:     {}", path.display());
        }
        if let Some(batch_size) = self.batch_size {
            println!("  Batch size:         {} artists", batch_size);
        }
        if let Some(min) = self.pause_min_secs {
            println!("  Pause min:          {} seconds", min);
        }
        if let Some(max) = self.pause_max_secs {
            println!("  Pause max:          {} seconds", max);
        }
        if let Some(retries) = self.max_retries {
            println!("  Max attempts:       {}", retries);
        }
        if let Some(ms) = self.request_interval_ms {
            println!("  Request interval:   {} ms", ms);
        }
        if let Some(market) = &self.market {
            println!("  Market:             {}", market);
        }
        if let Some(floor) = self.min_popularity {
            println!("  Popularity floor:   {}", floor);
        }
    }
}

// ── Credentials ──────────────────────────────────────────────────────────────

const TOKEN_ENV: &str = "SPOTIFY_ACCESS_TOKEN";
const CREDENTIALS_FILE: &str = "catalog_credentials.toml";

/// Find an access token: `SPOTIFY_ACCESS_TOKEN`, then `catalog_credentials.toml`
/// in the working directory, `/etc/catalog-harvest/` and
/// `~/.config/catalog-harvest/`. The file holds `access_token = "..."`.
pub fn load_access_token() -> Option<String> {
    if let Ok(token) = std::env::var(TOKEN_ENV) {
        if !token.trim().is_empty() {
            return Some(token.trim().to_string());
        }
    }

    let mut paths = vec![
        PathBuf::from(CREDENTIALS_FILE),
        Path::new("/etc/catalog-harvest").join(CREDENTIALS_FILE),
    ];
    if let Some(home) = std::env::var_os("HOME") {
        paths.push(PathBuf::from(home).join(".config/catalog-harvest").join(CREDENTIALS_FILE));
    }

    paths.iter().find_map(|p| read_token_file(p))
}

fn read_token_file(path: &Path) -> Option<String> {
    let content = fs::read_to_string(path).ok()?;
    let table = content.parse::<toml::Table>().ok()?;
    let token = table.get("access_token")?.as_str()?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}
