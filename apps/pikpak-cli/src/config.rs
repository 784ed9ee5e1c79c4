//! Uploader configuration management.
//!
//! Configuration is stored as TOML:
//! - Linux: `~/.config/pikpak/config.toml`
//! - Windows: `%APPDATA%/pikpak/config.toml`
//!
//! `PIKPAK_CONFIG` overrides the location.

use std::path::{Path, PathBuf};
use std::time::Duration;

use pikpak_signer::SaltTable;
use pikpak_upload::UploadConfig;
use serde::{Deserialize, Serialize};

/// Uploader configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// OAuth access token of the logged-in user.
    #[serde(default)]
    pub access_token: String,

    /// User id (`sub`) of the logged-in user.
    #[serde(default)]
    pub user_id: String,

    /// Stable device id; generated on first load.
    #[serde(default)]
    pub device_id: String,

    /// Last captcha token issued to this device.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub captcha_token: Option<String>,

    /// Concurrent part uploads.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Smallest chunk size in bytes.
    #[serde(default = "default_chunk_floor")]
    pub chunk_floor: u64,

    /// Attempts per part before giving up.
    #[serde(default = "default_part_attempts")]
    pub part_attempts: u32,

    /// HTTP request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// JSON salt table replacing the built-in one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salt_table_path: Option<PathBuf>,
}

fn default_workers() -> usize {
    16
}

fn default_chunk_floor() -> u64 {
    1 << 18
}

fn default_part_attempts() -> u32 {
    3
}

fn default_timeout_secs() -> u64 {
    300
}

impl Default for Config {
    fn default() -> Self {
        Self {
            access_token: String::new(),
            user_id: String::new(),
            device_id: String::new(),
            captcha_token: None,
            workers: default_workers(),
            chunk_floor: default_chunk_floor(),
            part_attempts: default_part_attempts(),
            timeout_secs: default_timeout_secs(),
            salt_table_path: None,
        }
    }
}

impl Config {
    /// Loads configuration from `path`, creating it when missing.
    ///
    /// A device id is generated and persisted when none is set.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let exists = path.exists();
        let mut config = if exists {
            let content = std::fs::read_to_string(path)?;
            toml::from_str::<Config>(&content)?
        } else {
            Config::default()
        };

        let generated = config.device_id.is_empty();
        if generated {
            config.device_id = new_device_id();
            tracing::info!(device_id = %config.device_id, "generated device id");
        }
        if !exists || generated {
            config.save(path)?;
        }

        Ok(config)
    }

    /// Saves the configuration to `path`.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        // Restrict permissions on Unix.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }

        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }

    /// Upload tuning derived from this configuration.
    pub fn upload_config(&self) -> UploadConfig {
        UploadConfig {
            workers: self.workers.max(1),
            chunk_floor: self.chunk_floor,
            part_attempts: self.part_attempts.max(1),
            ..UploadConfig::default()
        }
    }

    /// Salt table for captcha signing, read from `salt_table_path` when set.
    pub fn salt_table(&self) -> anyhow::Result<SaltTable> {
        match &self.salt_table_path {
            Some(path) => {
                let json = std::fs::read_to_string(path)?;
                Ok(SaltTable::from_json(&json)?)
            }
            None => Ok(SaltTable::builtin()),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn new_device_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Returns the configuration file path.
pub fn config_path() -> anyhow::Result<PathBuf> {
    if let Some(path) = std::env::var_os("PIKPAK_CONFIG") {
        return Ok(PathBuf::from(path));
    }

    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        Ok(PathBuf::from(appdata).join("pikpak").join("config.toml"))
    }

    #[cfg(not(target_os = "windows"))]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        Ok(PathBuf::from(home)
            .join(".config")
            .join("pikpak")
            .join("config.toml"))
    }
}
