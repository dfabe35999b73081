//! CLI configuration management.
//!
//! Configuration is stored as TOML:
//! - Linux: `~/.config/docbatch/config.toml`
//! - Windows: `%APPDATA%/docbatch/config.toml`

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Persisted settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Repository server base URL.
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// Authentication token for the server.
    #[serde(default)]
    pub token: String,

    /// Repository path prefix for browsing and destination folders.
    #[serde(default = "default_path_filter")]
    pub path_filter: String,

    /// Skip files whose name already exists in the destination folder.
    #[serde(default = "default_skip_reupload")]
    pub skip_reupload: bool,

    /// Default maximum concurrent transfers.
    #[serde(default = "default_concurrent")]
    pub concurrent: usize,
}

fn default_server_url() -> String {
    "http://localhost:8080/repo".into()
}

fn default_path_filter() -> String {
    "/asset-library/".into()
}

fn default_skip_reupload() -> bool {
    true
}

fn default_concurrent() -> usize {
    2
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            token: String::new(),
            path_filter: default_path_filter(),
            skip_reupload: default_skip_reupload(),
            concurrent: default_concurrent(),
        }
    }
}

impl Config {
    /// Loads configuration from disk, or creates a default if not found.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&config_path()?)
    }

    /// Saves the current configuration to disk.
    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&config_path()?)
    }

    fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        // Restrict permissions on Unix (contains the auth token).
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }

        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }
}

/// Returns the platform-specific configuration file path.
fn config_path() -> anyhow::Result<PathBuf> {
    #[cfg(target_os = "linux")]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        Ok(PathBuf::from(home)
            .join(".config")
            .join("docbatch")
            .join("config.toml"))
    }

    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        Ok(PathBuf::from(appdata).join("docbatch").join("config.toml"))
    }

    #[cfg(not(any(target_os = "linux", target_os = "windows")))]
    {
        Ok(PathBuf::from("/tmp/docbatch/config.toml"))
    }
}
