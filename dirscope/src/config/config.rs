//! src/config/config.rs
//! ============================================================================
//! # Config: Application Configuration Loader and Saver
//!
//! Manages user-editable settings for the size explorer. Loads and saves
//! settings as TOML from the proper cross-platform config path using the
//! [`directories`](https://docs.rs/directories) crate.
//!
//! The start path is resolved here, once, and passed down explicitly; no
//! component reads the process environment on its own.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Which measurement implementation to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MeasureBackend {
    /// Native traversal with `walkdir`, block-allocation sizes.
    #[default]
    Native,
    /// Shell out to `du -sk` / `find`.
    Shell,
}

/// Main configuration struct for the application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Start directory; defaults to the process working directory when unset.
    pub start_path: Option<PathBuf>,
    /// How many sized children a scan keeps per directory.
    pub top_n: usize,
    /// Worker-pool width for concurrent size measurements.
    pub concurrency: usize,
    /// Minimum interval between scan progress updates.
    #[serde(with = "humantime_serde")]
    pub progress_interval: Duration,
    pub backend: MeasureBackend,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            start_path: None,
            top_n: 30,
            concurrency: 6,
            progress_interval: Duration::from_millis(150),
            backend: MeasureBackend::Native,
        }
    }
}

impl Config {
    /// Loads config from TOML at the XDG-compliant app config dir, or returns defaults.
    pub async fn load() -> anyhow::Result<Self> {
        let path: PathBuf = Self::config_path()?;
        if path.exists() {
            let text: String = tokio::fs::read_to_string(&path).await?;
            let cfg: Config = toml::from_str(&text)?;
            Ok(cfg)
        } else {
            Ok(Config::default())
        }
    }

    /// Saves config to TOML at the XDG-compliant app config dir.
    pub async fn save(&self) -> anyhow::Result<()> {
        let path: PathBuf = Self::config_path()?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let toml_str: String = toml::to_string_pretty(self)?;
        tokio::fs::write(&path, toml_str).await?;
        Ok(())
    }

    /// Returns the config file path using `directories::ProjectDirs`.
    pub fn config_path() -> anyhow::Result<PathBuf> {
        let proj_dirs: ProjectDirs = Self::project_dirs()?;
        Ok(proj_dirs.config_dir().join("config.toml"))
    }

    /// Cache directory for the persisted scan store.
    pub fn cache_dir() -> anyhow::Result<PathBuf> {
        let proj_dirs: ProjectDirs = Self::project_dirs()?;
        Ok(proj_dirs.cache_dir().to_path_buf())
    }

    /// Data directory (log files live under here).
    pub fn data_dir() -> anyhow::Result<PathBuf> {
        let proj_dirs: ProjectDirs = Self::project_dirs()?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    fn project_dirs() -> anyhow::Result<ProjectDirs> {
        ProjectDirs::from("org", "dirscope", "dirscope")
            .ok_or_else(|| anyhow::anyhow!("Could not determine project directories."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_scan_contract() {
        let cfg: Config = Config::default();
        assert_eq!(cfg.top_n, 30);
        assert_eq!(cfg.concurrency, 6);
        assert_eq!(cfg.progress_interval, Duration::from_millis(150));
        assert_eq!(cfg.backend, MeasureBackend::Native);
    }

    #[test]
    fn roundtrips_through_toml() {
        let cfg: Config = Config {
            start_path: Some(PathBuf::from("/srv/data")),
            top_n: 10,
            concurrency: 2,
            progress_interval: Duration::from_millis(300),
            backend: MeasureBackend::Shell,
        };
        let text: String = toml::to_string_pretty(&cfg).expect("serialize");
        let back: Config = toml::from_str(&text).expect("parse");
        assert_eq!(back.top_n, 10);
        assert_eq!(back.backend, MeasureBackend::Shell);
        assert_eq!(back.progress_interval, Duration::from_millis(300));
        assert_eq!(back.start_path.as_deref(), Some(std::path::Path::new("/srv/data")));
    }
}
