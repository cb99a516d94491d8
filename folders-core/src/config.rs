//! src/config.rs
//! ============================================================================
//! # Config: Folder View Configuration Loader and Saver
//!
//! Manages the user-editable settings for one watched folder view. Loads and
//! saves settings as TOML from the proper cross-platform config path using
//! the [`directories`](https://docs.rs/directories) crate.
//!
//! ## Features
//! - XDG-compliant config discovery and writing (Linux, macOS, Windows)
//! - Robust defaulting if no config file exists
//! - Async load/save for smooth integration with Tokio
//!
//! The active sort mode is process-lifetime state: `Synchronizer::sort_icons`
//! deliberately never writes the newly selected mode back to this file.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use tokio::fs as TokioFs;

use crate::fs::icon_record::SortMode;

/// Target pixel size for every icon-theme lookup.
pub const ICON_PIXEL_SIZE: u32 = 48;

/// Configuration for one watched folder view. A snapshot of this struct is
/// captured into every scan task, so mid-scan edits never bleed into a
/// listing already in flight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoldersConfig {
    /// The directory whose entries are mirrored as icons.
    pub directory: PathBuf,

    /// Include entries whose name starts with the hidden-file marker (`.`).
    pub show_hidden: bool,

    /// Pin directories (and mounted volumes) ahead of plain files.
    pub folders_first: bool,

    /// Active sort mode for the icon list.
    pub sort_by: SortMode,

    /// Delay before the very first scan starts. Lets slow filesystem
    /// backends (network mounts, automounters) finish their own
    /// initialization; a policy delay, not a correctness requirement.
    #[serde(with = "humantime_serde")]
    pub launch_delay: Duration,

    /// Upper bound on entries taken from one directory listing.
    pub max_entries: usize,
}

impl Default for FoldersConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            show_hidden: false,
            folders_first: true,
            sort_by: SortMode::Name,
            launch_delay: Duration::from_millis(250),
            max_entries: 10_000,
        }
    }
}

impl FoldersConfig {
    /// Loads config from TOML file at the XDG-compliant app config dir, or
    /// returns defaults (writing them out for discoverability).
    pub async fn load() -> anyhow::Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            info!("Loading config from {}", path.display());
            let text = TokioFs::read_to_string(&path).await?;
            let cfg: Self = toml::from_str(&text)?;

            Ok(cfg)
        } else {
            info!(
                "No config file found at {}, using default configuration. Creating it now.",
                path.display()
            );

            let default_config = Self::default();
            default_config.save().await?;

            Ok(default_config)
        }
    }

    /// Saves config to TOML file at the XDG-compliant app config dir.
    pub async fn save(&self) -> anyhow::Result<()> {
        let path = Self::config_path()?;

        info!("Saving config to {}", path.display());

        if let Some(parent) = path.parent() {
            TokioFs::create_dir_all(parent).await?;
        }

        let toml_str = toml::to_string_pretty(self)?;
        TokioFs::write(&path, toml_str).await?;

        Ok(())
    }

    /// Returns the canonical config file path using `directories::ProjectDirs`.
    pub fn config_path() -> anyhow::Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("org", "example", "Folders")
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory."))?;
        Ok(proj_dirs.config_dir().join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_sane() {
        let cfg = FoldersConfig::default();
        assert!(!cfg.show_hidden);
        assert!(cfg.folders_first);
        assert_eq!(cfg.sort_by, SortMode::Name);
        assert!(cfg.launch_delay > Duration::ZERO);
        assert!(cfg.max_entries >= 1_000);
    }

    #[test]
    fn test_round_trips_through_toml() {
        let cfg = FoldersConfig {
            directory: PathBuf::from("/tmp/watched"),
            show_hidden: true,
            folders_first: false,
            sort_by: SortMode::Size,
            launch_delay: Duration::from_secs(2),
            max_entries: 500,
        };

        let text = toml::to_string_pretty(&cfg).unwrap();
        let back: FoldersConfig = toml::from_str(&text).unwrap();

        assert_eq!(back.directory, cfg.directory);
        assert_eq!(back.sort_by, SortMode::Size);
        assert_eq!(back.launch_delay, Duration::from_secs(2));
        assert_eq!(back.max_entries, 500);
    }
}
