use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::engine::WriteOptions;
use crate::key::Family;

/// Settings for the `image-meta-cli` front end.
///
/// Controls which families are shown and how, and how files are written
/// (dry run, backups, timestamps).
///
/// # Loading
///
/// ```rust,no_run
/// use image_meta::config::Config;
///
/// // From a JSON file
/// let config = Config::load(Some("config.json".as_ref())).unwrap();
///
/// // Or use defaults and customize
/// let mut config = Config::default();
/// config.display.families = vec!["iptc".into(), "xmp".into()];
/// config.output.backup_originals = false;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// How tags are listed.
    pub display: DisplayConfig,
    /// Write behavior (dry run, backups, timestamps).
    pub output: OutputConfig,
}

/// Tag listing options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Families to list, in order (`exif`, `iptc`, `xmp`).
    pub families: Vec<String>,
    /// Show rendered values (`F2.8`) instead of raw ones (`28/10`).
    pub human_readable: bool,
    /// Max width of the value column before wrapping.
    pub wrap_width: usize,
}

/// Output and behavior configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// If `true`, show what would change without modifying any files.
    pub dry_run: bool,
    /// If `true`, create a `.bak` backup before modifying an image.
    pub backup_originals: bool,
    /// Keep the file's access and modification times after writing.
    pub preserve_timestamps: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            display: DisplayConfig {
                families: vec!["exif".to_string(), "iptc".to_string(), "xmp".to_string()],
                human_readable: true,
                wrap_width: 46,
            },
            output: OutputConfig {
                dry_run: false,
                backup_originals: true,
                preserve_timestamps: false,
            },
        }
    }
}

impl Config {
    /// Resolve the config file path: `config.json` next to the executable.
    pub fn config_path() -> Result<PathBuf> {
        let exe_path = std::env::current_exe().context("Failed to get executable path")?;
        let exe_dir = exe_path
            .parent()
            .context("Failed to get executable directory")?;
        Ok(exe_dir.join("config.json"))
    }

    /// Load config from the given path, or from the default location.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        if !config_path.exists() {
            log::warn!(
                "Config file not found at {}. Using defaults.",
                config_path.display()
            );
            return Ok(Self::default());
        }

        let contents =
            std::fs::read_to_string(&config_path).context("Failed to read config file")?;
        let config: Config =
            serde_json::from_str(&contents).context("Failed to parse config file")?;
        Ok(config)
    }

    /// Save config to the given path, or to the default location.
    pub fn save(&self, path: Option<&Path>) -> Result<()> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        let contents = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(&config_path, contents).context("Failed to write config file")?;
        log::info!("Config saved to {}", config_path.display());
        Ok(())
    }

    /// Families to display, in configured order. Unknown names are skipped.
    pub fn enabled_families(&self) -> Vec<Family> {
        let mut families = Vec::new();
        for name in &self.display.families {
            match name.parse::<Family>() {
                Ok(family) if !families.contains(&family) => families.push(family),
                Ok(_) => {}
                Err(_) => log::warn!("Unknown metadata family in config: {name}"),
            }
        }
        families
    }

    pub fn write_options(&self) -> WriteOptions {
        WriteOptions {
            preserve_timestamps: self.output.preserve_timestamps,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load(Some(&dir.path().join("none.json"))).unwrap();
        assert!(config.output.backup_originals);
        assert_eq!(config.enabled_families(), Family::ALL);
    }

    #[test]
    fn save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        let mut config = Config::default();
        config.display.families = vec!["xmp".into()];
        config.output.preserve_timestamps = true;
        config.save(Some(&path)).unwrap();

        let loaded = Config::load(Some(&path)).unwrap();
        assert_eq!(loaded.enabled_families(), [Family::Xmp]);
        assert!(loaded.write_options().preserve_timestamps);
    }

    #[test]
    fn invalid_json_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = Config::load(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn unknown_and_duplicate_families_are_dropped() {
        let mut config = Config::default();
        config.display.families = vec!["IPTC".into(), "maker".into(), "iptc".into(), "exif".into()];
        assert_eq!(config.enabled_families(), [Family::Iptc, Family::Exif]);
    }
}
