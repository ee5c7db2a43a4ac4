//! Project configuration management for `kiln.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── paths      # [paths] source/destination directories
//! ├── serve      # [serve] dev server
//! ├── styles     # [styles] prefixing, minification, source maps
//! ├── images     # [images] compression settings
//! ├── watch      # [watch] debounce
//! ├── error      # ConfigError, ConfigDiagnostics
//! └── mod.rs     # KilnConfig (this file)
//! ```
//!
//! The config file is optional: without one every section uses its
//! defaults and the project root is the current directory.

mod error;
mod images;
mod paths;
mod serve;
mod styles;
mod util;
mod watch;

pub use error::{ConfigDiagnostics, ConfigError};
pub use images::{ImageConfig, SvgConfig};
pub use paths::{PathConfig, PathsConfig};
pub use serve::ServeConfig;
pub use styles::StyleConfig;
pub use watch::WatchConfig;

use crate::{cli::Cli, debug, log};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use util::find_config_file;

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing kiln.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KilnConfig {
    /// Absolute path to the config file, if one was found (internal use only)
    #[serde(skip)]
    pub config_path: Option<PathBuf>,

    /// Project root directory - parent of config file (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    /// Source and destination directories
    pub paths: PathsConfig,

    /// Development server settings
    pub serve: ServeConfig,

    /// Stylesheet pipeline settings
    pub styles: StyleConfig,

    /// Image optimization settings
    pub images: ImageConfig,

    /// Watcher settings
    pub watch: WatchConfig,
}

impl KilnConfig {
    /// Load configuration for the given CLI invocation.
    ///
    /// Searches upward from cwd for the config file. The project root is the
    /// config file's parent directory, or cwd when there is none.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;
        Self::load_from(&cli.config, &cwd)
    }

    /// Load configuration, searching for `config_name` upward from `start`.
    pub fn load_from(config_name: &Path, start: &Path) -> Result<Self> {
        let mut config = match find_config_file(config_name, start) {
            Some(path) => {
                debug!("config"; "using {}", path.display());
                let mut config = Self::from_path(&path)?;
                config.root = path
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| start.to_path_buf());
                config.config_path = Some(path);
                config
            }
            None => {
                debug!("config"; "no {} found, using defaults", config_name.display());
                Self::for_root(start)
            }
        };

        config.root = crate::utils::path::normalize_path(&config.root);
        config.validate()?;
        Ok(config)
    }

    /// Default configuration rooted at `root`.
    pub fn for_root(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            ..Self::default()
        }
    }

    /// Parse configuration from TOML string
    #[cfg(test)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from file path, warning about unknown fields.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {} are ignored:", display_path);
        for field in fields {
            log!("warning"; "- {}", field);
        }
    }

    /// Validate every section, reporting all problems at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut diag = ConfigDiagnostics::new();

        self.paths.validate(self.images.enable, &mut diag);
        self.styles.validate(&mut diag);
        self.images.validate(&mut diag);
        self.watch.validate(&mut diag);

        diag.into_result()
    }

    /// Resolve the directory layout against the project root.
    pub fn layout(&self) -> PathConfig {
        self.paths.resolve(&self.root, self.images.enable)
    }

    /// Get path relative to the project root, for display.
    pub fn root_relative(&self, path: impl AsRef<Path>) -> PathBuf {
        path.as_ref()
            .strip_prefix(&self.root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.as_ref().to_path_buf())
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse config and panic on unknown fields (to catch config typos in tests).
#[cfg(test)]
pub fn test_parse_config(content: &str) -> KilnConfig {
    let (parsed, ignored) = KilnConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================
