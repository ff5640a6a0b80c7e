//! Application configuration management.
//!
//! Settings are layered with figment, later layers overriding earlier ones:
//!
//! 1. Built-in defaults
//! 2. TOML file (`--config FILE`, or `config.toml` in the platform config dir)
//! 3. Environment variables prefixed `TEXDUPE_` (e.g. `TEXDUPE_MIN_DEDUPE_SIZE=2048`)
//! 4. Command-line flags
//!
//! ```toml
//! extension = "dds"
//! min_dedupe_size = 1024
//! fingerprint_size = 4096
//! header_window = 128
//! ledger_name = "texture_remap.txt"
//! ```

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::catalog::{WalkerConfig, DEFAULT_EXTENSION, FINGERPRINT_SIZE};
use crate::cli::DedupeArgs;
use crate::duplicates::{DetectorConfig, HEADER_WINDOW, MIN_DEDUPE_SIZE};

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "TEXDUPE_";

/// Default ledger file name, written into the scan root.
pub const DEFAULT_LEDGER_NAME: &str = "texture_remap.txt";

/// Errors raised while loading or validating configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// An explicitly requested config file does not exist.
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// A layer could not be parsed into [`Config`].
    #[error("Invalid configuration: {0}")]
    Extract(#[from] Box<figment::Error>),

    /// A value is out of range.
    #[error("Invalid value for '{field}': {reason}")]
    Invalid {
        /// Offending field
        field: &'static str,
        /// What is wrong with it
        reason: String,
    },
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Extension of the blob files to compare.
    pub extension: String,
    /// Files below this size are never deduplicated.
    pub min_dedupe_size: u64,
    /// Leading bytes compared before a full read.
    pub fingerprint_size: usize,
    /// Leading fingerprint bytes checked last.
    pub header_window: usize,
    /// Ledger file name inside the scan root.
    pub ledger_name: String,
    /// Follow symbolic links during enumeration.
    pub follow_symlinks: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            extension: DEFAULT_EXTENSION.to_string(),
            min_dedupe_size: MIN_DEDUPE_SIZE,
            fingerprint_size: FINGERPRINT_SIZE,
            header_window: HEADER_WINDOW,
            ledger_name: DEFAULT_LEDGER_NAME.to_string(),
            follow_symlinks: false,
        }
    }
}

impl Config {
    /// Load configuration from `path`, or the platform default file if `None`.
    ///
    /// A missing default file is not an error; a missing explicit file is.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a layer cannot be parsed or the result
    /// fails [`Config::validate`].
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(explicit) => {
                if !explicit.is_file() {
                    return Err(ConfigError::NotFound(explicit.to_path_buf()));
                }
                Some(explicit.to_path_buf())
            }
            None => Self::default_path().filter(|p| p.is_file()),
        };

        if let Some(ref file) = file {
            log::debug!("Loading configuration from {}", file.display());
        }

        let config: Self = Self::figment(file.as_deref())
            .extract()
            .map_err(Box::new)?;
        config.validate()?;
        Ok(config)
    }

    /// The figment layering used by [`Config::load`].
    #[must_use]
    pub fn figment(file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(file) = file {
            figment = figment.merge(Toml::file(file));
        }
        figment.merge(Env::prefixed(ENV_PREFIX))
    }

    /// Platform-specific default config file path.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "texdupe", "texdupe")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Apply dedupe command-line overrides.
    pub fn merge_dedupe_args(&mut self, args: &DedupeArgs) {
        if let Some(ref extension) = args.extension {
            self.extension = extension.clone();
        }
        if let Some(size) = args.min_size {
            self.min_dedupe_size = size;
        }
        if args.follow_symlinks {
            self.follow_symlinks = true;
        }
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for an empty extension or ledger name,
    /// a zero fingerprint size, or a header window wider than the fingerprint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.extension.trim_start_matches('.').trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "extension",
                reason: "must not be empty".to_string(),
            });
        }
        if self.ledger_name.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "ledger_name",
                reason: "must not be empty".to_string(),
            });
        }
        if self.fingerprint_size == 0 {
            return Err(ConfigError::Invalid {
                field: "fingerprint_size",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.header_window > self.fingerprint_size {
            return Err(ConfigError::Invalid {
                field: "header_window",
                reason: format!(
                    "{} exceeds fingerprint_size {}",
                    self.header_window, self.fingerprint_size
                ),
            });
        }
        Ok(())
    }

    /// Default ledger location for `root`.
    #[must_use]
    pub fn ledger_path(&self, root: &Path) -> PathBuf {
        root.join(&self.ledger_name)
    }

    /// Enumeration settings derived from this configuration.
    #[must_use]
    pub fn walker_config(&self) -> WalkerConfig {
        WalkerConfig::default()
            .with_extension(&self.extension)
            .with_follow_symlinks(self.follow_symlinks)
    }

    /// Detector settings derived from this configuration.
    #[must_use]
    pub fn detector_config(&self) -> DetectorConfig {
        DetectorConfig::default()
            .with_min_dedupe_size(self.min_dedupe_size)
            .with_fingerprint_size(self.fingerprint_size)
            .with_header_window(self.header_window)
            .with_walker_config(self.walker_config())
    }
}
