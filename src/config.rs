//! Layered configuration.
//!
//! Values are merged with `figment` in this order, later layers winning:
//!
//! 1. Built-in defaults ([`Config::default`])
//! 2. A TOML file: `--config FILE`, or `config.toml` in the platform config
//!    directory (e.g. `~/.config/dupesweep/config.toml` on Linux)
//! 3. `DUPESWEEP_*` environment variables (`DUPESWEEP_IO_THREADS=8`)
//! 4. Command-line flags ([`Config::apply_cli`])
//!
//! ```toml
//! io_threads = 8
//! block_size = 131072
//! skip_hidden = true
//! ignore_patterns = ["*.tmp", "node_modules/"]
//! verify_content = true
//! use_trash = false
//! ```

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cli::ScanArgs;
use crate::scanner::{BLOCK_SIZE, MIN_BLOCK_SIZE};

/// Prefix of the environment variables read into [`Config`].
pub const ENV_PREFIX: &str = "DUPESWEEP_";

/// Errors from loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly requested file does not exist.
    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    /// A layer could not be parsed or has the wrong types.
    #[error("invalid configuration: {0}")]
    Parse(#[from] Box<figment::Error>),

    /// A value parsed but is out of range.
    #[error("invalid value for {field}: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
}

/// Scan and resolve settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Fingerprinting worker threads.
    pub io_threads: usize,
    /// Read block size in bytes.
    pub block_size: usize,
    /// Follow symbolic links during the walk.
    pub follow_symlinks: bool,
    /// Skip files and directories starting with `.`.
    pub skip_hidden: bool,
    /// Extra gitignore-style patterns.
    pub ignore_patterns: Vec<String>,
    /// Byte-compare each file with the kept copy before deleting it.
    pub verify_content: bool,
    /// Move deleted files to the system trash.
    pub use_trash: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            io_threads: 4,
            block_size: BLOCK_SIZE,
            follow_symlinks: false,
            skip_hidden: false,
            ignore_patterns: Vec::new(),
            verify_content: true,
            use_trash: false,
        }
    }
}

impl Config {
    /// Load configuration, falling back to defaults on any error.
    ///
    /// `path` overrides the platform config file location.
    #[must_use]
    pub fn load(path: Option<&Path>) -> Self {
        let result = match path {
            Some(p) => Self::load_from_path(p),
            None => Self::extract(Self::figment(Self::config_path().as_deref())),
        };

        match result {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Failed to load config, using defaults: {}", e);
                Self::default()
            }
        }
    }

    /// Load configuration from an explicit file plus the environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file is missing, malformed, or holds
    /// out-of-range values.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        if !path.is_file() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        Self::extract(Self::figment(Some(path)))
    }

    /// The default/file/environment stack, without CLI overrides.
    #[must_use]
    pub fn figment(file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(file) = file {
            figment = figment.merge(Toml::file(file));
        }
        figment.merge(Env::prefixed(ENV_PREFIX))
    }

    /// Extract and validate a config from `figment`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] on type errors or out-of-range values.
    pub fn extract(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract().map_err(Box::new)?;
        config.validate()?;
        log::debug!("Loaded configuration: {:?}", config);
        Ok(config)
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.io_threads == 0 {
            return Err(ConfigError::Invalid {
                field: "io_threads",
                message: "must be at least 1".to_string(),
            });
        }
        if self.block_size < MIN_BLOCK_SIZE {
            return Err(ConfigError::Invalid {
                field: "block_size",
                message: format!("must be at least {} bytes", MIN_BLOCK_SIZE),
            });
        }
        Ok(())
    }

    /// Apply command-line overrides. Flags only ever switch options on.
    pub fn apply_cli(&mut self, args: &ScanArgs) {
        if let Some(threads) = args.io_threads {
            self.io_threads = threads;
        }
        if let Some(size) = args.block_size {
            self.block_size = usize::try_from(size).unwrap_or(usize::MAX);
        }
        self.follow_symlinks |= args.follow_symlinks;
        self.skip_hidden |= args.skip_hidden;
        self.ignore_patterns
            .extend(args.ignore_patterns.iter().cloned());
        if args.no_verify {
            self.verify_content = false;
        }
        self.use_trash |= args.trash;
    }

    /// Platform-specific default config file.
    #[must_use]
    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "dupesweep", "dupesweep")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }
}
