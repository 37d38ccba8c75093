//! Configuration management system for xfmirror
//!
//! This crate loads the mirror configuration from layered sources and
//! validates it before any remote contact is made.
//!
//! # Features
//!
//! - **Multiple formats**: YAML, TOML and JSON configuration files
//! - **Environment overrides**: `XFMIRROR__SECTION__KEY` variables, plus the
//!   legacy `FTP_HOST` / `XF_USERNAME` / `XF_PASSWORD` / `POSTBOX_DESTINATION` names
//! - **Validation**: structural checks at build time, remote and destination
//!   checks right before a run
//! - **Defaults**: the two standard feed areas with their package rules
//!
//! # Examples
//!
//! ```rust,no_run
//! use xfmirror_config::ConfigBuilder;
//!
//! let config = ConfigBuilder::new()
//!     .add_source_file("xfmirror.yaml")
//!     .add_env_prefix("XFMIRROR")
//!     .add_legacy_env()
//!     .build()
//!     .expect("Failed to load configuration");
//!
//! println!("Areas: {}", config.areas.len());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use xfmirror_types::{BufferSize, NamingConvention, WorkerCount};

pub mod builder;
pub mod error;
pub mod loader;

pub use builder::ConfigBuilder;
pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;

/// Main configuration structure for xfmirror
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Remote endpoint configuration
    pub remote: RemoteConfig,
    /// Local destination configuration
    pub local: LocalConfig,
    /// Top-level areas to mirror, in scan order
    pub areas: Vec<AreaConfig>,
    /// File categories to include
    pub categories: CategoryToggles,
    /// Download worker pool configuration
    pub workers: WorkersConfig,
    /// Transfer configuration
    pub transfer: TransferConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Kind of remote transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// SSH/SFTP server
    #[default]
    Sftp,
    /// Locally mounted directory tree
    Fs,
}

/// Remote endpoint configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Transport used to reach the feed
    pub transport: TransportKind,
    /// Remote host (sftp)
    pub host: Option<String>,
    /// Remote port (sftp)
    pub port: u16,
    /// Login user (sftp)
    pub username: Option<String>,
    /// Login password (sftp)
    pub password: Option<String>,
    /// Remote root directory; the mounted path for `fs`
    pub root: Option<String>,
    /// Session timeout in seconds
    pub timeout_secs: u64,
}

impl RemoteConfig {
    /// Session timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            transport: TransportKind::Sftp,
            host: None,
            port: 22,
            username: None,
            password: None,
            root: None,
            timeout_secs: 60,
        }
    }
}

/// Local destination configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalConfig {
    /// Destination root for the mirrored tree
    pub destination: Option<PathBuf>,
    /// Directories created under the destination before a run
    pub scaffold_dirs: Vec<String>,
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            destination: None,
            scaffold_dirs: ["Products", "Inbox", "Outbox", "Xpressfeed"]
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
        }
    }
}

/// One top-level remote area
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaConfig {
    /// Remote directory name
    pub name: String,
    /// File naming convention of the area's packages
    #[serde(default)]
    pub convention: NamingConvention,
    /// Skip quietly when the area is missing from the remote root
    #[serde(default)]
    pub optional: bool,
    /// Package allow-list; empty allows every package
    #[serde(default)]
    pub packages: Vec<String>,
    /// Packages whose latest file is their only download
    #[serde(default)]
    pub config_packages: Vec<String>,
    /// Packages whose every file is downloaded
    #[serde(default)]
    pub installer_packages: Vec<String>,
}

impl AreaConfig {
    /// Create an area with no package rules
    pub fn new(name: impl Into<String>, convention: NamingConvention) -> Self {
        Self {
            name: name.into(),
            convention,
            optional: false,
            packages: Vec::new(),
            config_packages: Vec::new(),
            installer_packages: Vec::new(),
        }
    }

    /// Check whether the allow-list admits a package
    pub fn allows(&self, package: &str) -> bool {
        self.packages.is_empty() || self.packages.iter().any(|p| p == package)
    }

    /// Check whether a package follows the config-file rule
    pub fn is_config_package(&self, package: &str) -> bool {
        self.config_packages.iter().any(|p| p == package)
    }

    /// Check whether a package follows the installer rule
    pub fn is_installer_package(&self, package: &str) -> bool {
        self.installer_packages.iter().any(|p| p == package)
    }
}

/// Which file categories a run includes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct CategoryToggles {
    /// Latest file of config packages
    pub config: bool,
    /// All files of installer packages
    pub installer: bool,
    /// Latest full flag file
    pub flag: bool,
    /// Latest full snapshot parts
    pub full: bool,
    /// Change files since the latest snapshot
    pub change: bool,
}

impl Default for CategoryToggles {
    fn default() -> Self {
        Self {
            config: true,
            installer: true,
            flag: true,
            full: true,
            change: true,
        }
    }
}

/// Download worker pool configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkersConfig {
    /// Pool size; unset means one less than the available cores
    pub count: Option<usize>,
}

/// Transfer configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferConfig {
    /// Chunk size for streaming
    pub buffer_size: BufferSize,
    /// Write to `<name>.part` and rename on success
    pub staging: bool,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,
    /// Emit JSON-formatted logs
    pub json_format: bool,
    /// Log file path
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            file: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let mut products = AreaConfig::new("Products", NamingConvention::Marker);
        products.config_packages = vec!["XpressfeedFeedConfigV2".to_string()];
        products.installer_packages =
            vec!["V5Loader_Linux".to_string(), "V5Loader_Windows".to_string()];

        let mut xpressfeed = AreaConfig::new("Xpressfeed", NamingConvention::Prefix);
        xpressfeed.optional = true;
        xpressfeed.installer_packages = vec!["suppcxf".to_string()];

        Self {
            remote: RemoteConfig::default(),
            local: LocalConfig::default(),
            areas: vec![products, xpressfeed],
            categories: CategoryToggles::default(),
            workers: WorkersConfig::default(),
            transfer: TransferConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Legacy environment names for the remote host, in lookup order
    pub const LEGACY_HOST_VARS: [&'static str; 2] = ["FTP_HOST", "EDX_HOST"];
    /// Legacy environment name for the login user
    pub const LEGACY_USERNAME_VAR: &'static str = "XF_USERNAME";
    /// Legacy environment name for the login password
    pub const LEGACY_PASSWORD_VAR: &'static str = "XF_PASSWORD";
    /// Legacy environment name for the destination root
    pub const LEGACY_DESTINATION_VAR: &'static str = "POSTBOX_DESTINATION";

    /// Fill still-unset remote and destination fields from legacy variable names
    pub fn fill_from_legacy<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if self.remote.host.is_none() {
            self.remote.host = Self::LEGACY_HOST_VARS.iter().find_map(|key| lookup(*key));
        }
        if self.remote.username.is_none() {
            self.remote.username = lookup(Self::LEGACY_USERNAME_VAR);
        }
        if self.remote.password.is_none() {
            self.remote.password = lookup(Self::LEGACY_PASSWORD_VAR);
        }
        if self.local.destination.is_none() {
            self.local.destination = lookup(Self::LEGACY_DESTINATION_VAR).map(PathBuf::from);
        }
    }

    /// Resolve the worker pool size
    pub fn worker_count(&self) -> ConfigResult<WorkerCount> {
        WorkerCount::resolve(self.workers.count)
            .map_err(|message| ConfigError::invalid_value("workers.count".to_string(), message))
    }

    /// Structural validation, independent of credentials and destination
    pub fn validate(&self) -> ConfigResult<()> {
        if let Err(message) = BufferSize::new(self.transfer.buffer_size.get()) {
            return Err(ConfigError::invalid_value(
                "transfer.buffer_size".to_string(),
                message,
            ));
        }

        self.worker_count()?;

        if !["trace", "debug", "info", "warn", "error"].contains(&self.logging.level.as_str()) {
            return Err(ConfigError::validation(
                "Log level must be one of: trace, debug, info, warn, error",
            ));
        }

        if self.remote.port == 0 {
            return Err(ConfigError::validation("Remote port must be greater than 0"));
        }

        let mut seen: Vec<&str> = Vec::new();
        for area in &self.areas {
            let name = area.name.trim();
            if name.is_empty() || name.contains('/') {
                return Err(ConfigError::invalid_value(
                    "areas.name".to_string(),
                    format!("'{}' is not a valid area directory name", area.name),
                ));
            }
            if seen.contains(&name) {
                return Err(ConfigError::validation(format!(
                    "Area '{}' is configured more than once",
                    name
                )));
            }
            seen.push(name);
        }

        Ok(())
    }

    /// Ensure the remote endpoint is fully specified
    pub fn require_remote(&self) -> ConfigResult<()> {
        match self.remote.transport {
            TransportKind::Sftp => {
                Self::require_text(self.remote.host.as_deref(), "remote.host")?;
                Self::require_text(self.remote.username.as_deref(), "remote.username")?;
                Self::require_text(self.remote.password.as_deref(), "remote.password")?;
            }
            TransportKind::Fs => {
                Self::require_text(self.remote.root.as_deref(), "remote.root")?;
            }
        }
        Ok(())
    }

    /// Ensure a destination root is configured
    pub fn require_destination(&self) -> ConfigResult<&PathBuf> {
        self.local
            .destination
            .as_ref()
            .filter(|path| !path.as_os_str().is_empty())
            .ok_or_else(|| ConfigError::missing_required("local.destination"))
    }

    fn require_text(value: Option<&str>, key: &str) -> ConfigResult<()> {
        match value {
            Some(v) if !v.trim().is_empty() => Ok(()),
            _ => Err(ConfigError::missing_required(key)),
        }
    }
}
