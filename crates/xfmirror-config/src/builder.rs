//! Layered configuration: defaults, then files, then environment

use crate::{Config, ConfigError, ConfigResult};
use config::{builder::DefaultState, Environment, File, FileFormat};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone)]
enum Layer {
    File(PathBuf),
    Env(String),
}

/// Stacks configuration layers; later layers override earlier ones
#[derive(Debug)]
pub struct ConfigBuilder {
    layers: Vec<Layer>,
    env_separator: String,
    legacy_env: bool,
}

impl ConfigBuilder {
    /// Builder over the built-in defaults
    pub fn new() -> Self {
        Self {
            layers: Vec::new(),
            env_separator: "__".to_string(),
            legacy_env: false,
        }
    }

    /// Add a configuration file layer; missing files are ignored
    pub fn add_source_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.layers.push(Layer::File(path.as_ref().to_path_buf()));
        self
    }

    /// Add `PREFIX__SECTION__KEY` environment overrides
    pub fn add_env_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.layers.push(Layer::Env(prefix.into()));
        self
    }

    /// Set the environment key separator (default: "__")
    pub fn env_separator<S: Into<String>>(mut self, separator: S) -> Self {
        self.env_separator = separator.into();
        self
    }

    /// Fill unset credentials and destination from the legacy variable names
    pub fn add_legacy_env(mut self) -> Self {
        self.legacy_env = true;
        self
    }

    /// Merge every layer, deserialize and validate
    pub fn build(self) -> ConfigResult<Config> {
        let defaults = serde_yaml::to_value(Config::default())
            .map_err(|e| ConfigError::serialization(format!("defaults: {}", e)))?;
        let mut inner: config::ConfigBuilder<DefaultState> =
            config::Config::builder().add_source(config::Config::try_from(&defaults)?);

        for layer in &self.layers {
            inner = match layer {
                Layer::File(path) if path.exists() => {
                    debug!("Loading configuration from {}", path.display());
                    inner.add_source(File::from(path.clone()).format(file_format(path)))
                }
                Layer::File(_) => inner,
                Layer::Env(prefix) => inner
                    .add_source(Environment::with_prefix(prefix).separator(&self.env_separator)),
            };
        }

        let mut result: Config = inner.build()?.try_deserialize()?;
        if self.legacy_env {
            result.fill_from_legacy(|key| std::env::var(key).ok());
        }
        result.validate()?;
        Ok(result)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn file_format(path: &Path) -> FileFormat {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => FileFormat::Toml,
        Some("json") => FileFormat::Json,
        _ => FileFormat::Yaml,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TransportKind;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use xfmirror_types::NamingConvention;

    #[test]
    fn test_builder_defaults() {
        let config = ConfigBuilder::new().build().unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_builder_yaml_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
remote:
  transport: fs
  root: /mnt/postbox
local:
  destination: /data/mirror
workers:
  count: 3
areas:
  - name: Products
    convention: marker
    packages: [KeyDevelopment, OwnershipInsider]
"#
        )
        .unwrap();

        let config = ConfigBuilder::new()
            .add_source_file(temp_file.path())
            .build()
            .unwrap();

        assert_eq!(config.remote.transport, TransportKind::Fs);
        assert_eq!(config.remote.root.as_deref(), Some("/mnt/postbox"));
        assert_eq!(config.remote.port, 22);
        assert_eq!(config.workers.count, Some(3));
        assert_eq!(config.areas.len(), 1);
        assert_eq!(config.areas[0].convention, NamingConvention::Marker);
        assert_eq!(config.areas[0].packages.len(), 2);
        assert!(config.areas[0].config_packages.is_empty());
    }

    #[test]
    fn test_builder_validation() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
workers:
  count: 0
"#
        )
        .unwrap();

        let result = ConfigBuilder::new()
            .add_source_file(temp_file.path())
            .build();

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("workers.count"));
    }

    #[test]
    fn test_missing_file_is_ignored() {
        let config = ConfigBuilder::new()
            .add_source_file("/definitely/not/here.yaml")
            .build()
            .unwrap();
        assert_eq!(config.areas.len(), 2);
    }

    #[test]
    fn test_env_override_uses_double_separator_after_prefix() {
        std::env::set_var("XFBUILDTEST__WORKERS__COUNT", "3");
        let config = ConfigBuilder::new()
            .add_env_prefix("XFBUILDTEST")
            .build()
            .unwrap();
        std::env::remove_var("XFBUILDTEST__WORKERS__COUNT");
        assert_eq!(config.workers.count, Some(3));
    }
}
