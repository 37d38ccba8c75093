//! Configuration loader utilities

use crate::{Config, ConfigBuilder, ConfigError, ConfigResult};
use std::path::{Path, PathBuf};

/// Configuration loader with common loading patterns
pub struct ConfigLoader;

impl ConfigLoader {
    /// Environment prefix for namespaced overrides
    pub const ENV_PREFIX: &'static str = "XFMIRROR";

    /// Load configuration from default locations
    pub fn load_default() -> ConfigResult<Config> {
        let mut builder = ConfigBuilder::new();

        if let Some(path) = Self::config_exists() {
            builder = builder.add_source_file(&path);
        }

        builder
            .add_env_prefix(Self::ENV_PREFIX)
            .add_legacy_env()
            .build()
    }

    /// Load configuration from a specific file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Config> {
        let path = path.as_ref();

        if !path.is_file() {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source: std::io::ErrorKind::NotFound.into(),
            });
        }

        ConfigBuilder::new()
            .add_source_file(path)
            .add_env_prefix(Self::ENV_PREFIX)
            .add_legacy_env()
            .build()
    }

    /// Serialize configuration in the format implied by the extension
    pub fn to_string_for(config: &Config, path: &Path) -> ConfigResult<String> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => toml::to_string_pretty(config)
                .map_err(|e| ConfigError::serialization(format!("TOML: {}", e))),
            Some("json") => serde_json::to_string_pretty(config)
                .map_err(|e| ConfigError::serialization(format!("JSON: {}", e))),
            _ => serde_yaml::to_string(config)
                .map_err(|e| ConfigError::serialization(format!("YAML: {}", e))),
        }
    }

    /// Save configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(config: &Config, path: P) -> ConfigResult<()> {
        let path = path.as_ref();
        let content = Self::to_string_for(config, path)?;

        std::fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Candidate configuration files, most specific first
    fn search_paths() -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = ["xfmirror.yaml", "xfmirror.yml", "xfmirror.toml"]
            .iter()
            .map(PathBuf::from)
            .collect();

        if let Some(dir) = user_config_dir() {
            paths.push(dir.join("xfmirror").join("config.yaml"));
            paths.push(dir.join("xfmirror").join("config.toml"));
        }

        #[cfg(unix)]
        paths.push(PathBuf::from("/etc/xfmirror/config.yaml"));

        paths
    }

    /// First configuration file found in the default locations
    pub fn config_exists() -> Option<PathBuf> {
        Self::search_paths().into_iter().find(|path| path.exists())
    }
}

fn user_config_dir() -> Option<PathBuf> {
    let var = |key: &str| std::env::var_os(key).map(PathBuf::from);
    if cfg!(windows) {
        var("APPDATA")
    } else {
        var("XDG_CONFIG_HOME").or_else(|| var("HOME").map(|home| home.join(".config")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TransportKind;
    use tempfile::TempDir;

    #[test]
    fn test_save_and_load_yaml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.yaml");

        let mut original = Config::default();
        original.remote.transport = TransportKind::Fs;
        original.remote.root = Some("/mnt/postbox".to_string());
        original.workers.count = Some(2);
        ConfigLoader::save_to_file(&original, &config_path).unwrap();

        let loaded = ConfigLoader::load_from_file(&config_path).unwrap();
        assert_eq!(loaded.remote.transport, TransportKind::Fs);
        assert_eq!(loaded.remote.root.as_deref(), Some("/mnt/postbox"));
        assert_eq!(loaded.workers.count, Some(2));
        assert_eq!(loaded.areas, original.areas);
    }

    #[test]
    fn test_save_and_load_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let original = Config::default();
        ConfigLoader::save_to_file(&original, &config_path).unwrap();

        let loaded = ConfigLoader::load_from_file(&config_path).unwrap();
        assert_eq!(loaded.areas, original.areas);
        assert_eq!(loaded.categories, original.categories);
    }

    #[test]
    fn test_save_default_config_json() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("default.json");

        ConfigLoader::save_to_file(&Config::default(), &config_path).unwrap();
        let content = std::fs::read_to_string(&config_path).unwrap();
        assert!(content.contains("XpressfeedFeedConfigV2"));

        let loaded = ConfigLoader::load_from_file(&config_path).unwrap();
        assert_eq!(loaded.transfer, Config::default().transfer);
    }

    #[test]
    fn test_load_missing_file_fails() {
        let temp_dir = TempDir::new().unwrap();
        let result = ConfigLoader::load_from_file(temp_dir.path().join("missing.yaml"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
