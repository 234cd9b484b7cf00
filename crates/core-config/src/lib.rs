//! Optional `image_transformer.toml` configuration (§1.1, §6).
//!
//! Mirrors the teacher's own config crate: a missing file is not an error
//! (falls back to defaults), a present-but-unparseable file is not an
//! error either, and the effective value always comes from layering
//! CLI overrides on top of whatever the file produced.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use core_model::{Result, StencilError};

/// Which ingest/egress path the driver should use (§4.4, §4.5). Defaults
/// to collective I/O, matching the original's own `#define
/// SHARED_FILE_SYSTEM` default build configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransportPath {
    CollectiveIo,
    ScatterGather,
}

impl Default for TransportPath {
    fn default() -> Self {
        TransportPath::CollectiveIo
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "kebab-case")]
struct ConfigFile {
    #[serde(default)]
    path: Option<TransportPath>,
    #[serde(default)]
    log_dir: Option<PathBuf>,
    #[serde(default)]
    compare_with_oracle: Option<bool>,
}

/// The fully resolved configuration the driver runs with: file values with
/// CLI overrides layered on top, then defaults filling in anything still
/// unset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub path: TransportPath,
    pub log_dir: PathBuf,
    pub compare_with_oracle: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            path: TransportPath::default(),
            log_dir: PathBuf::from("."),
            compare_with_oracle: true,
        }
    }
}

/// CLI-supplied overrides (§1.1): anything `Some` wins over the file and
/// the defaults.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub path: Option<TransportPath>,
    pub compare_with_oracle: Option<bool>,
}

/// Loads configuration from `path` (or does nothing if it's absent),
/// then layers `overrides` on top (§1.1: CLI > file > defaults).
pub fn load(path: Option<&Path>, overrides: &ConfigOverrides) -> Result<Config> {
    let file = match path {
        Some(path) => read_config_file(path)?,
        None => {
            let default_path = Path::new("image_transformer.toml");
            if default_path.exists() {
                read_config_file(default_path)?
            } else {
                ConfigFile::default()
            }
        }
    };

    let mut config = Config::default();
    if let Some(file_path) = file.path {
        config.path = file_path;
    }
    if let Some(dir) = file.log_dir {
        config.log_dir = dir;
    }
    if let Some(compare) = file.compare_with_oracle {
        config.compare_with_oracle = compare;
    }

    if let Some(path) = overrides.path {
        config.path = path;
    }
    if let Some(compare) = overrides.compare_with_oracle {
        config.compare_with_oracle = compare;
    }

    tracing::debug!(
        target: "config",
        path = ?config.path,
        log_dir = %config.log_dir.display(),
        compare_with_oracle = config.compare_with_oracle,
        "resolved configuration"
    );

    Ok(config)
}

fn read_config_file(path: &Path) -> Result<ConfigFile> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(_) => return Ok(ConfigFile::default()),
    };
    match toml::from_str(&content) {
        Ok(file) => Ok(file),
        Err(err) => Err(StencilError::InvalidFormat(format!(
            "failed to parse {}: {err}",
            path.display()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_no_file_given() {
        let config = load(None, &ConfigOverrides::default()).unwrap();
        assert_eq!(config.path, TransportPath::CollectiveIo);
        assert!(config.compare_with_oracle);
    }

    #[test]
    fn parses_path_selection_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("image_transformer.toml");
        std::fs::write(&path, "path = \"scatter-gather\"\ncompare-with-oracle = false\n").unwrap();
        let config = load(Some(&path), &ConfigOverrides::default()).unwrap();
        assert_eq!(config.path, TransportPath::ScatterGather);
        assert!(!config.compare_with_oracle);
    }

    #[test]
    fn cli_override_wins_over_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("image_transformer.toml");
        std::fs::write(&path, "path = \"scatter-gather\"\n").unwrap();
        let overrides = ConfigOverrides {
            path: Some(TransportPath::CollectiveIo),
            compare_with_oracle: None,
        };
        let config = load(Some(&path), &overrides).unwrap();
        assert_eq!(config.path, TransportPath::CollectiveIo);
    }

    #[test]
    fn missing_explicit_path_falls_back_to_defaults() {
        let config = load(Some(Path::new("__does_not_exist__.toml")), &ConfigOverrides::default()).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn rejects_malformed_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("image_transformer.toml");
        std::fs::write(&path, "not valid toml [[[").unwrap();
        assert!(load(Some(&path), &ConfigOverrides::default()).is_err());
    }
}
