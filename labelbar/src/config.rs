//! User configuration for labelbar.
//!
//! Read from `$XDG_CONFIG_HOME/labelbar/config.toml` (falling back to
//! `~/.config/labelbar/config.toml`). Every key is optional and a missing
//! file is the default config. An unreadable or broken file is returned as a
//! [`ConfigError`]; `main` falls back to defaults and logs it once the log
//! file is open.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use labelbar_core::capability::{self, Capabilities};
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("cannot parse {path}: {source}")]
    Parse { path: PathBuf, source: toml::de::Error },
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub theme: String,
    pub enable_tooltips: bool,
    pub explore: bool,
    /// Shorthand for `interfaces.review = true`.
    pub review: bool,
    /// Directory holding `reviews.db` and `labelbar.log`.
    pub data_dir: PathBuf,
    /// Capability flags. When the table is present it replaces the defaults.
    pub interfaces: BTreeMap<String, bool>,
}

impl Default for Config {
    fn default() -> Self {
        let interfaces = [
            capability::SKIP,
            capability::SUBMIT,
            capability::UPDATE,
            capability::EDIT_HISTORY,
            capability::INSTRUCTION,
            capability::GROUND_TRUTH,
        ]
        .into_iter()
        .map(|name| (name.to_owned(), true))
        .collect();

        Self {
            theme: "catppuccin-mocha".to_owned(),
            enable_tooltips: true,
            explore: false,
            review: false,
            data_dir: PathBuf::from(".labelbar"),
            interfaces,
        }
    }
}

impl Config {
    pub fn capabilities(&self) -> Capabilities {
        let mut caps: Capabilities = self
            .interfaces
            .iter()
            .map(|(name, on)| (name.clone(), *on))
            .collect();
        if self.review {
            caps.set(capability::REVIEW, true);
        }
        caps
    }
}

/// Returns the path to the labelbar config file.
///
/// Prefers `$XDG_CONFIG_HOME/labelbar/config.toml`; falls back to
/// `~/.config/labelbar/config.toml` when the env var is absent.
pub fn config_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join(".config"))
        })
        .unwrap_or_else(|| PathBuf::from(".config"));
    base.join("labelbar").join("config.toml")
}

pub fn parse(raw: &str) -> Result<Config, toml::de::Error> {
    toml::from_str(raw)
}

/// Reads the config at `path`. A missing file is the default config.
///
/// # Errors
///
/// `ConfigError::Read` if the file exists but cannot be read,
/// `ConfigError::Parse` if it is not a valid config.
pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
    let raw = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Config::default()),
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_owned(),
                source,
            })
        }
    };
    parse(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_owned(),
        source,
    })
}

/// [`load_from`] on [`config_path`].
pub fn load() -> Result<Config, ConfigError> {
    load_from(&config_path())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_default() {
        assert_eq!(parse("").unwrap(), Config::default());
    }

    #[test]
    fn interfaces_table_replaces_defaults() {
        let config = parse(
            r#"
            review = true
            [interfaces]
            "annotations:deny-empty" = true
            "comments:reject" = false
            "#,
        )
        .unwrap();
        let caps = config.capabilities();
        assert!(caps.has("review"));
        assert!(caps.has("annotations:deny-empty"));
        assert!(!caps.has("skip"));
        assert!(!caps.flag_or("comments:reject", true));
        assert!(caps.flag_or("comments:skip", true));
    }

    #[test]
    fn default_capabilities_leave_review_off() {
        let caps = Config::default().capabilities();
        assert!(!caps.has("review"));
        assert!(caps.has("skip") && caps.has("submit") && caps.has("update"));
    }

    #[test]
    fn bad_types_are_rejected() {
        assert!(parse("enable_tooltips = \"yes\"").is_err());
    }

    #[test]
    fn missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn broken_file_is_reported_with_its_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "theme = [").unwrap();

        let err = load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn directory_in_place_of_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(load_from(dir.path()), Err(ConfigError::Read { .. })));
    }

    #[test]
    fn valid_file_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "explore = true\n").unwrap();
        assert!(load_from(&path).unwrap().explore);
    }
}
