use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Session configuration: where the hosted backend lives and how to talk
/// to it. Defaults, then the config file, then `KEY=VALUE` overrides from
/// the command line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Base URL of the hosted backend.
    pub backend_url: String,

    /// Bearer token issued out of band; empty means unauthenticated.
    pub auth_token: String,

    /// Language hint passed with transcription requests.
    pub language: String,

    /// Log destination; stderr belongs to the terminal UI.
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: "https://api.murmur.rest".to_string(),
            auth_token: String::new(),
            language: "en".to_string(),
            log_file: None,
        }
    }
}

impl Config {
    pub fn load(file_override: Option<&Path>) -> anyhow::Result<Self> {
        let path = match file_override {
            Some(path) => Some(path.to_path_buf()),
            None => default_file_path().filter(|path| path.exists()),
        };

        let Some(path) = path else {
            warn!("no config file found; using defaults");
            return Ok(Self::default());
        };

        let raw = fs::read_to_string(&path)
            .with_context(|| format!("failed reading {}", path.display()))?;
        let cfg: Config = toml::from_str(&raw)
            .with_context(|| format!("failed parsing {}", path.display()))?;

        info!(config = %path.display(), "loaded config file");
        Ok(cfg)
    }

    pub fn apply_overrides<I>(&mut self, overrides: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in overrides {
            match key.as_str() {
                "backend_url" => self.backend_url = value,
                "auth_token" => self.auth_token = value,
                "language" => self.language = value,
                "log_file" => self.log_file = Some(PathBuf::from(value)),
                other => warn!(key = other, "ignoring unknown config override"),
            }
        }
    }

    pub fn log_file_path(&self) -> PathBuf {
        self.log_file.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("murmur")
                .join("murmur.log")
        })
    }
}

fn default_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("murmur").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::Config;

    #[test]
    fn file_then_overrides() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        fs::write(&path, "backend_url = \"https://backend.test\"\nlanguage = \"de\"\n")
            .expect("write config");

        let mut cfg = Config::load(Some(&path)).expect("load config");
        assert_eq!(cfg.backend_url, "https://backend.test");
        assert_eq!(cfg.language, "de");
        assert!(cfg.auth_token.is_empty());

        cfg.apply_overrides([("auth_token".to_string(), "tok_123".to_string())]);
        assert_eq!(cfg.auth_token, "tok_123");
    }

    #[test]
    fn unknown_override_keys_are_ignored() {
        let mut cfg = Config::default();
        cfg.apply_overrides([("no_such_key".to_string(), "x".to_string())]);
        assert_eq!(cfg, Config::default());
    }
}
