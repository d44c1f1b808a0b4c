use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Device-local preference flags, independent of the hosted store.
/// Loaded at startup, edited in the settings panel, saved explicitly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// API key for the speech-to-text provider.
    pub transcription_api_key: String,

    /// Gates the voice input mode.
    pub ai_enabled: bool,

    pub dark_theme: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            transcription_api_key: String::new(),
            ai_enabled: true,
            dark_theme: true,
        }
    }
}

impl Settings {
    /// Missing file means defaults; this is not an error.
    pub fn load(dir_override: Option<&Path>) -> anyhow::Result<Self> {
        let path = file_path(dir_override)?;
        if !path.exists() {
            debug!(settings = %path.display(), "no settings file, using defaults");
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(&path)
            .with_context(|| format!("failed reading {}", path.display()))?;
        let settings = toml::from_str(&raw)
            .with_context(|| format!("failed parsing {}", path.display()))?;

        debug!(settings = %path.display(), "loaded settings");
        Ok(settings)
    }

    pub fn save(&self, dir_override: Option<&Path>) -> anyhow::Result<()> {
        let path = file_path(dir_override)?;
        let dir = path
            .parent()
            .ok_or_else(|| anyhow!("settings path has no parent: {}", path.display()))?;
        fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;

        let serialized = toml::to_string_pretty(self).context("failed serializing settings")?;
        let mut temp = NamedTempFile::new_in(dir)?;
        temp.write_all(serialized.as_bytes())?;
        temp.flush()?;
        temp.persist(&path)
            .map_err(|err| anyhow!("failed to persist {}: {}", path.display(), err))?;

        info!(settings = %path.display(), "settings saved");
        Ok(())
    }
}

fn file_path(dir_override: Option<&Path>) -> anyhow::Result<PathBuf> {
    let dir = match dir_override {
        Some(dir) => dir.to_path_buf(),
        None => dirs::config_dir()
            .ok_or_else(|| anyhow!("no config directory on this platform"))?
            .join("murmur"),
    };
    Ok(dir.join("settings.toml"))
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::Settings;

    #[test]
    fn roundtrip_through_disk() {
        let temp = tempdir().expect("tempdir");

        let mut settings = Settings::default();
        settings.transcription_api_key = "key_abc".to_string();
        settings.ai_enabled = false;
        settings.save(Some(temp.path())).expect("save settings");

        let loaded = Settings::load(Some(temp.path())).expect("load settings");
        assert_eq!(loaded, settings);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let temp = tempdir().expect("tempdir");
        let loaded = Settings::load(Some(temp.path())).expect("load settings");
        assert_eq!(loaded, Settings::default());
    }
}
