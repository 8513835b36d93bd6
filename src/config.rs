use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;
use crate::error::Result;
use crate::samples::Difficulty;
use crate::sound::SoundSettings;
use crate::theme::Palette;
use crate::typing::DEFAULT_DURATION_SECS;

/// User preferences, cached best-effort between runs
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub duration_secs: u32,
    pub difficulty: Difficulty,
    pub sound: SoundSettings,
    pub palette: Palette,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            duration_secs: DEFAULT_DURATION_SECS,
            difficulty: Difficulty::default(),
            sound: SoundSettings::default(),
            palette: Palette::default(),
        }
    }
}

impl Config {
    /// Coerces out-of-range values to their defaults.
    pub fn sanitized(self) -> Self {
        Self {
            duration_secs: if self.duration_secs == 0 {
                DEFAULT_DURATION_SECS
            } else {
                self.duration_secs
            },
            difficulty: self.difficulty,
            sound: self.sound.sanitized(),
            palette: self.palette.sanitized(),
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        let path = AppDirs::config_path().unwrap_or_else(|| PathBuf::from("keysprint_config.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    /// Missing or unreadable preferences silently become defaults.
    fn load(&self) -> Config {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(_) => return Config::default(),
        };
        match serde_json::from_slice::<Config>(&bytes) {
            Ok(cfg) => cfg.sanitized(),
            Err(err) => {
                tracing::warn!(path = %self.path.display(), error = %err, "ignoring corrupt preferences");
                Config::default()
            }
        }
    }

    fn save(&self, cfg: &Config) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}
