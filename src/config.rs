use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::engine::EngineSettings;
use crate::geometry::{Playfield, Size};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub target_width: u16,
    pub target_height: u16,
    /// Rows reserved for the status bar above the playfield
    pub header_rows: u16,
    /// Where exported result files go; the working directory when unset
    pub export_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target_width: 10,
            target_height: 3,
            header_rows: 3,
            export_dir: None,
        }
    }
}

impl Config {
    /// Engine settings for a terminal of `width` x `height` cells
    pub fn engine_settings(&self, width: u16, height: u16) -> EngineSettings {
        EngineSettings {
            playfield: self.playfield(width, height),
            target_size: Size::new(i32::from(self.target_width), i32::from(self.target_height)),
        }
    }

    pub fn playfield(&self, width: u16, height: u16) -> Playfield {
        Playfield::new(i32::from(width), i32::from(height), i32::from(self.header_rows))
    }

    pub fn export_dir(&self) -> PathBuf {
        self.export_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "flinch") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("flinch_config.json")
        };
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
    fn load(&self) -> Config {
        match fs::read(&self.path) {
            Ok(bytes) => serde_json::from_slice::<Config>(&bytes).unwrap_or_else(|err| {
                log::warn!("ignoring unreadable config {}: {err}", self.path.display());
                Config::default()
            }),
            Err(_) => Config::default(),
        }
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)
    }
}
