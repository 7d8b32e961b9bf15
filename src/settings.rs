//! Runtime settings
//!
//! Stored as JSON next to the saves. A missing or unreadable file never
//! stops the game: every load falls back to defaults.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::consts::{MAX_FRAME_DT, VIEWPORT_HEIGHT, VIEWPORT_WIDTH};
use crate::persistence::{DEFAULT_USERNAME, PersistenceError, STARTING_WORLD};

/// Camera size in world units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: VIEWPORT_WIDTH,
            height: VIEWPORT_HEIGHT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Profile to load and save
    pub username: String,
    /// Directory holding profile saves
    pub save_dir: PathBuf,
    /// World to start runs in
    pub world_id: String,
    /// Fixed run seed. Time-derived when unset.
    pub seed: Option<u64>,
    /// Longest frame delta the simulation will integrate
    pub max_frame_dt: f32,
    /// Pick in-run shop upgrades at random instead of waiting for input
    pub auto_select_upgrade: bool,
    pub viewport: Viewport,
    /// Headless driver stops the run after this much simulated time
    pub max_run_seconds: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            username: DEFAULT_USERNAME.to_string(),
            save_dir: PathBuf::from("saves"),
            world_id: STARTING_WORLD.to_string(),
            seed: None,
            max_frame_dt: MAX_FRAME_DT,
            auto_select_upgrade: true,
            viewport: Viewport::default(),
            max_run_seconds: 600.0,
        }
    }
}

impl Settings {
    /// Read settings from `path`, or defaults when the file is missing or bad
    pub fn load(path: &Path) -> Self {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No settings at {}, using defaults", path.display());
                return Self::default();
            }
            Err(e) => {
                log::warn!("Could not read settings {}: {}", path.display(), e);
                return Self::default();
            }
        };
        match serde_json::from_str::<Self>(&text) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings.sanitized()
            }
            Err(e) => {
                log::warn!("Ignoring malformed settings {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), PersistenceError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        log::info!("Settings saved");
        Ok(())
    }

    /// Replace values the simulation cannot run with
    fn sanitized(mut self) -> Self {
        if !(self.max_frame_dt > 0.0) {
            log::warn!("max_frame_dt must be positive, using {}", MAX_FRAME_DT);
            self.max_frame_dt = MAX_FRAME_DT;
        }
        if !(self.viewport.width > 0.0 && self.viewport.height > 0.0) {
            log::warn!("Viewport must be non-empty, using the default");
            self.viewport = Viewport::default();
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("wave-survivor-settings-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = scratch_dir("missing");
        assert_eq!(Settings::load(&dir.join("settings.json")), Settings::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = scratch_dir("roundtrip");
        let path = dir.join("settings.json");
        let settings = Settings {
            username: "ada".into(),
            seed: Some(7),
            auto_select_upgrade: false,
            ..Settings::default()
        };
        settings.save(&path).expect("save settings");
        assert_eq!(Settings::load(&path), settings);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_partial_and_malformed_files() {
        let dir = scratch_dir("partial");
        fs::create_dir_all(&dir).expect("create dir");
        let path = dir.join("settings.json");

        fs::write(&path, r#"{"world_id":"ice","max_frame_dt":-1.0}"#).expect("write");
        let loaded = Settings::load(&path);
        assert_eq!(loaded.world_id, "ice");
        assert_eq!(loaded.max_frame_dt, MAX_FRAME_DT);
        assert_eq!(loaded.username, DEFAULT_USERNAME);

        fs::write(&path, "not json").expect("write");
        assert_eq!(Settings::load(&path), Settings::default());
        let _ = fs::remove_dir_all(&dir);
    }
}
