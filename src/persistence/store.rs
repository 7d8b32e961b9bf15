//! Profile storage backends

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::migration::{decode, encode};
use super::{PersistenceError, ProfileData};
use crate::highscores::now_ms;

/// Where profiles live. Injected into the run layer so tests can swap it.
pub trait ProfileStore {
    /// `Ok(None)` when the user has no save yet
    fn load(&mut self, username: &str) -> Result<Option<ProfileData>, PersistenceError>;
    fn save(&mut self, profile: &ProfileData) -> Result<(), PersistenceError>;

    /// Load, or start a fresh profile when there is no save or it is unreadable
    fn load_or_default(&mut self, username: &str) -> ProfileData {
        match self.load(username) {
            Ok(Some(profile)) => {
                log::info!("Loaded profile '{}'", username);
                profile
            }
            Ok(None) => {
                log::info!("No save for '{}', starting fresh", username);
                ProfileData::new(username)
            }
            Err(e) => {
                log::error!("Failed to load profile '{}': {}", username, e);
                ProfileData::new(username)
            }
        }
    }
}

/// One JSON file per user under a save directory
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
    /// Used to mint uids when migrating legacy saves
    rng: Pcg32,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            rng: Pcg32::seed_from_u64(now_ms()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Usernames are reduced to `[A-Za-z0-9_-]` for the file name
    pub fn path_for(&self, username: &str) -> PathBuf {
        let safe: String = username
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        let safe = if safe.is_empty() { "_".to_string() } else { safe };
        self.dir.join(format!("{safe}.json"))
    }
}

impl ProfileStore for FileStore {
    fn load(&mut self, username: &str) -> Result<Option<ProfileData>, PersistenceError> {
        let path = self.path_for(username);
        if !path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(&path)?;
        let mut profile = decode(&text, &mut self.rng)?;
        profile.username = username.to_string();
        Ok(Some(profile))
    }

    /// Writes to a temp file first so a crash never leaves a half-written save
    fn save(&mut self, profile: &ProfileData) -> Result<(), PersistenceError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(&profile.username);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, encode(profile)?)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

/// Keeps encoded saves in memory. Round-trips through the same envelope as
/// [`FileStore`].
#[derive(Debug)]
pub struct MemoryStore {
    saves: HashMap<String, String>,
    rng: Pcg32,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            saves: HashMap::new(),
            rng: Pcg32::seed_from_u64(0),
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a raw save, e.g. a legacy bare profile
    pub fn insert_raw(&mut self, username: &str, text: &str) {
        self.saves.insert(username.to_string(), text.to_string());
    }

    pub fn raw(&self, username: &str) -> Option<&str> {
        self.saves.get(username).map(String::as_str)
    }
}

impl ProfileStore for MemoryStore {
    fn load(&mut self, username: &str) -> Result<Option<ProfileData>, PersistenceError> {
        match self.saves.get(username) {
            Some(text) => decode(text, &mut self.rng).map(Some),
            None => Ok(None),
        }
    }

    fn save(&mut self, profile: &ProfileData) -> Result<(), PersistenceError> {
        let text = encode(profile)?;
        self.saves.insert(profile.username.clone(), text);
        Ok(())
    }
}
