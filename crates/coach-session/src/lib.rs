//! Player profile and workout history persistence.
//!
//! One TOML file per profile under the platform data dir. The core pipeline
//! knows nothing about this; the host records a `SessionRecord` when a
//! workout ends.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::info;

/// Reps per level; finishing enough total reps promotes the profile.
const REPS_PER_LEVEL: u32 = 100;

/// Outcome of one workout session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Unix seconds at session start.
    pub started_unix: u64,
    pub duration_secs: f32,
    /// Exercise identifier, e.g. "squat".
    pub exercise: String,
    pub reps: u32,
    /// Form warnings emitted during the session.
    pub warnings: u32,
}

impl SessionRecord {
    pub fn started_now(exercise: &str) -> Self {
        let started_unix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self {
            started_unix,
            duration_secs: 0.0,
            exercise: exercise.to_string(),
            reps: 0,
            warnings: 0,
        }
    }
}

/// A player and their workout history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub level: u32,
    pub history: Vec<SessionRecord>,
}

impl Profile {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            level: 1,
            history: Vec::new(),
        }
    }

    /// Append a finished session and recompute the level.
    pub fn record_session(&mut self, record: SessionRecord) {
        info!(
            profile = %self.name,
            reps = record.reps,
            warnings = record.warnings,
            "Session recorded"
        );
        self.history.push(record);
        self.level = 1 + self.total_reps() / REPS_PER_LEVEL;
    }

    pub fn total_reps(&self) -> u32 {
        self.history.iter().map(|s| s.reps).sum()
    }
}

/// Loads and saves a profile at a fixed path.
pub struct ProfileStore {
    path: PathBuf,
}

impl ProfileStore {
    /// Store under the platform data dir, e.g.
    /// `~/.local/share/sportcoach/<name>.toml`.
    pub fn for_profile(name: &str) -> Result<Self> {
        let dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?
            .join("sportcoach");
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            path: dir.join(format!("{name}.toml")),
        })
    }

    /// Store at an explicit path (used by tests).
    pub fn at(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Load the profile, or create a fresh one if none exists yet.
    pub fn load_or_create(&self, name: &str) -> Result<Profile> {
        if self.path.exists() {
            let contents = std::fs::read_to_string(&self.path)?;
            let profile: Profile = toml::from_str(&contents)?;
            info!(path = ?self.path, sessions = profile.history.len(), "Loaded profile");
            Ok(profile)
        } else {
            info!(%name, "No profile found, creating");
            Ok(Profile::new(name))
        }
    }

    pub fn save(&self, profile: &Profile) -> Result<()> {
        let contents = toml::to_string_pretty(profile)?;
        std::fs::write(&self.path, contents)?;
        info!(path = ?self.path, "Saved profile");
        Ok(())
    }
}
