//! Persisted progress counters
//!
//! Features:
//! - Two integers survive between runs: best zone reached and banked echoes
//! - JSON file store with write-to-tmp then rename
//! - In-memory store for tests and headless runs
//! - Missing or corrupt saves load as fresh progress

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Counters loaded once at startup and handed to the game state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistentProgress {
    pub best_zone: u32,
    pub banked: u64,
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("progress file i/o failed: {0}")]
    Io(#[from] io::Error),
    #[error("progress file is not valid json: {0}")]
    Json(#[from] serde_json::Error),
}

pub trait ProgressStore {
    fn load(&self) -> Result<PersistentProgress, PersistenceError>;
    fn save(&mut self, progress: &PersistentProgress) -> Result<(), PersistenceError>;

    /// Load, falling back to fresh progress on any failure
    fn load_or_default(&self) -> PersistentProgress {
        match self.load() {
            Ok(progress) => {
                log::info!(
                    "loaded progress: best zone {}, {} echoes banked",
                    progress.best_zone,
                    progress.banked
                );
                progress
            }
            Err(err) => {
                log::warn!("starting with fresh progress: {err}");
                PersistentProgress::default()
            }
        }
    }
}

/// Progress stored as a JSON document on disk
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        self.path.with_extension("tmp")
    }
}

impl ProgressStore for JsonFileStore {
    fn load(&self) -> Result<PersistentProgress, PersistenceError> {
        let json = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&json)?)
    }

    fn save(&mut self, progress: &PersistentProgress) -> Result<(), PersistenceError> {
        if let Some(dir) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(progress)?;
        let tmp = self.tmp_path();
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        log::debug!("saved progress to {}", self.path.display());
        Ok(())
    }
}

/// Non-persistent store; `load` fails until something is saved
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    saved: Option<PersistentProgress>,
    writes: u32,
}

impl MemoryStore {
    pub fn with(progress: PersistentProgress) -> Self {
        Self {
            saved: Some(progress),
            writes: 0,
        }
    }

    pub fn writes(&self) -> u32 {
        self.writes
    }
}

impl ProgressStore for MemoryStore {
    fn load(&self) -> Result<PersistentProgress, PersistenceError> {
        self.saved.ok_or_else(|| {
            PersistenceError::Io(io::Error::new(io::ErrorKind::NotFound, "nothing saved yet"))
        })
    }

    fn save(&mut self, progress: &PersistentProgress) -> Result<(), PersistenceError> {
        self.saved = Some(*progress);
        self.writes += 1;
        Ok(())
    }
}
