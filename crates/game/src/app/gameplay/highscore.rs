use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use engine::write_json_atomic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HighScoreError {
    #[error("failed to read high score file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse high score file {path} at {field}: {message}")]
    Parse {
        path: PathBuf,
        field: String,
        message: String,
    },
    #[error("failed to write high score file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// External key-value slot holding the best score across runs.
pub trait HighScoreStore {
    fn load(&mut self) -> Result<u32, HighScoreError>;
    fn save(&mut self, score: u32) -> Result<(), HighScoreError>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryHighScores {
    value: u32,
    saves: u32,
}

impl MemoryHighScores {
    pub fn with_value(value: u32) -> Self {
        Self { value, saves: 0 }
    }

    pub fn value(&self) -> u32 {
        self.value
    }

    pub fn save_count(&self) -> u32 {
        self.saves
    }
}

impl HighScoreStore for MemoryHighScores {
    fn load(&mut self) -> Result<u32, HighScoreError> {
        Ok(self.value)
    }

    fn save(&mut self, score: u32) -> Result<(), HighScoreError> {
        self.value = score;
        self.saves = self.saves.saturating_add(1);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
struct HighScoreRecord {
    high_score: u32,
}

/// `{"high_score": N}` on disk. A missing file reads as zero.
#[derive(Debug, Clone)]
pub struct JsonFileHighScores {
    path: PathBuf,
}

impl JsonFileHighScores {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HighScoreStore for JsonFileHighScores {
    fn load(&mut self) -> Result<u32, HighScoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(source) => {
                return Err(HighScoreError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        let mut deserializer = serde_json::Deserializer::from_str(&raw);
        let record: HighScoreRecord = serde_path_to_error::deserialize(&mut deserializer)
            .map_err(|err| HighScoreError::Parse {
                path: self.path.clone(),
                field: err.path().to_string(),
                message: err.inner().to_string(),
            })?;
        Ok(record.high_score)
    }

    fn save(&mut self, score: u32) -> Result<(), HighScoreError> {
        write_json_atomic(&self.path, &HighScoreRecord { high_score: score }).map_err(|source| {
            HighScoreError::Write {
                path: self.path.clone(),
                source,
            }
        })
    }
}
