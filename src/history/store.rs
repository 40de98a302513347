//! JSON persistence of the run history

use super::BuildHistory;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("Failed to access history at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("History file {path} is corrupt: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize history: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type HistoryResult<T> = std::result::Result<T, HistoryError>;

/// Run history kept in a single JSON file.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the history; a missing file is an empty history.
    pub fn load(&self) -> HistoryResult<BuildHistory> {
        if !self.path.exists() {
            debug!("No history at {}, starting empty", self.path.display());
            return Ok(BuildHistory::new());
        }
        let content = std::fs::read_to_string(&self.path).map_err(|source| HistoryError::Io {
            path: self.path.clone(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| HistoryError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    /// Write the history, replacing the file atomically.
    pub fn save(&self, history: &BuildHistory) -> HistoryResult<()> {
        let io_err = |source: std::io::Error| HistoryError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(history)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(io_err)?;
        std::fs::rename(&tmp, &self.path).map_err(io_err)?;
        debug!("Saved history to {}", self.path.display());
        Ok(())
    }
}
