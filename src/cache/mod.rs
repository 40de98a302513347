//! Source file caching for the fingerprinter
//!
//! Several issues usually point into the same file, so lines are read once
//! per file and shared.

pub mod paths;

use dashmap::DashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub use paths::{get_cache_dir, get_history_path};

/// Source line cache keyed by absolute path
#[derive(Clone)]
pub struct FileCache {
    lines: Arc<DashMap<PathBuf, Arc<Vec<String>>>>,
}

impl FileCache {
    pub fn new() -> Self {
        Self {
            lines: Arc::new(DashMap::new()),
        }
    }

    /// Get file lines (cached).
    ///
    /// Invalid UTF-8 is replaced rather than rejected. Failed reads are not cached.
    pub fn read_lines(&self, path: &Path) -> io::Result<Arc<Vec<String>>> {
        if let Some(lines) = self.lines.get(path) {
            return Ok(Arc::clone(&lines));
        }

        let bytes = std::fs::read(path)?;
        let content = String::from_utf8_lossy(&bytes);
        let lines: Vec<String> = content.lines().map(String::from).collect();
        let arc = Arc::new(lines);
        self.lines.insert(path.to_path_buf(), Arc::clone(&arc));
        Ok(arc)
    }

    /// Number of cached files
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl Default for FileCache {
    fn default() -> Self {
        Self::new()
    }
}
