//! Cache path utilities - run history lives in ~/.cache/warngate/<name>-<hash>/

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Get the cache directory for a workspace.
/// Uses ~/.cache/warngate/<workspace-hash>/ on Unix, %LOCALAPPDATA%/warngate/<workspace-hash>/ on Windows.
pub fn get_cache_dir(workspace: &Path) -> PathBuf {
    let workspace_hash = hash_path(workspace);

    let base = if cfg!(windows) {
        std::env::var("LOCALAPPDATA")
            .map(PathBuf::from)
            .unwrap_or_else(|_| dirs::cache_dir().unwrap_or_else(|| PathBuf::from(".")))
    } else {
        dirs::cache_dir().unwrap_or_else(|| {
            dirs::home_dir()
                .map(|h| h.join(".cache"))
                .unwrap_or_else(|| PathBuf::from("."))
        })
    };

    base.join("warngate").join(&workspace_hash)
}

/// Default location of the persisted run history for a workspace.
pub fn get_history_path(workspace: &Path) -> PathBuf {
    get_cache_dir(workspace).join("history.json")
}

/// Hash a path to create a unique but deterministic directory name.
fn hash_path(path: &Path) -> String {
    let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    let path_str = canonical.to_string_lossy();

    let digest = Sha256::digest(path_str.as_bytes());
    let hex: String = digest.iter().take(6).map(|b| format!("{:02x}", b)).collect();

    // Canonical file_name keeps "." readable
    let name = canonical
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("workspace")
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '-' || *c == '_')
        .take(20)
        .collect::<String>();

    format!("{}-{}", name, hex)
}
