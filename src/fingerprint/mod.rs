//! Issue fingerprinting
//!
//! A fingerprint recognizes the same defect across builds. When the affected
//! source file can be read, the hash covers a window of lines around the
//! issue, so edits elsewhere in the file (which shift line numbers) do not
//! change it. Otherwise the hash falls back to the issue's descriptive
//! fields. Fingerprinting never fails: every problem degrades a single issue
//! to the fallback and is counted in [`FingerprintStats`].

use crate::cache::FileCache;
use crate::models::{Issue, Report};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::debug;

/// Lines above and below the issue line that make up the context window
pub const DEFAULT_CONTEXT_LINES: usize = 3;

/// What happened while fingerprinting one report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingerprintStats {
    /// Fingerprints computed from source context
    pub context: usize,
    /// Fingerprints computed from issue fields only
    pub fallback: usize,
    /// Issues that already carried a fingerprint
    pub preset: usize,
    pub not_found: usize,
    pub io_errors: usize,
    pub outside_workspace: usize,
    /// Line number missing or past the end of the file
    pub out_of_range: usize,
    pub deadline_exceeded: usize,
}

/// Why a context fingerprint could not be computed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Skip {
    NotFound,
    Io,
    OutsideWorkspace,
    OutOfRange,
    Deadline,
}

/// Assigns fingerprints to the issues of a report.
pub struct Fingerprinter {
    workspace: PathBuf,
    context_lines: usize,
    deadline: Option<Instant>,
    cache: FileCache,
}

impl Fingerprinter {
    pub fn new(workspace: impl Into<PathBuf>) -> Self {
        let workspace = workspace.into();
        let workspace = workspace.canonicalize().unwrap_or(workspace);
        Self {
            workspace,
            context_lines: DEFAULT_CONTEXT_LINES,
            deadline: None,
            cache: FileCache::new(),
        }
    }

    pub fn with_context_lines(mut self, context_lines: usize) -> Self {
        self.context_lines = context_lines;
        self
    }

    /// Stop reading source files once `deadline` has passed.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    /// Fingerprint every issue of `report` in place.
    ///
    /// Issues that already carry a fingerprint keep it.
    pub fn fingerprint_report(&self, report: &mut Report) -> FingerprintStats {
        let mut stats = FingerprintStats::default();
        for issue in report.issues.iter_mut() {
            if issue.has_fingerprint() {
                stats.preset += 1;
                continue;
            }
            issue.fingerprint = self.fingerprint(issue, &mut stats);
        }

        report.log_info(format!(
            "-> created fingerprints for {} issues ({} from source context, {} from issue properties, {} kept)",
            stats.context + stats.fallback,
            stats.context,
            stats.fallback,
            stats.preset
        ));
        if stats.not_found + stats.io_errors + stats.outside_workspace > 0 {
            report.log_info(format!(
                "-> source files: {} not found, {} with I/O error, {} outside of workspace",
                stats.not_found, stats.io_errors, stats.outside_workspace
            ));
        }
        if stats.io_errors > 0 {
            report.log_error(format!(
                "Can't read source code of {} issues: I/O error while reading the affected file",
                stats.io_errors
            ));
        }
        if stats.deadline_exceeded > 0 {
            report.log_info(format!(
                "-> read deadline exceeded, {} issues fingerprinted from issue properties",
                stats.deadline_exceeded
            ));
        }
        debug!(?stats, "Fingerprinting finished");
        stats
    }

    /// Compute the fingerprint of a single issue, recording the outcome in `stats`.
    pub fn fingerprint(&self, issue: &Issue, stats: &mut FingerprintStats) -> String {
        match self.try_context(issue) {
            Ok(fingerprint) => {
                stats.context += 1;
                fingerprint
            }
            Err(skip) => {
                match skip {
                    Skip::NotFound => stats.not_found += 1,
                    Skip::Io => stats.io_errors += 1,
                    Skip::OutsideWorkspace => stats.outside_workspace += 1,
                    Skip::OutOfRange => stats.out_of_range += 1,
                    Skip::Deadline => stats.deadline_exceeded += 1,
                }
                stats.fallback += 1;
                fallback_fingerprint(issue)
            }
        }
    }

    fn try_context(&self, issue: &Issue) -> Result<String, Skip> {
        if issue.file_name.is_empty() {
            return Err(Skip::NotFound);
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(Skip::Deadline);
            }
        }

        let path = self.resolve(&issue.file_name)?;
        let lines = self.cache.read_lines(&path).map_err(|e| {
            debug!("Cannot read {}: {}", path.display(), e);
            match e.kind() {
                io::ErrorKind::NotFound => Skip::NotFound,
                _ => Skip::Io,
            }
        })?;

        context_fingerprint(issue, &lines, self.context_lines).ok_or(Skip::OutOfRange)
    }

    /// Resolve a reported file name to a canonical path inside the workspace.
    fn resolve(&self, file_name: &str) -> Result<PathBuf, Skip> {
        let candidate = Path::new(file_name);
        let joined = if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            self.workspace.join(candidate)
        };
        let canonical = joined.canonicalize().map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => Skip::NotFound,
            _ => Skip::Io,
        })?;
        if !canonical.starts_with(&self.workspace) {
            return Err(Skip::OutsideWorkspace);
        }
        Ok(canonical)
    }
}

/// Hash of the whitespace-normalized lines around the issue plus its file, category and type.
///
/// Returns `None` when the issue line is not inside `lines` (line numbers are 1-based).
pub fn context_fingerprint(issue: &Issue, lines: &[String], context_lines: usize) -> Option<String> {
    let line = issue.line_start as usize;
    if line == 0 || line > lines.len() {
        return None;
    }
    let index = line - 1;
    let first = index.saturating_sub(context_lines);
    let last = index.saturating_add(context_lines).min(lines.len() - 1);

    let mut hasher = Sha256::new();
    hasher.update(b"context\0");
    hasher.update(issue.file_name.as_bytes());
    hasher.update(b"\0");
    hasher.update(issue.category.as_bytes());
    hasher.update(b"\0");
    hasher.update(issue.issue_type.as_bytes());
    for text in &lines[first..=last] {
        hasher.update(b"\n");
        hasher.update(normalize_whitespace(text).as_bytes());
    }
    Some(format!("{:x}", hasher.finalize()))
}

/// Hash of the issue's descriptive fields, used when no source is available.
pub fn fallback_fingerprint(issue: &Issue) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"fallback\0");
    for field in [
        &issue.file_name,
        &issue.package_name,
        &issue.category,
        &issue.issue_type,
        &issue.message,
    ] {
        hasher.update(field.as_bytes());
        hasher.update(b"\0");
    }
    format!("{:x}", hasher.finalize())
}

fn normalize_whitespace(line: &str) -> String {
    line.split_whitespace().collect::<Vec<_>>().join(" ")
}
