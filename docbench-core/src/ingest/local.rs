//! Uploaded file sets, plus a directory walker that produces one from local disk.

use std::fs::DirEntry;
use std::path::Path;
use tracing::{debug, info, warn};

use super::{default_project_name, is_denied_directory, Collector, FileContent, IngestLimits, Ingested, UploadedFile};
use crate::error::IngestError;
use crate::language::{extension_of, is_supported};

/// Ingest a flat list of `(relative path, content)` pairs.
///
/// The project name is the first segment of the first multi-segment path (browsers upload
/// a folder as `folder/...`), unless a manifest declares one.
pub fn ingest_uploaded(files: Vec<UploadedFile>, limits: &IngestLimits) -> Result<Ingested, IngestError> {
    let fallback_name = files
        .first()
        .and_then(|f| super::normalize_path(&f.path))
        .and_then(|p| p.split_once('/').map(|(root, _)| root.to_string()))
        .unwrap_or_else(default_project_name);

    let mut collector = Collector::new(limits, limits.max_files);
    let total = files.len();
    for file in files {
        if collector.is_full() {
            debug!(remaining = total - collector.len(), "[INGEST] File cap reached, ignoring rest");
            break;
        }
        let size = match file.content.len() {
            Ok(size) => size,
            Err(e) => {
                warn!(path = %file.path, error = %e, "[INGEST] Could not stat file, skipping");
                continue;
            }
        };
        let Some(admitted) = collector.admit(&file.path, size, limits.max_file_bytes) else {
            continue;
        };
        match file.content.read() {
            Ok(bytes) => collector.accept(admitted, &bytes),
            Err(e) => warn!(path = %admitted.path(), error = %e, "[INGEST] Could not read file, skipping"),
        }
    }
    collector.finish(fallback_name)
}

/// Stop walking once this many candidate source files have been collected, as a multiple of
/// `max_files`. Some candidates are still dropped later by the size ceiling.
const SOURCE_CANDIDATE_FACTOR: usize = 4;
/// Bound on every collected file, supported or not, as a multiple of `max_files`.
const ENTRY_FACTOR: usize = 20;

/// Walk `root` into an uploaded-file set. Paths are prefixed with the root folder's name,
/// the way a browser folder upload presents them. Deny-listed directories are pruned and
/// file contents are left on disk until ingestion decides to read them.
///
/// Symbolic links are never followed. Directories deeper than `max_directory_depth` are not
/// entered, and the walk stops early once enough files have been seen for `max_files`.
/// Only an unreadable `root` is an error; anything below it is logged and skipped.
pub fn collect_directory(root: &Path, limits: &IngestLimits) -> Result<Vec<UploadedFile>, IngestError> {
    let prefix = root
        .canonicalize()?
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(default_project_name);
    let entries = read_sorted(root)?;

    let mut walk = Walk {
        limits,
        files: Vec::new(),
        source_candidates: 0,
    };
    walk.visit_entries(entries, &prefix, 0);
    info!(
        root = %root.display(),
        files = walk.files.len(),
        truncated = walk.is_exhausted(),
        "[INGEST] Collected local directory"
    );
    Ok(walk.files)
}

/// Entries that cannot be read are logged and dropped; only opening `dir` itself can fail.
fn read_sorted(dir: &Path) -> std::io::Result<Vec<DirEntry>> {
    let mut entries: Vec<DirEntry> = std::fs::read_dir(dir)?
        .filter_map(|entry| {
            entry
                .map_err(|e| warn!(dir = %dir.display(), error = %e, "[INGEST] Could not read entry, skipping"))
                .ok()
        })
        .collect();
    entries.sort_by_key(|e| e.file_name());
    Ok(entries)
}

struct Walk<'a> {
    limits: &'a IngestLimits,
    files: Vec<UploadedFile>,
    source_candidates: usize,
}

impl Walk<'_> {
    fn is_exhausted(&self) -> bool {
        let max_files = self.limits.max_files.max(1);
        self.source_candidates >= max_files.saturating_mul(SOURCE_CANDIDATE_FACTOR)
            || self.files.len() >= max_files.saturating_mul(ENTRY_FACTOR)
    }

    /// `depth` is the depth of the directory holding `entries`; the root is 0.
    fn visit_entries(&mut self, entries: Vec<DirEntry>, relative: &str, depth: usize) {
        for entry in entries {
            if self.is_exhausted() {
                debug!(dir = %relative, "[INGEST] Walk bound reached, ignoring rest");
                return;
            }
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().into_owned();
            let child = format!("{relative}/{name}");
            let file_type = match entry.file_type() {
                Ok(file_type) => file_type,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "[INGEST] Could not stat entry, skipping");
                    continue;
                }
            };

            if file_type.is_symlink() {
                debug!(path = %path.display(), "Skipping symbolic link");
            } else if file_type.is_dir() {
                if is_denied_directory(&name) {
                    debug!(path = %path.display(), "Skipping directory");
                    continue;
                }
                if depth + 1 >= self.limits.max_directory_depth {
                    debug!(path = %path.display(), "[INGEST] Depth limit reached, not descending");
                    continue;
                }
                match read_sorted(&path) {
                    Ok(children) => self.visit_entries(children, &child, depth + 1),
                    Err(e) => warn!(path = %path.display(), error = %e, "[INGEST] Could not read directory, skipping"),
                }
            } else if file_type.is_file() {
                if extension_of(&name).is_some_and(|ext| is_supported(&ext)) {
                    self.source_candidates += 1;
                }
                self.files.push(UploadedFile {
                    path: child,
                    content: FileContent::Disk(path),
                });
            }
        }
    }
}
