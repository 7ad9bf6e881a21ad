//! Project ingestion: turn an uploaded file set, a ZIP archive or a remote repository into
//! the canonical `(files, projectInfo)` pair.
//!
//! All three variants share one [`Collector`], so the bounding policy is applied the same
//! way regardless of where bytes come from:
//!
//! - paths are normalised to relative forward-slash form, `..` segments are refused
//! - any path under a deny-listed directory is ignored
//! - unsupported extensions are skipped
//! - files at or above the byte ceiling are skipped before their content is read
//! - retained content is truncated to `max_content_chars`
//! - once the file cap is reached, further files are ignored
//!
//! An ingestion that retains nothing fails with [`IngestError::NoSupportedFiles`].

pub mod archive;
pub mod local;
pub mod remote;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use tracing::{debug, info};

use crate::analyze;
use crate::contract::{FileEntry, PackageInfo, ProjectInfo, ProjectStructure, RepositoryClient, SourceFile};
use crate::error::IngestError;
use crate::language;

pub use local::collect_directory;

/// Directory names never descended into, matched against every path segment.
pub const DENIED_DIRECTORIES: &[&str] = &[
    "node_modules",
    ".git",
    ".next",
    "dist",
    "build",
    ".vscode",
    "__pycache__",
    "target",
    ".venv",
    "venv",
];

const MANIFEST_FILE: &str = "package.json";
const DEFAULT_PROJECT_NAME: &str = "Uploaded Project";

/// Resource bounds applied while ingesting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestLimits {
    /// Local and archive files of this many bytes or more are skipped.
    pub max_file_bytes: u64,
    /// Remote files of this many bytes or more are skipped before download.
    pub max_remote_file_bytes: u64,
    pub max_content_chars: usize,
    pub max_files: usize,
    pub max_remote_files: usize,
    pub max_files_per_directory: usize,
    pub max_directory_depth: usize,
}

impl Default for IngestLimits {
    fn default() -> Self {
        Self {
            max_file_bytes: 20_000,
            max_remote_file_bytes: 100_000,
            max_content_chars: 8_000,
            max_files: 100,
            max_remote_files: 50,
            max_files_per_directory: 15,
            max_directory_depth: 8,
        }
    }
}

/// Where the content of an uploaded file lives. Disk-backed content is only read after the
/// size check passed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileContent {
    Bytes(Vec<u8>),
    Disk(PathBuf),
}

impl FileContent {
    pub fn len(&self) -> std::io::Result<u64> {
        match self {
            FileContent::Bytes(bytes) => Ok(bytes.len() as u64),
            FileContent::Disk(path) => Ok(std::fs::metadata(path)?.len()),
        }
    }

    pub fn is_empty(&self) -> std::io::Result<bool> {
        Ok(self.len()? == 0)
    }

    pub fn read(self) -> std::io::Result<Vec<u8>> {
        match self {
            FileContent::Bytes(bytes) => Ok(bytes),
            FileContent::Disk(path) => std::fs::read(path),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub path: String,
    pub content: FileContent,
}

impl UploadedFile {
    pub fn from_bytes(path: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            content: FileContent::Bytes(bytes.into()),
        }
    }
}

/// The three accepted input shapes.
#[derive(Debug, Clone)]
pub enum ProjectSource {
    Uploaded(Vec<UploadedFile>),
    Archive { name: Option<String>, bytes: Vec<u8> },
    Repository { url: String },
}

impl ProjectSource {
    pub fn kind(&self) -> &'static str {
        match self {
            ProjectSource::Uploaded(_) => "uploaded",
            ProjectSource::Archive { .. } => "archive",
            ProjectSource::Repository { .. } => "repository",
        }
    }
}

/// Result of a successful ingestion.
#[derive(Debug, Clone)]
pub struct Ingested {
    pub files: Vec<SourceFile>,
    pub project: ProjectInfo,
    /// Non-fatal problems worth surfacing to the user, e.g. partial remote traversal.
    pub warnings: Vec<String>,
}

/// Ingest any source. `repository` is only consulted for [`ProjectSource::Repository`].
pub async fn ingest(
    source: ProjectSource,
    limits: &IngestLimits,
    repository: &dyn RepositoryClient,
) -> Result<Ingested, IngestError> {
    let kind = source.kind();
    info!(source = kind, "[INGEST] Starting ingestion");
    let ingested = match source {
        ProjectSource::Uploaded(files) => local::ingest_uploaded(files, limits)?,
        ProjectSource::Archive { name, bytes } => archive::ingest_archive(name, &bytes, limits)?,
        ProjectSource::Repository { url } => remote::ingest_repository(&url, limits, repository).await?,
    };
    info!(
        source = kind,
        project = %ingested.project.name,
        files = ingested.files.len(),
        warnings = ingested.warnings.len(),
        "[INGEST] Ingestion finished"
    );
    Ok(ingested)
}

/// Normalise a raw path to relative forward-slash form.
/// Returns `None` for empty paths and for paths that try to escape with `..`.
pub fn normalize_path(raw: &str) -> Option<String> {
    let replaced = raw.replace('\\', "/");
    let mut segments = Vec::new();
    for segment in replaced.split('/') {
        match segment {
            "" | "." => continue,
            ".." => return None,
            other => segments.push(other),
        }
    }
    if segments.is_empty() {
        None
    } else {
        Some(segments.join("/"))
    }
}

pub fn is_denied_directory(name: &str) -> bool {
    DENIED_DIRECTORIES.contains(&name)
}

/// True when any segment of a normalised path is a deny-listed directory.
pub fn is_denied_path(path: &str) -> bool {
    path.split('/').any(is_denied_directory)
}

/// Keep at most `max_chars` characters, never splitting a code point.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}

/// Read the interesting fields of a `package.json`. Anything that is not a JSON object is
/// treated as an absent manifest. `author` may be a string or an object with `name`.
pub fn parse_manifest(text: &str) -> Option<PackageInfo> {
    let value: Value = serde_json::from_str(text).ok()?;
    let object = value.as_object()?;
    let string = |key: &str| object.get(key).and_then(Value::as_str).map(str::to_string);
    let map = |key: &str| -> BTreeMap<String, String> {
        object
            .get(key)
            .and_then(Value::as_object)
            .map(|m| {
                m.iter()
                    .filter_map(|(k, v)| v.as_str().map(|v| (k.clone(), v.to_string())))
                    .collect()
            })
            .unwrap_or_default()
    };
    let author = match object.get("author") {
        Some(Value::String(name)) => Some(name.clone()),
        Some(Value::Object(fields)) => fields.get("name").and_then(Value::as_str).map(str::to_string),
        _ => None,
    };
    Some(PackageInfo {
        name: string("name").filter(|n| !n.trim().is_empty()),
        version: string("version"),
        description: string("description"),
        scripts: map("scripts"),
        dependencies: map("dependencies"),
        dev_dependencies: map("devDependencies"),
        author,
        license: string("license"),
        framework: None,
    })
}

/// A file that passed every pre-read check and may now have its content loaded.
#[derive(Debug)]
pub(crate) struct Admitted {
    path: String,
    language: String,
}

impl Admitted {
    pub(crate) fn path(&self) -> &str {
        &self.path
    }
}

/// Accumulates files for one ingestion pass and enforces the shared bounding policy.
pub(crate) struct Collector<'a> {
    limits: &'a IngestLimits,
    max_files: usize,
    files: Vec<SourceFile>,
    entries: Vec<FileEntry>,
    directories: BTreeSet<String>,
    observed: Vec<String>,
    manifest: Option<(usize, PackageInfo)>,
    warnings: Vec<String>,
}

impl<'a> Collector<'a> {
    pub(crate) fn new(limits: &'a IngestLimits, max_files: usize) -> Self {
        Self {
            limits,
            max_files,
            files: Vec::new(),
            entries: Vec::new(),
            directories: BTreeSet::new(),
            observed: Vec::new(),
            manifest: None,
            warnings: Vec::new(),
        }
    }

    pub(crate) fn is_full(&self) -> bool {
        self.files.len() >= self.max_files
    }

    pub(crate) fn len(&self) -> usize {
        self.files.len()
    }

    pub(crate) fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Record a directory and all of its ancestors.
    pub(crate) fn register_directory(&mut self, raw: &str) {
        let Some(path) = normalize_path(raw) else {
            return;
        };
        if is_denied_path(&path) {
            return;
        }
        let mut prefix = String::new();
        for segment in path.split('/') {
            if !prefix.is_empty() {
                prefix.push('/');
            }
            prefix.push_str(segment);
            self.directories.insert(prefix.clone());
        }
    }

    /// Decide whether a file may be read. `size` is checked against `ceiling` here so the
    /// content is never loaded for oversized files.
    pub(crate) fn admit(&mut self, raw: &str, size: u64, ceiling: u64) -> Option<Admitted> {
        let path = normalize_path(raw)?;
        if is_denied_path(&path) {
            debug!(path = %path, reason = "denied directory", "[INGEST] Skipping file");
            return None;
        }
        self.observed.push(path.clone());
        if let Some((parent, _)) = path.rsplit_once('/') {
            let parent = parent.to_string();
            self.register_directory(&parent);
        }
        if self.is_full() {
            debug!(path = %path, reason = "file cap reached", "[INGEST] Skipping file");
            return None;
        }
        let Some(extension) = language::extension_of(&path) else {
            debug!(path = %path, reason = "no extension", "[INGEST] Skipping file");
            return None;
        };
        let language = match language::classify(&extension) {
            language::Classification::Supported(label) => label.to_string(),
            language::Classification::Unsupported => {
                debug!(path = %path, reason = "unsupported extension", "[INGEST] Skipping file");
                return None;
            }
        };
        if size >= ceiling {
            debug!(path = %path, size, ceiling, reason = "too large", "[INGEST] Skipping file");
            return None;
        }
        Some(Admitted { path, language })
    }

    /// Store an admitted file. Invalid UTF-8 is replaced rather than rejected.
    pub(crate) fn accept(&mut self, admitted: Admitted, bytes: &[u8]) {
        if self.is_full() {
            return;
        }
        let text = String::from_utf8_lossy(bytes);
        if file_name(&admitted.path) == MANIFEST_FILE {
            self.offer_manifest(&admitted.path, &text);
        }
        let extension = language::extension_of(&admitted.path).unwrap_or_default();
        self.entries.push(FileEntry {
            path: admitted.path.clone(),
            kind: extension.trim_start_matches('.').to_string(),
            size: bytes.len(),
        });
        self.files.push(SourceFile {
            path: admitted.path,
            content: truncate_chars(&text, self.limits.max_content_chars),
            language: admitted.language,
        });
    }

    fn offer_manifest(&mut self, path: &str, text: &str) {
        let Some(info) = parse_manifest(text) else {
            debug!(path = %path, "[INGEST] Ignoring manifest that does not parse");
            return;
        };
        let depth = path.split('/').count();
        match &self.manifest {
            Some((best, _)) if *best <= depth => {}
            _ => self.manifest = Some((depth, info)),
        }
    }

    /// Build the final result. `fallback_name` is used unless a manifest supplies a name.
    pub(crate) fn finish(self, fallback_name: String) -> Result<Ingested, IngestError> {
        if self.files.is_empty() {
            return Err(IngestError::NoSupportedFiles);
        }
        let mut package_info = self.manifest.map(|(_, info)| info);
        let name = package_info
            .as_ref()
            .and_then(|p| p.name.clone())
            .unwrap_or(fallback_name);
        let languages = self.files.iter().map(|f| f.language.clone()).collect();

        let analysis = analyze::analyze(&self.files, package_info.as_ref(), &self.observed, &self.directories);
        if let Some(info) = package_info.as_mut() {
            info.framework = Some(analysis.framework.clone());
        }

        let mut project = ProjectInfo {
            name,
            file_count: self.files.len(),
            languages,
            structure: ProjectStructure {
                directories: self.directories,
                files: self.entries,
                depth: 0,
                key_files: Vec::new(),
            },
            package_info,
            ..ProjectInfo::default()
        };
        analysis.apply_to(&mut project);

        Ok(Ingested {
            files: self.files,
            project,
            warnings: self.warnings,
        })
    }
}

pub(crate) fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

pub(crate) fn default_project_name() -> String {
    DEFAULT_PROJECT_NAME.to_string()
}
