//! # contract: data model and collaborator interfaces
//!
//! This module holds the plain data that flows through the pipeline
//! (`SourceFile` → `ProjectInfo` → `GenerationTask` → `DocumentationResult`) and the two
//! async seams to the outside world:
//!
//! - [`Generator`]: issues one documentation-generation call to an LLM provider.
//! - [`RepositoryClient`]: lists directories and downloads files of a hosted repository.
//!
//! ## Mocking & Testing
//! - Both traits are annotated for `mockall` so tests can script provider and repository
//!   behaviour without network access (enabled by the default `test-export-mocks` feature).
//!
//! ## Ownership
//! - `SourceFile`s are created once by ingestion and only read afterwards.
//! - `DocumentationResult`s are created exactly once per attempted task and never mutated,
//!   apart from the ranker reordering the collection that holds them.

use async_trait::async_trait;
use mockall::automock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use crate::error::{GenerationError, RemoteError};

/// One retained project file. `path` is repo-relative with forward slashes and
/// `content` is already truncated to the ingestion character ceiling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    pub path: String,
    pub content: String,
    pub language: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectInfo {
    pub name: String,
    pub file_count: usize,
    pub languages: BTreeSet<String>,
    pub framework: String,
    pub structure: ProjectStructure,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package_info: Option<PackageInfo>,
    pub api_endpoints: Vec<ApiEndpoint>,
    pub data_flow_info: DataFlowInfo,
    pub test_files: Vec<String>,
    pub config_files: Vec<String>,
    pub ui_files: Vec<String>,
    pub security_files: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectStructure {
    pub directories: BTreeSet<String>,
    pub files: Vec<FileEntry>,
    pub depth: usize,
    pub key_files: Vec<KeyFile>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub size: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyFile {
    pub path: String,
    pub purpose: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Fields read from a `package.json`-style manifest. Every field is optional; unknown
/// fields are ignored and a manifest that does not parse is treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub scripts: BTreeMap<String, String>,
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,
    #[serde(default)]
    pub dev_dependencies: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub framework: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiEndpoint {
    pub method: String,
    pub path: String,
    pub description: String,
    pub file: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataFlowInfo {
    pub presentation_layer: Vec<String>,
    pub application_layer: Vec<String>,
    pub data_layer: Vec<String>,
}

/// One `(provider, model)` unit of fan-out work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationTask {
    pub provider_name: String,
    pub model_name: String,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentationResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
    pub model_used: String,
    pub provider_used: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub generation_time_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_count: Option<u64>,
}

impl DocumentationResult {
    pub fn succeeded(task: &GenerationTask, documentation: String, elapsed: Duration) -> Self {
        let token_count = estimate_tokens(&documentation);
        Self {
            success: true,
            documentation: Some(documentation),
            model_used: task.model_name.clone(),
            provider_used: task.provider_name.clone(),
            error: None,
            generation_time_ms: elapsed.as_millis() as u64,
            token_count: Some(token_count),
        }
    }

    pub fn failed(task: &GenerationTask, error: &GenerationError, elapsed: Duration) -> Self {
        Self {
            success: false,
            documentation: None,
            model_used: task.model_name.clone(),
            provider_used: task.provider_name.clone(),
            error: Some(error.to_string()),
            generation_time_ms: elapsed.as_millis() as u64,
            token_count: None,
        }
    }
}

/// Rough token estimate used for comparing outputs across providers: one token per four
/// characters, rounded up.
pub fn estimate_tokens(text: &str) -> u64 {
    (text.chars().count() as u64).div_ceil(4)
}

/// A single generation call as seen by a [`Generator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub provider: String,
    pub model: String,
    pub prompt: String,
    pub max_output_tokens: u32,
    /// Budget the caller will enforce; implementations should pass it to their transport.
    pub timeout: Duration,
}

/// Issues documentation-generation calls against LLM providers.
///
/// Implementations map transport and API failures onto [`GenerationError`] so the
/// orchestrator can tell transient failures from terminal ones.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, request: GenerationRequest) -> Result<String, GenerationError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteEntryKind {
    File,
    Dir,
    #[serde(other)]
    Other,
}

/// One entry of a remote directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteEntry {
    #[serde(rename = "type")]
    pub kind: RemoteEntryKind,
    pub name: String,
    #[serde(default)]
    pub size: u64,
    /// Raw download location for files.
    #[serde(default)]
    pub download_url: Option<String>,
    /// API location used to list a sub-directory.
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryListing {
    pub entries: Vec<RemoteEntry>,
    /// Value of the provider's rate-limit-remaining header, if it sent one.
    pub rate_limit_remaining: Option<u32>,
}

/// Read access to a hosted repository.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait RepositoryClient: Send + Sync {
    /// API root listing URL for `owner/repo`.
    fn contents_url(&self, owner: &str, repo: &str) -> String;

    async fn list_directory(&self, url: &str) -> Result<DirectoryListing, RemoteError>;

    async fn fetch_file(&self, url: &str) -> Result<String, RemoteError>;
}
