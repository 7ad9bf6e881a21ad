//! Structural heuristics over an ingested file set.
//!
//! Everything here is best-effort: names and paths are matched against fixed keyword
//! tables and route registrations are found with regexes, so false negatives are expected.
//! Nothing in this module fails; missing input just yields empty fields.

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

use crate::contract::{ApiEndpoint, DataFlowInfo, KeyFile, PackageInfo, ProjectInfo, SourceFile};
use crate::language;

pub const MAX_KEY_FILES: usize = 15;
pub const MAX_ENDPOINTS: usize = 10;
pub const MAX_LAYER_FILES: usize = 10;
pub const MAX_ROLE_FILES: usize = 10;

/// Dependency name to framework, checked in order before any filename rule.
const DEPENDENCY_FRAMEWORKS: &[(&str, &str)] = &[
    ("next", "Next.js"),
    ("react", "React"),
    ("vue", "Vue.js"),
    ("svelte", "Svelte"),
    ("@angular/core", "Angular"),
    ("express", "Express.js"),
    ("fastapi", "FastAPI"),
    ("django", "Django"),
    ("flask", "Flask"),
    ("spring-boot", "Spring Boot"),
];

/// Filename fragment to framework or toolchain.
const FILE_FRAMEWORKS: &[(&str, &str)] = &[
    ("next.config", "Next.js"),
    ("nuxt.config", "Nuxt.js"),
    ("vite.config", "Vite"),
    ("webpack.config", "Webpack"),
    ("requirements.txt", "Python"),
    ("pom.xml", "Maven/Java"),
    ("cargo.toml", "Rust/Cargo"),
    ("go.mod", "Go"),
    ("package.json", "Node.js"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    FileName,
    Path,
}

struct KeyFileRule {
    category: &'static str,
    purpose: &'static str,
    target: Target,
    needles: &'static [&'static str],
}

const KEY_FILE_RULES: &[KeyFileRule] = &[
    KeyFileRule {
        category: "Entry Point",
        purpose: "Main application entry point",
        target: Target::FileName,
        needles: &["main.", "index.", "app."],
    },
    KeyFileRule {
        category: "Page/Route",
        purpose: "Application page or route handler",
        target: Target::Path,
        needles: &["page", "route", "view"],
    },
    KeyFileRule {
        category: "Component",
        purpose: "Reusable UI component",
        target: Target::Path,
        needles: &["component"],
    },
    KeyFileRule {
        category: "Model",
        purpose: "Data model or schema definition",
        target: Target::Path,
        needles: &["model", "schema"],
    },
    KeyFileRule {
        category: "Controller/Service",
        purpose: "Business logic and API handling",
        target: Target::Path,
        needles: &["controller", "service"],
    },
    KeyFileRule {
        category: "Configuration",
        purpose: "Application configuration",
        target: Target::FileName,
        needles: &["config", "setting"],
    },
    KeyFileRule {
        category: "Utility",
        purpose: "Utility functions and helpers",
        target: Target::Path,
        needles: &["util", "helper", "lib"],
    },
    KeyFileRule {
        category: "Database",
        purpose: "Database operations and schema management",
        target: Target::Path,
        needles: &["db", "database", "migration"],
    },
    KeyFileRule {
        category: "Security",
        purpose: "Authentication and security management",
        target: Target::Path,
        needles: &["auth", "security", "permission", "role"],
    },
];

const PRESENTATION_PATHS: &[&str] = &["component", "page", "view", "ui", "screen", "template"];
const PRESENTATION_EXTENSIONS: &[&str] = &[".jsx", ".tsx", ".vue", ".svelte", ".html"];
const APPLICATION_PATHS: &[&str] = &[
    "controller", "service", "handler", "middleware", "util", "helper", "business", "logic",
];
const DATA_PATHS: &[&str] = &[
    "model", "entity", "repository", "dao", "db", "database", "schema", "migration", "query",
];

const TEST_NAMES: &[&str] = &["test", "spec"];
const CONFIG_NAMES: &[&str] = &["config", "setting", ".env", "docker", "webpack", "babel"];
const UI_PATHS: &[&str] = &["component", "view", "page", "screen", "ui"];
const UI_EXTENSIONS: &[&str] = &[".jsx", ".tsx", ".vue", ".svelte", ".html", ".css", ".scss"];
const SECURITY_PATHS: &[&str] = &["auth", "security", "permission", "role", "login", "password"];

/// A route registration pattern and the capture groups holding method and path.
struct EndpointPattern {
    regex: Regex,
    method_group: usize,
    path_group: usize,
}

static ENDPOINT_PATTERNS: LazyLock<Vec<EndpointPattern>> = LazyLock::new(|| {
    let build = |pattern: &str, method_group, path_group| EndpointPattern {
        regex: Regex::new(pattern).expect("endpoint pattern is valid"),
        method_group,
        path_group,
    };
    vec![
        build(r#"app\.(get|post|put|delete|patch)\s*\(\s*['"`]([^'"`]+)['"`]"#, 1, 2),
        build(r#"router\.(get|post|put|delete|patch)\s*\(\s*['"`]([^'"`]+)['"`]"#, 1, 2),
        build(r#"@(get|post|put|delete|patch)\s*\(\s*['"`]([^'"`]+)['"`]"#, 1, 2),
        build(r#"route\s*\(\s*['"`]([^'"`]+)['"`].*?(get|post|put|delete|patch)"#, 2, 1),
    ]
});

/// Derived structural fields for a [`ProjectInfo`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Analysis {
    pub framework: String,
    pub depth: usize,
    pub key_files: Vec<KeyFile>,
    pub api_endpoints: Vec<ApiEndpoint>,
    pub data_flow: DataFlowInfo,
    pub test_files: Vec<String>,
    pub config_files: Vec<String>,
    pub ui_files: Vec<String>,
    pub security_files: Vec<String>,
}

impl Analysis {
    pub fn apply_to(self, project: &mut ProjectInfo) {
        project.framework = self.framework;
        project.structure.depth = self.depth;
        project.structure.key_files = self.key_files;
        project.api_endpoints = self.api_endpoints;
        project.data_flow_info = self.data_flow;
        project.test_files = self.test_files;
        project.config_files = self.config_files;
        project.ui_files = self.ui_files;
        project.security_files = self.security_files;
    }
}

/// Analyse retained files. `observed_paths` includes files that were seen but not retained
/// (unsupported extension, too large). They still count as framework evidence and feed the
/// test/config/ui/security role lists, so `.env` or `Dockerfile` show up as config files.
pub fn analyze(
    files: &[SourceFile],
    manifest: Option<&PackageInfo>,
    observed_paths: &[String],
    directories: &BTreeSet<String>,
) -> Analysis {
    Analysis {
        framework: detect_framework(manifest, observed_paths, files),
        depth: directory_depth(directories),
        key_files: identify_key_files(files),
        api_endpoints: extract_api_endpoints(files),
        data_flow: classify_data_flow(files),
        test_files: collect_role(observed_paths, is_test_file),
        config_files: collect_role(observed_paths, is_config_file),
        ui_files: collect_role(observed_paths, is_ui_file),
        security_files: collect_role(observed_paths, is_security_file),
    }
}

pub fn detect_framework(manifest: Option<&PackageInfo>, observed_paths: &[String], files: &[SourceFile]) -> String {
    if let Some(info) = manifest {
        let declared = |name: &str| info.dependencies.contains_key(name) || info.dev_dependencies.contains_key(name);
        if let Some((_, framework)) = DEPENDENCY_FRAMEWORKS.iter().find(|(dep, _)| declared(dep)) {
            return framework.to_string();
        }
    }
    if manifest.is_none() && observed_paths.is_empty() && files.is_empty() {
        return "Unknown".to_string();
    }
    let names: Vec<String> = observed_paths
        .iter()
        .map(String::as_str)
        .chain(files.iter().map(|f| f.path.as_str()))
        .map(|p| crate::ingest::file_name(p).to_lowercase())
        .collect();
    FILE_FRAMEWORKS
        .iter()
        .find(|(needle, _)| names.iter().any(|name| name.contains(needle)))
        .map(|(_, framework)| framework.to_string())
        .unwrap_or_else(|| "Custom".to_string())
}

pub fn directory_depth(directories: &BTreeSet<String>) -> usize {
    directories
        .iter()
        .map(|d| d.split('/').filter(|s| !s.is_empty()).count())
        .max()
        .unwrap_or(0)
        .max(1)
}

pub fn identify_key_files(files: &[SourceFile]) -> Vec<KeyFile> {
    files
        .iter()
        .filter_map(|file| {
            let path = file.path.to_lowercase();
            let name = crate::ingest::file_name(&path).to_string();
            KEY_FILE_RULES
                .iter()
                .find(|rule| {
                    let haystack = match rule.target {
                        Target::FileName => &name,
                        Target::Path => &path,
                    };
                    contains_any(haystack, rule.needles)
                })
                .map(|rule| KeyFile {
                    path: file.path.clone(),
                    purpose: rule.purpose.to_string(),
                    kind: rule.category.to_string(),
                })
        })
        .take(MAX_KEY_FILES)
        .collect()
}

pub fn extract_api_endpoints(files: &[SourceFile]) -> Vec<ApiEndpoint> {
    let mut endpoints = Vec::new();
    for file in files {
        let content = file.content.to_lowercase();
        for pattern in ENDPOINT_PATTERNS.iter() {
            for captures in pattern.regex.captures_iter(&content) {
                if endpoints.len() >= MAX_ENDPOINTS {
                    return endpoints;
                }
                let path = &captures[pattern.path_group];
                if path.contains("function") || path.contains("const") {
                    continue;
                }
                let method = captures[pattern.method_group].to_uppercase();
                endpoints.push(ApiEndpoint {
                    description: format!("{method} endpoint"),
                    method,
                    path: path.to_string(),
                    file: file.path.clone(),
                });
            }
        }
    }
    endpoints
}

pub fn classify_data_flow(files: &[SourceFile]) -> DataFlowInfo {
    let mut flow = DataFlowInfo::default();
    for file in files {
        let path = file.path.to_lowercase();
        let extension = language::extension_of(&path).unwrap_or_default();
        let layer = if contains_any(&path, PRESENTATION_PATHS) || PRESENTATION_EXTENSIONS.contains(&extension.as_str()) {
            &mut flow.presentation_layer
        } else if contains_any(&path, APPLICATION_PATHS) {
            &mut flow.application_layer
        } else if contains_any(&path, DATA_PATHS) {
            &mut flow.data_layer
        } else {
            continue;
        };
        if layer.len() < MAX_LAYER_FILES {
            layer.push(file.path.clone());
        }
    }
    flow
}

fn collect_role(paths: &[String], matches: fn(&str, &str) -> bool) -> Vec<String> {
    paths
        .iter()
        .filter(|original| {
            let path = original.to_lowercase();
            let name = crate::ingest::file_name(&path).to_string();
            matches(&path, &name)
        })
        .take(MAX_ROLE_FILES)
        .cloned()
        .collect()
}

fn is_test_file(path: &str, name: &str) -> bool {
    contains_any(name, TEST_NAMES) || path.contains("test")
}

fn is_config_file(_path: &str, name: &str) -> bool {
    contains_any(name, CONFIG_NAMES)
}

fn is_ui_file(path: &str, _name: &str) -> bool {
    let extension = language::extension_of(path).unwrap_or_default();
    contains_any(path, UI_PATHS) || UI_EXTENSIONS.contains(&extension.as_str())
}

fn is_security_file(path: &str, _name: &str) -> bool {
    contains_any(path, SECURITY_PATHS)
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}
