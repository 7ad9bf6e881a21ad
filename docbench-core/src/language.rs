//! Extension to language classification.
//!
//! The supported set and the label table are the same table: an extension is supported
//! exactly when it has an entry here. Labels for anything else are still derivable with
//! [`language_label`] so callers can describe a file they are about to skip.

/// Verdict for a single file extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Supported(&'static str),
    Unsupported,
}

const LANGUAGES: &[(&str, &str)] = &[
    (".js", "JavaScript"),
    (".jsx", "React/JSX"),
    (".ts", "TypeScript"),
    (".tsx", "React/TypeScript"),
    (".py", "Python"),
    (".java", "Java"),
    (".cpp", "C++"),
    (".c", "C"),
    (".cs", "C#"),
    (".php", "PHP"),
    (".rb", "Ruby"),
    (".go", "Go"),
    (".rs", "Rust"),
    (".swift", "Swift"),
    (".kt", "Kotlin"),
    (".scala", "Scala"),
    (".html", "HTML"),
    (".css", "CSS"),
    (".scss", "SCSS"),
    (".vue", "Vue.js"),
    (".svelte", "Svelte"),
    (".md", "Markdown"),
    (".json", "JSON"),
    (".yaml", "YAML"),
    (".yml", "YAML"),
    (".xml", "XML"),
    (".sql", "SQL"),
];

/// Classify an extension (with or without the leading dot, any case).
pub fn classify(extension: &str) -> Classification {
    let ext = normalize(extension);
    LANGUAGES
        .iter()
        .find(|(known, _)| *known == ext)
        .map(|(_, label)| Classification::Supported(label))
        .unwrap_or(Classification::Unsupported)
}

/// Human label for any extension. Unknown extensions map to the uppercased extension
/// without its dot, e.g. `.toml` -> `TOML`.
pub fn language_label(extension: &str) -> String {
    match classify(extension) {
        Classification::Supported(label) => label.to_string(),
        Classification::Unsupported => normalize(extension)
            .trim_start_matches('.')
            .to_uppercase(),
    }
}

pub fn is_supported(extension: &str) -> bool {
    matches!(classify(extension), Classification::Supported(_))
}

/// Extension of the last path segment including the dot, lowercased.
/// Returns `None` for names without a dot and for dotfiles such as `.env`.
pub fn extension_of(path: &str) -> Option<String> {
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rfind('.') {
        Some(0) | None => None,
        Some(idx) => Some(name[idx..].to_lowercase()),
    }
}

fn normalize(extension: &str) -> String {
    let lower = extension.trim().to_lowercase();
    if lower.starts_with('.') {
        lower
    } else {
        format!(".{lower}")
    }
}
