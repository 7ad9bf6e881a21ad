//! README prompt rendering.
//!
//! The section order is fixed (project information, structure tree, key files, package
//! information, API endpoints, source excerpts, requested README sections) so every
//! provider is asked exactly the same question.

use std::fmt;

use crate::contract::{ProjectInfo, SourceFile};
use crate::language;

const MAX_TREE_ENTRIES: usize = 50;
const MAX_KEY_FILE_PREVIEWS: usize = 8;
const KEY_FILE_PREVIEW_CHARS: usize = 200;
const MAX_LISTED_DEPENDENCIES: usize = 10;

/// Second, tighter truncation pass applied when rendering source excerpts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptLimits {
    pub max_files: usize,
    pub max_chars_per_file: usize,
}

impl Default for PromptLimits {
    fn default() -> Self {
        Self {
            max_files: 12,
            max_chars_per_file: 800,
        }
    }
}

impl PromptLimits {
    /// Scale the per-file excerpt to a model's output budget: an eighth of the token budget
    /// in characters, kept between 400 and 1600.
    pub fn for_output_budget(max_tokens: u32) -> Self {
        Self {
            max_chars_per_file: (max_tokens as usize / 8).clamp(400, 1600),
            ..Self::default()
        }
    }
}

/// Render the prompt. Pure and deterministic for a given input.
pub fn build_prompt(project: &ProjectInfo, files: &[SourceFile], limits: PromptLimits) -> String {
    Prompt { project, files, limits }.to_string()
}

struct Prompt<'a> {
    project: &'a ProjectInfo,
    files: &'a [SourceFile],
    limits: PromptLimits,
}

impl fmt::Display for Prompt<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let project = self.project;
        let excerpted = self.files.len().min(self.limits.max_files);

        f.write_str(
            "You are a technical documentation expert. Analyze the following project and \
             generate a comprehensive README in Markdown.\n\n",
        )?;

        writeln!(f, "## Project Information")?;
        writeln!(f, "- **Name**: {}", project.name)?;
        writeln!(f, "- **Framework**: {}", project.framework)?;
        let languages: Vec<&str> = project.languages.iter().map(String::as_str).collect();
        writeln!(f, "- **Languages**: {}", languages.join(", "))?;
        writeln!(f, "- **Files Analyzed**: {excerpted}")?;
        writeln!(f, "- **Total Files**: {}", project.file_count)?;
        writeln!(f, "- **Directories**: {}", project.structure.directories.len())?;
        writeln!(f, "- **Project Depth**: {} levels\n", project.structure.depth)?;

        writeln!(f, "## Project Structure\n```\n{}\n```\n", structure_tree(project))?;

        self.write_key_files(f)?;
        self.write_package(f)?;

        if !project.api_endpoints.is_empty() {
            writeln!(f, "## Detected API Endpoints")?;
            for endpoint in &project.api_endpoints {
                writeln!(f, "- `{} {}` in {}", endpoint.method, endpoint.path, endpoint.file)?;
            }
            writeln!(f)?;
        }

        writeln!(f, "## Source Code Analysis")?;
        for file in self.files.iter().take(self.limits.max_files) {
            let fence = language::extension_of(&file.path)
                .map(|e| e.trim_start_matches('.').to_string())
                .unwrap_or_default();
            writeln!(
                f,
                "### File: {} ({})\n```{}\n{}\n```\n",
                file.path,
                file.language,
                fence,
                crate::ingest::truncate_chars(&file.content, self.limits.max_chars_per_file)
            )?;
        }

        writeln!(f, "Write the README with these sections, in this order:\n")?;
        writeln!(f, "# {}\n", project.name)?;
        for (index, section) in README_SECTIONS.iter().enumerate() {
            writeln!(f, "{}. {section}", index + 1)?;
        }
        f.write_str(
            "\nMake the documentation professional, clear and actionable. Focus on practical \
             information that helps developers understand, set up and contribute to the project.\n",
        )
    }
}

impl Prompt<'_> {
    fn write_key_files(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key_files = &self.project.structure.key_files;
        writeln!(f, "## Key Files")?;
        if key_files.is_empty() {
            writeln!(f, "None identified.")?;
        }
        for key in key_files.iter().take(MAX_KEY_FILE_PREVIEWS) {
            let preview = self
                .files
                .iter()
                .find(|file| file.path == key.path)
                .map(|file| crate::ingest::truncate_chars(&file.content, KEY_FILE_PREVIEW_CHARS).replace('\n', " "))
                .unwrap_or_default();
            writeln!(f, "- **{}** ({}, {}): {}...", key.path, key.kind, key.purpose, preview.trim())?;
        }
        writeln!(f)
    }

    fn write_package(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "## Package Information")?;
        let Some(package) = &self.project.package_info else {
            writeln!(f, "No package manifest found.")?;
            return writeln!(f);
        };
        writeln!(f, "- **Version**: {}", package.version.as_deref().unwrap_or("Not specified"))?;
        writeln!(
            f,
            "- **Description**: {}",
            package.description.as_deref().unwrap_or("Not specified")
        )?;
        let dependencies: Vec<&str> = package
            .dependencies
            .keys()
            .take(MAX_LISTED_DEPENDENCIES)
            .map(String::as_str)
            .collect();
        let dependencies = if dependencies.is_empty() {
            "Not specified".to_string()
        } else {
            dependencies.join(", ")
        };
        writeln!(f, "- **Main Dependencies**: {dependencies}")?;
        if !package.scripts.is_empty() {
            writeln!(f, "- **Scripts**:")?;
            for (name, command) in &package.scripts {
                writeln!(f, "  - `npm run {name}`: {command}")?;
            }
        }
        writeln!(f)
    }
}

const README_SECTIONS: &[&str] = &[
    "Project Overview: what the project does and why it exists.",
    "Architecture & Design: high-level architecture, patterns and organisation.",
    "Technologies Used: frameworks, libraries, languages and tools.",
    "Project Structure: explain the directory layout shown above.",
    "Page/Component Explanations: what each key file does.",
    "Setup & Installation: prerequisites, installation, configuration, running locally.",
    "Available Scripts: the commands to run, build and test the project.",
    "Deployment & Production: build process, deployment options, environment setup, monitoring.",
    "Development: code structure, workflow and how to run tests.",
    "API Documentation and Contributing: document interfaces if applicable, then contribution guidelines.",
];

/// Directories and retained files merged, sorted by path, indented two spaces per level.
pub fn structure_tree(project: &ProjectInfo) -> String {
    let mut entries: Vec<(&str, bool)> = project
        .structure
        .directories
        .iter()
        .map(|d| (d.as_str(), true))
        .chain(project.structure.files.iter().map(|f| (f.path.as_str(), false)))
        .collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    entries.dedup_by(|a, b| a.0 == b.0);

    let mut lines: Vec<String> = entries
        .iter()
        .take(MAX_TREE_ENTRIES)
        .map(|(path, is_dir)| {
            let depth = path.matches('/').count();
            let name = crate::ingest::file_name(path);
            let suffix = if *is_dir { "/" } else { "" };
            format!("{}{name}{suffix}", "  ".repeat(depth))
        })
        .collect();
    if entries.len() > MAX_TREE_ENTRIES {
        lines.push("... and more files".to_string());
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_scaling_is_clamped() {
        assert_eq!(PromptLimits::for_output_budget(1000).max_chars_per_file, 400);
        assert_eq!(PromptLimits::for_output_budget(8000).max_chars_per_file, 1000);
        assert_eq!(PromptLimits::for_output_budget(128_000).max_chars_per_file, 1600);
    }
}
