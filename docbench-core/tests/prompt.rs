use docbench_core::contract::{FileEntry, KeyFile, PackageInfo, ProjectInfo, ProjectStructure, SourceFile};
use docbench_core::prompt::{build_prompt, structure_tree, PromptLimits};
use std::collections::BTreeMap;

fn project() -> ProjectInfo {
    ProjectInfo {
        name: "demo".into(),
        file_count: 2,
        languages: ["JavaScript".to_string()].into_iter().collect(),
        framework: "Express.js".into(),
        structure: ProjectStructure {
            directories: ["src".to_string()].into_iter().collect(),
            files: vec![
                FileEntry {
                    path: "src/index.js".into(),
                    kind: "js".into(),
                    size: 10,
                },
                FileEntry {
                    path: "package.json".into(),
                    kind: "json".into(),
                    size: 10,
                },
            ],
            depth: 1,
            key_files: vec![KeyFile {
                path: "src/index.js".into(),
                purpose: "Main application entry point".into(),
                kind: "Entry Point".into(),
            }],
        },
        package_info: Some(PackageInfo {
            version: Some("1.2.3".into()),
            scripts: BTreeMap::from([("start".to_string(), "node src/index.js".to_string())]),
            dependencies: BTreeMap::from([("express".to_string(), "^4".to_string())]),
            ..PackageInfo::default()
        }),
        ..ProjectInfo::default()
    }
}

fn files() -> Vec<SourceFile> {
    vec![
        SourceFile {
            path: "src/index.js".into(),
            content: "const express = require('express');\n".repeat(100),
            language: "JavaScript".into(),
        },
        SourceFile {
            path: "package.json".into(),
            content: "{}".into(),
            language: "JSON".into(),
        },
    ]
}

#[test]
fn test_sections_appear_in_fixed_order() {
    let prompt = build_prompt(&project(), &files(), PromptLimits::default());
    let order = [
        "## Project Information",
        "## Project Structure",
        "## Key Files",
        "## Package Information",
        "## Source Code Analysis",
        "# demo",
    ];
    let positions: Vec<usize> = order
        .iter()
        .map(|heading| prompt.find(heading).unwrap_or_else(|| panic!("missing {heading}")))
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]), "{positions:?}");
    assert!(prompt.contains("`npm run start`: node src/index.js"));
    assert!(prompt.contains("- **Version**: 1.2.3"));
    assert!(prompt.contains("```js"));
}

#[test]
fn test_source_excerpts_respect_limits() {
    let limits = PromptLimits {
        max_files: 1,
        max_chars_per_file: 40,
    };
    let prompt = build_prompt(&project(), &files(), limits);
    assert!(prompt.contains("### File: src/index.js"));
    assert!(!prompt.contains("### File: package.json"));
    let excerpts = &prompt[prompt.find("## Source Code Analysis").unwrap()..];
    assert_eq!(excerpts.matches("require('express')").count(), 1);
}

#[test]
fn test_prompt_is_deterministic() {
    let a = build_prompt(&project(), &files(), PromptLimits::default());
    let b = build_prompt(&project(), &files(), PromptLimits::default());
    assert_eq!(a, b);
}

#[test]
fn test_structure_tree_indents_and_truncates() {
    let mut info = project();
    let tree = structure_tree(&info);
    assert_eq!(tree, "package.json\nsrc/\n  index.js");

    info.structure.files = (0..60)
        .map(|i| FileEntry {
            path: format!("f{i:02}.js"),
            kind: "js".into(),
            size: 1,
        })
        .collect();
    let tree = structure_tree(&info);
    assert_eq!(tree.lines().count(), 51);
    assert!(tree.ends_with("... and more files"));
}
