use docbench_core::analyze::{
    analyze, classify_data_flow, detect_framework, directory_depth, extract_api_endpoints, identify_key_files,
};
use docbench_core::contract::{PackageInfo, SourceFile};
use std::collections::{BTreeMap, BTreeSet};

fn source(path: &str, content: &str) -> SourceFile {
    SourceFile {
        path: path.to_string(),
        content: content.to_string(),
        language: "JavaScript".to_string(),
    }
}

fn manifest_with(deps: &[&str]) -> PackageInfo {
    PackageInfo {
        dependencies: deps.iter().map(|d| (d.to_string(), "1.0.0".to_string())).collect::<BTreeMap<_, _>>(),
        ..PackageInfo::default()
    }
}

#[test]
fn test_dependency_rules_beat_file_rules_in_priority_order() {
    let files = vec![source("vite.config.js", "")];
    let observed = vec!["vite.config.js".to_string()];
    let manifest = manifest_with(&["react", "next"]);
    assert_eq!(detect_framework(Some(&manifest), &observed, &files), "Next.js");

    let plain = manifest_with(&["lodash"]);
    assert_eq!(detect_framework(Some(&plain), &observed, &files), "Vite");
}

#[test]
fn test_framework_fallbacks() {
    assert_eq!(detect_framework(None, &[], &[]), "Unknown");
    let files = vec![source("src/lib.rs", "")];
    assert_eq!(detect_framework(None, &["src/lib.rs".to_string()], &files), "Custom");
    let observed = vec!["Cargo.toml".to_string(), "src/lib.rs".to_string()];
    assert_eq!(detect_framework(None, &observed, &files), "Rust/Cargo");
}

#[test]
fn test_key_files_take_first_matching_category() {
    let files = vec![
        source("src/index.js", ""),
        source("src/pages/about.jsx", ""),
        source("src/components/Nav.jsx", ""),
        source("src/models/user.js", ""),
        source("src/services/billing.js", ""),
        source("webpack.config.js", ""),
        source("src/utils/format.js", ""),
        source("src/db/connection.js", ""),
        source("src/auth/jwt.js", ""),
        source("docs/notes.md", ""),
    ];
    let keys = identify_key_files(&files);
    let kinds: Vec<&str> = keys.iter().map(|k| k.kind.as_str()).collect();
    assert_eq!(
        kinds,
        vec![
            "Entry Point",
            "Page/Route",
            "Component",
            "Model",
            "Controller/Service",
            "Configuration",
            "Utility",
            "Database",
            "Security",
        ]
    );
    assert_eq!(keys[1].purpose, "Application page or route handler");
}

#[test]
fn test_key_files_are_capped() {
    let files: Vec<SourceFile> = (0..40).map(|i| source(&format!("c/components/c{i}.js"), "")).collect();
    assert_eq!(identify_key_files(&files).len(), 15);
}

#[test]
fn test_endpoint_patterns_extract_method_and_path() {
    let files = vec![
        source(
            "server.js",
            "app.get('/users', list);\nrouter.POST(\"/orders\", create);\napp.get(`${function}`, x);",
        ),
        source("api.py", "@app.route('/items', methods=['GET'])\n@delete('/items/1')"),
    ];
    let endpoints = extract_api_endpoints(&files);
    let pairs: Vec<(&str, &str)> = endpoints.iter().map(|e| (e.method.as_str(), e.path.as_str())).collect();
    assert!(pairs.contains(&("GET", "/users")));
    assert!(pairs.contains(&("POST", "/orders")));
    assert!(pairs.contains(&("GET", "/items")));
    assert!(pairs.contains(&("DELETE", "/items/1")));
    assert!(!pairs.iter().any(|(_, p)| p.contains("function")));
    assert!(endpoints.iter().all(|e| e.description == format!("{} endpoint", e.method)));
}

#[test]
fn test_endpoints_are_capped_at_ten() {
    let body: String = (0..25).map(|i| format!("app.post('/r{i}', h);\n")).collect();
    let files = vec![source("routes.js", &body)];
    assert_eq!(extract_api_endpoints(&files).len(), 10);
}

#[test]
fn test_data_flow_layers_are_disjoint() {
    let files = vec![
        source("src/components/Card.tsx", ""),
        source("src/services/payment.ts", ""),
        source("src/models/order.ts", ""),
        source("README.md", ""),
    ];
    let flow = classify_data_flow(&files);
    assert_eq!(flow.presentation_layer, vec!["src/components/Card.tsx"]);
    assert_eq!(flow.application_layer, vec!["src/services/payment.ts"]);
    assert_eq!(flow.data_layer, vec!["src/models/order.ts"]);
}

#[test]
fn test_depth_has_floor_of_one() {
    assert_eq!(directory_depth(&BTreeSet::new()), 1);
    let dirs: BTreeSet<String> = ["a", "a/b", "a/b/c"].iter().map(|s| s.to_string()).collect();
    assert_eq!(directory_depth(&dirs), 3);
}

#[test]
fn test_role_lists_include_files_that_were_not_retained() {
    let files = vec![
        source("tests/api.test.js", ""),
        source(".env.example.json", ""),
        source("src/styles/main.css", ""),
        source("src/auth/login.js", ""),
    ];
    let observed: Vec<String> = [
        "tests/api.test.js",
        ".env",
        ".env.example.json",
        "Dockerfile",
        "src/styles/main.css",
        "src/auth/login.js",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    let analysis = analyze(&files, None, &observed, &BTreeSet::new());
    assert_eq!(analysis.test_files, vec!["tests/api.test.js"]);
    assert_eq!(analysis.config_files, vec![".env", ".env.example.json", "Dockerfile"]);
    assert_eq!(analysis.ui_files, vec!["src/styles/main.css"]);
    assert_eq!(analysis.security_files, vec!["src/auth/login.js"]);
}
