use docbench_core::contract::MockRepositoryClient;
use docbench_core::error::IngestError;
use docbench_core::ingest::local::ingest_uploaded;
use docbench_core::ingest::{collect_directory, ingest, FileContent, IngestLimits, ProjectSource, UploadedFile};
use std::collections::BTreeSet;
use std::fs;
use tempfile::tempdir;

fn upload(files: &[(&str, &str)]) -> Vec<UploadedFile> {
    files
        .iter()
        .map(|(path, content)| UploadedFile::from_bytes(*path, content.as_bytes().to_vec()))
        .collect()
}

#[tokio::test]
async fn test_uploaded_set_excludes_dependency_directories() {
    let files = upload(&[
        ("index.js", "console.log('hi')"),
        ("README.md", "# Demo"),
        ("node_modules/x.js", "module.exports = 1"),
    ]);
    let repository = MockRepositoryClient::new();

    let ingested = ingest(ProjectSource::Uploaded(files), &IngestLimits::default(), &repository)
        .await
        .expect("ingestion should succeed");

    assert_eq!(ingested.project.file_count, 2);
    assert_eq!(ingested.files.len(), 2);
    assert!(ingested.files.iter().all(|f| !f.path.contains("node_modules")));
    let expected: BTreeSet<String> = ["JavaScript", "Markdown"].iter().map(|s| s.to_string()).collect();
    assert_eq!(ingested.project.languages, expected);
    assert!(ingested.warnings.is_empty());
}

#[test]
fn test_manifest_name_overrides_folder_name() {
    let files = upload(&[
        ("my-folder/src/app.js", "const x = 1;"),
        ("my-folder/package.json", r#"{"name":"foo","dependencies":{"express":"^4"}}"#),
    ]);
    let ingested = ingest_uploaded(files, &IngestLimits::default()).unwrap();
    assert_eq!(ingested.project.name, "foo");
    assert_eq!(ingested.project.framework, "Express.js");
    let package = ingested.project.package_info.as_ref().unwrap();
    assert_eq!(package.framework.as_deref(), Some("Express.js"));
}

#[test]
fn test_folder_name_used_without_manifest_and_bad_manifest_is_ignored() {
    let files = upload(&[
        ("my-folder/src/app.js", "const x = 1;"),
        ("my-folder/package.json", "{ this is not json"),
    ]);
    let ingested = ingest_uploaded(files, &IngestLimits::default()).unwrap();
    assert_eq!(ingested.project.name, "my-folder");
    assert!(ingested.project.package_info.is_none());
}

#[test]
fn test_only_unsupported_files_is_fatal() {
    let files = upload(&[("Cargo.lock", "x"), ("logo.png", "x"), ("node_modules/a.js", "x")]);
    let result = ingest_uploaded(files, &IngestLimits::default());
    assert!(matches!(result, Err(IngestError::NoSupportedFiles)));
}

#[test]
fn test_caps_hold_for_every_retained_file() {
    let limits = IngestLimits {
        max_files: 5,
        max_content_chars: 50,
        ..IngestLimits::default()
    };
    let long = "x".repeat(500);
    let files: Vec<UploadedFile> = (0..20)
        .map(|i| UploadedFile::from_bytes(format!("p/src/f{i}.ts"), long.clone().into_bytes()))
        .collect();
    let ingested = ingest_uploaded(files, &limits).unwrap();
    assert_eq!(ingested.files.len(), 5);
    assert!(ingested.files.iter().all(|f| f.content.chars().count() <= 50));
    assert_eq!(ingested.project.file_count, ingested.files.len());
}

#[test]
fn test_oversized_files_are_skipped_not_truncated() {
    let big = "a".repeat(25_000);
    let files = upload(&[("p/big.js", big.as_str()), ("p/small.js", "let a;")]);
    let ingested = ingest_uploaded(files, &IngestLimits::default()).unwrap();
    let paths: Vec<&str> = ingested.files.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(paths, vec!["p/small.js"]);
}

#[test]
fn test_collect_directory_prunes_denied_and_keeps_content_on_disk() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("webapp");
    fs::create_dir_all(root.join("src/components")).unwrap();
    fs::create_dir_all(root.join("node_modules/react")).unwrap();
    fs::create_dir_all(root.join(".git")).unwrap();
    fs::write(root.join("src/index.tsx"), "export default function App() {}").unwrap();
    fs::write(root.join("src/components/Button.tsx"), "export const Button = 1;").unwrap();
    fs::write(root.join("node_modules/react/index.js"), "x").unwrap();
    fs::write(root.join(".git/HEAD"), "ref").unwrap();

    let files = collect_directory(&root, &IngestLimits::default()).unwrap();
    let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(paths, vec!["webapp/src/components/Button.tsx", "webapp/src/index.tsx"]);
    assert!(files.iter().all(|f| matches!(f.content, FileContent::Disk(_))));

    let ingested = ingest_uploaded(files, &IngestLimits::default()).unwrap();
    assert_eq!(ingested.project.name, "webapp");
    assert!(ingested.project.structure.directories.contains("webapp/src/components"));
    assert_eq!(ingested.project.structure.depth, 3);
}

#[cfg(unix)]
#[test]
fn test_collect_directory_does_not_follow_symlink_cycles() {
    use std::os::unix::fs::symlink;

    let dir = tempdir().unwrap();
    let root = dir.path().join("webapp");
    fs::create_dir_all(root.join("src")).unwrap();
    fs::write(root.join("index.js"), "console.log('root')").unwrap();
    fs::write(root.join("src/index.js"), "console.log('src')").unwrap();
    symlink(".", root.join("src/loop")).unwrap();
    symlink(".", root.join("a")).unwrap();
    symlink(".", root.join("b")).unwrap();

    let files = collect_directory(&root, &IngestLimits::default()).unwrap();
    let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(paths, vec!["webapp/index.js", "webapp/src/index.js"]);
}

#[test]
fn test_collect_directory_stops_at_depth_limit() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("deep");
    let nested = root.join("l1/l2/l3/l4");
    fs::create_dir_all(&nested).unwrap();
    fs::write(root.join("main.py"), "print(0)").unwrap();
    fs::write(root.join("l1/one.py"), "print(1)").unwrap();
    fs::write(root.join("l1/l2/two.py"), "print(2)").unwrap();
    fs::write(root.join("l1/l2/l3/three.py"), "print(3)").unwrap();
    fs::write(nested.join("four.py"), "print(4)").unwrap();

    let limits = IngestLimits {
        max_directory_depth: 3,
        ..IngestLimits::default()
    };
    let files = collect_directory(&root, &limits).unwrap();
    let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(paths, vec!["deep/l1/l2/two.py", "deep/l1/one.py", "deep/main.py"]);
}

#[test]
fn test_collect_directory_stops_once_enough_files_are_seen() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("many");
    fs::create_dir_all(&root).unwrap();
    for i in 0..50 {
        fs::write(root.join(format!("f{i:02}.js")), "let a;").unwrap();
    }

    let limits = IngestLimits {
        max_files: 2,
        ..IngestLimits::default()
    };
    let files = collect_directory(&root, &limits).unwrap();
    assert_eq!(files.len(), 8);

    let ingested = ingest_uploaded(files, &limits).unwrap();
    assert_eq!(ingested.files.len(), 2);
}

#[test]
fn test_collect_directory_errors_only_for_missing_root() {
    let dir = tempdir().unwrap();
    let result = collect_directory(&dir.path().join("absent"), &IngestLimits::default());
    assert!(matches!(result, Err(IngestError::Io(_))));
}

#[cfg(unix)]
#[test]
fn test_unreadable_subdirectory_is_skipped() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    let root = dir.path().join("webapp");
    let secret = root.join("secret");
    fs::create_dir_all(root.join("src")).unwrap();
    fs::create_dir_all(&secret).unwrap();
    fs::write(root.join("src/app.js"), "let a;").unwrap();
    fs::write(secret.join("key.js"), "let k;").unwrap();
    fs::set_permissions(&secret, fs::Permissions::from_mode(0o000)).unwrap();

    let result = collect_directory(&root, &IngestLimits::default());
    fs::set_permissions(&secret, fs::Permissions::from_mode(0o755)).unwrap();

    let files = result.unwrap();
    let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
    // Running as root ignores the permission bits, so the secret file may still appear.
    assert!(paths.contains(&"webapp/src/app.js"));
}

#[test]
fn test_config_role_lists_unretained_files() {
    let files = upload(&[
        ("svc/.env", "PORT=3000"),
        ("svc/Dockerfile", "FROM node:20"),
        ("svc/server.js", "const port = process.env.PORT;"),
    ]);
    let ingested = ingest_uploaded(files, &IngestLimits::default()).unwrap();
    assert_eq!(ingested.files.len(), 1);
    assert_eq!(ingested.project.config_files, vec!["svc/.env", "svc/Dockerfile"]);
}
