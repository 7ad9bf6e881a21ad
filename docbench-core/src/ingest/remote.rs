//! Remote repository ingestion through a [`RepositoryClient`].
//!
//! Traversal is an explicit depth-first stack rather than recursion, bounded by the
//! per-directory file cap, the total file cap, the directory depth limit and the deny list.
//! Individual download failures skip the file. Listing failures become warnings, unless
//! nothing at all was collected, in which case they are fatal.

use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, info, warn};

use super::{is_denied_directory, Collector, IngestLimits, Ingested};
use crate::contract::{RemoteEntryKind, RepositoryClient};
use crate::error::{IngestError, RemoteError};

static REPOSITORY_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"github\.com[/:]([^/\s]+)/([^/\s]+?)(?:\.git)?(?:/|$)").expect("repository url pattern is valid")
});

/// Listings reporting fewer remaining requests than this are logged as a warning.
const RATE_LIMIT_WARNING_THRESHOLD: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryRef {
    pub owner: String,
    pub repo: String,
}

/// Extract `owner/repo` from a GitHub URL (`https://github.com/o/r`, `.../r.git`,
/// `git@github.com:o/r.git`, or deeper links such as `/tree/main`).
pub fn parse_repository_url(url: &str) -> Result<RepositoryRef, IngestError> {
    let captures = REPOSITORY_URL
        .captures(url.trim())
        .ok_or_else(|| IngestError::InvalidRepositoryUrl(url.to_string()))?;
    Ok(RepositoryRef {
        owner: captures[1].to_string(),
        repo: captures[2].to_string(),
    })
}

struct PendingDirectory {
    url: String,
    path: String,
    depth: usize,
}

pub async fn ingest_repository(
    url: &str,
    limits: &IngestLimits,
    client: &dyn RepositoryClient,
) -> Result<Ingested, IngestError> {
    let repository = parse_repository_url(url)?;
    info!(owner = %repository.owner, repo = %repository.repo, "[INGEST] Traversing remote repository");

    let mut collector = Collector::new(limits, limits.max_remote_files);
    let mut stack = vec![PendingDirectory {
        url: client.contents_url(&repository.owner, &repository.repo),
        path: String::new(),
        depth: 0,
    }];
    let mut rate_limited: Option<RemoteError> = None;
    let mut first_failure: Option<RemoteError> = None;

    'traversal: while let Some(directory) = stack.pop() {
        if collector.is_full() {
            break;
        }
        let listing = match client.list_directory(&directory.url).await {
            Ok(listing) => listing,
            Err(RemoteError::RateLimited(detail)) => {
                warn!(path = %directory.path, "[INGEST] Rate limited while listing directory");
                rate_limited = Some(RemoteError::RateLimited(detail));
                break;
            }
            Err(e) => {
                warn!(path = %directory.path, error = %e, "[INGEST] Could not list directory");
                collector.warn(format!("Could not list directory '{}': {e}", display_path(&directory.path)));
                first_failure.get_or_insert(e);
                continue;
            }
        };
        if let Some(remaining) = listing.rate_limit_remaining {
            if remaining < RATE_LIMIT_WARNING_THRESHOLD {
                warn!(remaining, "[INGEST] GitHub API rate limit nearly exhausted");
            }
        }

        let mut taken_here = 0;
        let mut subdirectories = Vec::new();
        for entry in listing.entries {
            let path = if directory.path.is_empty() {
                entry.name.clone()
            } else {
                format!("{}/{}", directory.path, entry.name)
            };
            match entry.kind {
                RemoteEntryKind::Dir => {
                    if is_denied_directory(&entry.name) {
                        debug!(path = %path, "Skipping directory");
                        continue;
                    }
                    collector.register_directory(&path);
                    if directory.depth + 1 >= limits.max_directory_depth {
                        debug!(path = %path, "[INGEST] Depth limit reached, not descending");
                        continue;
                    }
                    if let Some(url) = entry.url {
                        subdirectories.push(PendingDirectory {
                            url,
                            path,
                            depth: directory.depth + 1,
                        });
                    }
                }
                RemoteEntryKind::File => {
                    if collector.is_full() {
                        break;
                    }
                    if taken_here >= limits.max_files_per_directory {
                        continue;
                    }
                    let Some(admitted) = collector.admit(&path, entry.size, limits.max_remote_file_bytes) else {
                        continue;
                    };
                    let Some(download_url) = entry.download_url else {
                        continue;
                    };
                    match client.fetch_file(&download_url).await {
                        Ok(text) => {
                            collector.accept(admitted, text.as_bytes());
                            taken_here += 1;
                        }
                        Err(RemoteError::RateLimited(detail)) => {
                            warn!(path = %path, "[INGEST] Rate limited while downloading file");
                            rate_limited = Some(RemoteError::RateLimited(detail));
                            break 'traversal;
                        }
                        Err(e) => debug!(path = %path, error = %e, "[INGEST] Download failed, skipping file"),
                    }
                }
                RemoteEntryKind::Other => {}
            }
        }
        // Reverse so directories are visited in listing order.
        stack.extend(subdirectories.into_iter().rev());
    }

    if collector.len() == 0 {
        if let Some(e) = rate_limited {
            return Err(IngestError::from_remote_rate_limit(e));
        }
        if let Some(e) = first_failure {
            return Err(IngestError::Remote(e.to_string()));
        }
    } else if let Some(e) = rate_limited {
        warn!(files = collector.len(), "[INGEST] Continuing with partial repository after rate limit");
        collector.warn(format!(
            "Repository traversal stopped early after {} files: {e}",
            collector.len()
        ));
    }

    collector.finish(repository.repo)
}

fn display_path(path: &str) -> &str {
    if path.is_empty() {
        "/"
    } else {
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_common_url_shapes() {
        let expected = RepositoryRef {
            owner: "rust-lang".into(),
            repo: "cargo".into(),
        };
        for url in [
            "https://github.com/rust-lang/cargo",
            "https://github.com/rust-lang/cargo.git",
            "https://github.com/rust-lang/cargo/tree/master/src",
            "git@github.com:rust-lang/cargo.git",
        ] {
            assert_eq!(parse_repository_url(url).unwrap(), expected, "{url}");
        }
    }

    #[test]
    fn rejects_foreign_hosts() {
        assert!(matches!(
            parse_repository_url("https://gitlab.com/a/b"),
            Err(IngestError::InvalidRepositoryUrl(_))
        ));
        assert!(parse_repository_url("github.com/only-owner").is_err());
    }
}
