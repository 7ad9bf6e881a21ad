//! ZIP archive ingestion.

use std::io::{Cursor, Read};
use tracing::{debug, warn};
use zip::ZipArchive;

use super::{default_project_name, Collector, IngestLimits, Ingested};
use crate::error::IngestError;

/// Ingest a ZIP archive held in memory. `name` (usually the archive's file stem) names the
/// project unless a manifest declares one.
///
/// Directory entries only register directory names. File entries are size-checked from the
/// central directory first, and the read itself is bounded so a lying header cannot make us
/// inflate more than the ceiling.
pub fn ingest_archive(name: Option<String>, bytes: &[u8], limits: &IngestLimits) -> Result<Ingested, IngestError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(|e| IngestError::EmptyArchive(e.to_string()))?;
    if archive.len() == 0 {
        return Err(IngestError::EmptyArchive("archive has no entries".into()));
    }
    let mut collector = Collector::new(limits, limits.max_files);

    for index in 0..archive.len() {
        if collector.is_full() {
            debug!(index, "[INGEST] File cap reached, ignoring remaining archive entries");
            break;
        }
        let mut entry = match archive.by_index(index) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(index, error = %e, "[INGEST] Unreadable archive entry, skipping");
                continue;
            }
        };
        let entry_name = entry.name().to_string();
        if entry.is_dir() {
            collector.register_directory(&entry_name);
            continue;
        }
        let Some(admitted) = collector.admit(&entry_name, entry.size(), limits.max_file_bytes) else {
            continue;
        };
        let mut buffer = Vec::new();
        match (&mut entry).take(limits.max_file_bytes).read_to_end(&mut buffer) {
            Ok(_) if buffer.len() as u64 >= limits.max_file_bytes => {
                debug!(path = %entry_name, "[INGEST] Entry inflated past ceiling, skipping");
            }
            Ok(_) => collector.accept(admitted, &buffer),
            Err(e) => warn!(path = %entry_name, error = %e, "[INGEST] Could not inflate entry, skipping"),
        }
    }

    collector.finish(name.filter(|n| !n.is_empty()).unwrap_or_else(default_project_name))
}
