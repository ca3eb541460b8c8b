//! Full-tree scan
//!
//! Walks the watched root for files the filter accepts. Used for one-shot runs and to
//! catch markers written while no watcher was running.

use crate::filter::PathFilter;
use anyhow::Result;
use std::path::PathBuf;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Every file under the filter's root that passes the filter, in walk order
pub fn candidate_files(filter: &PathFilter) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(filter.root())
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !(e.file_type().is_dir() && filter.prunes_dir(e.path())))
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry during scan: {}", e);
                continue;
            }
        };

        // Only check files
        if !entry.file_type().is_file() {
            continue;
        }

        if filter.allows(entry.path()) {
            files.push(entry.into_path());
        }
    }

    debug!("Scan found {} candidate files", files.len());
    Ok(files)
}
