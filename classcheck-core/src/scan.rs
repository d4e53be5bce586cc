//! Parallel file discovery with early directory pruning.
//!
//! Performance optimizations:
//! - Early directory pruning via `WalkDir::filter_entry` (O(1) subtree skip)
//! - Parallel file filtering via Rayon's `par_bridge`
//!
//! Every call walks the filesystem again; nothing is cached between checks.

use anyhow::{Context, Result};
use rayon::prelude::*;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Extensions searched for class usages by default.
pub const DEFAULT_EXTENSIONS: &[&str] = &["js", "ts", "css", "scss"];

/// Dependency directories excluded by default.
pub const EXCLUDED_DIRS: &[&str] = &["node_modules"];

/// What to look for while walking a scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    /// File extensions to keep, without the leading dot.
    pub extensions: Vec<String>,
    /// Directory names whose subtrees are skipped.
    pub excluded_dirs: Vec<String>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            excluded_dirs: EXCLUDED_DIRS.iter().map(|d| d.to_string()).collect(),
        }
    }
}

/// Checks if a directory entry should be pruned (excluded from traversal).
#[inline]
fn is_excluded_dir(entry: &walkdir::DirEntry, excludes: &HashSet<&str>) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| excludes.contains(name))
}

/// Gathers every candidate file under `root`.
///
/// Returned paths are sorted so reports and logs are deterministic.
pub fn gather_candidate_files(root: &Path, options: &ScanOptions) -> Result<Vec<PathBuf>> {
    let excludes: HashSet<&str> = options.excluded_dirs.iter().map(String::as_str).collect();
    let extensions: HashSet<&str> = options.extensions.iter().map(String::as_str).collect();

    let mut files = WalkDir::new(root)
        .into_iter()
        // Prune whole subtrees before descending into them; the root itself
        // is searched even when its name is excluded
        .filter_entry(|e| e.depth() == 0 || !is_excluded_dir(e, &excludes))
        .par_bridge()
        .filter_map(|entry| match entry {
            Ok(e) => {
                let path = e.path();
                let wanted = e.file_type().is_file()
                    && path
                        .extension()
                        .and_then(|ext| ext.to_str())
                        .is_some_and(|ext| extensions.contains(ext));
                if wanted {
                    Some(Ok(path.to_path_buf()))
                } else {
                    None
                }
            }
            Err(e) => Some(Err(e.into())),
        })
        .collect::<Result<Vec<_>>>()
        .context(format!("Failed to gather files from {}", root.display()))?;

    files.sort();
    Ok(files)
}
