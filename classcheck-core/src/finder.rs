//! Unused class detection: declared classes minus used classes.
//!
//! ```text
//!  html ──► extract_classes ──► declared (first-seen order)
//!                                   │
//!  scope ─► gather_candidate_files ─┤
//!                                   ▼
//!                             UsageSearcher ◄── reference corpus
//!                                   │
//!                                   ▼
//!                      unused = declared - used
//! ```

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use serde::Serialize;
use tracing::info;

use crate::extract::extract_classes;
use crate::scan::{gather_candidate_files, ScanOptions};
use crate::usage::UsageSearcher;

/// Immutable snapshot of third-party reference texts.
///
/// Refreshing the corpus builds a new snapshot; a running check keeps the one
/// it was given.
pub type ReferenceCorpus = Arc<[String]>;

/// Result of one unused-class check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UnusedReport {
    /// Every declared class, in first-declared order.
    pub declared: Vec<String>,
    /// Declared classes with no usage, in first-declared order.
    pub unused: Vec<String>,
    /// Local files searched.
    pub files_scanned: usize,
    /// Reference texts searched.
    pub corpus_blobs: usize,
}

impl UnusedReport {
    /// True if every declared class is used somewhere.
    pub fn is_clean(&self) -> bool {
        self.unused.is_empty()
    }
}

/// Find the classes declared in `html` that are not used under `scope_root`
/// nor in `corpus`.
pub fn find_unused(
    html: &str,
    scope_root: &Path,
    corpus: &[String],
    options: &ScanOptions,
) -> Result<UnusedReport> {
    let declared: Vec<String> = extract_classes(html).into_iter().collect();
    if declared.is_empty() {
        return Ok(UnusedReport::default());
    }

    let files = gather_candidate_files(scope_root, options)?;

    let mut searcher = UsageSearcher::new(declared.iter().map(String::as_str));
    let files_scanned = searcher.search_files(&files);

    let mut corpus_blobs = 0;
    for blob in corpus {
        if searcher.is_done() {
            break;
        }
        searcher.search_text(blob);
        corpus_blobs += 1;
    }

    let used = searcher.finish();
    let unused: Vec<String> = declared
        .iter()
        .filter(|class| !used.contains(*class))
        .cloned()
        .collect();

    info!(
        scope = %scope_root.display(),
        declared = declared.len(),
        unused = unused.len(),
        files_scanned,
        corpus_blobs,
        "unused class check finished"
    );

    Ok(UnusedReport {
        declared,
        unused,
        files_scanned,
        corpus_blobs,
    })
}
