//! Removal of unused classes from HTML documents.
//!
//! Deletion uses the with-context spans from [`crate::locate`], so a class
//! that was alone in its attribute takes the whole `class="..."` with it and
//! the remaining classes stay single-space separated.
//!
//! Features:
//! - In-memory span deletion for hosts that own the document buffer
//! - On-disk removal with dry-run support and atomic writes
//! - Classes that cannot be located cleanly are reported, never guessed

use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::locate::{find_bounds_with_context, OccurrenceSpan, Position};

/// Result of a fix operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FixResult {
    /// Classes removed (or that would be removed in dry-run mode).
    pub removed: Vec<String>,
    /// Classes with no deletable occurrence.
    pub not_removable: Vec<String>,
    /// Total number of spans deleted.
    pub spans_removed: usize,
    /// Whether the file was rewritten.
    pub written: bool,
}

/// Byte offset of each line start.
fn line_starts(text: &str) -> Vec<usize> {
    std::iter::once(0)
        .chain(text.match_indices('\n').map(|(i, _)| i + 1))
        .collect()
}

fn offset_of(starts: &[usize], text: &str, pos: Position) -> Option<usize> {
    let offset = starts.get(pos.line)? + pos.column;
    (offset <= text.len() && text.is_char_boundary(offset)).then_some(offset)
}

/// Delete `spans` from `text`.
///
/// Spans are applied last-to-first so earlier offsets stay valid. Spans that
/// fall outside the text or overlap an already deleted region are ignored.
/// Returns the new text and the number of spans deleted.
pub fn remove_spans(text: &str, spans: &[OccurrenceSpan]) -> (String, usize) {
    let starts = line_starts(text);
    let mut ranges: Vec<(usize, usize)> = spans
        .iter()
        .filter_map(|span| {
            let start = offset_of(&starts, text, span.start)?;
            let end = offset_of(&starts, text, span.end)?;
            (start < end).then_some((start, end))
        })
        .collect();
    ranges.sort_unstable_by(|a, b| b.0.cmp(&a.0));

    let mut out = text.to_string();
    let mut removed = 0;
    let mut floor = usize::MAX;
    for (start, end) in ranges {
        if end > floor {
            continue;
        }
        out.replace_range(start..end, "");
        floor = start;
        removed += 1;
    }

    (out, removed)
}

/// Delete every occurrence of `class` from `text`.
///
/// Returns `None` if the class has no deletable occurrence.
pub fn remove_class(text: &str, class: &str) -> Option<String> {
    let spans = find_bounds_with_context(class, text);
    if spans.is_empty() {
        return None;
    }
    let (out, _) = remove_spans(text, &spans);
    Some(out)
}

/// Remove `classes` from the HTML file at `path`.
///
/// Classes are removed one at a time against the updated text, the same way
/// an editor would apply successive deletions. In dry-run mode nothing is
/// written.
///
/// Security: refuses to rewrite symlinks.
pub fn remove_unused_classes(path: &Path, classes: &[String], dry_run: bool) -> Result<FixResult> {
    let metadata = path
        .symlink_metadata()
        .with_context(|| format!("Failed to stat: {}", path.display()))?;
    if metadata.file_type().is_symlink() {
        anyhow::bail!("Refusing to rewrite symlink: {}", path.display());
    }

    let original = fs::read_to_string(path)
        .with_context(|| format!("Failed to read: {}", path.display()))?;

    let mut result = FixResult::default();
    let mut text = original.clone();

    for class in classes {
        let spans = find_bounds_with_context(class, &text);
        if spans.is_empty() {
            warn!(class = %class, file = %path.display(), "class could not be deleted");
            result.not_removable.push(class.clone());
            continue;
        }
        let (updated, count) = remove_spans(&text, &spans);
        text = updated;
        result.spans_removed += count;
        result.removed.push(class.clone());
        if dry_run {
            info!(class = %class, spans = count, "[DRY RUN] would remove class");
        } else {
            info!(class = %class, spans = count, "removed class");
        }
    }

    if !dry_run && text != original {
        write_document(path, &text)?;
        result.written = true;
    }

    Ok(result)
}

/// Replace the file at `path` with `content`.
///
/// Writes through a temp file in the same directory, then renames.
pub fn write_document(path: &Path, content: &str) -> Result<()> {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "document".to_string());
    let temp_path = path.with_file_name(format!(
        ".{}.{}.{}.tmp",
        file_name,
        std::process::id(),
        nanos
    ));

    fs::write(&temp_path, content)
        .with_context(|| format!("Failed to write temp file: {}", temp_path.display()))?;

    fs::rename(&temp_path, path).with_context(|| {
        let _ = fs::remove_file(&temp_path);
        format!("Failed to replace: {}", path.display())
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_file(name: &str, content: &str) -> PathBuf {
        let dir = std::env::temp_dir()
            .join("classcheck_fix_test")
            .join(format!("{}_{}", name, std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("index.html");
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_remove_class_first_token() {
        let out = remove_class(r#"<div class="foo bar">"#, "foo").unwrap();
        assert_eq!(out, r#"<div class="bar">"#);
    }

    #[test]
    fn test_remove_class_sole_attribute() {
        let out = remove_class("<main>\n  <div class=\"foo\"></div>\n</main>", "foo").unwrap();
        assert_eq!(out, "<main>\n  <div></div>\n</main>");
    }

    #[test]
    fn test_remove_class_every_line() {
        let text = "<a class=\"x foo\"></a>\n<b class=\"foo y\"></b>";
        let out = remove_class(text, "foo").unwrap();
        assert_eq!(out, "<a class=\"x\"></a>\n<b class=\"y\"></b>");
    }

    #[test]
    fn test_remove_class_missing() {
        assert!(remove_class(r#"<div class="bar">"#, "foo").is_none());
    }

    #[test]
    fn test_remove_spans_ignores_out_of_range() {
        let spans = [
            OccurrenceSpan::on_line(0, 0, 1),
            OccurrenceSpan::on_line(5, 0, 1),
            OccurrenceSpan::on_line(0, 2, 99),
        ];
        let (out, count) = remove_spans("abc", &spans);
        assert_eq!(out, "bc");
        assert_eq!(count, 1);
    }

    #[test]
    fn test_remove_spans_skips_overlap() {
        let spans = [OccurrenceSpan::on_line(0, 1, 4), OccurrenceSpan::on_line(0, 2, 3)];
        let (out, count) = remove_spans("abcdef", &spans);
        assert_eq!(out, "abdef");
        assert_eq!(count, 1);
    }

    #[test]
    fn test_remove_unused_classes_writes_file() {
        let path = temp_file(
            "write",
            "<div class=\"hero card\">\n  <p class=\"lead\"></p>\n</div>\n",
        );
        let classes = vec!["card".to_string(), "lead".to_string(), "gone".to_string()];

        let result = remove_unused_classes(&path, &classes, false).unwrap();
        assert!(result.written);
        assert_eq!(result.removed, vec!["card", "lead"]);
        assert_eq!(result.not_removable, vec!["gone"]);
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "<div class=\"hero\">\n  <p></p>\n</div>\n"
        );

        fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_dry_run_leaves_file() {
        let original = "<div class=\"hero card\"></div>";
        let path = temp_file("dry", original);

        let result = remove_unused_classes(&path, &["card".to_string()], true).unwrap();
        assert!(!result.written);
        assert_eq!(result.removed, vec!["card"]);
        assert_eq!(fs::read_to_string(&path).unwrap(), original);

        fs::remove_dir_all(path.parent().unwrap()).ok();
    }
}
