//! Search scope resolution.
//!
//! A scope is one of the directories between the active HTML file and the
//! project root it lives in. Scopes are listed nearest-first, so index 0 is
//! the file's parent directory and the last index is the project root
//! (labelled `.`).
//!
//! The remembered default index is owned by the host. Resolution takes it as
//! an argument and hands the updated value back in [`ResolvedScope`].

use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::error::{ClassCheckError, ClassCheckResult};

/// Label of the project root scope.
pub const ROOT_LABEL: &str = ".";

/// Decoration appended to the label of the remembered default scope.
pub const DEFAULT_SUFFIX: &str = " (default)";

/// One candidate search root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeChoice {
    /// Position in the nearest-first list.
    pub index: usize,
    /// Path relative to the project root, `/`-separated, or `.` for the root.
    pub label: String,
    /// Absolute directory to search.
    pub path: PathBuf,
}

/// How the user (or the host on their behalf) picked a scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeSelection {
    /// Reuse the remembered default index.
    Default,
    /// Pick a scope by its index.
    Index(usize),
    /// Pick a scope by its (possibly decorated) label.
    Label(String),
}

/// An entry of the list shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeOption {
    pub label: String,
    pub selection: ScopeSelection,
}

/// Outcome of resolving a selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedScope {
    /// Directory to search.
    pub path: PathBuf,
    /// Index of the chosen scope.
    pub index: usize,
    /// Label of the chosen scope.
    pub label: String,
    /// Default index the host should persist after this resolution.
    pub default_index: Option<usize>,
}

/// Collapse `.` and `..` components without touching the filesystem.
///
/// `..` at the filesystem root stays at the root; a leading `..` in a
/// relative path is kept.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => normalized.push(".."),
            },
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// Find the project root containing `active_file`.
///
/// Both paths are compared after [`normalize_path`]. The first root for which
/// the file's relative path is non-empty and does not climb out of the root
/// wins.
pub fn find_project_root<'a>(
    active_file: &Path,
    roots: &'a [PathBuf],
) -> ClassCheckResult<&'a Path> {
    roots
        .iter()
        .map(PathBuf::as_path)
        .find(|root| relative_segments(active_file, root).is_some())
        .ok_or_else(|| ClassCheckError::scope_resolution(active_file))
}

/// Path segments of `file` below `root`, or `None` if it is not inside it.
fn relative_segments(file: &Path, root: &Path) -> Option<Vec<String>> {
    let file = normalize_path(file);
    let root = normalize_path(root);
    let relative = file.strip_prefix(&root).ok()?;
    let mut segments = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => segments.push(part.to_string_lossy().to_string()),
            Component::CurDir => {}
            _ => return None,
        }
    }
    if segments.is_empty() {
        None
    } else {
        Some(segments)
    }
}

/// List the candidate scopes for `active_file`, nearest ancestor first.
///
/// Scope paths are built from the normalized project root.
pub fn list_scopes(active_file: &Path, project_root: &Path) -> ClassCheckResult<Vec<ScopeChoice>> {
    let root = normalize_path(project_root);
    let mut dirs = relative_segments(active_file, project_root)
        .ok_or_else(|| ClassCheckError::scope_resolution(active_file))?;
    // Drop the file name
    dirs.pop();

    let scopes = (0..=dirs.len())
        .rev()
        .enumerate()
        .map(|(index, depth)| {
            let kept = &dirs[..depth];
            let path = kept.iter().fold(root.clone(), |p, d| p.join(d));
            let label = if kept.is_empty() {
                ROOT_LABEL.to_string()
            } else {
                kept.join("/")
            };
            ScopeChoice { index, label, path }
        })
        .collect();

    Ok(scopes)
}

/// Build the list presented to the user.
///
/// When a default is remembered it is prepended as a decorated entry; the
/// remaining entries keep their own indices.
pub fn scope_options(scopes: &[ScopeChoice], default_index: Option<usize>) -> Vec<ScopeOption> {
    let mut options = Vec::with_capacity(scopes.len() + 1);

    if let Some(label) = default_label(scopes, default_index) {
        options.push(ScopeOption {
            label,
            selection: ScopeSelection::Default,
        });
    }

    options.extend(scopes.iter().map(|s| ScopeOption {
        label: s.label.clone(),
        selection: ScopeSelection::Index(s.index),
    }));

    options
}

/// Decorated label of the remembered default, as shown in the option list.
fn default_label(scopes: &[ScopeChoice], default_index: Option<usize>) -> Option<String> {
    let index = clamp_index(default_index?, scopes.len())?;
    Some(format!("{}{}", scopes[index].label, DEFAULT_SUFFIX))
}

/// Clamp a remembered index recorded for a file at another depth.
fn clamp_index(index: usize, len: usize) -> Option<usize> {
    if len == 0 {
        None
    } else {
        Some(index.min(len - 1))
    }
}

/// Resolve `selection` against `scopes`.
pub fn resolve_choice(
    selection: &ScopeSelection,
    scopes: &[ScopeChoice],
    default_index: Option<usize>,
) -> ClassCheckResult<ResolvedScope> {
    if scopes.is_empty() {
        return Err(ClassCheckError::invalid_argument("no scopes to choose from"));
    }

    let index = match selection {
        ScopeSelection::Default => resolve_default(scopes, default_index)?,
        ScopeSelection::Index(i) => {
            if *i >= scopes.len() {
                return Err(ClassCheckError::invalid_argument(format!(
                    "scope index {} out of range (0..{})",
                    i,
                    scopes.len()
                )));
            }
            *i
        }
        ScopeSelection::Label(label) => {
            // Only the exact decorated entry means "default"; a directory may
            // itself be named "x (default)".
            if default_label(scopes, default_index).as_deref() == Some(label.as_str()) {
                resolve_default(scopes, default_index)?
            } else {
                scopes
                    .iter()
                    .position(|s| s.label == *label)
                    .ok_or_else(|| {
                        ClassCheckError::invalid_argument(format!("unknown scope '{}'", label))
                    })?
            }
        }
    };

    let chosen = &scopes[index];
    debug!(scope = %chosen.label, index, "resolved search scope");

    Ok(ResolvedScope {
        path: chosen.path.clone(),
        index,
        label: chosen.label.clone(),
        default_index: Some(index),
    })
}

fn resolve_default(scopes: &[ScopeChoice], default_index: Option<usize>) -> ClassCheckResult<usize> {
    let recorded = default_index
        .ok_or_else(|| ClassCheckError::invalid_argument("no default scope recorded"))?;
    let index = clamp_index(recorded, scopes.len()).unwrap_or(0);
    if index != recorded {
        debug!(recorded, clamped = index, "clamped remembered default scope");
    }
    Ok(index)
}
