//! Persisted session state for one project.
//!
//! Stored as `.classcheck/state.json` under the project root and holds the
//! two values that outlive a single check:
//!
//! - the remembered default scope index
//! - the reference corpus fetched from the configured URLs
//!
//! The core never reads this file behind the caller's back: hosts load it,
//! pass the values into a check and save whatever the check hands back.
//!
//! # Versioning
//!
//! The file carries a format version and the tool version that wrote it. An
//! incompatible file is discarded and rebuilt.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::corpus::CorpusState;
use crate::error::{ClassCheckError, ClassCheckResult};
use crate::finder::ReferenceCorpus;

/// Maximum state file size (50MB); the corpus is the only large part.
const MAX_STATE_SIZE_BYTES: usize = 50_000_000;

/// Current state format version. Increment when the format changes.
const STATE_VERSION: u32 = 1;

/// classcheck version for compatibility checking.
const CLASSCHECK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Directory holding the state file, relative to the project root.
pub const STATE_DIR: &str = ".classcheck";

/// Format metadata.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct StateMetadata {
    pub state_version: u32,
    pub classcheck_version: String,
}

impl StateMetadata {
    pub fn current() -> Self {
        Self {
            state_version: STATE_VERSION,
            classcheck_version: CLASSCHECK_VERSION.to_string(),
        }
    }

    /// Same format version and same major tool version.
    pub fn is_compatible(&self) -> bool {
        if self.state_version != STATE_VERSION {
            return false;
        }
        let current_major = CLASSCHECK_VERSION.split('.').next().unwrap_or("0");
        let stored_major = self.classcheck_version.split('.').next().unwrap_or("0");
        current_major == stored_major
    }
}

/// Everything remembered for a project between checks.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SessionState {
    #[serde(default)]
    pub metadata: StateMetadata,
    /// Remembered default scope index, unset until a scope is picked.
    #[serde(default)]
    pub default_scope: Option<usize>,
    /// Last fetched reference corpus.
    #[serde(default)]
    pub corpus: CorpusState,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            metadata: StateMetadata::current(),
            default_scope: None,
            corpus: CorpusState::default(),
        }
    }
}

impl SessionState {
    /// Forget the remembered default scope.
    pub fn clear_default(&mut self) {
        self.default_scope = None;
    }

    /// Record the default scope returned by a check.
    pub fn set_default(&mut self, index: Option<usize>) {
        self.default_scope = index;
    }

    /// Snapshot of the corpus texts for a check.
    pub fn corpus_snapshot(&self) -> ReferenceCorpus {
        self.corpus.snapshot()
    }
}

/// Location of the state file for `project_root`.
pub fn state_path(project_root: &Path) -> PathBuf {
    project_root.join(STATE_DIR).join("state.json")
}

/// Load the state for `project_root`.
///
/// Returns `None` if the file is missing, corrupted or was written by an
/// incompatible version (in which case it is removed).
pub fn load_state(project_root: &Path) -> Option<SessionState> {
    let path = state_path(project_root);
    if !path.exists() {
        return None;
    }

    let text = fs::read_to_string(&path).ok()?;
    let state: SessionState = match serde_json::from_str(&text) {
        Ok(s) => s,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring corrupted state file");
            return None;
        }
    };

    if !state.metadata.is_compatible() {
        info!(
            stored = state.metadata.state_version,
            current = STATE_VERSION,
            "state format changed, starting fresh"
        );
        let _ = fs::remove_file(&path);
        return None;
    }

    Some(state)
}

/// Load the state or start from an empty one.
pub fn load_state_or_default(project_root: &Path) -> SessionState {
    load_state(project_root).unwrap_or_default()
}

/// Reject serialized state above [`MAX_STATE_SIZE_BYTES`].
fn check_state_size(len: usize) -> ClassCheckResult<()> {
    if len > MAX_STATE_SIZE_BYTES {
        return Err(ClassCheckError::state(format!(
            "state is {} bytes, limit is {}MB",
            len,
            MAX_STATE_SIZE_BYTES / 1_000_000
        )));
    }
    Ok(())
}

/// Save the state for `project_root`.
///
/// Uses an atomic write (temp file + rename) so concurrent readers never see
/// a partial file. State over the size limit is not written and comes back
/// as [`ClassCheckError::State`]; the previous file is left in place.
pub fn save_state(project_root: &Path, state: &SessionState) -> Result<()> {
    let dir = project_root.join(STATE_DIR);
    if !dir.exists() {
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }

    let mut state = state.clone();
    state.metadata = StateMetadata::current();

    let path = state_path(project_root);
    let json = serde_json::to_string_pretty(&state)?;

    check_state_size(json.len())?;

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let temp_path = dir.join(format!("state.json.{}.{}.tmp", std::process::id(), nanos));

    fs::write(&temp_path, &json)
        .with_context(|| format!("Failed to write temp state file: {}", temp_path.display()))?;

    fs::rename(&temp_path, &path).with_context(|| {
        let _ = fs::remove_file(&temp_path);
        format!("Failed to rename state file to: {}", path.display())
    })?;

    Ok(())
}
