//! Typed error handling for classcheck.
//!
//! Every abort condition of a check maps to one variant, so hosts can decide
//! how to surface it (message box, diagnostic, exit code) without string
//! matching.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for classcheck operations.
#[derive(Error, Debug)]
pub enum ClassCheckError {
    /// I/O error when reading/writing files
    #[error("I/O error at {path}: {message}")]
    Io {
        path: PathBuf,
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// The active file is not inside any known project root
    #[error("File not in workspace: {path}")]
    ScopeResolution { path: PathBuf },

    /// No eligible HTML document to check
    #[error("Open an HTML file first: {message}")]
    NoActiveDocument { message: String },

    /// A reference corpus URL could not be loaded
    #[error("Failed to fetch {url}: {message}")]
    Fetch { url: String, message: String },

    /// Configuration file errors
    #[error("Config error at {path}: {message}")]
    Config { path: PathBuf, message: String },

    /// Session state file errors
    #[error("State error: {message}")]
    State { message: String },

    /// Invalid argument provided
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },
}

impl ClassCheckError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: err.to_string(),
            source: Some(err),
        }
    }

    /// Create a "file not in workspace" error.
    pub fn scope_resolution(path: impl Into<PathBuf>) -> Self {
        Self::ScopeResolution { path: path.into() }
    }

    /// Create a missing/ineligible document error.
    pub fn no_active_document(message: impl Into<String>) -> Self {
        Self::NoActiveDocument {
            message: message.into(),
        }
    }

    /// Create a fetch error for a reference URL.
    pub fn fetch(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Fetch {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a config error.
    pub fn config(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Config {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a state error.
    pub fn state(message: impl Into<String>) -> Self {
        Self::State {
            message: message.into(),
        }
    }

    /// Create an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Check if this error aborts a check.
    ///
    /// Fetch and state errors only degrade the corpus or the remembered
    /// default; the check itself can still run.
    pub fn aborts_check(&self) -> bool {
        !matches!(self, Self::Fetch { .. } | Self::State { .. })
    }

    /// Get the path associated with this error, if any.
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::Io { path, .. } => Some(path),
            Self::ScopeResolution { path } => Some(path),
            Self::Config { path, .. } => Some(path),
            _ => None,
        }
    }
}

/// Convenience type alias for classcheck results.
pub type ClassCheckResult<T> = Result<T, ClassCheckError>;

/// Extension trait for converting std::io::Error with path context.
pub trait IoResultExt<T> {
    /// Add path context to an I/O error.
    fn with_path(self, path: impl Into<PathBuf>) -> ClassCheckResult<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> ClassCheckResult<T> {
        self.map_err(|e| ClassCheckError::io(path, e))
    }
}
