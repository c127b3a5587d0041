//! Error surface of the bundle core
//!
//! Only resolver, size, manifest and log-read failures become errors.
//! Everything else a parser runs into is recorded as a warning on the bundle.

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Machine-readable error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    MissingPath,
    InvalidPath,
    NotFound,
    NotADirectory,
    NotABundle,
    IncompleteBundle,
    SizeExceeded,
    Manifest,
    LogFileNotFound,
    LogRead,
}

impl ErrorKind {
    /// Stable code for scripts and renderers
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::MissingPath => "missing_path",
            ErrorKind::InvalidPath => "invalid_path",
            ErrorKind::NotFound => "not_found",
            ErrorKind::NotADirectory => "not_a_directory",
            ErrorKind::NotABundle => "not_a_bundle",
            ErrorKind::IncompleteBundle => "incomplete_bundle",
            ErrorKind::SizeExceeded => "size_exceeded",
            ErrorKind::Manifest => "manifest",
            ErrorKind::LogFileNotFound => "log_file_not_found",
            ErrorKind::LogRead => "log_read",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BundleError {
    #[error("no bundle path given")]
    MissingPath,

    #[error("cannot resolve bundle path {}: {source}", .path.display())]
    InvalidPath {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("bundle path {} does not exist", .path.display())]
    NotFound { path: PathBuf },

    #[error("bundle path {} is not a directory", .path.display())]
    NotADirectory { path: PathBuf },

    #[error("{} does not look like a support bundle (no rke2/ directory)", .path.display())]
    NotABundle { path: PathBuf },

    #[error("bundle at {} has neither rke2/kubectl/ nor rke2/podlogs/", .path.display())]
    IncompleteBundle { path: PathBuf },

    #[error("bundle at {} is {total} bytes uncompressed, limit is {limit}", .path.display())]
    SizeExceeded {
        path: PathBuf,
        total: u64,
        limit: u64,
    },

    #[error("could not determine node name for bundle at {}", .path.display())]
    Manifest { path: PathBuf },

    #[error("log file {} is not part of this bundle", .path.display())]
    LogFileNotFound { path: PathBuf },

    #[error("failed to read log file {}: {source}", .path.display())]
    LogRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl BundleError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BundleError::MissingPath => ErrorKind::MissingPath,
            BundleError::InvalidPath { .. } => ErrorKind::InvalidPath,
            BundleError::NotFound { .. } => ErrorKind::NotFound,
            BundleError::NotADirectory { .. } => ErrorKind::NotADirectory,
            BundleError::NotABundle { .. } => ErrorKind::NotABundle,
            BundleError::IncompleteBundle { .. } => ErrorKind::IncompleteBundle,
            BundleError::SizeExceeded { .. } => ErrorKind::SizeExceeded,
            BundleError::Manifest { .. } => ErrorKind::Manifest,
            BundleError::LogFileNotFound { .. } => ErrorKind::LogFileNotFound,
            BundleError::LogRead { .. } => ErrorKind::LogRead,
        }
    }

    pub fn code(&self) -> &'static str {
        self.kind().code()
    }

    fn path(&self) -> Option<&Path> {
        match self {
            BundleError::MissingPath => None,
            BundleError::InvalidPath { path, .. }
            | BundleError::NotFound { path }
            | BundleError::NotADirectory { path }
            | BundleError::NotABundle { path }
            | BundleError::IncompleteBundle { path }
            | BundleError::SizeExceeded { path, .. }
            | BundleError::Manifest { path }
            | BundleError::LogFileNotFound { path }
            | BundleError::LogRead { path, .. } => Some(path),
        }
    }

    fn hint(&self) -> &'static str {
        match self.kind() {
            ErrorKind::MissingPath => "Pass the directory an extracted support bundle was unpacked into.",
            ErrorKind::InvalidPath => "Check that the path is spelled correctly and readable.",
            ErrorKind::NotFound => "Extract the bundle archive first, then pass the extracted directory.",
            ErrorKind::NotADirectory => {
                "Archives are not extracted automatically; run `tar -xzf <bundle>.tar.gz` and pass the result."
            }
            ErrorKind::NotABundle => {
                "Point at the directory containing rke2/ or at a directory holding exactly one such directory."
            }
            ErrorKind::IncompleteBundle => {
                "The collector did not capture kubectl output or pod logs; re-run it on the node."
            }
            ErrorKind::SizeExceeded => "Raise the size limit if this bundle is expected to be large.",
            ErrorKind::Manifest => "Make sure systeminfo/hostname exists or the bundle directory has a name.",
            ErrorKind::LogFileNotFound => "List the bundle's log files and pick one of those paths.",
            ErrorKind::LogRead => "Check file permissions inside the extracted bundle.",
        }
    }

    /// Multi-line explanation with the attempted path, working directory and a hint
    pub fn elaborate(&self, attempted: &str) -> String {
        let cwd = std::env::current_dir()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|_| "<unavailable>".to_string());
        let resolved = self
            .path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<none>".to_string());

        format!(
            "error [{}]: {}\n  path given:    {}\n  path resolved: {}\n  working dir:   {}\n  hint: {}",
            self.code(),
            self,
            if attempted.is_empty() { "<empty>" } else { attempted },
            resolved,
            cwd,
            self.hint()
        )
    }
}

/// Error returned by a bundle import
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct ImportError {
    #[source]
    pub error: BundleError,
    /// Present only when the import ran with `verbose`
    pub elaboration: Option<String>,
}

impl ImportError {
    pub fn new(error: BundleError, attempted: &str, verbose: bool) -> Self {
        let elaboration = verbose.then(|| error.elaborate(attempted));
        Self { error, elaboration }
    }

    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }

    pub fn code(&self) -> &'static str {
        self.error.code()
    }
}
