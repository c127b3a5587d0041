//! Offline support bundle import
//!
//! This module turns an extracted RKE2 support bundle into an immutable
//! [`Bundle`] inventory:
//! - the resolver finds and validates the bundle root
//! - one parser per artifact reads a fixed relative path
//! - the assembler runs the parsers and merges their output

mod inventory;
mod kubectl;
mod logs;
mod lookup;
mod manifest;
mod node_health;
mod resolver;
mod tabular;

#[cfg(test)]
mod tests;

pub use inventory::Bundle;
pub use logs::parse_pod_log_name;
pub use lookup::{guard, lookup_path, lookup_str};
pub use manifest::parse_k8s_version;
pub use resolver::{resolve, tree_stats, BundleRoot, Layout, TreeStats};
pub use tabular::{age_to_timestamp, normalize_namespace, parse_ratio};

use crate::error::{BundleError, ImportError};
use crate::observability::StructuredLogger;
use chrono::{DateTime, Utc};
use std::io::ErrorKind as IoErrorKind;
use std::path::PathBuf;
use tokio::fs;

/// Default cap on the uncompressed size of a bundle (50 MiB)
pub const DEFAULT_MAX_UNCOMPRESSED_BYTES: u64 = 50 * 1024 * 1024;

/// Options accepted by [`import_bundle`]
#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Bundles larger than this are rejected before any parser runs
    pub max_uncompressed_bytes: u64,
    /// Attach a human-readable explanation to import errors
    pub verbose: bool,
    /// Reserved; callers extract archives themselves and pass the directory
    pub extraction_dir: Option<PathBuf>,
    /// Clock used to turn age columns into timestamps; defaults to now
    pub now: Option<DateTime<Utc>>,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            max_uncompressed_bytes: DEFAULT_MAX_UNCOMPRESSED_BYTES,
            verbose: false,
            extraction_dir: None,
            now: None,
        }
    }
}

impl ImportOptions {
    pub fn with_max_uncompressed_bytes(mut self, bytes: u64) -> Self {
        self.max_uncompressed_bytes = bytes;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_extraction_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.extraction_dir = Some(dir.into());
        self
    }

    /// Pin the clock, mainly for tests
    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }
}

/// Inputs shared by every parser of one import
#[derive(Debug, Clone, Copy)]
pub struct ParseContext {
    pub now: DateTime<Utc>,
}

/// Parser output plus an optional non-fatal warning
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed<T> {
    pub value: T,
    pub warning: Option<String>,
}

/// Raw artifact as found on disk
#[derive(Debug)]
enum Artifact {
    Missing,
    Unreadable(String),
    Content(String),
}

impl Artifact {
    fn content(&self) -> Option<&str> {
        match self {
            Artifact::Content(c) => Some(c),
            _ => None,
        }
    }
}

/// Read one artifact; invalid UTF-8 is replaced rather than rejected
async fn read_artifact(root: &BundleRoot, relative: &str) -> Artifact {
    match fs::read(root.join(relative)).await {
        Ok(bytes) => Artifact::Content(String::from_utf8_lossy(&bytes).into_owned()),
        Err(e) if e.kind() == IoErrorKind::NotFound => Artifact::Missing,
        Err(e) => Artifact::Unreadable(format!("failed to read {}: {}", relative, e)),
    }
}

/// Import a bundle directory.
///
/// Resolver and size failures, and a manifest without any node name, are the
/// only errors; every other problem is recorded on the returned bundle.
pub async fn import_bundle(path: &str, options: &ImportOptions) -> Result<Bundle, ImportError> {
    let logger = StructuredLogger::new(path);
    logger.log_import_started();

    let fail = |error: BundleError| {
        logger.log_import_failed(&error);
        ImportError::new(error, path, options.verbose)
    };

    let root = resolve(path).await.map_err(fail)?;
    logger.log_layout_detected(&root);

    let stats = tree_stats(root.path()).await;
    if stats.total_bytes > options.max_uncompressed_bytes {
        return Err(fail(BundleError::SizeExceeded {
            path: root.path().to_path_buf(),
            total: stats.total_bytes,
            limit: options.max_uncompressed_bytes,
        }));
    }

    let ctx = ParseContext {
        now: options.now.unwrap_or_else(Utc::now),
    };
    let bundle = inventory::Assembler::new(root, ctx, stats, &logger)
        .assemble()
        .await
        .map_err(fail)?;

    logger.log_import_completed(&bundle);
    Ok(bundle)
}
