//! Bundle path resolution and layout validation
//!
//! Turns a user supplied path into the directory that directly contains
//! `rke2/`, unwrapping at most one wrapper directory, and checks that the
//! subtrees the parsers depend on exist.

use crate::error::BundleError;
use serde::Serialize;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// How the bundle sits under the path the user gave
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// `rke2/` is directly under the given path
    Direct,
    /// The given path holds a single directory which contains `rke2/`
    Wrapped,
}

/// Resolved, validated bundle root
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BundleRoot {
    path: PathBuf,
    layout: Layout,
}

impl BundleRoot {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn join(&self, relative: &str) -> PathBuf {
        self.path.join(relative)
    }
}

/// File statistics for a bundle tree
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TreeStats {
    pub file_count: u64,
    pub total_bytes: u64,
}

/// Resolve and validate a bundle directory
pub async fn resolve(input: &str) -> Result<BundleRoot, BundleError> {
    if input.trim().is_empty() {
        return Err(BundleError::MissingPath);
    }

    let path = absolutize(Path::new(input))?;

    let metadata = match fs::metadata(&path).await {
        Ok(m) => m,
        Err(e) if e.kind() == IoErrorKind::NotFound => {
            return Err(BundleError::NotFound { path });
        }
        Err(source) => return Err(BundleError::InvalidPath { path, source }),
    };
    if !metadata.is_dir() {
        return Err(BundleError::NotADirectory { path });
    }

    let root = detect_layout(&path).await?;
    debug!(path = %root.path.display(), layout = ?root.layout, "Detected bundle layout");

    if !is_dir(&root.join("rke2/kubectl")).await && !is_dir(&root.join("rke2/podlogs")).await {
        return Err(BundleError::IncompleteBundle { path: root.path });
    }

    Ok(root)
}

fn absolutize(path: &Path) -> Result<PathBuf, BundleError> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(|source| BundleError::InvalidPath {
                path: path.to_path_buf(),
                source,
            })?
            .join(path)
    };

    // Drop `.` and resolve `..` lexically; symlinks are left alone
    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            std::path::Component::CurDir => {}
            std::path::Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    Ok(normalized)
}

async fn is_dir(path: &Path) -> bool {
    fs::metadata(path).await.map(|m| m.is_dir()).unwrap_or(false)
}

async fn detect_layout(path: &Path) -> Result<BundleRoot, BundleError> {
    if is_dir(&path.join("rke2")).await {
        return Ok(BundleRoot {
            path: path.to_path_buf(),
            layout: Layout::Direct,
        });
    }

    let not_a_bundle = || BundleError::NotABundle {
        path: path.to_path_buf(),
    };

    let mut entries = fs::read_dir(path).await.map_err(|_| not_a_bundle())?;
    let mut only: Option<PathBuf> = None;
    while let Some(entry) = entries.next_entry().await.map_err(|_| not_a_bundle())? {
        if only.is_some() {
            return Err(not_a_bundle());
        }
        only = Some(entry.path());
    }

    match only {
        Some(inner) if is_dir(&inner).await && is_dir(&inner.join("rke2")).await => Ok(BundleRoot {
            path: inner,
            layout: Layout::Wrapped,
        }),
        _ => Err(not_a_bundle()),
    }
}

/// Count regular files and sum their sizes; symlinks and special files are ignored
pub async fn tree_stats(root: &Path) -> TreeStats {
    let mut stats = TreeStats::default();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let Ok(mut entries) = fs::read_dir(&dir).await else {
            continue;
        };
        while let Ok(Some(entry)) = entries.next_entry().await {
            let Ok(file_type) = entry.file_type().await else {
                continue;
            };
            if file_type.is_dir() {
                pending.push(entry.path());
            } else if file_type.is_file() {
                let size = entry.metadata().await.map(|m| m.len()).unwrap_or(0);
                stats.file_count += 1;
                stats.total_bytes += size;
            }
        }
    }

    stats
}
