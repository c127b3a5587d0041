//! Log file inventory
//!
//! Pod logs live under `rke2/podlogs/` and are named
//! `<namespace>_<pod>_<container>[-previous].log`. Everything under
//! `systemlogs/` is recorded as a host log without being parsed.
//! Only metadata is read here; contents are loaded on demand.

use crate::models::{LogFile, LogKind, PodLogRef};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

pub const POD_LOGS_DIR: &str = "rke2/podlogs";
pub const SYSTEM_LOGS_DIR: &str = "systemlogs";

const LOG_SUFFIX: &str = ".log";
const PREVIOUS_SUFFIX: &str = "-previous";

/// Split a pod log file name into its identity.
///
/// The namespace is the first `_` segment and the container the last, so pod
/// names containing underscores still split deterministically.
pub fn parse_pod_log_name(file_name: &str) -> Option<PodLogRef> {
    let stem = file_name.strip_suffix(LOG_SUFFIX)?;
    let (stem, is_previous) = match stem.strip_suffix(PREVIOUS_SUFFIX) {
        Some(s) => (s, true),
        None => (stem, false),
    };

    let (namespace, rest) = stem.split_once('_')?;
    let (pod, container) = rest.rsplit_once('_')?;
    if namespace.is_empty() || pod.is_empty() || container.is_empty() {
        return None;
    }

    Some(PodLogRef {
        namespace: namespace.to_string(),
        pod: pod.to_string(),
        container: container.to_string(),
        is_previous,
    })
}

/// Regular files under `dir`, recursively, with their sizes
async fn walk_files(dir: &Path) -> std::io::Result<Vec<(PathBuf, u64)>> {
    let mut files = Vec::new();
    let mut pending = vec![dir.to_path_buf()];

    while let Some(current) = pending.pop() {
        let mut entries = fs::read_dir(&current).await?;
        while let Some(entry) = entries.next_entry().await? {
            let file_type = entry.file_type().await?;
            if file_type.is_dir() {
                pending.push(entry.path());
            } else if file_type.is_file() {
                let size = entry.metadata().await.map(|m| m.len()).unwrap_or(0);
                files.push((entry.path(), size));
            }
        }
    }

    files.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(files)
}

/// Inventory pod logs; file names that do not follow the grammar are skipped
pub async fn scan_pod_logs(dir: &Path) -> std::io::Result<Vec<LogFile>> {
    let mut logs = Vec::new();

    for (path, size) in walk_files(dir).await? {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        match parse_pod_log_name(&name) {
            Some(pod) => logs.push(LogFile {
                path,
                kind: LogKind::Pod,
                pod: Some(pod),
                size,
            }),
            None => debug!(file = %name, "Skipping pod log with unrecognised name"),
        }
    }

    Ok(logs)
}

/// Inventory host logs, classified by file name
pub async fn scan_system_logs(dir: &Path) -> std::io::Result<Vec<LogFile>> {
    let files = walk_files(dir).await?;
    Ok(files
        .into_iter()
        .map(|(path, size)| {
            let kind = path
                .file_name()
                .map(|n| LogKind::classify_system(&n.to_string_lossy()))
                .unwrap_or(LogKind::System);
            LogFile {
                path,
                kind,
                pod: None,
                size,
            }
        })
        .collect())
}
