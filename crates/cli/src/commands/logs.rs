//! Log inventory and log reading commands

use anyhow::{Context, Result};
use bundle_lib::{Bundle, BundleError, LogFile, Resource, ResourceKind};
use std::io::Write;
use std::path::{Path, PathBuf};
use tabled::Tabled;

use crate::output::{format_bytes, print_rows, OutputFormat};

#[derive(Tabled)]
struct LogRow {
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Namespace")]
    namespace: String,
    #[tabled(rename = "Pod")]
    pod: String,
    #[tabled(rename = "Container")]
    container: String,
    #[tabled(rename = "Previous")]
    previous: String,
    #[tabled(rename = "Size")]
    size: String,
    #[tabled(rename = "Path")]
    path: String,
}

fn relative_to<'a>(root: &Path, path: &'a Path) -> &'a Path {
    path.strip_prefix(root).unwrap_or(path)
}

/// List log files, optionally narrowed to a namespace and pod
pub fn list_logs(
    bundle: &Bundle,
    namespace: Option<&str>,
    pod: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    let logs = bundle.list_log_files(namespace, pod);

    let root = bundle.root().path();
    let rows = logs
        .iter()
        .map(|l| {
            let (namespace, pod, container, previous) = match &l.pod {
                Some(r) => (
                    r.namespace.clone(),
                    r.pod.clone(),
                    r.container.clone(),
                    if r.is_previous { "yes" } else { "no" }.to_string(),
                ),
                None => Default::default(),
            };
            LogRow {
                kind: l.kind.to_string(),
                namespace,
                pod,
                container,
                previous,
                size: format_bytes(l.size),
                path: relative_to(root, &l.path).display().to_string(),
            }
        })
        .collect();
    print_rows(&logs, rows, format, "No log files found")
}

/// Resolve a user path (absolute, or relative to the bundle root) to an inventoried log
fn find_log<'a>(bundle: &'a Bundle, path: &str) -> Result<&'a LogFile, BundleError> {
    let candidate = Path::new(path);
    let absolute: PathBuf = if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        bundle.root().path().join(candidate)
    };

    match bundle.find(ResourceKind::LogFile, "", &absolute.to_string_lossy()) {
        Some(Resource::LogFile(log)) => Ok(log),
        _ => Err(BundleError::LogFileNotFound { path: absolute }),
    }
}

/// Print a log file, or only its last `tail` lines
pub async fn read_log(bundle: &Bundle, path: &str, tail: Option<usize>) -> Result<()> {
    let log = find_log(bundle, path)?;
    let bytes = bundle
        .read_log_file(log)
        .await
        .with_context(|| format!("Failed to read {}", path))?;

    let mut stdout = std::io::stdout().lock();
    match tail {
        Some(n) => {
            let text = String::from_utf8_lossy(&bytes);
            let lines: Vec<&str> = text.lines().collect();
            for line in &lines[lines.len().saturating_sub(n)..] {
                writeln!(stdout, "{}", line)?;
            }
        }
        None => stdout.write_all(&bytes)?,
    }
    stdout.flush()?;
    Ok(())
}
