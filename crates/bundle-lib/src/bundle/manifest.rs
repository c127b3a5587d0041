//! Bundle manifest: node identity, versions and tree statistics

use super::lookup::lookup_str;
use super::resolver::TreeStats;
use crate::models::{Manifest, UNKNOWN_VERSION};
use std::path::Path;

pub const HOSTNAME: &str = "systeminfo/hostname";
pub const RKE2_VERSION: &str = "rke2/version";
pub const K8S_VERSION: &str = "rke2/kubectl/version";

const BUNDLE_TYPE: &str = "rke2";

/// Inputs gathered by the assembler for the manifest
#[derive(Debug, Default)]
pub struct ManifestSources<'a> {
    pub hostname: Option<&'a str>,
    pub rke2_version: Option<&'a str>,
    pub k8s_version: Option<&'a str>,
    pub collected_at: i64,
    pub stats: TreeStats,
}

/// Build the manifest; `None` only when no node name can be found at all
pub fn build_manifest(root: &Path, sources: &ManifestSources<'_>) -> Option<Manifest> {
    let node_name = sources
        .hostname
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .map(str::to_string)
        .or_else(|| {
            root.file_name()
                .map(|n| n.to_string_lossy().trim().to_string())
                .filter(|n| !n.is_empty())
        })?;

    Some(Manifest {
        node_name,
        collected_at: sources.collected_at,
        rke2_version: sources
            .rke2_version
            .map(parse_rke2_version)
            .unwrap_or_else(|| UNKNOWN_VERSION.to_string()),
        k8s_version: sources
            .k8s_version
            .map(parse_k8s_version)
            .unwrap_or_else(|| UNKNOWN_VERSION.to_string()),
        file_count: sources.stats.file_count,
        total_bytes: sources.stats.total_bytes,
        bundle_type: BUNDLE_TYPE.to_string(),
    })
}

/// `rke2 version v1.28.3+rke2r1 (hash)` keeps the first line only
fn parse_rke2_version(content: &str) -> String {
    content
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| UNKNOWN_VERSION.to_string())
}

/// Extract the Kubernetes version from `kubectl version` output.
///
/// JSON output is read through `serverVersion.gitVersion` (then
/// `clientVersion`); Go struct output is probed for the first `GitVersion`
/// value; anything else is returned trimmed.
pub fn parse_k8s_version(content: &str) -> String {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return UNKNOWN_VERSION.to_string();
    }

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        for section in ["serverVersion", "clientVersion"] {
            let version = lookup_str(&value, &[section, "gitVersion"]);
            if !version.is_empty() {
                return version.to_string();
            }
        }
    }

    if let Some(version) = probe_git_version(trimmed) {
        return version;
    }

    trimmed.to_string()
}

/// Find the first `GitVersion:"v1.2.3"` (any case, optional quotes) value
fn probe_git_version(content: &str) -> Option<String> {
    let lower = content.to_ascii_lowercase();
    let idx = lower.find("gitversion")?;
    let rest = &content[idx + "gitversion".len()..];
    let rest = rest.trim_start_matches(|c: char| c == '"' || c == ':' || c.is_whitespace());
    let value: String = rest
        .chars()
        .take_while(|c| *c != '"' && *c != ',' && *c != '}' && !c.is_whitespace())
        .collect();
    (!value.is_empty()).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_manifest_hostname_and_defaults() {
        let sources = ManifestSources {
            hostname: Some("  node-a\n"),
            stats: TreeStats {
                file_count: 3,
                total_bytes: 300,
            },
            ..Default::default()
        };
        let manifest = build_manifest(&PathBuf::from("/tmp/bundle-dir"), &sources).unwrap();
        assert_eq!(manifest.node_name, "node-a");
        assert_eq!(manifest.rke2_version, "unknown");
        assert_eq!(manifest.k8s_version, "unknown");
        assert_eq!(manifest.file_count, 3);
        assert_eq!(manifest.total_bytes, 300);
        assert_eq!(manifest.bundle_type, "rke2");
    }

    #[test]
    fn test_manifest_falls_back_to_directory_name() {
        let sources = ManifestSources {
            hostname: Some("   "),
            ..Default::default()
        };
        let manifest = build_manifest(&PathBuf::from("/tmp/node-2025-01-01"), &sources).unwrap();
        assert_eq!(manifest.node_name, "node-2025-01-01");
    }

    #[test]
    fn test_manifest_without_any_name() {
        assert!(build_manifest(&PathBuf::from("/"), &ManifestSources::default()).is_none());
    }

    #[test]
    fn test_k8s_version_go_struct() {
        let content = r#"Client Version: version.Info{Major:"1", Minor:"28", GitVersion:"v1.28.3+rke2r1", GitCommit:"abc"}
Server Version: version.Info{Major:"1", Minor:"28", GitVersion:"v1.28.4+rke2r1"}"#;
        assert_eq!(parse_k8s_version(content), "v1.28.3+rke2r1");
    }

    #[test]
    fn test_k8s_version_json() {
        let content = r#"{"clientVersion":{"gitVersion":"v1.29.0"},"serverVersion":{"gitVersion":"v1.29.1+rke2r1"}}"#;
        assert_eq!(parse_k8s_version(content), "v1.29.1+rke2r1");
    }

    #[test]
    fn test_k8s_version_raw_and_empty() {
        assert_eq!(parse_k8s_version("  v1.27.9+rke2r1\n"), "v1.27.9+rke2r1");
        assert_eq!(parse_k8s_version("\n"), "unknown");
    }

    #[test]
    fn test_rke2_version_first_line() {
        assert_eq!(
            parse_rke2_version("\nrke2 version v1.28.3+rke2r1 (abc)\ngo version go1.20\n"),
            "rke2 version v1.28.3+rke2r1 (abc)"
        );
    }
}
