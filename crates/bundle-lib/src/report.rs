//! Import report
//!
//! Records, per artifact, whether it was loaded, absent, or present but
//! unusable, and rolls that up into an overall import status.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Outcome of loading one artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ArtifactStatus {
    /// Read and parsed; `count` is the number of records produced
    Loaded { count: usize },
    /// Not present in the bundle
    Absent,
    /// Present but unreadable or unparseable
    Degraded { reason: String },
}

impl ArtifactStatus {
    pub fn is_usable(&self) -> bool {
        matches!(self, ArtifactStatus::Loaded { .. })
    }
}

/// Overall import status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportStatus {
    /// Every artifact that exists was parsed
    Complete,
    /// At least one artifact produced a warning
    Partial,
}

/// A non-fatal problem found while parsing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactWarning {
    pub artifact: String,
    pub message: String,
}

/// Well-known artifact names used in the report
pub mod artifacts {
    pub const MANIFEST: &str = "manifest";
    pub const POD_LOGS: &str = "podlogs";
    pub const SYSTEM_LOGS: &str = "systemlogs";
    pub const CRDS: &str = "crds";
    pub const DEPLOYMENTS: &str = "deployments";
    pub const SERVICES: &str = "services";
    pub const NAMESPACES: &str = "namespaces";
    pub const PODS: &str = "pods";
    pub const EVENTS: &str = "events";
    pub const NODES: &str = "nodes";
    pub const DAEMONSETS: &str = "daemonsets";
    pub const ETCD: &str = "etcd";
    pub const SYSTEM_HEALTH: &str = "systeminfo";
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportReport {
    artifacts: BTreeMap<String, ArtifactStatus>,
    warnings: Vec<ArtifactWarning>,
}

impl ImportReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn loaded(&mut self, artifact: &str, count: usize) {
        self.artifacts
            .insert(artifact.to_string(), ArtifactStatus::Loaded { count });
    }

    pub fn absent(&mut self, artifact: &str) {
        self.artifacts
            .insert(artifact.to_string(), ArtifactStatus::Absent);
    }

    /// Mark an artifact degraded and keep the reason as a warning
    pub fn degraded(&mut self, artifact: &str, reason: impl Into<String>) {
        let reason = reason.into();
        self.warnings.push(ArtifactWarning {
            artifact: artifact.to_string(),
            message: reason.clone(),
        });
        self.artifacts
            .insert(artifact.to_string(), ArtifactStatus::Degraded { reason });
    }

    pub fn status_of(&self, artifact: &str) -> Option<&ArtifactStatus> {
        self.artifacts.get(artifact)
    }

    pub fn artifacts(&self) -> &BTreeMap<String, ArtifactStatus> {
        &self.artifacts
    }

    pub fn warnings(&self) -> &[ArtifactWarning] {
        &self.warnings
    }

    pub fn absent_artifacts(&self) -> Vec<&str> {
        self.artifacts
            .iter()
            .filter(|(_, s)| matches!(s, ArtifactStatus::Absent))
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub fn degraded_artifacts(&self) -> Vec<&str> {
        self.artifacts
            .iter()
            .filter(|(_, s)| matches!(s, ArtifactStatus::Degraded { .. }))
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub fn status(&self) -> ImportStatus {
        if self
            .artifacts
            .values()
            .any(|s| matches!(s, ArtifactStatus::Degraded { .. }))
        {
            ImportStatus::Partial
        } else {
            ImportStatus::Complete
        }
    }
}
