//! Core data models for the bundle inventory
//!
//! Every entity is created once during import and never mutated afterwards.
//! Raw status strings are kept for display; the derived enums drive triage.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Value recorded when a version artifact is missing or empty
pub const UNKNOWN_VERSION: &str = "unknown";

/// Project id assigned to every namespace imported from a bundle
pub const BUNDLE_PROJECT_ID: &str = "bundle-project";

/// Cluster id assigned to every namespace imported from a bundle
pub const BUNDLE_CLUSTER_ID: &str = "bundle";

/// Bundle metadata gathered from the version and systeminfo artifacts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub node_name: String,
    /// Unix seconds
    pub collected_at: i64,
    pub rke2_version: String,
    pub k8s_version: String,
    pub file_count: u64,
    pub total_bytes: u64,
    pub bundle_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Namespace {
    pub name: String,
    /// Lowercased status column, e.g. `active` or `terminating`
    pub state: String,
    pub project_id: String,
    pub cluster_id: String,
    pub created_at: i64,
}

/// Pod condition derived from the status column at parse time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PodPhase {
    CrashLoopBackOff,
    OomKilled,
    Error,
    ImagePullBackOff,
    Evicted,
    Running,
    Pending,
    Completed,
    Other,
}

impl PodPhase {
    /// Classify a raw status string. Order matters: the first match wins.
    pub fn from_status(status: &str) -> Self {
        if status.contains("CrashLoopBackOff") {
            PodPhase::CrashLoopBackOff
        } else if status.contains("OOMKilled") {
            PodPhase::OomKilled
        } else if status.contains("Error") || status.contains("Failed") {
            PodPhase::Error
        } else if status.contains("ImagePullBackOff") || status.contains("ErrImagePull") {
            PodPhase::ImagePullBackOff
        } else if status.contains("Evicted") {
            PodPhase::Evicted
        } else if status == "Running" {
            PodPhase::Running
        } else if status == "Pending" || status.starts_with("Init:") || status == "ContainerCreating" {
            PodPhase::Pending
        } else if status == "Completed" || status == "Succeeded" {
            PodPhase::Completed
        } else {
            PodPhase::Other
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pod {
    pub namespace: String,
    pub name: String,
    pub node: String,
    /// `X/Y` with X <= Y; absent when the column was malformed
    pub ready: Option<String>,
    pub status: String,
    pub phase: PodPhase,
    pub restarts: u32,
    pub age: String,
    /// Unix seconds derived from `age`; 0 when the age was unparseable
    pub started_at: i64,
    pub ip: String,
    pub readiness_gates: Option<String>,
    pub containers: Vec<String>,
    pub has_current_logs: bool,
    pub has_previous_logs: bool,
    /// Messages of events whose involved object is this pod
    pub events: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deployment {
    pub namespace: String,
    pub name: String,
    pub desired_replicas: u32,
    pub ready_replicas: u32,
    pub available_replicas: u32,
    pub updated_replicas: u32,
    pub age: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServicePort {
    pub protocol: String,
    pub port: u16,
    pub target_port: u16,
    pub node_port: Option<u16>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub namespace: String,
    pub name: String,
    pub service_type: String,
    pub cluster_ip: String,
    pub external_ip: String,
    pub ports: Vec<ServicePort>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrdVersion {
    pub name: String,
    pub served: bool,
    pub storage: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Crd {
    /// `plural.group`
    pub name: String,
    pub group: String,
    pub plural: String,
    pub kind: String,
    pub scope: String,
    pub versions: Vec<CrdVersion>,
    pub created: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub namespace: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub reason: String,
    /// Raw `kind/name` column
    pub object: String,
    pub object_kind: String,
    pub object_name: String,
    pub message: String,
    pub source: String,
    pub first_seen: String,
    pub last_seen: String,
    /// Always at least 1
    pub count: u32,
}

impl Event {
    pub fn is_warning(&self) -> bool {
        self.event_type == "Warning"
    }

    /// True when the involved object is a pod
    pub fn targets_pod(&self) -> bool {
        self.object_kind.eq_ignore_ascii_case("pod")
    }
}

/// Node condition derived from the status column at parse time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeCondition {
    Ready,
    NotReady,
    Unknown,
    Other,
}

impl NodeCondition {
    pub fn from_status(status: &str) -> Self {
        if status.contains("NotReady") {
            NodeCondition::NotReady
        } else if status.contains("Unknown") {
            NodeCondition::Unknown
        } else if status.split(',').any(|s| s == "Ready") {
            NodeCondition::Ready
        } else {
            NodeCondition::Other
        }
    }

    pub fn is_unhealthy(&self) -> bool {
        matches!(self, NodeCondition::NotReady | NodeCondition::Unknown)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    pub status: String,
    pub condition: NodeCondition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaemonSet {
    pub namespace: String,
    pub name: String,
    /// `X/Y`
    pub ready: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    Pod,
    System,
    Journald,
    Containerd,
    Kubelet,
}

impl LogKind {
    /// Classify a file under `systemlogs/` by its name
    pub fn classify_system(file_name: &str) -> Self {
        let lower = file_name.to_ascii_lowercase();
        if lower.contains("kubelet") {
            LogKind::Kubelet
        } else if lower.contains("containerd") {
            LogKind::Containerd
        } else if lower.contains("journal") {
            LogKind::Journald
        } else {
            LogKind::System
        }
    }
}

impl fmt::Display for LogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogKind::Pod => write!(f, "pod"),
            LogKind::System => write!(f, "system"),
            LogKind::Journald => write!(f, "journald"),
            LogKind::Containerd => write!(f, "containerd"),
            LogKind::Kubelet => write!(f, "kubelet"),
        }
    }
}

/// Identity carried by pod log files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodLogRef {
    pub namespace: String,
    pub pod: String,
    pub container: String,
    pub is_previous: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogFile {
    pub path: PathBuf,
    pub kind: LogKind,
    pub pod: Option<PodLogRef>,
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EtcdHealth {
    pub healthy: bool,
    pub has_alarms: bool,
    pub alarm_type: String,
    pub alarm_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemHealth {
    pub memory_used_percent: f64,
    pub disk_used_percent: f64,
}

/// Kind tag shared by inventory lookups and attention items
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Pod,
    Deployment,
    Service,
    Namespace,
    Crd,
    Event,
    Node,
    DaemonSet,
    LogFile,
    Etcd,
    System,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::Pod => "Pod",
            ResourceKind::Deployment => "Deployment",
            ResourceKind::Service => "Service",
            ResourceKind::Namespace => "Namespace",
            ResourceKind::Crd => "CRD",
            ResourceKind::Event => "Event",
            ResourceKind::Node => "Node",
            ResourceKind::DaemonSet => "DaemonSet",
            ResourceKind::LogFile => "LogFile",
            ResourceKind::Etcd => "Etcd",
            ResourceKind::System => "System",
        };
        write!(f, "{}", name)
    }
}

/// Borrowed view of one inventory entity, tagged by kind
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", content = "resource", rename_all = "snake_case")]
pub enum Resource<'a> {
    Pod(&'a Pod),
    Deployment(&'a Deployment),
    Service(&'a Service),
    Namespace(&'a Namespace),
    Crd(&'a Crd),
    Event(&'a Event),
    Node(&'a Node),
    DaemonSet(&'a DaemonSet),
    LogFile(&'a LogFile),
    Etcd(&'a EtcdHealth),
    System(&'a SystemHealth),
}

impl Resource<'_> {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Resource::Pod(_) => ResourceKind::Pod,
            Resource::Deployment(_) => ResourceKind::Deployment,
            Resource::Service(_) => ResourceKind::Service,
            Resource::Namespace(_) => ResourceKind::Namespace,
            Resource::Crd(_) => ResourceKind::Crd,
            Resource::Event(_) => ResourceKind::Event,
            Resource::Node(_) => ResourceKind::Node,
            Resource::DaemonSet(_) => ResourceKind::DaemonSet,
            Resource::LogFile(_) => ResourceKind::LogFile,
            Resource::Etcd(_) => ResourceKind::Etcd,
            Resource::System(_) => ResourceKind::System,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pod_phase_first_match_wins() {
        assert_eq!(PodPhase::from_status("CrashLoopBackOff"), PodPhase::CrashLoopBackOff);
        assert_eq!(PodPhase::from_status("Init:CrashLoopBackOff"), PodPhase::CrashLoopBackOff);
        assert_eq!(PodPhase::from_status("OOMKilled"), PodPhase::OomKilled);
        assert_eq!(PodPhase::from_status("Init:Error"), PodPhase::Error);
        assert_eq!(PodPhase::from_status("Failed"), PodPhase::Error);
        assert_eq!(PodPhase::from_status("ErrImagePull"), PodPhase::ImagePullBackOff);
        assert_eq!(PodPhase::from_status("ImagePullBackOff"), PodPhase::ImagePullBackOff);
        assert_eq!(PodPhase::from_status("Evicted"), PodPhase::Evicted);
        assert_eq!(PodPhase::from_status("Running"), PodPhase::Running);
        assert_eq!(PodPhase::from_status("Completed"), PodPhase::Completed);
        assert_eq!(PodPhase::from_status("Terminating"), PodPhase::Other);
    }

    #[test]
    fn test_node_condition() {
        assert_eq!(NodeCondition::from_status("Ready"), NodeCondition::Ready);
        assert_eq!(
            NodeCondition::from_status("Ready,SchedulingDisabled"),
            NodeCondition::Ready
        );
        assert_eq!(NodeCondition::from_status("NotReady"), NodeCondition::NotReady);
        assert_eq!(NodeCondition::from_status("Unknown"), NodeCondition::Unknown);
        assert!(NodeCondition::from_status("NotReady,SchedulingDisabled").is_unhealthy());
        assert!(!NodeCondition::from_status("Ready").is_unhealthy());
    }

    #[test]
    fn test_log_kind_classification() {
        assert_eq!(LogKind::classify_system("kubelet.log"), LogKind::Kubelet);
        assert_eq!(LogKind::classify_system("containerd.log"), LogKind::Containerd);
        assert_eq!(LogKind::classify_system("journalctl-rke2"), LogKind::Journald);
        assert_eq!(LogKind::classify_system("dmesg"), LogKind::System);
    }
}
