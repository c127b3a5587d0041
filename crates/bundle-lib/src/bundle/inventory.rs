//! Inventory assembly and in-memory queries

use super::kubectl;
use super::logs::{self, POD_LOGS_DIR, SYSTEM_LOGS_DIR};
use super::lookup::guard;
use super::manifest::{self, ManifestSources};
use super::node_health::{self, ETCD_DIR, SYSTEMINFO_DIR};
use super::resolver::{BundleRoot, TreeStats};
use super::tabular::{namespace_matches, normalize_namespace};
use super::{read_artifact, Artifact, ParseContext, Parsed};
use crate::error::BundleError;
use crate::models::{
    Crd, DaemonSet, Deployment, EtcdHealth, Event, LogFile, LogKind, Manifest, Namespace, Node,
    Pod, PodPhase, Resource, ResourceKind, Service, SystemHealth,
};
use crate::observability::StructuredLogger;
use crate::report::{artifacts, ImportReport};
use anyhow::Context;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use tokio::fs;

/// Immutable inventory of one support bundle
#[derive(Debug, Clone, Serialize)]
pub struct Bundle {
    root: BundleRoot,
    manifest: Manifest,
    namespaces: Vec<Namespace>,
    pods: Vec<Pod>,
    deployments: Vec<Deployment>,
    services: Vec<Service>,
    crds: Vec<Crd>,
    events: Vec<Event>,
    nodes: Vec<Node>,
    daemonsets: Vec<DaemonSet>,
    log_files: Vec<LogFile>,
    etcd: Option<EtcdHealth>,
    system: Option<SystemHealth>,
    report: ImportReport,
}

impl Bundle {
    pub fn root(&self) -> &BundleRoot {
        &self.root
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn report(&self) -> &ImportReport {
        &self.report
    }

    pub fn list_pods(&self, namespace: Option<&str>) -> Vec<&Pod> {
        self.pods
            .iter()
            .filter(|p| namespace_matches(namespace, &p.namespace))
            .collect()
    }

    pub fn list_deployments(&self, namespace: Option<&str>) -> Vec<&Deployment> {
        self.deployments
            .iter()
            .filter(|d| namespace_matches(namespace, &d.namespace))
            .collect()
    }

    pub fn list_services(&self, namespace: Option<&str>) -> Vec<&Service> {
        self.services
            .iter()
            .filter(|s| namespace_matches(namespace, &s.namespace))
            .collect()
    }

    pub fn list_daemonsets(&self, namespace: Option<&str>) -> Vec<&DaemonSet> {
        self.daemonsets
            .iter()
            .filter(|d| namespace_matches(namespace, &d.namespace))
            .collect()
    }

    pub fn list_events(&self, namespace: Option<&str>) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| namespace_matches(namespace, &e.namespace))
            .collect()
    }

    pub fn list_all_events(&self) -> &[Event] {
        &self.events
    }

    pub fn list_namespaces(&self) -> &[Namespace] {
        &self.namespaces
    }

    pub fn list_crds(&self) -> &[Crd] {
        &self.crds
    }

    pub fn list_nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn log_files(&self) -> &[LogFile] {
        &self.log_files
    }

    /// Log files narrowed by namespace and pod
    ///
    /// Host logs carry no namespace, so they are kept only when neither
    /// filter narrows the listing.
    pub fn list_log_files(&self, namespace: Option<&str>, pod: Option<&str>) -> Vec<&LogFile> {
        self.log_files
            .iter()
            .filter(|l| match &l.pod {
                Some(r) => {
                    namespace_matches(namespace, &r.namespace) && pod.map_or(true, |p| p == r.pod)
                }
                None => pod.is_none() && namespace_matches(namespace, ""),
            })
            .collect()
    }

    /// Log files belonging to one pod, current and previous
    pub fn pod_logs(&self, namespace: &str, pod: &str) -> Vec<&LogFile> {
        let namespace = normalize_namespace(namespace);
        self.log_files
            .iter()
            .filter(|l| {
                l.pod
                    .as_ref()
                    .is_some_and(|p| p.namespace == namespace && p.pod == pod)
            })
            .collect()
    }

    pub fn etcd_health(&self) -> Option<&EtcdHealth> {
        self.etcd.as_ref()
    }

    pub fn system_health(&self) -> Option<&SystemHealth> {
        self.system.as_ref()
    }

    /// Resolve a back-reference to one entity.
    ///
    /// `namespace` is ignored for cluster-scoped kinds. For log files `name`
    /// is the absolute path.
    pub fn find(&self, kind: ResourceKind, namespace: &str, name: &str) -> Option<Resource<'_>> {
        let ns = normalize_namespace(namespace);
        match kind {
            ResourceKind::Pod => self
                .pods
                .iter()
                .find(|p| p.namespace == ns && p.name == name)
                .map(Resource::Pod),
            ResourceKind::Deployment => self
                .deployments
                .iter()
                .find(|d| d.namespace == ns && d.name == name)
                .map(Resource::Deployment),
            ResourceKind::Service => self
                .services
                .iter()
                .find(|s| s.namespace == ns && s.name == name)
                .map(Resource::Service),
            ResourceKind::DaemonSet => self
                .daemonsets
                .iter()
                .find(|d| d.namespace == ns && d.name == name)
                .map(Resource::DaemonSet),
            ResourceKind::Event => self
                .events
                .iter()
                .find(|e| e.namespace == ns && e.object_name == name)
                .map(Resource::Event),
            ResourceKind::Namespace => self
                .namespaces
                .iter()
                .find(|n| n.name == name)
                .map(Resource::Namespace),
            ResourceKind::Crd => self.crds.iter().find(|c| c.name == name).map(Resource::Crd),
            ResourceKind::Node => self
                .nodes
                .iter()
                .find(|n| n.name == name)
                .map(Resource::Node),
            ResourceKind::LogFile => self
                .log_files
                .iter()
                .find(|l| l.path == Path::new(name))
                .map(Resource::LogFile),
            ResourceKind::Etcd => self.etcd.as_ref().map(Resource::Etcd),
            ResourceKind::System => self.system.as_ref().map(Resource::System),
        }
    }

    /// Read a log file listed in this bundle's inventory
    pub async fn read_log_file(&self, log: &LogFile) -> Result<Vec<u8>, BundleError> {
        if !self.log_files.iter().any(|l| l.path == log.path) {
            return Err(BundleError::LogFileNotFound {
                path: log.path.clone(),
            });
        }
        fs::read(&log.path).await.map_err(|source| BundleError::LogRead {
            path: log.path.clone(),
            source,
        })
    }
}

/// Runs the parsers in dependency order and builds the [`Bundle`]
pub(super) struct Assembler<'a> {
    root: BundleRoot,
    ctx: ParseContext,
    stats: TreeStats,
    report: ImportReport,
    logger: &'a StructuredLogger,
}

impl<'a> Assembler<'a> {
    pub(super) fn new(
        root: BundleRoot,
        ctx: ParseContext,
        stats: TreeStats,
        logger: &'a StructuredLogger,
    ) -> Self {
        Self {
            root,
            ctx,
            stats,
            report: ImportReport::new(),
            logger,
        }
    }

    fn degraded(&mut self, artifact: &str, reason: String) {
        self.logger.log_artifact_degraded(artifact, &reason);
        self.report.degraded(artifact, reason);
    }

    /// Read one file and run `parse` behind the fault guard
    async fn load<T: Default>(
        &mut self,
        artifact: &str,
        relative: &str,
        count: impl FnOnce(&T) -> usize,
        parse: impl FnOnce(&str) -> Parsed<T>,
    ) -> T {
        let content = match read_artifact(&self.root, relative).await {
            Artifact::Missing => {
                self.report.absent(artifact);
                return T::default();
            }
            Artifact::Unreadable(reason) => {
                self.degraded(artifact, reason);
                return T::default();
            }
            Artifact::Content(content) => content,
        };

        match guard(|| parse(&content)) {
            Ok(Parsed {
                value,
                warning: None,
            }) => {
                self.report.loaded(artifact, count(&value));
                value
            }
            Ok(Parsed {
                value,
                warning: Some(warning),
            }) => {
                self.degraded(artifact, warning);
                value
            }
            Err(fault) => {
                self.degraded(artifact, format!("{}: {}", relative, fault));
                T::default()
            }
        }
    }

    async fn dir_exists(&self, relative: &str) -> bool {
        fs::metadata(self.root.join(relative))
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
    }

    pub(super) async fn assemble(mut self) -> Result<Bundle, BundleError> {
        let manifest = self.load_manifest().await?;

        let mut log_files = self
            .load_logs(artifacts::POD_LOGS, POD_LOGS_DIR, LogKind::Pod)
            .await;
        log_files.extend(
            self.load_logs(artifacts::SYSTEM_LOGS, SYSTEM_LOGS_DIR, LogKind::System)
                .await,
        );

        let ctx = self.ctx;
        let crds = self
            .load(artifacts::CRDS, kubectl::CRDS, Vec::len, kubectl::parse_crds)
            .await;
        let deployments = self
            .load(
                artifacts::DEPLOYMENTS,
                kubectl::DEPLOYMENTS,
                Vec::len,
                kubectl::parse_deployments,
            )
            .await;
        let services = self
            .load(
                artifacts::SERVICES,
                kubectl::SERVICES,
                Vec::len,
                kubectl::parse_services,
            )
            .await;
        let namespaces = self
            .load(artifacts::NAMESPACES, kubectl::NAMESPACES, Vec::len, |c| {
                kubectl::parse_namespaces(c, &ctx)
            })
            .await;
        let mut pods = self
            .load(artifacts::PODS, kubectl::PODS, Vec::len, |c| {
                kubectl::parse_pods(c, &ctx)
            })
            .await;
        let nodes = self
            .load(artifacts::NODES, kubectl::NODES, Vec::len, kubectl::parse_nodes)
            .await;
        let daemonsets = self
            .load(
                artifacts::DAEMONSETS,
                kubectl::DAEMONSETS,
                Vec::len,
                kubectl::parse_daemonsets,
            )
            .await;
        let events = self
            .load(artifacts::EVENTS, kubectl::EVENTS, Vec::len, kubectl::parse_events)
            .await;

        attach_logs(&mut pods, &log_files);
        attach_events(&mut pods, &events);

        let etcd = self.load_etcd().await;
        let system = self.load_system_health().await;

        Ok(Bundle {
            root: self.root,
            manifest,
            namespaces,
            pods,
            deployments,
            services,
            crds,
            events,
            nodes,
            daemonsets,
            log_files,
            etcd,
            system,
            report: self.report,
        })
    }

    async fn load_manifest(&mut self) -> Result<Manifest, BundleError> {
        let hostname = read_artifact(&self.root, manifest::HOSTNAME).await;
        let rke2 = read_artifact(&self.root, manifest::RKE2_VERSION).await;
        let k8s = read_artifact(&self.root, manifest::K8S_VERSION).await;

        let collected_at = fs::metadata(self.root.path())
            .await
            .ok()
            .and_then(|m| m.modified().ok())
            .map(|t| chrono::DateTime::<chrono::Utc>::from(t).timestamp())
            .unwrap_or_else(|| self.ctx.now.timestamp());

        let sources = ManifestSources {
            hostname: hostname.content(),
            rke2_version: rke2.content(),
            k8s_version: k8s.content(),
            collected_at,
            stats: self.stats,
        };

        match guard(|| manifest::build_manifest(self.root.path(), &sources)) {
            Ok(Some(manifest)) => {
                self.report.loaded(artifacts::MANIFEST, 1);
                Ok(manifest)
            }
            Ok(None) | Err(_) => Err(BundleError::Manifest {
                path: self.root.path().to_path_buf(),
            }),
        }
    }

    async fn load_logs(&mut self, artifact: &str, relative: &str, kind: LogKind) -> Vec<LogFile> {
        if !self.dir_exists(relative).await {
            self.report.absent(artifact);
            return Vec::new();
        }

        let dir = self.root.join(relative);
        let scanned = match kind {
            LogKind::Pod => logs::scan_pod_logs(&dir).await,
            _ => logs::scan_system_logs(&dir).await,
        }
        .with_context(|| format!("failed to walk {}", relative));

        match scanned {
            Ok(files) => {
                self.report.loaded(artifact, files.len());
                files
            }
            Err(e) => {
                self.degraded(artifact, format!("{:#}", e));
                Vec::new()
            }
        }
    }

    async fn load_etcd(&mut self) -> Option<EtcdHealth> {
        if !self.dir_exists(ETCD_DIR).await {
            self.report.absent(artifacts::ETCD);
            return None;
        }

        let alarms = read_artifact(&self.root, node_health::ETCD_ALARMS).await;
        let endpoints = read_artifact(&self.root, node_health::ETCD_ENDPOINT_HEALTH).await;
        for artifact in [&alarms, &endpoints] {
            if let Artifact::Unreadable(reason) = artifact {
                self.degraded(artifacts::ETCD, reason.clone());
            }
        }

        match guard(|| node_health::parse_etcd(alarms.content(), endpoints.content())) {
            Ok(etcd) => {
                if self.report.status_of(artifacts::ETCD).is_none() {
                    self.report.loaded(artifacts::ETCD, 1);
                }
                Some(etcd)
            }
            Err(fault) => {
                self.degraded(artifacts::ETCD, fault);
                None
            }
        }
    }

    async fn load_system_health(&mut self) -> Option<SystemHealth> {
        if !self.dir_exists(SYSTEMINFO_DIR).await {
            self.report.absent(artifacts::SYSTEM_HEALTH);
            return None;
        }

        let free = read_artifact(&self.root, node_health::FREE_MEMORY).await;
        let df = read_artifact(&self.root, node_health::DISK_FREE).await;
        for artifact in [&free, &df] {
            if let Artifact::Unreadable(reason) = artifact {
                self.degraded(artifacts::SYSTEM_HEALTH, reason.clone());
            }
        }

        match guard(|| node_health::system_health(free.content(), df.content())) {
            Ok(health) => {
                if self.report.status_of(artifacts::SYSTEM_HEALTH).is_none() {
                    self.report.loaded(artifacts::SYSTEM_HEALTH, 1);
                }
                Some(health)
            }
            Err(fault) => {
                self.degraded(artifacts::SYSTEM_HEALTH, fault);
                None
            }
        }
    }
}

/// Record containers and log presence on pods; pods seen only in logs are added
fn attach_logs(pods: &mut Vec<Pod>, log_files: &[LogFile]) {
    let mut index: HashMap<(String, String), usize> = pods
        .iter()
        .enumerate()
        .map(|(i, p)| ((p.namespace.clone(), p.name.clone()), i))
        .collect();

    for log in log_files {
        let Some(pod_ref) = &log.pod else {
            continue;
        };
        let key = (pod_ref.namespace.clone(), pod_ref.pod.clone());
        let idx = *index.entry(key).or_insert_with(|| {
            pods.push(log_only_pod(&pod_ref.namespace, &pod_ref.pod));
            pods.len() - 1
        });

        let pod = &mut pods[idx];
        if !pod.containers.contains(&pod_ref.container) {
            pod.containers.push(pod_ref.container.clone());
        }
        if pod_ref.is_previous {
            pod.has_previous_logs = true;
        } else {
            pod.has_current_logs = true;
        }
    }
}

fn log_only_pod(namespace: &str, name: &str) -> Pod {
    Pod {
        namespace: namespace.to_string(),
        name: name.to_string(),
        node: String::new(),
        ready: None,
        status: "Unknown".to_string(),
        phase: PodPhase::Other,
        restarts: 0,
        age: String::new(),
        started_at: 0,
        ip: String::new(),
        readiness_gates: None,
        containers: Vec::new(),
        has_current_logs: false,
        has_previous_logs: false,
        events: None,
    }
}

/// Attach messages of pod-targeted events, keyed by `namespace/pod`
fn attach_events(pods: &mut [Pod], events: &[Event]) {
    let mut by_pod: HashMap<String, Vec<String>> = HashMap::new();
    for event in events.iter().filter(|e| e.targets_pod()) {
        by_pod
            .entry(format!("{}/{}", event.namespace, event.object_name))
            .or_default()
            .push(event.message.clone());
    }

    for pod in pods.iter_mut() {
        if let Some(messages) = by_pod.remove(&format!("{}/{}", pod.namespace, pod.name)) {
            pod.events = Some(messages);
        }
    }
}
