//! Inventory listing commands

use anyhow::Result;
use bundle_lib::Bundle;
use tabled::Tabled;

use crate::output::{color_health, color_pod_status, format_timestamp, print_rows, OutputFormat};

#[derive(Tabled)]
struct PodRow {
    #[tabled(rename = "Namespace")]
    namespace: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Ready")]
    ready: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Restarts")]
    restarts: u32,
    #[tabled(rename = "Age")]
    age: String,
    #[tabled(rename = "Node")]
    node: String,
    #[tabled(rename = "Logs")]
    logs: String,
}

#[derive(Tabled)]
struct DeploymentRow {
    #[tabled(rename = "Namespace")]
    namespace: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Ready")]
    ready: String,
    #[tabled(rename = "Available")]
    available: u32,
    #[tabled(rename = "Age")]
    age: String,
}

#[derive(Tabled)]
struct ServiceRow {
    #[tabled(rename = "Namespace")]
    namespace: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    service_type: String,
    #[tabled(rename = "Cluster IP")]
    cluster_ip: String,
    #[tabled(rename = "External IP")]
    external_ip: String,
    #[tabled(rename = "Ports")]
    ports: String,
}

#[derive(Tabled)]
struct NamespaceRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Created")]
    created: String,
}

#[derive(Tabled)]
struct CrdRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Group")]
    group: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Created")]
    created: String,
}

#[derive(Tabled)]
struct NodeRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
}

#[derive(Tabled)]
struct DaemonSetRow {
    #[tabled(rename = "Namespace")]
    namespace: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Ready")]
    ready: String,
}

#[derive(Tabled)]
struct EventRow {
    #[tabled(rename = "Namespace")]
    namespace: String,
    #[tabled(rename = "Type")]
    event_type: String,
    #[tabled(rename = "Reason")]
    reason: String,
    #[tabled(rename = "Object")]
    object: String,
    #[tabled(rename = "Count")]
    count: u32,
    #[tabled(rename = "Message")]
    message: String,
}

fn log_flags(current: bool, previous: bool) -> String {
    match (current, previous) {
        (true, true) => "current+previous".to_string(),
        (true, false) => "current".to_string(),
        (false, true) => "previous".to_string(),
        (false, false) => "-".to_string(),
    }
}

pub fn list_pods(bundle: &Bundle, namespace: Option<&str>, format: OutputFormat) -> Result<()> {
    let pods = bundle.list_pods(namespace);
    let rows = pods
        .iter()
        .map(|p| PodRow {
            namespace: p.namespace.clone(),
            name: p.name.clone(),
            ready: p.ready.clone().unwrap_or_else(|| "-".to_string()),
            status: color_pod_status(&p.status, p.phase),
            restarts: p.restarts,
            age: p.age.clone(),
            node: p.node.clone(),
            logs: log_flags(p.has_current_logs, p.has_previous_logs),
        })
        .collect();
    print_rows(&pods, rows, format, "No pods found")
}

pub fn list_deployments(
    bundle: &Bundle,
    namespace: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    let deployments = bundle.list_deployments(namespace);
    let rows = deployments
        .iter()
        .map(|d| DeploymentRow {
            namespace: d.namespace.clone(),
            name: d.name.clone(),
            ready: color_health(
                d.ready_replicas == d.desired_replicas,
                &format!("{}/{}", d.ready_replicas, d.desired_replicas),
            ),
            available: d.available_replicas,
            age: d.age.clone(),
        })
        .collect();
    print_rows(&deployments, rows, format, "No deployments found")
}

pub fn list_services(bundle: &Bundle, namespace: Option<&str>, format: OutputFormat) -> Result<()> {
    let services = bundle.list_services(namespace);
    let rows = services
        .iter()
        .map(|s| ServiceRow {
            namespace: s.namespace.clone(),
            name: s.name.clone(),
            service_type: s.service_type.clone(),
            cluster_ip: s.cluster_ip.clone(),
            external_ip: s.external_ip.clone(),
            ports: s
                .ports
                .iter()
                .map(|p| match p.node_port {
                    Some(node_port) => format!("{}:{}/{}", p.port, node_port, p.protocol),
                    None => format!("{}/{}", p.port, p.protocol),
                })
                .collect::<Vec<_>>()
                .join(","),
        })
        .collect();
    print_rows(&services, rows, format, "No services found")
}

pub fn list_namespaces(bundle: &Bundle, format: OutputFormat) -> Result<()> {
    let namespaces = bundle.list_namespaces();
    let rows = namespaces
        .iter()
        .map(|n| NamespaceRow {
            name: n.name.clone(),
            state: color_health(n.state == "active", &n.state),
            created: format_timestamp(n.created_at),
        })
        .collect();
    print_rows(namespaces, rows, format, "No namespaces found")
}

pub fn list_crds(bundle: &Bundle, format: OutputFormat) -> Result<()> {
    let crds = bundle.list_crds();
    let rows = crds
        .iter()
        .map(|c| CrdRow {
            name: c.name.clone(),
            group: c.group.clone(),
            kind: c.kind.clone(),
            created: c.created.clone(),
        })
        .collect();
    print_rows(crds, rows, format, "No CRDs found")
}

pub fn list_nodes(bundle: &Bundle, format: OutputFormat) -> Result<()> {
    let nodes = bundle.list_nodes();
    let rows = nodes
        .iter()
        .map(|n| NodeRow {
            name: n.name.clone(),
            status: color_health(!n.condition.is_unhealthy(), &n.status),
        })
        .collect();
    print_rows(nodes, rows, format, "No nodes found")
}

pub fn list_daemonsets(
    bundle: &Bundle,
    namespace: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    let daemonsets = bundle.list_daemonsets(namespace);
    let rows = daemonsets
        .iter()
        .map(|d| {
            let ready = d
                .ready
                .split_once('/')
                .is_some_and(|(ready, desired)| ready == desired);
            DaemonSetRow {
                namespace: d.namespace.clone(),
                name: d.name.clone(),
                ready: color_health(ready, &d.ready),
            }
        })
        .collect();
    print_rows(&daemonsets, rows, format, "No daemonsets found")
}

pub fn list_events(
    bundle: &Bundle,
    namespace: Option<&str>,
    warnings_only: bool,
    format: OutputFormat,
) -> Result<()> {
    let events: Vec<_> = bundle
        .list_events(namespace)
        .into_iter()
        .filter(|e| !warnings_only || e.is_warning())
        .collect();
    let rows = events
        .iter()
        .map(|e| EventRow {
            namespace: e.namespace.clone(),
            event_type: color_health(!e.is_warning(), &e.event_type),
            reason: e.reason.clone(),
            object: e.object.clone(),
            count: e.count,
            message: e.message.clone(),
        })
        .collect();
    print_rows(&events, rows, format, "No events found")
}
