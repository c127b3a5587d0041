//! Parsers for the `rke2/kubectl/*` listings
//!
//! Each parser is a pure function from file contents to typed rows. They
//! never fail: malformed rows are dropped and reported through the returned
//! warning when nothing usable remains.

use super::tabular::{
    age_to_timestamp, lenient_u32, normalize_namespace, parse_ratio, valid_ready_ratio, Table,
};
use super::{ParseContext, Parsed};
use crate::models::{
    Crd, CrdVersion, DaemonSet, Deployment, Event, Namespace, Node, NodeCondition, Pod, PodPhase,
    Service, ServicePort, BUNDLE_CLUSTER_ID, BUNDLE_PROJECT_ID,
};
use tracing::debug;

pub const CRDS: &str = "rke2/kubectl/crds";
pub const DEPLOYMENTS: &str = "rke2/kubectl/deployments";
pub const SERVICES: &str = "rke2/kubectl/services";
pub const NAMESPACES: &str = "rke2/kubectl/namespaces";
pub const PODS: &str = "rke2/kubectl/pods";
pub const EVENTS: &str = "rke2/kubectl/events";
pub const NODES: &str = "rke2/kubectl/nodes";
pub const DAEMONSETS: &str = "rke2/kubectl/daemonsets";

/// Wrap parsed rows, warning when every data line was rejected
fn finish<T>(artifact: &str, items: Vec<T>, table: &Table<'_>) -> Parsed<Vec<T>> {
    if table.skipped > 0 {
        debug!(artifact, skipped = table.skipped, kept = items.len(), "Dropped malformed rows");
    }
    let warning = (items.is_empty() && table.skipped > 0).then(|| {
        format!(
            "{}: no parseable rows ({} malformed)",
            artifact, table.skipped
        )
    });
    Parsed {
        value: items,
        warning,
    }
}

/// `NAME CREATED-AT`
pub fn parse_crds(content: &str) -> Parsed<Vec<Crd>> {
    let table = Table::parse(content, 2);
    let mut crds = Vec::with_capacity(table.rows.len());

    for row in &table.rows {
        let name = row[0];
        let Some((plural, group)) = name.split_once('.') else {
            continue;
        };
        if plural.is_empty() || group.is_empty() {
            continue;
        }

        crds.push(Crd {
            name: name.to_string(),
            group: group.to_string(),
            plural: plural.to_string(),
            kind: kind_from_plural(plural),
            scope: "Cluster".to_string(),
            versions: vec![CrdVersion {
                name: "v1".to_string(),
                served: true,
                storage: true,
            }],
            created: row[1].to_string(),
        });
    }

    finish(CRDS, crds, &table)
}

/// `certificates` -> `Certificate`
fn kind_from_plural(plural: &str) -> String {
    let singular = if plural.len() > 1 {
        plural.strip_suffix('s').unwrap_or(plural)
    } else {
        plural
    };
    let mut chars = singular.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `NAMESPACE NAME READY UP-TO-DATE AVAILABLE AGE ...`
pub fn parse_deployments(content: &str) -> Parsed<Vec<Deployment>> {
    let table = Table::parse(content, 6);
    let mut deployments = Vec::with_capacity(table.rows.len());

    for row in &table.rows {
        let (ready, desired) = parse_ratio(row[2]).unwrap_or((0, 0));
        let ready = ready.min(desired);

        deployments.push(Deployment {
            namespace: normalize_namespace(row[0]).to_string(),
            name: row[1].to_string(),
            desired_replicas: desired,
            ready_replicas: ready,
            available_replicas: ready,
            updated_replicas: ready,
            age: row[5].to_string(),
        });
    }

    finish(DEPLOYMENTS, deployments, &table)
}

/// `NAMESPACE NAME TYPE CLUSTER-IP EXTERNAL-IP PORT(S) ...`
pub fn parse_services(content: &str) -> Parsed<Vec<Service>> {
    let table = Table::parse(content, 6);
    let mut services = Vec::with_capacity(table.rows.len());

    for row in &table.rows {
        services.push(Service {
            namespace: normalize_namespace(row[0]).to_string(),
            name: row[1].to_string(),
            service_type: row[2].to_string(),
            cluster_ip: row[3].to_string(),
            external_ip: row[4].to_string(),
            ports: parse_ports(row[5]),
        });
    }

    finish(SERVICES, services, &table)
}

/// Parse `80/TCP,443:30443/TCP`; tokens that do not parse are dropped
pub fn parse_ports(spec: &str) -> Vec<ServicePort> {
    spec.split(',')
        .filter_map(|token| {
            let (numbers, protocol) = token.trim().split_once('/')?;
            if protocol.is_empty() {
                return None;
            }
            let (port, node_port) = match numbers.split_once(':') {
                Some((port, node)) => (port.parse::<u16>().ok()?, node.parse::<u16>().ok()),
                None => (numbers.parse::<u16>().ok()?, None),
            };
            Some(ServicePort {
                protocol: protocol.to_string(),
                port,
                target_port: port,
                node_port,
            })
        })
        .collect()
}

/// `NAME STATUS AGE`
pub fn parse_namespaces(content: &str, ctx: &ParseContext) -> Parsed<Vec<Namespace>> {
    let table = Table::parse(content, 3);
    let mut namespaces: Vec<Namespace> = Vec::with_capacity(table.rows.len());

    for row in &table.rows {
        let name = normalize_namespace(row[0]);
        if namespaces.iter().any(|ns| ns.name == name) {
            continue;
        }
        namespaces.push(Namespace {
            name: name.to_string(),
            state: row[1].to_lowercase(),
            project_id: BUNDLE_PROJECT_ID.to_string(),
            cluster_id: BUNDLE_CLUSTER_ID.to_string(),
            created_at: age_to_timestamp(row[2], ctx.now),
        });
    }

    finish(NAMESPACES, namespaces, &table)
}

/// `NAMESPACE NAME READY STATUS RESTARTS AGE IP NODE [NOMINATED-NODE] [READINESS-GATES]`
///
/// kubectl annotates restarts as `3 (5m ago)`; the annotation is skipped so
/// the remaining columns line up.
pub fn parse_pods(content: &str, ctx: &ParseContext) -> Parsed<Vec<Pod>> {
    let table = Table::parse(content, 8);
    let mut pods: Vec<Pod> = Vec::with_capacity(table.rows.len());
    let mut rejected = 0usize;

    for row in &table.rows {
        let mut rest: Vec<&str> = row[5..].to_vec();
        if rest.first().is_some_and(|f| f.starts_with('(')) {
            let close = rest.iter().position(|f| f.ends_with(')')).unwrap_or(0);
            rest.drain(..=close);
        }
        // AGE IP NODE must survive the annotation strip
        if rest.len() < 3 {
            rejected += 1;
            continue;
        }

        let namespace = normalize_namespace(row[0]).to_string();
        let name = row[1].to_string();
        if pods.iter().any(|p| p.namespace == namespace && p.name == name) {
            continue;
        }

        let status = row[3].to_string();
        pods.push(Pod {
            namespace,
            name,
            node: rest[2].to_string(),
            ready: valid_ready_ratio(row[2]),
            phase: PodPhase::from_status(&status),
            status,
            restarts: lenient_u32(row[4]),
            age: rest[0].to_string(),
            started_at: age_to_timestamp(rest[0], ctx.now),
            ip: rest[1].to_string(),
            readiness_gates: rest.get(4).map(|g| g.to_string()),
            containers: Vec::new(),
            has_current_logs: false,
            has_previous_logs: false,
            events: None,
        });
    }

    let mut parsed = finish(PODS, pods, &table);
    if parsed.value.is_empty() && rejected > 0 && parsed.warning.is_none() {
        parsed.warning = Some(format!("{}: no parseable rows ({} malformed)", PODS, rejected));
    }
    parsed
}

/// `NAMESPACE LAST-SEEN TYPE REASON OBJECT SUBOBJECT SOURCE MESSAGE... FIRST-SEEN COUNT NAME`
pub fn parse_events(content: &str) -> Parsed<Vec<Event>> {
    let table = Table::parse(content, 11);
    let mut events = Vec::with_capacity(table.rows.len());

    for row in &table.rows {
        let len = row.len();
        let object = row[4];
        let (object_kind, object_name) = object.split_once('/').unwrap_or(("", ""));

        events.push(Event {
            namespace: normalize_namespace(row[0]).to_string(),
            last_seen: row[1].to_string(),
            event_type: row[2].to_string(),
            reason: row[3].to_string(),
            object: object.to_string(),
            object_kind: object_kind.to_string(),
            object_name: object_name.to_string(),
            source: row[6].to_string(),
            message: row[7..len - 3].join(" "),
            first_seen: row[len - 3].to_string(),
            count: lenient_u32(row[len - 2]).max(1),
        });
    }

    finish(EVENTS, events, &table)
}

/// `NAME STATUS ...`
pub fn parse_nodes(content: &str) -> Parsed<Vec<Node>> {
    let table = Table::parse(content, 2);
    let mut nodes: Vec<Node> = Vec::with_capacity(table.rows.len());

    for row in &table.rows {
        if nodes.iter().any(|n| n.name == row[0]) {
            continue;
        }
        nodes.push(Node {
            name: row[0].to_string(),
            status: row[1].to_string(),
            condition: NodeCondition::from_status(row[1]),
        });
    }

    finish(NODES, nodes, &table)
}

/// `NAMESPACE NAME DESIRED CURRENT ...`
pub fn parse_daemonsets(content: &str) -> Parsed<Vec<DaemonSet>> {
    let table = Table::parse(content, 4);
    let mut daemonsets = Vec::with_capacity(table.rows.len());

    for row in &table.rows {
        let ready = if parse_ratio(row[2]).is_some() {
            row[2].to_string()
        } else {
            format!("{}/{}", lenient_u32(row[3]), lenient_u32(row[2]))
        };

        daemonsets.push(DaemonSet {
            namespace: normalize_namespace(row[0]).to_string(),
            name: row[1].to_string(),
            ready,
        });
    }

    finish(DAEMONSETS, daemonsets, &table)
}
