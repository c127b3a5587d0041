//! Signal detectors, one per tier
//!
//! Each detector appends items in a deterministic order derived from the
//! bundle's own row order.

use super::item::{AttentionItem, ItemRef, ItemTag, Severity};
use crate::bundle::{parse_ratio, Bundle};
use crate::models::{Pod, PodPhase, ResourceKind, BUNDLE_CLUSTER_ID};
use std::collections::HashMap;

/// Restart count at which a pod is flagged
pub const RESTART_THRESHOLD: u32 = 3;

/// Aggregated warning-event count at which a reason is flagged
pub const EVENT_AGGREGATE_THRESHOLD: u32 = 5;

/// Memory use above this percent is reported
pub const MEMORY_THRESHOLD_PERCENT: f64 = 90.0;

/// Root disk use above this percent is reported
pub const DISK_THRESHOLD_PERCENT: f64 = 85.0;

/// Critical pod phases and the description each one produces
const CRITICAL_PHASES: &[(PodPhase, &str)] = &[
    (PodPhase::CrashLoopBackOff, "CrashLoopBackOff"),
    (PodPhase::OomKilled, "OOMKilled"),
    (PodPhase::Error, "Error state"),
    (PodPhase::ImagePullBackOff, "ImagePullBackOff"),
    (PodPhase::Evicted, "Evicted"),
];

/// A tier of the triage engine
pub trait Detector {
    fn name(&self) -> &'static str;
    fn detect(&self, bundle: &Bundle, out: &mut Vec<AttentionItem>);
}

fn pod_item(pod: &Pod, severity: Severity, description: String) -> AttentionItem {
    AttentionItem::new(severity, ResourceKind::Pod, &pod.name, description)
        .with_namespace(&pod.namespace)
        .with_timestamp(pod.started_at)
        .with_reference(ItemRef {
            pod: Some(pod.name.clone()),
            container: pod.containers.first().cloned(),
            cluster_id: Some(BUNDLE_CLUSTER_ID.to_string()),
        })
}

/// Tier 1: per-pod health, first matching rule wins
pub struct PodHealth;

impl PodHealth {
    fn evaluate(pod: &Pod) -> Option<AttentionItem> {
        if let Some((_, description)) = CRITICAL_PHASES.iter().find(|(p, _)| *p == pod.phase) {
            return Some(pod_item(pod, Severity::Critical, description.to_string()));
        }

        if pod.restarts >= RESTART_THRESHOLD {
            return Some(
                pod_item(pod, Severity::Warning, format!("{} restarts", pod.restarts))
                    .with_count(pod.restarts),
            );
        }

        if pod.phase == PodPhase::Running {
            if let Some(ready) = pod.ready.as_deref() {
                if let Some((left, right)) = parse_ratio(ready) {
                    if left != right {
                        return Some(pod_item(
                            pod,
                            Severity::Warning,
                            format!("Not ready ({})", ready),
                        ));
                    }
                }
            }
        }

        None
    }
}

impl Detector for PodHealth {
    fn name(&self) -> &'static str {
        "pod_health"
    }

    fn detect(&self, bundle: &Bundle, out: &mut Vec<AttentionItem>) {
        out.extend(bundle.list_pods(None).into_iter().filter_map(Self::evaluate));
    }
}

/// Tier 2: nodes, etcd and daemonsets
pub struct ClusterHealth;

impl Detector for ClusterHealth {
    fn name(&self) -> &'static str {
        "cluster_health"
    }

    fn detect(&self, bundle: &Bundle, out: &mut Vec<AttentionItem>) {
        for node in bundle.list_nodes() {
            if node.condition.is_unhealthy() {
                out.push(AttentionItem::new(
                    Severity::Critical,
                    ResourceKind::Node,
                    &node.name,
                    &node.status,
                ));
            }
        }

        if let Some(etcd) = bundle.etcd_health() {
            if etcd.has_alarms {
                out.push(
                    AttentionItem::new(
                        Severity::Critical,
                        ResourceKind::Etcd,
                        "ETCD",
                        format!("ALARM: {}", etcd.alarm_type),
                    )
                    .with_count(etcd.alarm_count.max(1)),
                );
            }
            if !etcd.healthy {
                out.push(AttentionItem::new(
                    Severity::Critical,
                    ResourceKind::Etcd,
                    "ETCD",
                    "Unhealthy endpoints",
                ));
            }
        }

        for ds in bundle.list_daemonsets(None) {
            if let Some((ready, desired)) = parse_ratio(&ds.ready) {
                if ready != desired {
                    out.push(
                        AttentionItem::new(
                            Severity::Warning,
                            ResourceKind::DaemonSet,
                            &ds.name,
                            format!("{} ready", ds.ready),
                        )
                        .with_namespace(&ds.namespace),
                    );
                }
            }
        }
    }
}

/// Tier 3: warning events aggregated by reason
pub struct EventAggregation;

impl EventAggregation {
    fn is_failure_reason(reason: &str) -> bool {
        reason.contains("Failed") || reason.contains("Error") || reason == "BackOff"
    }
}

impl Detector for EventAggregation {
    fn name(&self) -> &'static str {
        "event_aggregation"
    }

    fn detect(&self, bundle: &Bundle, out: &mut Vec<AttentionItem>) {
        // Reasons in order of first appearance
        let mut order: Vec<&str> = Vec::new();
        let mut totals: HashMap<&str, u32> = HashMap::new();

        for event in bundle.list_all_events().iter().filter(|e| e.is_warning()) {
            let total = totals.entry(event.reason.as_str()).or_insert_with(|| {
                order.push(event.reason.as_str());
                0
            });
            *total = total.saturating_add(event.count);
        }

        for reason in order {
            let total = totals.get(reason).copied().unwrap_or(0);
            if total < EVENT_AGGREGATE_THRESHOLD {
                continue;
            }
            let mut item = AttentionItem::new(
                Severity::Warning,
                ResourceKind::Event,
                format!("{} Warning events", total),
                reason,
            )
            .with_count(total);
            if Self::is_failure_reason(reason) {
                item = item.with_tag(ItemTag::FailureEvent);
            }
            out.push(item);
        }
    }
}

/// Tier 5: host memory and disk pressure
pub struct SystemPressure;

impl Detector for SystemPressure {
    fn name(&self) -> &'static str {
        "system_pressure"
    }

    fn detect(&self, bundle: &Bundle, out: &mut Vec<AttentionItem>) {
        let Some(system) = bundle.system_health() else {
            return;
        };
        let node = &bundle.manifest().node_name;

        if system.memory_used_percent > MEMORY_THRESHOLD_PERCENT {
            out.push(
                AttentionItem::new(
                    Severity::Info,
                    ResourceKind::System,
                    "Memory",
                    format!("{:.0}% used on {}", system.memory_used_percent, node),
                )
                .with_count(system.memory_used_percent.round() as u32),
            );
        }
        if system.disk_used_percent > DISK_THRESHOLD_PERCENT {
            out.push(
                AttentionItem::new(
                    Severity::Info,
                    ResourceKind::System,
                    "Disk",
                    format!("{:.0}% of / used on {}", system.disk_used_percent, node),
                )
                .with_count(system.disk_used_percent.round() as u32),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_reasons() {
        assert!(EventAggregation::is_failure_reason("FailedScheduling"));
        assert!(EventAggregation::is_failure_reason("ErrorSyncing"));
        assert!(EventAggregation::is_failure_reason("BackOff"));
        assert!(!EventAggregation::is_failure_reason("ImageBackOff"));
        assert!(!EventAggregation::is_failure_reason("Unhealthy"));
    }
}
