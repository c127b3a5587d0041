//! Severity-ranked attention list
//!
//! The engine runs a fixed set of detectors over an imported [`Bundle`] and
//! returns every finding ordered Critical, Warning, Info. Within one severity
//! items keep detector order, so the same bundle always yields the same list.

mod detectors;
mod item;

pub use detectors::{
    ClusterHealth, Detector, EventAggregation, PodHealth, SystemPressure,
    DISK_THRESHOLD_PERCENT, EVENT_AGGREGATE_THRESHOLD, MEMORY_THRESHOLD_PERCENT,
    RESTART_THRESHOLD,
};
pub use item::{AttentionItem, ItemRef, ItemTag, Severity};

use crate::bundle::Bundle;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Number of items shown when the list is collapsed
pub const DEFAULT_DISPLAY_CAP: usize = 15;

fn detectors() -> [&'static dyn Detector; 4] {
    [&PodHealth, &ClusterHealth, &EventAggregation, &SystemPressure]
}

/// Compute the full attention list for a bundle
pub fn compute_attention(bundle: &Bundle) -> Vec<AttentionItem> {
    let mut items = Vec::new();
    for detector in detectors() {
        let before = items.len();
        detector.detect(bundle, &mut items);
        debug!(
            detector = detector.name(),
            items = items.len() - before,
            "Detector finished"
        );
    }
    // Stable sort keeps detector order within a severity
    items.sort_by_key(|item| item.severity);
    items
}

/// The slice a renderer should show: everything when expanded, else the
/// first `cap` items
pub fn displayed(items: &[AttentionItem], cap: usize, expanded: bool) -> &[AttentionItem] {
    if expanded {
        items
    } else {
        &items[..items.len().min(cap)]
    }
}

/// Per-severity totals for one attention list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttentionSummary {
    pub critical: usize,
    pub warning: usize,
    pub info: usize,
}

impl AttentionSummary {
    pub fn from_items(items: &[AttentionItem]) -> Self {
        items.iter().fold(Self::default(), |mut acc, item| {
            match item.severity {
                Severity::Critical => acc.critical += 1,
                Severity::Warning => acc.warning += 1,
                Severity::Info => acc.info += 1,
            }
            acc
        })
    }

    pub fn total(&self) -> usize {
        self.critical + self.warning + self.info
    }

    /// True when nothing needs attention
    pub fn is_all_clear(&self) -> bool {
        self.total() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ResourceKind;

    fn item(severity: Severity, title: &str) -> AttentionItem {
        AttentionItem::new(severity, ResourceKind::Pod, title, "")
    }

    #[test]
    fn test_displayed_caps_collapsed_list() {
        let items: Vec<_> = (0..20)
            .map(|i| item(Severity::Warning, &format!("pod-{}", i)))
            .collect();

        assert_eq!(displayed(&items, DEFAULT_DISPLAY_CAP, false).len(), 15);
        assert_eq!(displayed(&items, DEFAULT_DISPLAY_CAP, true).len(), 20);
        assert_eq!(displayed(&items[..3], DEFAULT_DISPLAY_CAP, false).len(), 3);
        assert!(displayed(&[], DEFAULT_DISPLAY_CAP, false).is_empty());
    }

    #[test]
    fn test_summary() {
        let items = vec![
            item(Severity::Critical, "a"),
            item(Severity::Warning, "b"),
            item(Severity::Warning, "c"),
        ];
        let summary = AttentionSummary::from_items(&items);
        assert_eq!(summary.critical, 1);
        assert_eq!(summary.warning, 2);
        assert_eq!(summary.info, 0);
        assert_eq!(summary.total(), 3);
        assert!(!summary.is_all_clear());
        assert!(AttentionSummary::from_items(&[]).is_all_clear());
    }
}
