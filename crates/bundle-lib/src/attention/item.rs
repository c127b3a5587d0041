//! Attention item types

use crate::models::ResourceKind;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of an attention item. Ordering is Critical < Warning < Info,
/// so an ascending sort puts critical items first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Critical => write!(f, "critical"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// Render hint for items that deserve emphasis without a higher severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemTag {
    /// Event reason points at a failure (`Failed*`, `*Error*`, `BackOff`)
    FailureEvent,
}

/// Back-reference used by renderers to drill into the source entity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRef {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pod: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_id: Option<String>,
}

/// One finding an operator should look at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttentionItem {
    pub severity: Severity,
    pub kind: ResourceKind,
    pub title: String,
    pub description: String,
    pub namespace: String,
    pub count: u32,
    /// Unix seconds; 0 when unknown
    pub timestamp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<ItemRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<ItemTag>,
}

impl AttentionItem {
    pub fn new(
        severity: Severity,
        kind: ResourceKind,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            kind,
            title: title.into(),
            description: description.into(),
            namespace: String::new(),
            count: 1,
            timestamp: 0,
            reference: None,
            tag: None,
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_count(mut self, count: u32) -> Self {
        self.count = count;
        self
    }

    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_reference(mut self, reference: ItemRef) -> Self {
        self.reference = Some(reference);
        self
    }

    pub fn with_tag(mut self, tag: ItemTag) -> Self {
        self.tag = Some(tag);
        self
    }

    /// `title – description`, the single-line form renderers use
    pub fn headline(&self) -> String {
        format!("{} – {}", self.title, self.description)
    }
}
