//! Offline triage library for RKE2 support bundles
//!
//! This crate provides the core functionality for:
//! - Locating and validating an extracted bundle directory
//! - Parsing kubectl dumps, logs and node diagnostics into an inventory
//! - Computing a severity-ranked attention list
//! - Per-artifact import reporting and structured logging

pub mod attention;
pub mod bundle;
pub mod error;
pub mod models;
pub mod observability;
pub mod report;

pub use attention::{
    compute_attention, displayed, AttentionItem, AttentionSummary, ItemRef, ItemTag, Severity,
    DEFAULT_DISPLAY_CAP,
};
pub use bundle::{import_bundle, Bundle, BundleRoot, ImportOptions, Layout};
pub use error::{BundleError, ErrorKind, ImportError};
pub use models::*;
pub use observability::StructuredLogger;
pub use report::{ArtifactStatus, ArtifactWarning, ImportReport, ImportStatus};
