//! Structured logging for bundle imports and triage
//!
//! Every record carries an `event` field so JSON log output can be filtered
//! without parsing messages.

use crate::attention::AttentionSummary;
use crate::bundle::{Bundle, BundleRoot};
use crate::error::BundleError;
use tracing::{debug, info, warn};

/// Structured logger scoped to one bundle path
#[derive(Clone)]
pub struct StructuredLogger {
    bundle: String,
}

impl StructuredLogger {
    pub fn new(bundle: impl Into<String>) -> Self {
        Self {
            bundle: bundle.into(),
        }
    }

    pub fn log_import_started(&self) {
        info!(
            event = "import_started",
            bundle = %self.bundle,
            "Importing support bundle"
        );
    }

    pub fn log_layout_detected(&self, root: &BundleRoot) {
        debug!(
            event = "layout_detected",
            bundle = %self.bundle,
            root = %root.path().display(),
            layout = ?root.layout(),
            "Resolved bundle root"
        );
    }

    pub fn log_artifact_degraded(&self, artifact: &str, reason: &str) {
        warn!(
            event = "artifact_degraded",
            bundle = %self.bundle,
            artifact = %artifact,
            reason = %reason,
            "Artifact could not be fully parsed"
        );
    }

    pub fn log_import_failed(&self, error: &BundleError) {
        warn!(
            event = "import_failed",
            bundle = %self.bundle,
            code = error.code(),
            error = %error,
            "Bundle import failed"
        );
    }

    pub fn log_import_completed(&self, bundle: &Bundle) {
        let manifest = bundle.manifest();
        info!(
            event = "import_completed",
            bundle = %self.bundle,
            node = %manifest.node_name,
            rke2_version = %manifest.rke2_version,
            k8s_version = %manifest.k8s_version,
            files = manifest.file_count,
            bytes = manifest.total_bytes,
            pods = bundle.list_pods(None).len(),
            events = bundle.list_all_events().len(),
            log_files = bundle.log_files().len(),
            warnings = bundle.report().warnings().len(),
            "Imported support bundle"
        );
    }

    pub fn log_attention(&self, summary: &AttentionSummary) {
        if summary.critical > 0 {
            warn!(
                event = "attention_computed",
                bundle = %self.bundle,
                critical = summary.critical,
                warning = summary.warning,
                info = summary.info,
                "Critical issues found"
            );
        } else {
            info!(
                event = "attention_computed",
                bundle = %self.bundle,
                critical = summary.critical,
                warning = summary.warning,
                info = summary.info,
                "Attention list computed"
            );
        }
    }
}
