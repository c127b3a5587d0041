//! Triage commands: bundle summary, attention list and node health

use anyhow::Result;
use bundle_lib::attention::{DISK_THRESHOLD_PERCENT, MEMORY_THRESHOLD_PERCENT};
use bundle_lib::{
    compute_attention, displayed, ArtifactStatus, AttentionItem, AttentionSummary, Bundle,
    ImportReport, ImportStatus, StructuredLogger,
};
use colored::Colorize;
use serde::Serialize;
use tabled::Tabled;

use crate::output::{
    color_health, color_percent, color_severity, format_bytes, format_timestamp, print_heading,
    print_info, print_json, print_rows, print_success, print_warning, OutputFormat,
};

#[derive(Tabled)]
struct AttentionRow {
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Namespace")]
    namespace: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Description")]
    description: String,
    #[tabled(rename = "Count")]
    count: u32,
}

impl From<&AttentionItem> for AttentionRow {
    fn from(item: &AttentionItem) -> Self {
        let description = if item.tag.is_some() {
            item.description.bold().to_string()
        } else {
            item.description.clone()
        };
        Self {
            severity: color_severity(item.severity),
            kind: item.kind.to_string(),
            namespace: if item.namespace.is_empty() {
                "-".to_string()
            } else {
                item.namespace.clone()
            },
            title: item.title.clone(),
            description,
            count: item.count,
        }
    }
}

#[derive(Tabled)]
struct ArtifactRow {
    #[tabled(rename = "Artifact")]
    artifact: String,
    #[tabled(rename = "Status")]
    status: String,
}

#[derive(Serialize)]
struct AttentionView<'a> {
    summary: AttentionSummary,
    total: usize,
    items: &'a [AttentionItem],
}

#[derive(Serialize)]
struct SummaryView<'a> {
    manifest: &'a bundle_lib::Manifest,
    status: ImportStatus,
    counts: Counts,
    attention: AttentionSummary,
    report: &'a ImportReport,
}

#[derive(Serialize)]
struct Counts {
    namespaces: usize,
    pods: usize,
    deployments: usize,
    services: usize,
    crds: usize,
    events: usize,
    nodes: usize,
    daemonsets: usize,
    log_files: usize,
}

impl Counts {
    fn of(bundle: &Bundle) -> Self {
        Self {
            namespaces: bundle.list_namespaces().len(),
            pods: bundle.list_pods(None).len(),
            deployments: bundle.list_deployments(None).len(),
            services: bundle.list_services(None).len(),
            crds: bundle.list_crds().len(),
            events: bundle.list_all_events().len(),
            nodes: bundle.list_nodes().len(),
            daemonsets: bundle.list_daemonsets(None).len(),
            log_files: bundle.log_files().len(),
        }
    }
}

fn artifact_status(status: &ArtifactStatus) -> String {
    match status {
        ArtifactStatus::Loaded { count } => format!("loaded ({})", count).green().to_string(),
        ArtifactStatus::Absent => "absent".dimmed().to_string(),
        ArtifactStatus::Degraded { reason } => format!("degraded: {}", reason).red().to_string(),
    }
}

fn artifact_rows(report: &ImportReport) -> Vec<ArtifactRow> {
    report
        .artifacts()
        .iter()
        .map(|(artifact, status)| ArtifactRow {
            artifact: artifact.clone(),
            status: artifact_status(status),
        })
        .collect()
}

fn print_summary_line(summary: &AttentionSummary) {
    if summary.is_all_clear() {
        print_success("All clear: nothing needs attention");
    } else {
        println!(
            "{} critical, {} warning, {} info",
            summary.critical.to_string().red().bold(),
            summary.warning.to_string().yellow(),
            summary.info.to_string().blue()
        );
    }
}

/// Show bundle metadata, inventory counts and import status
pub fn show_summary(bundle: &Bundle, logger: &StructuredLogger, format: OutputFormat) -> Result<()> {
    let items = compute_attention(bundle);
    let attention = AttentionSummary::from_items(&items);
    logger.log_attention(&attention);

    let manifest = bundle.manifest();
    let report = bundle.report();
    let counts = Counts::of(bundle);

    if format == OutputFormat::Json {
        return print_json(&SummaryView {
            manifest,
            status: report.status(),
            counts,
            attention,
            report,
        });
    }

    print_heading("Support Bundle");
    println!("Node:          {}", manifest.node_name.cyan());
    println!("RKE2:          {}", manifest.rke2_version);
    println!("Kubernetes:    {}", manifest.k8s_version);
    println!("Collected:     {}", format_timestamp(manifest.collected_at));
    println!(
        "Files:         {} ({})",
        manifest.file_count,
        format_bytes(manifest.total_bytes)
    );
    println!("Root:          {}", bundle.root().path().display());
    println!();

    println!("{}", "Inventory".bold());
    println!("{}", "-".repeat(60));
    println!("Namespaces:    {}", counts.namespaces);
    println!("Pods:          {}", counts.pods);
    println!("Deployments:   {}", counts.deployments);
    println!("Services:      {}", counts.services);
    println!("DaemonSets:    {}", counts.daemonsets);
    println!("Nodes:         {}", counts.nodes);
    println!("CRDs:          {}", counts.crds);
    println!("Events:        {}", counts.events);
    println!("Log files:     {}", counts.log_files);
    println!();

    println!("{}", "Import".bold());
    println!("{}", "-".repeat(60));
    println!(
        "{}",
        tabled::Table::new(artifact_rows(report))
            .with(tabled::settings::Style::rounded())
            .to_string()
    );
    if report.status() == ImportStatus::Partial {
        print_warning(&format!(
            "Partial import: {} artifact(s) could not be parsed",
            report.degraded_artifacts().len()
        ));
    }
    println!();

    println!("{}", "Attention".bold());
    println!("{}", "-".repeat(60));
    print_summary_line(&attention);

    Ok(())
}

/// Show the severity-ranked attention list
pub fn show_attention(
    bundle: &Bundle,
    logger: &StructuredLogger,
    cap: usize,
    expanded: bool,
    format: OutputFormat,
) -> Result<()> {
    let items = compute_attention(bundle);
    let summary = AttentionSummary::from_items(&items);
    logger.log_attention(&summary);

    let shown = displayed(&items, cap, expanded);

    if format == OutputFormat::Json {
        return print_json(&AttentionView {
            summary,
            total: items.len(),
            items: shown,
        });
    }

    print_heading("Needs Attention");
    if summary.is_all_clear() {
        print_success("All clear: nothing needs attention");
        return Ok(());
    }

    let rows: Vec<AttentionRow> = shown.iter().map(AttentionRow::from).collect();
    println!(
        "{}",
        tabled::Table::new(rows)
            .with(tabled::settings::Style::rounded())
            .to_string()
    );
    print_summary_line(&summary);
    if shown.len() < items.len() {
        print_info(&format!(
            "Showing {} of {} items (use --expanded to see all)",
            shown.len(),
            items.len()
        ));
    }

    Ok(())
}

#[derive(Serialize)]
struct HealthView<'a> {
    nodes: Vec<&'a bundle_lib::Node>,
    etcd: Option<&'a bundle_lib::EtcdHealth>,
    system: Option<&'a bundle_lib::SystemHealth>,
}

/// Show node, etcd and host health
pub fn show_health(bundle: &Bundle, format: OutputFormat) -> Result<()> {
    let unhealthy: Vec<_> = bundle
        .list_nodes()
        .iter()
        .filter(|n| n.condition.is_unhealthy())
        .collect();

    if format == OutputFormat::Json {
        return print_json(&HealthView {
            nodes: bundle.list_nodes().iter().collect(),
            etcd: bundle.etcd_health(),
            system: bundle.system_health(),
        });
    }

    print_heading("Cluster Health");
    println!(
        "Nodes:         {} total, {}",
        bundle.list_nodes().len(),
        color_health(
            unhealthy.is_empty(),
            &format!("{} unhealthy", unhealthy.len())
        )
    );
    for node in &unhealthy {
        println!("  {} {}", node.name, node.status.red());
    }

    match bundle.etcd_health() {
        Some(etcd) => {
            println!(
                "Etcd:          {}",
                color_health(etcd.healthy, if etcd.healthy { "healthy" } else { "unhealthy" })
            );
            if etcd.has_alarms {
                println!(
                    "  {} {} ({})",
                    "ALARM".red().bold(),
                    etcd.alarm_type,
                    etcd.alarm_count
                );
            }
        }
        None => println!("Etcd:          {}", "not collected".dimmed()),
    }

    match bundle.system_health() {
        Some(system) => {
            println!(
                "Memory used:   {}",
                color_percent(system.memory_used_percent, MEMORY_THRESHOLD_PERCENT)
            );
            println!(
                "Disk used (/): {}",
                color_percent(system.disk_used_percent, DISK_THRESHOLD_PERCENT)
            );
        }
        None => println!("System:        {}", "not collected".dimmed()),
    }

    Ok(())
}

/// Print import warnings; used by `--verbose`
pub fn show_warnings(bundle: &Bundle) {
    for warning in bundle.report().warnings() {
        print_warning(&format!("{}: {}", warning.artifact, warning.message));
    }
}

/// Per-artifact import status
pub fn list_artifacts(bundle: &Bundle, format: OutputFormat) -> Result<()> {
    let report = bundle.report();
    let rows = artifact_rows(report);
    print_rows(report, rows, format, "No artifacts recorded")
}
