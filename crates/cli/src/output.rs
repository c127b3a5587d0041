//! Output formatting utilities

use anyhow::Result;
use bundle_lib::{PodPhase, Severity};
use chrono::{TimeZone, Utc};
use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

impl OutputFormat {
    /// Parse a format name from the config file; unknown names fall back to table
    pub fn from_setting(value: Option<&str>) -> Self {
        value
            .and_then(|v| <Self as ValueEnum>::from_str(v, true).ok())
            .unwrap_or_default()
    }
}

/// Print `data` as JSON, or `rows` as a table
pub fn print_rows<T, R>(data: &T, rows: Vec<R>, format: OutputFormat, empty: &str) -> Result<()>
where
    T: Serialize + ?Sized,
    R: Tabled,
{
    match format {
        OutputFormat::Json => print_json(data),
        OutputFormat::Table => {
            if rows.is_empty() {
                println!("{}", empty.yellow());
                return Ok(());
            }
            let count = rows.len();
            println!("{}", Table::new(rows).with(Style::rounded()));
            println!("\nTotal: {}", count);
            Ok(())
        }
    }
}

pub fn print_json<T: Serialize + ?Sized>(data: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(data)?);
    Ok(())
}

/// Print a section heading
pub fn print_heading(title: &str) {
    println!("{}", title.bold());
    println!("{}", "=".repeat(60));
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Format bytes as human-readable string
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2}Gi", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2}Mi", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2}Ki", bytes as f64 / KB as f64)
    } else {
        format!("{}B", bytes)
    }
}

/// Unix seconds as RFC 3339; 0 renders as `-`
pub fn format_timestamp(secs: i64) -> String {
    if secs == 0 {
        return "-".to_string();
    }
    Utc.timestamp_opt(secs, 0)
        .single()
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "-".to_string())
}

pub fn format_percent(value: f64) -> String {
    format!("{:.1}%", value)
}

/// Color a severity label
pub fn color_severity(severity: Severity) -> String {
    let label = severity.to_string().to_uppercase();
    match severity {
        Severity::Critical => label.red().bold().to_string(),
        Severity::Warning => label.yellow().to_string(),
        Severity::Info => label.blue().to_string(),
    }
}

/// Color a pod status by its derived phase
pub fn color_pod_status(status: &str, phase: PodPhase) -> String {
    match phase {
        PodPhase::Running | PodPhase::Completed => status.green().to_string(),
        PodPhase::Pending => status.yellow().to_string(),
        PodPhase::Other => status.to_string(),
        _ => status.red().to_string(),
    }
}

/// Color a health flag
pub fn color_health(healthy: bool, label: &str) -> String {
    if healthy {
        label.green().to_string()
    } else {
        label.red().bold().to_string()
    }
}

/// Color a percentage against a threshold
pub fn color_percent(value: f64, threshold: f64) -> String {
    let formatted = format_percent(value);
    if value > threshold {
        formatted.red().to_string()
    } else if value > threshold * 0.8 {
        formatted.yellow().to_string()
    } else {
        formatted.green().to_string()
    }
}
