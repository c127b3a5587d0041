//! etcd and host health parsers
//!
//! Reads:
//! - etcd/alarmlist and etcd/endpointhealth for etcd state
//! - systeminfo/freem and systeminfo/dfh for memory and root disk usage

use super::tabular::lenient_f64;
use crate::models::{EtcdHealth, SystemHealth};

pub const ETCD_DIR: &str = "etcd";
pub const ETCD_ALARMS: &str = "etcd/alarmlist";
pub const ETCD_ENDPOINT_HEALTH: &str = "etcd/endpointhealth";
pub const SYSTEMINFO_DIR: &str = "systeminfo";
pub const FREE_MEMORY: &str = "systeminfo/freem";
pub const DISK_FREE: &str = "systeminfo/dfh";

const ALARM_MARKER: &str = "alarm:";
const UNKNOWN_ALARM: &str = "UNKNOWN";

/// Build etcd health from the two etcdctl outputs; either may be absent
pub fn parse_etcd(alarm_list: Option<&str>, endpoint_health: Option<&str>) -> EtcdHealth {
    let (has_alarms, alarm_type, alarm_count) = alarm_list.map(parse_alarms).unwrap_or_default();

    EtcdHealth {
        healthy: endpoint_health.map(endpoints_healthy).unwrap_or(true),
        has_alarms,
        alarm_type,
        alarm_count,
    }
}

/// Returns (has_alarms, alarm_type, alarm_count)
///
/// Output that does not start with a `memberID:` line is treated as an
/// alarm signal, as is any `alarm:` entry.
fn parse_alarms(content: &str) -> (bool, String, u32) {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return (false, String::new(), 0);
    }

    let alarm_count = trimmed
        .lines()
        .filter(|line| line.contains(ALARM_MARKER))
        .count() as u32;

    let first_line = trimmed.lines().next().unwrap_or_default().trim_start();
    let has_alarms = alarm_count > 0 || !first_line.starts_with("memberID:");
    if !has_alarms {
        return (false, String::new(), 0);
    }

    let alarm_type = trimmed
        .find(ALARM_MARKER)
        .map(|idx| &trimmed[idx + ALARM_MARKER.len()..])
        .and_then(|rest| rest.lines().next())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(UNKNOWN_ALARM);

    (true, alarm_type.to_string(), alarm_count)
}

fn endpoints_healthy(content: &str) -> bool {
    let lower = content.to_lowercase();
    !(lower.contains("unhealthy")
        || lower.contains("health: false")
        || lower.contains("\"health\":false"))
}

/// Memory used percent from `free -m` output, `None` when no usable `Mem:` row exists
pub fn parse_free_memory(content: &str) -> Option<f64> {
    let line = content
        .lines()
        .map(str::trim_start)
        .find(|line| line.starts_with("Mem:"))?;
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 3 {
        return None;
    }

    let total = lenient_f64(parts[1]);
    let used = lenient_f64(parts[2]);
    if total > 0.0 {
        Some(clamp_percent(used / total * 100.0))
    } else {
        None
    }
}

/// Root filesystem used percent from `df -h` output
pub fn parse_disk_free(content: &str) -> Option<f64> {
    content.lines().skip(1).find_map(|line| {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 5 || parts.last() != Some(&"/") {
            return None;
        }
        parts[4]
            .trim_end_matches('%')
            .parse::<f64>()
            .ok()
            .map(clamp_percent)
    })
}

fn clamp_percent(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

/// Combine host readings; missing values count as 0%
pub fn system_health(free: Option<&str>, df: Option<&str>) -> SystemHealth {
    SystemHealth {
        memory_used_percent: free.and_then(parse_free_memory).unwrap_or(0.0),
        disk_used_percent: df.and_then(parse_disk_free).unwrap_or(0.0),
    }
}
