//! Shared helpers for `kubectl get` style tables
//!
//! Column splitting, lenient numerics, age conversion and ratio checks used
//! by every tabular artifact parser.

use chrono::{DateTime, Duration, Utc};

/// Rows of a tabular artifact after the header has been dropped
#[derive(Debug, Default)]
pub struct Table<'a> {
    pub rows: Vec<Vec<&'a str>>,
    /// Data lines dropped for having too few columns
    pub skipped: usize,
}

impl<'a> Table<'a> {
    /// Split `content` into whitespace-separated rows.
    ///
    /// The first non-empty line is the header and is discarded. Rows with
    /// fewer than `min_fields` columns are counted in `skipped`.
    pub fn parse(content: &'a str, min_fields: usize) -> Self {
        let mut table = Table::default();

        for line in content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .skip(1)
        {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < min_fields {
                table.skipped += 1;
                continue;
            }
            table.rows.push(fields);
        }

        table
    }
}

/// Parse a count leniently; anything unparseable is zero
pub fn lenient_u32(value: &str) -> u32 {
    value.trim().parse().unwrap_or(0)
}

pub fn lenient_f64(value: &str) -> f64 {
    value.trim().parse().unwrap_or(0.0)
}

/// Convert an age column such as `5d` into unix seconds relative to `now`.
///
/// Only `<integer><unit>` with unit in s/m/h/d is understood; anything else,
/// including `<invalid>`, yields 0.
pub fn age_to_timestamp(age: &str, now: DateTime<Utc>) -> i64 {
    let age = age.trim();
    if age.len() < 2 || !age.is_ascii() {
        return 0;
    }

    let (digits, unit) = age.split_at(age.len() - 1);
    let Ok(amount) = digits.parse::<i64>() else {
        return 0;
    };
    if amount < 0 {
        return 0;
    }

    let delta = match unit {
        "s" => Duration::try_seconds(amount),
        "m" => Duration::try_minutes(amount),
        "h" => Duration::try_hours(amount),
        "d" => Duration::try_days(amount),
        _ => None,
    };

    delta
        .and_then(|d| now.checked_sub_signed(d))
        .map(|t| t.timestamp())
        .unwrap_or(0)
}

/// Split a `X/Y` ratio into its two sides
pub fn parse_ratio(ratio: &str) -> Option<(u32, u32)> {
    let (left, right) = ratio.split_once('/')?;
    if left.is_empty()
        || right.is_empty()
        || !left.bytes().all(|b| b.is_ascii_digit())
        || !right.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }
    Some((left.parse().ok()?, right.parse().ok()?))
}

/// Accept a ratio only when it is well formed and the left side does not exceed the right
pub fn valid_ready_ratio(ratio: &str) -> Option<String> {
    match parse_ratio(ratio) {
        Some((ready, total)) if ready <= total => Some(ratio.to_string()),
        _ => None,
    }
}

/// Drop a `cluster-id:` prefix from a namespace reference
pub fn normalize_namespace(namespace: &str) -> &str {
    match namespace.split_once(':') {
        Some((_, rest)) => rest,
        None => namespace,
    }
}

/// True when `namespace` passes an optional filter; empty or `all` matches everything
pub fn namespace_matches(filter: Option<&str>, namespace: &str) -> bool {
    match filter.map(normalize_namespace) {
        None | Some("") | Some("all") => true,
        Some(wanted) => wanted == namespace,
    }
}
