//! Human-readable sizes and durations for console summaries

use std::time::Duration;

const SIZE_UNITS: [&str; 5] = ["kB", "MB", "GB", "TB", "PB"];

/// Format a byte count with decimal units, e.g. `1 Byte`, `532 Bytes`, `12.3 kB`
pub fn natural_size(bytes: u64) -> String {
    if bytes == 1 {
        return "1 Byte".to_string();
    }
    if bytes < 1000 {
        return format!("{} Bytes", bytes);
    }

    let mut value = bytes as f64 / 1000.0;
    let mut unit = 0;
    while value >= 1000.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1000.0;
        unit += 1;
    }
    format!("{:.1} {}", value, SIZE_UNITS[unit])
}

fn plural(count: u64, unit: &str) -> String {
    if count == 1 {
        format!("1 {}", unit)
    } else {
        format!("{} {}s", count, unit)
    }
}

/// Format a duration down to hundredths of a second,
/// e.g. `0.42 seconds`, `1 hour, 2 minutes and 3.50 seconds`
pub fn precise_delta(duration: Duration) -> String {
    let total = duration.as_secs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = (total % 60) as f64 + f64::from(duration.subsec_nanos()) / 1e9;

    let mut parts = Vec::new();
    if hours > 0 {
        parts.push(plural(hours, "hour"));
    }
    if minutes > 0 {
        parts.push(plural(minutes, "minute"));
    }
    if seconds > 0.0 || parts.is_empty() {
        let seconds = format!("{:.2}", seconds);
        if seconds == "1.00" {
            parts.push("1 second".to_string());
        } else {
            parts.push(format!("{} seconds", seconds));
        }
    }

    match parts.split_last() {
        Some((last, rest)) if !rest.is_empty() => format!("{} and {}", rest.join(", "), last),
        _ => parts.join(""),
    }
}
