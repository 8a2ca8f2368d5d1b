//! Duration and pace string codec
//!
//! Tracker exports carry elapsed time as `HH:MM:SS` strings and pace as
//! `MM:SS` strings. Parsing is total: malformed, empty, or missing input
//! normalizes to zero rather than failing the row.

/// Parse an `HH:MM:SS` or `MM:SS` duration string into whole seconds.
///
/// One-part input is parsed as fractional seconds and truncated. Any
/// parse failure yields 0.
pub fn parse_duration_seconds(text: &str) -> u32 {
    let text = text.trim();
    if text.is_empty() {
        return 0;
    }

    let parts: Vec<&str> = text.split(':').collect();
    let seconds = match parts.as_slice() {
        [h, m, s] => match (parse_part(h), parse_part(m), parse_part(s)) {
            (Some(h), Some(m), Some(s)) => h * 3600 + m * 60 + s,
            _ => 0,
        },
        [m, s] => match (parse_part(m), parse_part(s)) {
            (Some(m), Some(s)) => m * 60 + s,
            _ => 0,
        },
        [s] => s.parse::<f64>().map(|v| v as i64).unwrap_or(0),
        _ => 0,
    };

    seconds.max(0) as u32
}

/// Parse an `MM:SS` pace string into seconds per unit distance.
///
/// Same two-part/one-part logic as [`parse_duration_seconds`]; a pace
/// string never carries an hour component.
pub fn parse_pace_seconds(text: &str) -> u32 {
    let text = text.trim();
    if text.is_empty() {
        return 0;
    }

    let parts: Vec<&str> = text.split(':').collect();
    let seconds = match parts.as_slice() {
        [m, s] => match (parse_part(m), parse_part(s)) {
            (Some(m), Some(s)) => m * 60 + s,
            _ => 0,
        },
        [s] => s.parse::<f64>().map(|v| v as i64).unwrap_or(0),
        _ => 0,
    };

    seconds.max(0) as u32
}

/// Render a second count as a zero-padded `HH:MM:SS` string.
///
/// Hours are unbounded (no 24h wraparound); zero or negative input
/// renders as `"00:00:00"`. Exact left inverse of
/// [`parse_duration_seconds`] for every canonical `HH:MM:SS` string.
pub fn format_duration(seconds: i64) -> String {
    if seconds <= 0 {
        return "00:00:00".to_string();
    }
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let seconds = seconds % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

fn parse_part(part: &str) -> Option<i64> {
    part.trim().parse::<i64>().ok()
}
