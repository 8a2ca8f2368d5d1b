//! Unit conversions between raw device units and display units
//!
//! FIT positions arrive in semicircles, speeds in m/s, distances in
//! meters; Dutch spreadsheet exports write decimals with a comma.

/// Semicircles per degree denominator: 2^31.
const SEMICIRCLE_SCALE: f64 = 2_147_483_648.0;

/// Convert a raw FIT semicircle angle to degrees.
///
/// `degrees = semicircles * 180 / 2^31`, no rounding beyond f64.
pub fn semicircles_to_degrees(semicircles: i64) -> f64 {
    semicircles as f64 * 180.0 / SEMICIRCLE_SCALE
}

/// Convert meters per second to kilometers per hour.
pub fn ms_to_kmh(ms: f64) -> f64 {
    ms * 3.6
}

/// Convert meters to kilometers.
pub fn meters_to_km(meters: f64) -> f64 {
    meters / 1000.0
}

/// Parse a possibly comma-decimal numeric string into an f64.
///
/// Replaces `,` with `.` before parsing. Empty or non-numeric input
/// yields `0.0`; NaN never propagates into aggregation.
pub fn parse_locale_float(text: &str) -> f64 {
    let cleaned = text.trim().replace(',', ".");
    if cleaned.is_empty() {
        return 0.0;
    }
    match cleaned.parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}
