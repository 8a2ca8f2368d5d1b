//! Property tests for the duration/pace codec.

use proptest::prelude::*;

use sportrs::codec::{format_duration, parse_duration_seconds, parse_pace_seconds};

proptest! {
    /// format is the exact left inverse of parse for every canonical
    /// zero-padded HH:MM:SS string with H < 100.
    #[test]
    fn format_inverts_parse_for_canonical_strings(h in 0u32..100, m in 0u32..60, s in 0u32..60) {
        let canonical = format!("{:02}:{:02}:{:02}", h, m, s);
        let seconds = parse_duration_seconds(&canonical);
        prop_assert_eq!(seconds, h * 3600 + m * 60 + s);
        prop_assert_eq!(format_duration(seconds as i64), canonical);
    }

    /// parse then format is stable for any non-negative second count.
    #[test]
    fn parse_format_fixpoint(total in 0i64..1_000_000) {
        let formatted = format_duration(total);
        prop_assert_eq!(parse_duration_seconds(&formatted) as i64, total);
    }

    /// Arbitrary input never panics and never goes negative.
    #[test]
    fn parse_is_total(input in "\\PC*") {
        let _ = parse_duration_seconds(&input);
        let _ = parse_pace_seconds(&input);
    }

    /// Two-part pace strings decode as MM:SS.
    #[test]
    fn pace_decodes_minutes_seconds(m in 0u32..60, s in 0u32..60) {
        let pace = format!("{}:{:02}", m, s);
        prop_assert_eq!(parse_pace_seconds(&pace), m * 60 + s);
    }
}

#[test]
fn known_duration_strings() {
    assert_eq!(parse_duration_seconds("01:02:03"), 3723);
    assert_eq!(parse_duration_seconds("5:30"), 330);
    assert_eq!(parse_duration_seconds(""), 0);
    assert_eq!(parse_duration_seconds("garbage"), 0);
    assert_eq!(format_duration(0), "00:00:00");
}
