//! Timestamp formatting helpers.

/// Format a position in seconds as `HH:MM:SS`.
///
/// Hours, minutes, and seconds are derived by integer division; fractional
/// seconds are truncated, not rounded.
pub fn format_timestamp(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_hour_minute_second() {
        assert_eq!(format_timestamp(3661.0), "01:01:01");
    }

    #[test]
    fn formats_sub_minute() {
        assert_eq!(format_timestamp(59.0), "00:00:59");
    }

    #[test]
    fn truncates_fractional_seconds() {
        assert_eq!(format_timestamp(59.9), "00:00:59");
    }

    #[test]
    fn formats_zero() {
        assert_eq!(format_timestamp(0.0), "00:00:00");
    }

    #[test]
    fn clamps_negative_to_zero() {
        assert_eq!(format_timestamp(-3.0), "00:00:00");
    }

    #[test]
    fn formats_multi_hour() {
        assert_eq!(format_timestamp(7322.0), "02:02:02");
    }
}
