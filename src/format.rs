//! Text formatting helpers for rendered output.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::fmt::Write;

/// Escape HTML special characters.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Format a millisecond timestamp in `tz` with a strftime pattern.
///
/// An invalid pattern or out-of-range timestamp yields `"-"` rather than
/// failing the whole page.
pub fn format_timestamp(ms: i64, pattern: &str, tz: Tz) -> String {
    let Some(dt) = DateTime::<Utc>::from_timestamp_millis(ms) else {
        return "-".to_string();
    };
    let dt = dt.with_timezone(&tz);
    let mut out = String::new();
    match write!(out, "{}", dt.format(pattern)) {
        Ok(()) => out,
        Err(_) => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup() {
        assert_eq!(
            html_escape(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn formats_with_pattern() {
        // 2024-03-05T14:07:00Z
        let ms = 1_709_647_620_000;
        assert_eq!(
            format_timestamp(ms, "%b %d, %Y - %H:%M", Tz::UTC),
            "Mar 05, 2024 - 14:07"
        );
        assert_eq!(format_timestamp(ms, "%Y-%m-%d", Tz::UTC), "2024-03-05");
    }

    #[test]
    fn formats_in_zone() {
        let ms = 1_709_647_620_000;
        assert_eq!(
            format_timestamp(ms, "%Y-%m-%d %H:%M", chrono_tz::Asia::Tokyo),
            "2024-03-05 23:07"
        );
        // NZDT is UTC+13 in March, which crosses midnight.
        assert_eq!(
            format_timestamp(ms, "%Y-%m-%d %H:%M", chrono_tz::Pacific::Auckland),
            "2024-03-06 03:07"
        );
    }

    #[test]
    fn bad_pattern_does_not_panic() {
        assert_eq!(format_timestamp(0, "%Q", Tz::UTC), "-");
    }
}
