//! Driver utility functions.

use chrono::DateTime;

/// Source of wall-clock time, in unix seconds.
pub trait Clock: Send + Sync {
    fn now(&self) -> i64;
}

/// The system clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

/// Format unix seconds as `YYYY-MM-DD HH:MM:SS` (UTC).
///
/// Timestamps chrono cannot represent yield an empty string.
pub fn format_time(secs: i64) -> String {
    match DateTime::from_timestamp(secs, 0) {
        Some(t) => t.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => {
            tracing::warn!("timestamp {secs} is out of range, leaving time text empty");
            String::new()
        }
    }
}

/// Drop backslash escapes and escape HTML special characters.
///
/// Applied to submitted credentials before they reach the login callback.
pub fn sanitize(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars();

    while let Some(ch) = chars.next() {
        let ch = if ch == '\\' {
            match chars.next() {
                Some(escaped) => escaped,
                None => break,
            }
        } else {
            ch
        };
        match ch {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#039;"),
            c => result.push(c),
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_escapes_markup() {
        assert_eq!(
            sanitize("<b>\"x\" & 'y'</b>"),
            "&lt;b&gt;&quot;x&quot; &amp; &#039;y&#039;&lt;/b&gt;"
        );
    }

    #[test]
    fn sanitize_strips_slashes() {
        assert_eq!(sanitize(r"O\'Reilly"), "O&#039;Reilly");
        assert_eq!(sanitize(r"a\\b"), r"a\b");
        assert_eq!(sanitize("trailing\\"), "trailing");
    }

    #[test]
    fn format_epoch() {
        assert_eq!(format_time(0), "1970-01-01 00:00:00");
        assert_eq!(format_time(1_700_000_000), "2023-11-14 22:13:20");
    }

    #[test]
    fn format_out_of_range() {
        assert_eq!(format_time(i64::MAX), "");
        assert_eq!(format_time(i64::MIN), "");
    }
}
