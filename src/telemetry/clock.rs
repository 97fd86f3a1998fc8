//! Mission clock parsing.
//!
//! Broadcast overlays show the clock as `T+HH:MM:SS` (or `T-HH:MM:SS` during
//! the countdown). The OCR output is matched position by position against that
//! 10-character layout.

/// Length of a complete clock string, e.g. `T+00:01:23`.
pub const CLOCK_TEXT_LEN: usize = 10;

/// Replaces every `.` with `:`.
///
/// OCR regularly reads the colon separators as periods.
pub fn normalize_clock_text(text: &str) -> String {
    text.replace('.', ":")
}

/// Parses a `T±HH:MM:SS` string into signed seconds.
///
/// Position 1 holds the sign: `-` yields a negative value (countdown),
/// any other character a positive one. The separator positions are not
/// checked. Returns `None` when the text is not exactly 10 characters long
/// or a digit field does not parse.
pub fn parse_clock(text: &str) -> Option<i64> {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() != CLOCK_TEXT_LEN {
        return None;
    }

    let field = |start: usize| -> Option<i64> {
        let digits: String = chars[start..start + 2].iter().collect();
        if !digits.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()
    };

    let hours = field(2)?;
    let minutes = field(5)?;
    let seconds = field(8)?;
    let total = 3600 * hours + 60 * minutes + seconds;

    if chars[1] == '-' {
        Some(-total)
    } else {
        Some(total)
    }
}

/// Returns the clock value for this frame, falling back to `last` when the
/// text cannot be parsed.
pub fn update_clock(last: i64, text: &str) -> i64 {
    parse_clock(text).unwrap_or(last)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_clock_positive() {
        assert_eq!(parse_clock("T+00:01:23"), Some(83));
        assert_eq!(parse_clock("T+01:00:00"), Some(3600));
        assert_eq!(parse_clock("T+12:34:56"), Some(12 * 3600 + 34 * 60 + 56));
    }

    #[test]
    fn test_parse_clock_countdown_is_negative() {
        assert_eq!(parse_clock("T-00:00:10"), Some(-10));
        assert_eq!(parse_clock("T-00:02:00"), Some(-120));
    }

    #[test]
    fn test_parse_clock_sign_other_than_minus_is_positive() {
        // OCR may drop or garble the plus sign into another character
        assert_eq!(parse_clock("T400:00:05"), Some(5));
        assert_eq!(parse_clock("1+00:00:05"), Some(5));
    }

    #[test]
    fn test_parse_clock_wrong_length() {
        assert_eq!(parse_clock(""), None);
        assert_eq!(parse_clock("T+0:01:23"), None);
        assert_eq!(parse_clock("T+000:01:23"), None);
        assert_eq!(parse_clock("00:01:23"), None);
    }

    #[test]
    fn test_parse_clock_non_digit_fields() {
        assert_eq!(parse_clock("T+0a:01:23"), None);
        assert_eq!(parse_clock("T+00:-1:23"), None);
    }

    #[test]
    fn test_normalize_clock_text() {
        assert_eq!(normalize_clock_text("T+00.01.23"), "T+00:01:23");
        assert_eq!(normalize_clock_text("T+00:01.23"), "T+00:01:23");
        assert_eq!(parse_clock(&normalize_clock_text("T-00.00.30")), Some(-30));
    }

    #[test]
    fn test_update_clock_keeps_last_on_garbage() {
        assert_eq!(update_clock(42, "T+00:00:43"), 43);
        assert_eq!(update_clock(42, "T+00:0"), 42);
        assert_eq!(update_clock(-5, ""), -5);
    }
}
