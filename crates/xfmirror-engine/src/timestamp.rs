//! Timestamp tokens embedded in feed file names
//!
//! Timestamps stay strings. Feeds use fixed-width `YYYYMMDD` or
//! `YYYYMMDDHHMMSS` tokens, so lexicographic order on equal-length digit
//! strings is chronological order.

use once_cell::sync::Lazy;
use regex::Regex;

/// Shortest digit run accepted as a timestamp
pub const MIN_TIMESTAMP_DIGITS: usize = 8;

static TIMESTAMP: Lazy<Result<Regex, regex::Error>> = Lazy::new(|| Regex::new(r"[0-9]{8,}"));

/// First run of at least [`MIN_TIMESTAMP_DIGITS`] ASCII digits in `name`
pub fn extract_timestamp(name: &str) -> Option<&str> {
    TIMESTAMP.as_ref().ok()?.find(name).map(|m| m.as_str())
}

/// Finds the leftmost window of exactly `width` consecutive digits
///
/// Used to pull a token of the same width as a reference timestamp out of
/// change file names, so that unrelated numbers of another width never
/// compare against it.
#[derive(Debug, Clone)]
pub struct DigitWindow {
    width: usize,
    pattern: Regex,
}

impl DigitWindow {
    /// Build a matcher for `width` digits; `None` for a zero width
    pub fn new(width: usize) -> Option<Self> {
        if width == 0 {
            return None;
        }
        let pattern = Regex::new(&format!("[0-9]{{{}}}", width)).ok()?;
        Some(Self { width, pattern })
    }

    /// Matcher sized to a reference timestamp
    pub fn for_reference(reference: &str) -> Option<Self> {
        Self::new(reference.len())
    }

    /// Window width
    pub fn width(&self) -> usize {
        self.width
    }

    /// Leftmost `width`-digit window in `name`
    pub fn find<'a>(&self, name: &'a str) -> Option<&'a str> {
        self.pattern.find(name).map(|m| m.as_str())
    }
}

/// Leftmost window of exactly `width` digits in `name`
pub fn extract_fixed_width(name: &str, width: usize) -> Option<&str> {
    DigitWindow::new(width).and_then(|window| window.find(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case("P_Full_20240101.zip", Some("20240101"))]
    #[case("P_Full_20240101120000_1.zip", Some("20240101120000"))]
    #[case("v2_1234_Full_20240101.zip", Some("20240101"))]
    #[case("f_12345678_20240101.zip", Some("12345678"))]
    #[case("P_Full_2024011.zip", None)]
    #[case("no_digits.flg", None)]
    #[case("", None)]
    fn test_extract_timestamp(#[case] name: &str, #[case] expected: Option<&str>) {
        assert_eq!(extract_timestamp(name), expected);
    }

    #[rstest]
    #[case("P_Change_20240102.zip", 8, Some("20240102"))]
    #[case("P_Change_20240102120000.zip", 8, Some("20240102"))]
    #[case("t_7_Change_20240102.zip", 8, Some("20240102"))]
    #[case("t_1234567_x.zip", 8, None)]
    #[case("abc123", 0, None)]
    fn test_extract_fixed_width(
        #[case] name: &str,
        #[case] width: usize,
        #[case] expected: Option<&str>,
    ) {
        assert_eq!(extract_fixed_width(name, width), expected);
    }

    #[test]
    fn test_digit_window_for_reference() {
        let window = DigitWindow::for_reference("20240101120000").unwrap();
        assert_eq!(window.width(), 14);
        assert_eq!(window.find("t_20240102_x"), None);
        assert_eq!(window.find("t_20240102130000.zip"), Some("20240102130000"));
    }

    /// Reference scan for the first maximal ASCII digit run of a minimum length
    fn first_long_run(name: &str, min: usize) -> Option<String> {
        let mut run = String::new();
        for c in name.chars() {
            if c.is_ascii_digit() {
                run.push(c);
            } else {
                if run.len() >= min {
                    return Some(run);
                }
                run.clear();
            }
        }
        (run.len() >= min).then_some(run)
    }

    proptest! {
        #[test]
        fn test_extractor_returns_first_long_run(name in "[a-zA-Z_0-9.]{0,40}") {
            let expected = first_long_run(&name, MIN_TIMESTAMP_DIGITS);
            prop_assert_eq!(extract_timestamp(&name).map(str::to_string), expected);
        }

        #[test]
        fn test_fixed_width_is_prefix_of_first_long_enough_run(
            name in "[a-z_0-9]{0,40}",
            width in 1usize..10,
        ) {
            let expected = first_long_run(&name, width).map(|run| run[..width].to_string());
            prop_assert_eq!(extract_fixed_width(&name, width).map(str::to_string), expected);
        }
    }
}
