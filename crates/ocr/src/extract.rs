use std::borrow::Cow;
use std::sync::OnceLock;

use odoscan_core::DistanceUnit;
use regex::Regex;

// ── Compiled regex cache ─────────────────────────────────────────────────────

macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static Regex {
            static R: OnceLock<Regex> = OnceLock::new();
            R.get_or_init(|| Regex::new($pat).expect("invalid regex"))
        }
    };
}

re!(re_digit_run, r"[0-9]+");
re!(re_grouped, r"[0-9]{1,3}(?:[,. ][0-9]{3})+");
re!(re_unit, r"(?i)kilometers?|kms?|miles?|mi");

/// Every maximal run of ASCII digits, in order of appearance, followed by the
/// joined digits of any thousands-grouped number (`52,347` → `52347`).
///
/// Runs are returned as text so that any length survives; bounds are checked
/// when the caller parses them into a `Mileage`.
pub fn extract_digit_runs(text: &str) -> Vec<Cow<'_, str>> {
    let mut runs: Vec<Cow<'_, str>> = re_digit_run()
        .find_iter(text)
        .map(|m| Cow::Borrowed(m.as_str()))
        .collect();

    for m in re_grouped().find_iter(text) {
        if touches_digit(text, m.start(), m.end()) {
            continue;
        }
        runs.push(Cow::Owned(m.as_str().chars().filter(char::is_ascii_digit).collect()));
    }
    runs
}

/// The first distance-unit token in `text`, matched case-insensitively and
/// only when not embedded in a longer word.
pub fn detect_unit(text: &str) -> Option<DistanceUnit> {
    re_unit()
        .find_iter(text)
        .find(|m| !touches_letter(text, m.start(), m.end()))
        .and_then(|m| m.as_str().parse().ok())
}

fn touches_digit(text: &str, start: usize, end: usize) -> bool {
    text[..start].chars().next_back().is_some_and(|c| c.is_ascii_digit())
        || text[end..].chars().next().is_some_and(|c| c.is_ascii_digit())
}

fn touches_letter(text: &str, start: usize, end: usize) -> bool {
    text[..start].chars().next_back().is_some_and(char::is_alphabetic)
        || text[end..].chars().next().is_some_and(char::is_alphabetic)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correct::correct;

    fn runs(text: &str) -> Vec<String> {
        extract_digit_runs(text).into_iter().map(Cow::into_owned).collect()
    }

    #[test]
    fn extracts_every_digit_run() {
        assert_eq!(runs("ODO 52347 TRIP 234.5"), ["52347", "234", "5"]);
    }

    #[test]
    fn no_digits_no_numbers() {
        assert!(extract_digit_runs("MILES").is_empty());
        assert!(extract_digit_runs(&correct("MILES")).is_empty());
        assert!(extract_digit_runs("").is_empty());
    }

    #[test]
    fn corrected_text_yields_full_reading() {
        assert_eq!(runs(&correct("Z3S977")), ["235977"]);
    }

    #[test]
    fn thousands_grouping_adds_joined_value() {
        assert_eq!(runs("52,347 mi"), ["52", "347", "52347"]);
        assert_eq!(runs("1.234.567"), ["1", "234", "567", "1234567"]);
        assert_eq!(runs("52 347"), ["52", "347", "52347"]);
    }

    #[test]
    fn grouping_requires_exact_three_digit_groups() {
        assert_eq!(runs("123.4"), ["123", "4"]);
        assert_eq!(runs("52,3478"), ["52", "3478"]);
        assert_eq!(runs("123456,789"), ["123456", "789"]);
    }

    #[test]
    fn huge_runs_are_kept_whole() {
        assert_eq!(
            runs("123456789012345678901234567890"),
            ["123456789012345678901234567890"]
        );
    }

    #[test]
    fn detects_kilometers() {
        assert_eq!(detect_unit("50000 km"), Some(DistanceUnit::Kilometers));
        assert_eq!(detect_unit("50000 KILOMETERS"), Some(DistanceUnit::Kilometers));
        assert_eq!(detect_unit("50000km"), Some(DistanceUnit::Kilometers));
        assert_eq!(detect_unit("120 km/h"), Some(DistanceUnit::Kilometers));
    }

    #[test]
    fn detects_plural_kms() {
        assert_eq!(detect_unit("50000 kms"), Some(DistanceUnit::Kilometers));
        assert_eq!(detect_unit("50000KMS"), Some(DistanceUnit::Kilometers));
        assert_eq!(detect_unit("kmsx 50000"), None);
    }

    #[test]
    fn detects_miles() {
        assert_eq!(detect_unit("50000 mi"), Some(DistanceUnit::Miles));
        assert_eq!(detect_unit("ODO 50000 Miles"), Some(DistanceUnit::Miles));
        assert_eq!(detect_unit("50000 mile"), Some(DistanceUnit::Miles));
    }

    #[test]
    fn no_unit_token() {
        assert_eq!(detect_unit("50000"), None);
        assert_eq!(detect_unit(""), None);
    }

    #[test]
    fn unit_inside_a_word_is_ignored() {
        assert_eq!(detect_unit("MINIMUM 50000"), None);
        assert_eq!(detect_unit("smiles 50000"), None);
        assert_eq!(detect_unit("MINI 50000 km"), Some(DistanceUnit::Kilometers));
    }

    #[test]
    fn first_unit_wins() {
        assert_eq!(detect_unit("31068 mi / 50000 km"), Some(DistanceUnit::Miles));
        assert_eq!(detect_unit("50000 km (31068 mi)"), Some(DistanceUnit::Kilometers));
    }
}
