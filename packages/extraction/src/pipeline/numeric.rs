//! Leading-numeral extraction from free-text cells.

use regex::Regex;
use std::sync::LazyLock;

static NUMERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]+(?:\.[0-9]+)?").expect("numeral pattern is valid"));

/// Return the first decimal numeral in `text`, ignoring any units.
///
/// `"0.5 ppb"` yields `0.5`; `"ND"` and `""` yield `None`.
pub fn extract_numeric(text: &str) -> Option<f64> {
    NUMERAL
        .find(text)
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_examples() {
        assert_eq!(extract_numeric("0.5 ppb"), Some(0.5));
        assert_eq!(extract_numeric("Legal limit: 10 ppb"), Some(10.0));
        assert_eq!(extract_numeric("12ppm"), Some(12.0));
        assert_eq!(extract_numeric("ND"), None);
        assert_eq!(extract_numeric(""), None);
        assert_eq!(extract_numeric("Not regulated"), None);
    }

    #[test]
    fn test_first_numeral_wins() {
        assert_eq!(extract_numeric("3.25 ppb (limit 10)"), Some(3.25));
    }

    proptest! {
        #[test]
        fn finds_embedded_numeral(
            value in 0u32..1_000_000,
            frac in 0u32..1000,
            unit in "[a-zA-Z/ ]{0,12}",
        ) {
            let text = format!("{}.{:03}{}", value, frac, unit);
            let expected = format!("{}.{:03}", value, frac).parse::<f64>().unwrap();
            prop_assert_eq!(extract_numeric(&text), Some(expected));
        }

        #[test]
        fn no_digits_means_absent(text in "[^0-9]{0,40}") {
            prop_assert_eq!(extract_numeric(&text), None);
        }
    }
}
