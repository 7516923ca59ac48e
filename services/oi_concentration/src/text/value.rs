use regex::Regex;

/// First signed integer in `text`, thousands separators allowed.
///
/// Returns 0 when no digit run is present so a malformed cell never
/// aborts the row it sits in.
pub fn coerce_int(text: &str) -> i64 {
    let cleaned = text.replace('\u{a0}', " ");
    let Ok(re) = Regex::new(r"[-+]?\d[\d,]*") else {
        return 0;
    };
    re.find(&cleaned)
        .and_then(|m| m.as_str().replace(',', "").parse::<i64>().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coerce_thousands() {
        assert_eq!(coerce_int("1,234"), 1234);
        assert_eq!(coerce_int("100,000"), 100_000);
    }

    #[test]
    fn test_coerce_signed() {
        assert_eq!(coerce_int("-56"), -56);
        assert_eq!(coerce_int("+7"), 7);
    }

    #[test]
    fn test_coerce_no_digits() {
        assert_eq!(coerce_int("N/A"), 0);
        assert_eq!(coerce_int(""), 0);
        assert_eq!(coerce_int("-"), 0);
    }

    #[test]
    fn test_coerce_embedded_in_prose() {
        assert_eq!(coerce_int("\u{a0}12,345\u{a0}(32.1%)"), 12_345);
        assert_eq!(coerce_int("部位數 8,000 口"), 8_000);
    }

    #[test]
    fn test_coerce_overflow_is_zero() {
        assert_eq!(coerce_int("99999999999999999999999"), 0);
    }
}
