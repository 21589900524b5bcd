use std::sync::LazyLock;

use regex::Regex;

/// Fallback candidates must fall inside this range to count.
const FALLBACK_RANGE: std::ops::RangeInclusive<f64> = 0.0..=500.0;

// Labelled patterns, tried in order; first hit wins.
static LABELLED_RES: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        Regex::new(r"PM2\.5\s*[: ]*\s*([0-9]+(?:\.[0-9]+)?)").unwrap(),
        Regex::new(r"PM25\s*[: ]*\s*([0-9]+(?:\.[0-9]+)?)").unwrap(),
        Regex::new(r"P25[A-Z]*\s*([0-9]+(?:\.[0-9]+)?)").unwrap(),
    ]
});
static STANDALONE_NUM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[0-9]{1,3}(?:\.[0-9]+)?\b").unwrap());

/// Pull one PM2.5 value out of normalized text.
///
/// A labelled value is returned as-is, whatever its magnitude; range checks
/// belong to the caller. Without a label, the text must contain exactly one
/// standalone number in `0..=500`. Zero or several candidates is ambiguous and
/// yields `None`.
pub fn extract_pm25(normalized: &str) -> Option<f64> {
    for re in LABELLED_RES.iter() {
        if let Some(caps) = re.captures(normalized) {
            if let Ok(value) = caps[1].parse::<f64>() {
                return Some(value);
            }
        }
    }
    single_candidate(normalized)
}

fn single_candidate(normalized: &str) -> Option<f64> {
    let mut candidates = STANDALONE_NUM_RE
        .find_iter(normalized)
        .filter_map(|m| m.as_str().parse::<f64>().ok())
        .filter(|n| FALLBACK_RANGE.contains(n));
    let first = candidates.next()?;
    match candidates.next() {
        Some(_) => None,
        None => Some(first),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labelled_value() {
        assert_eq!(extract_pm25("PM2.5: 85"), Some(85.0));
        assert_eq!(extract_pm25("PM2.5 12.7 UG/M3"), Some(12.7));
        assert_eq!(extract_pm25("AQI 120 PM2.5 45"), Some(45.0));
    }

    #[test]
    fn labelled_value_exact_for_whole_range() {
        for tenths in (0..=5000).step_by(37) {
            let v = tenths as f64 / 10.0;
            let text = format!("PM2.5 {}", v);
            assert_eq!(extract_pm25(&text), Some(v), "{}", text);
        }
    }

    #[test]
    fn labelled_value_may_exceed_range() {
        assert_eq!(extract_pm25("PM2.5 600"), Some(600.0));
    }

    #[test]
    fn alternate_labels() {
        assert_eq!(extract_pm25("PM25:33"), Some(33.0));
        assert_eq!(extract_pm25("P25UGM 48.2"), Some(48.2));
    }

    #[test]
    fn label_priority() {
        // "PM2.5" outranks a later "PM25"
        assert_eq!(extract_pm25("PM25 10 PM2.5 20"), Some(20.0));
    }

    #[test]
    fn fallback_single_number() {
        assert_eq!(extract_pm25("READING 42"), Some(42.0));
        assert_eq!(extract_pm25("37.5"), Some(37.5));
    }

    #[test]
    fn fallback_ambiguous() {
        assert_eq!(extract_pm25("12 34"), None);
    }

    #[test]
    fn fallback_ignores_out_of_range_and_long_numbers() {
        // 999 is out of range, 2024 is not a 1-3 digit token
        assert_eq!(extract_pm25("999 2024 88"), Some(88.0));
    }

    #[test]
    fn nothing_numeric() {
        assert_eq!(extract_pm25("GARBAGE N0 NUMBER5"), None);
        assert_eq!(extract_pm25(""), None);
    }
}
