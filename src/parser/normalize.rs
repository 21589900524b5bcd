use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static LABEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(PM|MP)\s*2\s*\.?\s*5").unwrap());

/// Character-level repair applied to OCR text before any pattern matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OcrCorrection {
    /// `S` → `5`, `O` → `0` everywhere in the (uppercased) text. Letters in
    /// words are rewritten too.
    #[default]
    DigitLookalikes,
    Disabled,
}

impl OcrCorrection {
    pub fn apply(self, text: &str) -> String {
        match self {
            OcrCorrection::DigitLookalikes => text
                .chars()
                .map(|c| match c {
                    'S' => '5',
                    'O' => '0',
                    other => other,
                })
                .collect(),
            OcrCorrection::Disabled => text.to_string(),
        }
    }
}

/// Uppercase, repair, collapse whitespace, canonicalize the PM2.5 label, trim.
pub fn normalize(raw: &str, correction: OcrCorrection) -> String {
    let upper = raw.to_uppercase();
    let corrected = correction.apply(&upper);
    let collapsed = WHITESPACE_RE.replace_all(&corrected, " ");
    let labelled = LABEL_RE.replace_all(&collapsed, "PM2.5");
    labelled.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(raw: &str) -> String {
        normalize(raw, OcrCorrection::DigitLookalikes)
    }

    #[test]
    fn canonical_label_untouched() {
        assert_eq!(norm("PM2.5: 85"), "PM2.5: 85");
    }

    #[test]
    fn label_variants() {
        assert_eq!(norm("pm 2 . 5 42"), "PM2.5 42");
        assert_eq!(norm("MP25 42"), "PM2.5 42");
        assert_eq!(norm("Pm2.5\n\t17"), "PM2.5 17");
    }

    #[test]
    fn lookalikes_become_digits() {
        assert_eq!(norm("PM2.5 S4"), "PM2.5 54");
        assert_eq!(norm("1O"), "10");
        // words are corrupted as well
        assert_eq!(norm("status ok"), "5TATU5 0K");
    }

    #[test]
    fn correction_can_be_disabled() {
        assert_eq!(normalize("status 1O", OcrCorrection::Disabled), "STATUS 1O");
    }

    #[test]
    fn whitespace_collapsed_and_trimmed() {
        assert_eq!(norm("  \n 12   \r\n 34 \t"), "12 34");
        assert_eq!(norm(""), "");
        assert_eq!(norm(" \n\t "), "");
    }
}
