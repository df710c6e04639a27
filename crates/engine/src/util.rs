//! Internal helpers for input validation and conversion.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation and mapping logic so the engine enforces consistent invariants.

use chrono::NaiveDate;
use unicode_normalization::UnicodeNormalization;

use crate::{EngineError, ResultEngine};

/// Trim a name and collapse inner whitespace; reject empty names.
pub(crate) fn normalize_required_name(value: &str, label: &str) -> ResultEngine<String> {
    let collapsed = value.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return Err(EngineError::InvalidName(format!(
            "{label} name must not be empty"
        )));
    }
    Ok(collapsed)
}

pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// Case-folded form of a note, used for case-insensitive containment.
///
/// NFC keeps composed and decomposed input comparable; lowercasing is done
/// per char so non-ASCII scripts fold too.
pub(crate) fn normalize_note(value: &str) -> String {
    value.nfc().flat_map(char::to_lowercase).collect()
}

/// Escape `LIKE` wildcards so user text matches literally (escape char `\`).
pub(crate) fn escape_like(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Parse an ISO `YYYY-MM-DD` calendar date.
pub(crate) fn parse_date(value: &str, label: &str) -> ResultEngine<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| EngineError::InvalidDate(format!("invalid {label}: '{value}'")))
}

/// Parse a category id coming from a transport layer.
pub(crate) fn parse_category_id(value: &str) -> ResultEngine<i32> {
    value
        .trim()
        .parse()
        .map_err(|_| EngineError::InvalidId(format!("invalid category id: '{value}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_is_trimmed_and_collapsed() {
        assert_eq!(
            normalize_required_name("  Motor   oil ", "category").unwrap(),
            "Motor oil"
        );
        assert!(matches!(
            normalize_required_name("   ", "category"),
            Err(EngineError::InvalidName(_))
        ));
    }

    #[test]
    fn note_folding_handles_cyrillic() {
        assert_eq!(normalize_note("Бензин АИ-95"), "бензин аи-95");
        assert_eq!(normalize_note("Caf\u{0065}\u{0301}"), "caf\u{00e9}");
    }

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
    }

    #[test]
    fn dates_must_be_iso() {
        assert_eq!(
            parse_date("2020-05-01", "start date").unwrap(),
            NaiveDate::from_ymd_opt(2020, 5, 1).unwrap()
        );
        assert!(matches!(
            parse_date("01/05/2020", "start date"),
            Err(EngineError::InvalidDate(_))
        ));
        assert!(matches!(
            parse_date("2020-02-30", "start date"),
            Err(EngineError::InvalidDate(_))
        ));
    }

    #[test]
    fn category_id_must_be_integer() {
        assert_eq!(parse_category_id(" 7 ").unwrap(), 7);
        assert!(matches!(
            parse_category_id("seven"),
            Err(EngineError::InvalidId(_))
        ));
    }
}
