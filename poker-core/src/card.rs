//! The estimation deck.

/// Card faces offered to participants, in display order.
pub const CARD_VALUES: [&str; 8] = ["1", "2", "3", "5", "8", "13", "21", "?"];

/// Whether `value` is one of the deck's faces.
pub fn is_card_value(value: &str) -> bool {
    CARD_VALUES.contains(&value)
}

/// Numeric reading of a vote, if it has one.
///
/// Surrounding whitespace is ignored. Empty text, `"?"`, and anything that
/// does not parse to a finite number yield `None`.
pub fn numeric_value(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deck_membership() {
        assert!(is_card_value("13"));
        assert!(is_card_value("?"));
        assert!(!is_card_value("4"));
        assert!(!is_card_value(""));
    }

    #[test]
    fn test_numeric_values() {
        assert_eq!(numeric_value("8"), Some(8.0));
        assert_eq!(numeric_value(" 5 "), Some(5.0));
        assert_eq!(numeric_value("0.5"), Some(0.5));
        assert_eq!(numeric_value("?"), None);
        assert_eq!(numeric_value(""), None);
        assert_eq!(numeric_value("inf"), None);
        assert_eq!(numeric_value("NaN"), None);
    }

    #[test]
    fn test_every_face_but_question_mark_is_numeric() {
        let numeric = CARD_VALUES
            .iter()
            .filter(|v| numeric_value(v).is_some())
            .count();
        assert_eq!(numeric, CARD_VALUES.len() - 1);
    }
}
