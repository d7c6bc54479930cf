use serde_json::Value;

/// Text ratings in priority order. The first rung whose phrase appears in the
/// lowercased input wins, so "très insatisfait" resolves on the "satisfait"
/// rung before reaching its own.
const RATING_LADDER: &[(&[&str], f64)] = &[
    (&["excellent", "très satisfait"], 5.0),
    (&["good", "bien", "satisfait"], 4.0),
    (&["average", "moyen", "neutre"], 3.0),
    (&["poor", "mauvais", "insatisfait"], 2.0),
    (&["terrible", "très insatisfait"], 1.0),
];

/// Coerce a survey cell into a numeric rating.
///
/// Numbers pass through unchanged. Strings are stripped down to digits and
/// dots and parsed as a leading float; failing that, a bilingual
/// (English/French) keyword ladder is consulted. Anything else is `None`,
/// which callers must exclude from averages rather than treat as zero.
pub fn parse_rating(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_rating_text(s),
        _ => None,
    }
}

/// String branch of [`parse_rating`].
pub fn parse_rating_text(text: &str) -> Option<f64> {
    let numeric: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    if let Some(n) = leading_float(&numeric) {
        return Some(n);
    }

    let lower = text.trim().to_lowercase();
    RATING_LADDER
        .iter()
        .find(|(phrases, _)| phrases.iter().any(|p| lower.contains(p)))
        .map(|(_, score)| *score)
}

/// Longest `digits[.digits]` prefix, requiring at least one digit.
/// "1.2.3" → 1.2, "3." → 3, ".5" → 0.5, "." → None.
fn leading_float(s: &str) -> Option<f64> {
    let bytes = s.as_bytes();
    let mut end = 0;
    let mut seen_dot = false;
    let mut seen_digit = false;
    while end < bytes.len() {
        match bytes[end] {
            b'0'..=b'9' => seen_digit = true,
            b'.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end += 1;
    }
    if !seen_digit {
        return None;
    }
    let prefix = s[..end].trim_end_matches('.');
    let prefix = if prefix.starts_with('.') {
        format!("0{prefix}")
    } else {
        prefix.to_string()
    };
    prefix.parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numbers_pass_through_unbounded() {
        assert_eq!(parse_rating(&json!(4)), Some(4.0));
        assert_eq!(parse_rating(&json!(42.5)), Some(42.5));
        assert_eq!(parse_rating(&json!(0)), Some(0.0));
    }

    #[test]
    fn numeric_strings_strip_noise() {
        assert_eq!(parse_rating(&json!("4")), Some(4.0));
        assert_eq!(parse_rating(&json!(" 3.5 stars")), Some(3.5));
        assert_eq!(parse_rating(&json!("4/5")), Some(45.0));
        assert_eq!(parse_rating(&json!("1.2.3")), Some(1.2));
        assert_eq!(parse_rating(&json!(".5")), Some(0.5));
    }

    #[test]
    fn numeric_strings_match_float_parse() {
        for s in ["0", "7", "10", "2.25", "9.0"] {
            assert_eq!(parse_rating_text(s), s.parse::<f64>().ok());
        }
    }

    #[test]
    fn text_ladder_english_and_french() {
        assert_eq!(parse_rating(&json!("Excellent")), Some(5.0));
        assert_eq!(parse_rating(&json!("Très satisfait")), Some(5.0));
        assert_eq!(parse_rating(&json!("good")), Some(4.0));
        assert_eq!(parse_rating(&json!("Moyen")), Some(3.0));
        assert_eq!(parse_rating(&json!("poor")), Some(2.0));
        assert_eq!(parse_rating(&json!("Terrible!")), Some(1.0));
    }

    #[test]
    fn ladder_order_is_first_match() {
        // "insatisfait" contains "satisfait", which sits on the 4 rung.
        assert_eq!(parse_rating(&json!("insatisfait")), Some(4.0));
        assert_eq!(parse_rating(&json!("très insatisfait")), Some(4.0));
    }

    #[test]
    fn unparseable_is_none_not_zero() {
        assert_eq!(parse_rating(&json!("n/a")), None);
        assert_eq!(parse_rating(&json!(".")), None);
        assert_eq!(parse_rating(&json!("")), None);
        assert_eq!(parse_rating(&Value::Null), None);
        assert_eq!(parse_rating(&json!(true)), None);
        assert_eq!(parse_rating(&json!([1, 2])), None);
    }
}
