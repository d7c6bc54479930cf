//! Recover a JSON object from free-form model output.
//!
//! Stages run in order and the first that yields a value wins:
//! direct parse, fenced code block, first balanced `{...}` span, textual
//! repairs, then a flat object assembled from `key: value` pairs.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Number, Value};

static FENCED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"```(?:json)?\s*(\{[\s\S]*?\})\s*```").expect("valid fenced-block regex")
});

static LAZY_OBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\{[\s\S]*?\})").expect("valid object regex"));

static BARE_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([{,])\s*([a-zA-Z0-9_]+)\s*:").expect("valid bare-key regex")
});

static SINGLE_QUOTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":\s*'([^']*)'").expect("valid single-quote regex"));

static KEY_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"["']?([\w\s]+)["']?\s*[:=]\s*["']?([\w\s.\-]+)["']?"#)
        .expect("valid key-value regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractStage {
    Direct,
    Fenced,
    Balanced,
    Repaired,
    KeyValue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Extraction {
    pub value: Value,
    pub stage: ExtractStage,
}

/// Remove C0 and C1 control characters (0x00–0x1F, 0x7F–0x9F).
pub fn strip_control(text: &str) -> String {
    text.chars()
        .filter(|c| !matches!(*c as u32, 0x00..=0x1F | 0x7F..=0x9F))
        .collect()
}

/// Contents of the first ``` or ```json fence holding an object.
pub fn fenced_block(text: &str) -> Option<&str> {
    FENCED
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
}

/// First balanced top-level `{...}` span. Braces inside double-quoted
/// strings are ignored.
pub fn balanced_object(text: &str) -> Option<&str> {
    let mut depth = 0usize;
    let mut start = None;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' if depth > 0 => in_string = true,
            '{' => {
                if depth == 0 {
                    start = Some(i);
                }
                depth += 1;
            }
            '}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    return start.map(|s| text[s..=i].trim());
                }
            }
            _ => {}
        }
    }
    None
}

/// Quote bare object keys and turn single-quoted values into double-quoted.
pub fn repair_json(text: &str) -> String {
    let keyed = BARE_KEY.replace_all(text, r#"${1}"${2}":"#);
    SINGLE_QUOTED.replace_all(&keyed, r#":"${1}""#).into_owned()
}

/// Flat object from `key: value` / `key = value` pairs; `None` if no pair
/// was found. Pairs never span a line break.
pub fn key_value_pairs(text: &str) -> Option<Value> {
    let mut out = Map::new();
    for line in text.lines().map(strip_control) {
        for caps in KEY_VALUE.captures_iter(&line) {
            let key = caps.get(1).map_or("", |m| m.as_str()).trim();
            let value = caps.get(2).map_or("", |m| m.as_str()).trim();
            if key.is_empty() || value.is_empty() {
                continue;
            }
            out.insert(key.to_string(), coerce_scalar(value));
        }
    }
    (!out.is_empty()).then_some(Value::Object(out))
}

fn coerce_scalar(value: &str) -> Value {
    if let Ok(n) = value.parse::<i64>() {
        return Value::Number(n.into());
    }
    if let Some(n) = value
        .parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .and_then(Number::from_f64)
    {
        return Value::Number(n);
    }
    match value.to_ascii_lowercase().as_str() {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => Value::String(value.to_string()),
    }
}

fn parse(text: &str) -> Option<Value> {
    serde_json::from_str(text).ok()
}

/// Run the extraction pipeline, reporting which stage succeeded.
pub fn extract_json(text: &str) -> Option<Extraction> {
    if text.trim().is_empty() {
        return None;
    }
    let cleaned = strip_control(text);
    let found = |value, stage| {
        tracing::debug!(?stage, "extracted JSON");
        Some(Extraction { value, stage })
    };

    if let Some(v) = parse(&cleaned) {
        return found(v, ExtractStage::Direct);
    }

    let fenced = fenced_block(&cleaned);
    if let Some(v) = fenced.and_then(parse) {
        return found(v, ExtractStage::Fenced);
    }

    let balanced = balanced_object(&cleaned);
    if let Some(v) = balanced.and_then(parse) {
        return found(v, ExtractStage::Balanced);
    }

    let candidate = balanced
        .or(fenced)
        .or_else(|| LAZY_OBJECT.find(&cleaned).map(|m| m.as_str()))
        .unwrap_or(&cleaned);
    if let Some(v) = parse(&repair_json(candidate)) {
        return found(v, ExtractStage::Repaired);
    }
    tracing::debug!("repairs failed, scanning for key/value pairs");

    if let Some(v) = key_value_pairs(text) {
        return found(v, ExtractStage::KeyValue);
    }
    None
}

/// The recovered value alone. `None` means every stage failed and the
/// caller must fall back to its own default.
pub fn safe_json_parse(text: &str) -> Option<Value> {
    extract_json(text).map(|e| e.value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fenced_json_block() {
        let got = extract_json("```json\n{\"a\":1}\n```").unwrap();
        assert_eq!(got.value, json!({"a": 1}));
        assert_eq!(got.stage, ExtractStage::Fenced);
    }

    #[test]
    fn serialized_values_round_trip() {
        let x = json!({
            "name": "Accra",
            "score": 4.5,
            "ok": true,
            "tags": ["a", "b"],
            "nested": {"n": 1}
        });
        let text = serde_json::to_string(&x).unwrap();
        assert_eq!(safe_json_parse(&text), Some(x.clone()));
        let pretty = serde_json::to_string_pretty(&x).unwrap();
        assert_eq!(safe_json_parse(&pretty), Some(x));
    }

    #[test]
    fn nested_object_inside_prose() {
        let text = r#"Sure! Here it is: {"a": {"b": {"c": 2}}, "d": "}"} Hope that helps."#;
        let got = extract_json(text).unwrap();
        assert_eq!(got.stage, ExtractStage::Balanced);
        assert_eq!(got.value, json!({"a": {"b": {"c": 2}}, "d": "}"}));
    }

    #[test]
    fn balanced_scan_ignores_braces_in_strings() {
        assert_eq!(balanced_object(r#"x {"k": "{"} y"#), Some(r#"{"k": "{"}"#));
        assert_eq!(balanced_object("{ unclosed"), None);
    }

    #[test]
    fn bare_keys_and_single_quotes_are_repaired() {
        let got = extract_json("Result: {name: 'Accra', count: 3}").unwrap();
        assert_eq!(got.stage, ExtractStage::Repaired);
        assert_eq!(got.value, json!({"name": "Accra", "count": 3}));
    }

    #[test]
    fn key_value_last_resort() {
        let got = extract_json("score: 0.8, label = positive, flagged: TRUE").unwrap();
        assert_eq!(got.stage, ExtractStage::KeyValue);
        assert_eq!(
            got.value,
            json!({"score": 0.8, "label": "positive", "flagged": true})
        );
    }

    #[test]
    fn key_value_pairs_stay_on_their_line() {
        assert_eq!(
            safe_json_parse("sentiment: positive\nscore: 0.8"),
            Some(json!({"sentiment": "positive", "score": 0.8}))
        );
        assert_eq!(
            safe_json_parse("label: positive\r\nflagged: true\n"),
            Some(json!({"label": "positive", "flagged": true}))
        );
    }

    #[test]
    fn hopeless_input_is_none() {
        assert_eq!(safe_json_parse("no structure here"), None);
        assert_eq!(safe_json_parse(""), None);
        assert_eq!(safe_json_parse("   "), None);
    }

    #[test]
    fn control_characters_are_stripped() {
        assert_eq!(strip_control("a\u{0}b\u{1f}c\u{85}d\n"), "abcd");
        assert_eq!(safe_json_parse("{\"a\":\u{7}1}"), Some(json!({"a": 1})));
    }
}
