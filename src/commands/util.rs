use nu_protocol::{PipelineData, Record, Span, Value};
use serde_json::{Map, Number};

/// Collect pipeline input as JSON survey records.
///
/// Handles:
///   - Table (list of records) → one object per row
///   - Single record → [record]
///   - List of non-records → one JSON scalar each (ops wrap them as `{value: v}`)
///   - Empty/Nothing → []
pub fn input_records(input: PipelineData) -> Vec<serde_json::Value> {
    let values: Vec<Value> = match input {
        PipelineData::Value(Value::List { vals, .. }, _) => vals,
        PipelineData::Value(Value::Nothing { .. }, _) => vec![],
        PipelineData::Value(value, _) => vec![value],
        other => other.into_iter().collect(),
    };
    values.iter().map(nu_to_json).collect()
}

/// Convert a nu_protocol::Value to a serde_json::Value.
/// Dates become RFC 3339 strings; values with no JSON form fall back to
/// their display string.
pub fn nu_to_json(val: &Value) -> serde_json::Value {
    match val {
        Value::Nothing { .. } => serde_json::Value::Null,
        Value::Bool { val, .. } => serde_json::Value::Bool(*val),
        Value::Int { val, .. } => serde_json::Value::Number((*val).into()),
        Value::Float { val, .. } => Number::from_f64(*val)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::String { val, .. } => serde_json::Value::String(val.clone()),
        Value::Date { val, .. } => serde_json::Value::String(val.to_rfc3339()),
        Value::List { vals, .. } => serde_json::Value::Array(vals.iter().map(nu_to_json).collect()),
        Value::Record { val, .. } => {
            let mut map = Map::new();
            for (k, v) in val.iter() {
                map.insert(k.clone(), nu_to_json(v));
            }
            serde_json::Value::Object(map)
        }
        other => match other.coerce_string() {
            Ok(s) => serde_json::Value::String(s),
            Err(_) => serde_json::Value::Null,
        },
    }
}

/// Convert a serde_json::Value to a nu_protocol::Value.
pub fn json_to_nu(val: &serde_json::Value, span: Span) -> Value {
    match val {
        serde_json::Value::Null => Value::nothing(span),
        serde_json::Value::Bool(b) => Value::bool(*b, span),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::int(i, span)
            } else if let Some(f) = n.as_f64() {
                Value::float(f, span)
            } else {
                Value::string(n.to_string(), span)
            }
        }
        serde_json::Value::String(s) => Value::string(s, span),
        serde_json::Value::Array(arr) => {
            Value::list(arr.iter().map(|v| json_to_nu(v, span)).collect(), span)
        }
        serde_json::Value::Object(map) => {
            let mut record = Record::new();
            for (k, v) in map {
                record.push(k, json_to_nu(v, span));
            }
            Value::record(record, span)
        }
    }
}

/// Wrap an op result as pipeline output.
pub fn output(result: Result<serde_json::Value, String>, span: Span) -> Result<PipelineData, nu_protocol::LabeledError> {
    match result {
        Ok(json_val) => Ok(PipelineData::Value(json_to_nu(&json_val, span), None)),
        Err(e) => Err(nu_protocol::LabeledError::new(e)),
    }
}
