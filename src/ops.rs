//! Shared operation wrappers for all interfaces (CLI, MCP, plugin).
//!
//! Each `op_*` function is a pure, synchronous wrapper around one or more
//! `algo` modules. Input and output are `serde_json::Value`, with no
//! dependency on rmcp, clap, or nu-plugin.
//!
//! Record-taking operations normalize column names first, so callers can
//! pass raw survey exports straight through.

use std::path::Path;

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::algo::branch::{self, AggregateOptions};
use crate::algo::improvement::{categorize_improvement, Improvement};
use crate::algo::{analysis, categories, columns, extract, nps, rating, table, SurveyRow};

// ── Helpers ──────────────────────────────────────────────────────────────────

fn to_json<T: Serialize>(value: &T) -> Result<Value, String> {
    serde_json::to_value(value).map_err(|e| format!("Failed to serialize result: {e}"))
}

/// JSON records as survey rows; non-object records become `{"value": ...}`.
pub fn to_rows(records: &[Value]) -> Vec<SurveyRow> {
    records
        .iter()
        .map(|r| match r {
            Value::Object(map) => map.clone(),
            other => {
                let mut map = Map::new();
                map.insert("value".into(), other.clone());
                map
            }
        })
        .collect()
}

fn rows_value(rows: Vec<SurveyRow>) -> Value {
    Value::Array(rows.into_iter().map(Value::Object).collect())
}

fn prepare(records: &[Value]) -> Vec<SurveyRow> {
    columns::normalize_rows(&to_rows(records))
}

fn options(scan_reasons: bool) -> AggregateOptions {
    AggregateOptions { scan_reasons }
}

/// Category names from an inline list, a file, or the default resolution.
pub fn category_names(inline: Option<&[String]>, path: Option<&str>) -> Result<Vec<String>, String> {
    match inline {
        Some(list) if !list.is_empty() => Ok(list.to_vec()),
        _ => Ok(categories::resolve_categories(path)?.categories),
    }
}

// ── Parsing and normalization ────────────────────────────────────────────────

/// Parse raw survey text. `format` is "csv", "tsv" or "json"; JSON that fails
/// to parse is retried as CSV.
pub fn op_parse(raw: &str, format: &str) -> Result<Value, String> {
    let fmt = table::TableFormat::from_name(format)
        .ok_or_else(|| format!("Unknown format '{format}'. Use: csv, tsv, json"))?;
    let rows = table::parse_with_fallback(raw, fmt).map_err(|e| e.to_string())?;
    Ok(rows_value(rows))
}

/// Read a survey file (CSV/TSV/JSON/workbook) by extension.
pub fn op_read_file(path: &str) -> Result<Value, String> {
    let rows = table::read_survey_file(Path::new(path)).map_err(|e| e.to_string())?;
    Ok(rows_value(rows))
}

pub fn op_normalize(records: &[Value], branch_only: bool) -> Value {
    let rows = prepare(records);
    let rows = if branch_only {
        branch::filter_branch_rows(&rows)
    } else {
        rows
    };
    rows_value(rows)
}

/// Header → normalized column, one entry per header.
pub fn op_column(headers: &[String]) -> Value {
    let mapped: Vec<Value> = headers
        .iter()
        .map(|h| {
            let column = columns::normalize_column_name(h);
            json!({
                "header": h,
                "column": column.label(),
                "canonical": column.field().is_some(),
            })
        })
        .collect();
    Value::Array(mapped)
}

pub fn op_rating(values: &[Value]) -> Value {
    let parsed: Vec<Value> = values
        .iter()
        .map(|v| json!({"value": v, "rating": rating::parse_rating(v)}))
        .collect();
    Value::Array(parsed)
}

pub fn op_categorize(texts: &[String]) -> Value {
    let out: Vec<Value> = texts
        .iter()
        .map(|t| {
            let improvement = categorize_improvement(t);
            json!({
                "text": t,
                "category": improvement.label(),
                "known": matches!(improvement, Improvement::Category(_)),
            })
        })
        .collect();
    Value::Array(out)
}

// ── Aggregation ──────────────────────────────────────────────────────────────

pub fn op_rank(records: &[Value]) -> Result<Value, String> {
    to_json(&branch::branch_rankings(&prepare(records)))
}

pub fn op_improvements(records: &[Value], scan_reasons: bool) -> Result<Value, String> {
    to_json(&branch::improvement_histogram(
        &prepare(records),
        options(scan_reasons),
    ))
}

pub fn op_reasons(records: &[Value]) -> Result<Value, String> {
    to_json(&branch::extract_reasons(&prepare(records)))
}

pub fn op_branch_improvements(records: &[Value], scan_reasons: bool) -> Result<Value, String> {
    to_json(&branch::branch_improvements(
        &prepare(records),
        options(scan_reasons),
    ))
}

pub fn op_matrix(
    records: &[Value],
    inline: Option<&[String]>,
    categories_path: Option<&str>,
) -> Result<Value, String> {
    let names = category_names(inline, categories_path)?;
    to_json(&branch::recommendation_matrix(&prepare(records), &names))
}

/// NPS summary, or `null` when no row has a valid 0–10 AS value.
pub fn op_nps(records: &[Value]) -> Result<Value, String> {
    to_json(&nps::nps_summary(&prepare(records)))
}

/// Full branch pipeline: normalize, keep rows with a branch, then every
/// aggregate over those rows.
pub fn op_report(
    records: &[Value],
    categories_path: Option<&str>,
    scan_reasons: bool,
) -> Result<Value, String> {
    let names = category_names(None, categories_path)?;
    let normalized = prepare(records);
    let rows = branch::filter_branch_rows(&normalized);
    tracing::info!(
        total = normalized.len(),
        with_branch = rows.len(),
        "survey rows prepared"
    );
    let opts = options(scan_reasons);

    Ok(json!({
        "totalRows": normalized.len(),
        "branchRows": rows.len(),
        "branchRankings": to_json(&branch::branch_rankings(&rows))?,
        "improvementCategories": to_json(&branch::improvement_histogram(&rows, opts))?,
        "reasonsData": to_json(&branch::extract_reasons(&rows))?,
        "branchImprovements": to_json(&branch::branch_improvements(&rows, opts))?,
        "recommendationMatrix": to_json(&branch::recommendation_matrix(&rows, &names))?,
        "nps": to_json(&nps::nps_summary(&rows))?,
        "branchData": rows_value(rows),
    }))
}

// ── Model responses ──────────────────────────────────────────────────────────

/// `{value, stage}` on success, `null` when nothing could be recovered.
pub fn op_extract(text: &str) -> Result<Value, String> {
    to_json(&extract::extract_json(text))
}

/// Interpret a model response as `kind`: comprehensive, sentiment, themes,
/// kpis. Verbatims feed the fallbacks.
pub fn op_interpret(kind: &str, text: &str, verbatims: &[String]) -> Result<Value, String> {
    match kind {
        "comprehensive" => to_json(&analysis::interpret_comprehensive(text, verbatims)),
        "sentiment" => to_json(&analysis::interpret_sentiment(text)),
        "themes" => to_json(&analysis::interpret_themes(text, verbatims)),
        "kpis" => to_json(&analysis::interpret_kpis(text)),
        other => Err(format!(
            "Unknown kind '{other}'. Use: comprehensive, sentiment, themes, kpis"
        )),
    }
}

pub fn op_categories(path: Option<&str>) -> Result<Value, String> {
    to_json(&categories::resolve_categories(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_rows_wraps_scalars() {
        let rows = to_rows(&[json!({"a": 1}), json!("x")]);
        assert_eq!(rows[0]["a"], json!(1));
        assert_eq!(rows[1]["value"], json!("x"));
    }

    #[test]
    fn inline_categories_win_over_defaults() {
        let inline = vec!["Speed".to_string()];
        assert_eq!(category_names(Some(&inline), None).unwrap(), inline);
        assert!(category_names(Some(&[]), None).unwrap().len() > 1);
    }

    #[test]
    fn unknown_interpret_kind_is_rejected() {
        let err = op_interpret("poetry", "", &[]).unwrap_err();
        assert!(err.contains("Unknown kind"));
    }
}
