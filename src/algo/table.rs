//! Tolerant reader for uploaded survey exports (CSV/TSV, JSON, workbooks).

use std::path::{Path, PathBuf};

use serde_json::{Map, Number, Value};
use thiserror::Error;

use super::SurveyRow;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("CSV needs a header line and at least one data line, found {0} non-blank line(s)")]
    TooFewLines(usize),
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot read workbook: {0}")]
    Workbook(String),
    #[error("unsupported format '{0}'")]
    UnsupportedFormat(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Json,
    Workbook,
}

impl TableFormat {
    /// Format from a file extension, case-insensitive, without the dot.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" | "tsv" | "txt" => Some(Self::Csv),
            "json" => Some(Self::Json),
            "xlsx" | "xls" | "xlsm" | "xlsb" | "ods" => Some(Self::Workbook),
            _ => None,
        }
    }

    /// Format from a caller hint ("csv", "json", "xlsx", ...).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "excel" | "workbook" => Some(Self::Workbook),
            other => Self::from_extension(other),
        }
    }
}

/// Parse raw text into rows. Workbooks are binary and go through
/// [`read_survey_file`] instead.
pub fn parse_survey_table(raw: &str, format: TableFormat) -> Result<Vec<SurveyRow>, ParseError> {
    match format {
        TableFormat::Json => parse_json(raw),
        TableFormat::Csv => parse_csv(raw),
        TableFormat::Workbook => Err(ParseError::UnsupportedFormat(
            "workbook data must be read from a file".into(),
        )),
    }
}

/// Like [`parse_survey_table`], but JSON that fails to parse is retried as CSV.
pub fn parse_with_fallback(raw: &str, format: TableFormat) -> Result<Vec<SurveyRow>, ParseError> {
    match parse_survey_table(raw, format) {
        Err(ParseError::InvalidJson(e)) => {
            tracing::debug!(error = %e, "JSON parse failed, retrying as CSV");
            parse_csv(raw)
        }
        other => other,
    }
}

/// Read a survey file, picking the format from its extension.
pub fn read_survey_file(path: &Path) -> Result<Vec<SurveyRow>, ParseError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();
    let format =
        TableFormat::from_extension(ext).ok_or_else(|| ParseError::UnsupportedFormat(ext.into()))?;

    if format == TableFormat::Workbook {
        return read_workbook(path);
    }

    let raw = std::fs::read_to_string(path).map_err(|source| ParseError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_with_fallback(&raw, format)
}

// ── JSON ─────────────────────────────────────────────────────────────────────

fn parse_json(raw: &str) -> Result<Vec<SurveyRow>, ParseError> {
    let parsed: Value = serde_json::from_str(raw)?;
    let items = match parsed {
        Value::Array(items) => items,
        other => vec![other],
    };
    Ok(items
        .into_iter()
        .map(|item| match item {
            Value::Object(map) => map,
            other => {
                let mut map = Map::new();
                map.insert("value".into(), other);
                map
            }
        })
        .collect())
}

// ── CSV ──────────────────────────────────────────────────────────────────────

fn parse_csv(raw: &str) -> Result<Vec<SurveyRow>, ParseError> {
    let normalized = raw.replace("\r\n", "\n").replace('\r', "\n");
    let lines: Vec<&str> = normalized
        .split('\n')
        .filter(|line| !line.trim().is_empty())
        .collect();
    if lines.len() < 2 {
        return Err(ParseError::TooFewLines(lines.len()));
    }

    let delimiter = if lines[0].contains('\t') { b'\t' } else { b',' };

    let headers: Vec<String> = split_line(lines[0], delimiter)?
        .iter()
        .enumerate()
        .map(|(i, h)| {
            let h = h.trim();
            if h.is_empty() {
                format!("column{}", i + 1)
            } else {
                h.to_string()
            }
        })
        .collect();

    let mut rows = Vec::with_capacity(lines.len() - 1);
    for (line, text) in lines.iter().enumerate().skip(1) {
        let record = split_line(text, delimiter)?;
        if record.len() != headers.len() {
            tracing::debug!(
                line = line + 1,
                expected = headers.len(),
                found = record.len(),
                "ragged CSV row, padding/truncating"
            );
        }
        let row: SurveyRow = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.clone(), infer_cell(record.get(i).map_or("", String::as_str))))
            .collect();
        rows.push(row);
    }
    Ok(rows)
}

/// Fields of one line. Quotes are honoured within the line only, so an
/// unterminated quote runs to the end of its own line.
fn split_line(line: &str, delimiter: u8) -> Result<Vec<String>, ParseError> {
    let line = tighten_quotes(line, char::from(delimiter));
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(line.as_bytes());
    match reader.records().next() {
        Some(record) => Ok(record?.iter().map(str::to_string).collect()),
        None => Ok(Vec::new()),
    }
}

/// Drop the spaces between a delimiter and an opening quote, so `1, "q, r"`
/// reads as a quoted second field.
fn tighten_quotes(line: &str, delimiter: char) -> String {
    let mut out = String::with_capacity(line.len());
    let mut in_quotes = false;
    let mut at_field_start = true;
    let mut blanks = 0usize;
    for c in line.chars() {
        if at_field_start {
            if c == ' ' {
                blanks += 1;
                continue;
            }
            if c != '"' {
                out.push_str(&" ".repeat(blanks));
            }
            blanks = 0;
            at_field_start = false;
        }
        if c == '"' {
            in_quotes = !in_quotes;
        } else if c == delimiter && !in_quotes {
            at_field_start = true;
        }
        out.push(c);
    }
    out.push_str(&" ".repeat(blanks));
    out
}

/// "" → null, numeric → number, true/false → bool, else the string itself.
pub fn infer_cell(cell: &str) -> Value {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    if let Ok(n) = trimmed.parse::<i64>() {
        return Value::Number(n.into());
    }
    if let Some(n) = trimmed
        .parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .and_then(Number::from_f64)
    {
        return Value::Number(n);
    }
    if trimmed.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if trimmed.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    Value::String(cell.to_string())
}

// ── Workbooks ────────────────────────────────────────────────────────────────

#[cfg(feature = "xlsx")]
fn read_workbook(path: &Path) -> Result<Vec<SurveyRow>, ParseError> {
    use calamine::{open_workbook_auto, DataType, Reader};

    let mut workbook = open_workbook_auto(path).map_err(|e| ParseError::Workbook(e.to_string()))?;
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| ParseError::Workbook("workbook has no sheets".into()))?;
    let range = workbook
        .worksheet_range(&sheet_name)
        .ok_or_else(|| ParseError::Workbook(format!("cannot read sheet '{sheet_name}'")))?
        .map_err(|e| ParseError::Workbook(e.to_string()))?;

    let mut sheet_rows = range.rows();
    let Some(header) = sheet_rows.next() else {
        return Ok(Vec::new());
    };
    let headers: Vec<String> = header
        .iter()
        .enumerate()
        .map(|(i, cell)| {
            let text = cell.to_string();
            let text = text.trim();
            if text.is_empty() {
                format!("column{}", i + 1)
            } else {
                text.to_string()
            }
        })
        .collect();

    let cell_value = |cell: &DataType| match cell {
        DataType::Empty => Value::Null,
        DataType::Int(n) => Value::Number((*n).into()),
        DataType::Float(f) => Number::from_f64(*f).map(Value::Number).unwrap_or(Value::Null),
        DataType::Bool(b) => Value::Bool(*b),
        DataType::String(s) => infer_cell(s),
        other => Value::String(other.to_string()),
    };

    Ok(sheet_rows
        .filter(|cells| cells.iter().any(|c| !matches!(c, DataType::Empty)))
        .map(|cells| {
            headers
                .iter()
                .enumerate()
                .map(|(i, h)| (h.clone(), cells.get(i).map(cell_value).unwrap_or(Value::Null)))
                .collect()
        })
        .collect())
}

#[cfg(not(feature = "xlsx"))]
fn read_workbook(_path: &Path) -> Result<Vec<SurveyRow>, ParseError> {
    Err(ParseError::UnsupportedFormat(
        "workbook support requires the `xlsx` feature".into(),
    ))
}
