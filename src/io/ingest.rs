//! Tabular ingest and series extraction.
//!
//! This module turns an uploaded CSV or JSON table into `SeriesPoint`s:
//!
//! 1. read the file into a `RawTable` (headers + header->cell rows)
//! 2. infer the time and temperature columns
//! 3. parse each row's timestamp and temperature
//!
//! Row-level problems are collected as `RowIssue`s and never abort the run.
//! Rows with an unparseable timestamp are dropped; rows with a valid
//! timestamp but no usable temperature are kept with `temperature_c = None`.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::domain::{RawRecord, RawTable, RawValue, RowIssue, SeriesPoint};
use crate::error::AppError;
use crate::normalize::{ColumnChoice, classify_columns, parse_temperature, parse_timestamp_ms};

/// A table as read from disk, with the rows that could not be read.
#[derive(Debug, Clone, Default)]
pub struct IngestedTable {
    pub table: RawTable,
    pub row_issues: Vec<RowIssue>,
    pub rows_read: usize,
}

/// Points extracted from a table.
#[derive(Debug, Clone)]
pub struct ExtractedSeries {
    pub points: Vec<SeriesPoint>,
    pub columns: ColumnChoice,
    /// Rows dropped for an unparseable or missing timestamp.
    pub dropped_rows: usize,
    pub row_issues: Vec<RowIssue>,
}

/// Upload file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Json,
}

impl TableFormat {
    /// `.json` files are JSON uploads; everything else is read as CSV.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => TableFormat::Json,
            _ => TableFormat::Csv,
        }
    }
}

/// Load a CSV or JSON upload from disk.
pub fn load_table(path: &Path) -> Result<IngestedTable, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open '{}': {e}", path.display())))?;

    match TableFormat::from_path(path) {
        TableFormat::Csv => read_csv_table(file),
        TableFormat::Json => {
            let mut text = String::new();
            let mut file = file;
            file.read_to_string(&mut text)
                .map_err(|e| AppError::new(2, format!("Failed to read '{}': {e}", path.display())))?;
            parse_json_table(&text)
        }
    }
}

/// Read a CSV document into a raw table of text cells.
pub fn read_csv_table<R: Read>(reader: R) -> Result<IngestedTable, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();
    let headers = normalize_headers(&headers);
    if headers.is_empty() {
        return Err(AppError::new(2, "CSV has no header row."));
    }

    let mut rows = Vec::new();
    let mut row_issues = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        let row = idx + 1;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_issues.push(RowIssue {
                    row,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        let cells: RawRecord = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.clone(), RawValue::from_text(record.get(i).unwrap_or(""))))
            .collect();
        rows.push(cells);
    }

    debug!(rows = rows_read, columns = headers.len(), "read CSV table");
    Ok(IngestedTable {
        table: RawTable { headers, rows },
        row_issues,
        rows_read,
    })
}

#[derive(Debug, Deserialize)]
struct JsonUpload {
    #[serde(default)]
    headers: Vec<String>,
    #[serde(default)]
    rows: Vec<Value>,
}

/// Parse a JSON upload `{ "headers": [...], "rows": [{...}] }`.
///
/// When `headers` is absent the union of row keys is used, sorted. Nested
/// cells become empty and non-object rows are skipped, each with a `RowIssue`.
pub fn parse_json_table(text: &str) -> Result<IngestedTable, AppError> {
    let upload: JsonUpload = serde_json::from_str(text)
        .map_err(|e| AppError::new(2, format!("Invalid JSON upload: {e}")))?;

    let rows_read = upload.rows.len();
    let mut rows = Vec::with_capacity(rows_read);
    let mut row_issues = Vec::new();

    for (idx, value) in upload.rows.into_iter().enumerate() {
        let row = idx + 1;
        let Value::Object(fields) = value else {
            row_issues.push(RowIssue {
                row,
                message: "JSON row is not an object".to_string(),
            });
            continue;
        };
        let mut record = RawRecord::with_capacity(fields.len());
        for (key, cell) in fields {
            let raw = json_cell(&cell).unwrap_or_else(|| {
                row_issues.push(RowIssue {
                    row,
                    message: format!("Nested value in column `{key}` ignored"),
                });
                RawValue::Empty
            });
            record.insert(key, raw);
        }
        rows.push(record);
    }

    let mut headers = upload.headers;
    if headers.is_empty() {
        let keys: BTreeSet<&String> = rows.iter().flat_map(|r| r.keys()).collect();
        headers = keys.into_iter().cloned().collect();
    }
    if !row_issues.is_empty() {
        warn!(issues = row_issues.len(), "JSON upload had unusable cells");
    }

    Ok(IngestedTable {
        table: RawTable { headers, rows },
        row_issues,
        rows_read,
    })
}

/// Scalar JSON cell; `None` for arrays and objects.
fn json_cell(value: &Value) -> Option<RawValue> {
    match value {
        Value::Null => Some(RawValue::Empty),
        Value::Bool(b) => Some(RawValue::Bool(*b)),
        Value::Number(n) => Some(n.as_f64().map_or(RawValue::Empty, RawValue::from)),
        Value::String(s) => Some(RawValue::from(s.as_str())),
        Value::Array(_) | Value::Object(_) => None,
    }
}

/// Classify columns and convert every row into a `SeriesPoint`.
pub fn extract_series(table: &RawTable) -> ExtractedSeries {
    let columns = classify_columns(table);
    let mut points = Vec::with_capacity(table.rows.len());
    let mut row_issues = Vec::new();
    let mut dropped_rows = 0usize;

    let Some(time_column) = columns.time_column.as_deref() else {
        return ExtractedSeries {
            points,
            columns,
            dropped_rows: table.rows.len(),
            row_issues,
        };
    };
    let temperature_column = columns.temperature_column.as_deref();

    for (idx, record) in table.rows.iter().enumerate() {
        let row = idx + 1;
        let Some(timestamp_ms) = parse_timestamp_ms(RawTable::cell(record, time_column)) else {
            dropped_rows += 1;
            row_issues.push(RowIssue {
                row,
                message: format!("Unparseable timestamp in column `{time_column}`"),
            });
            continue;
        };
        let temperature_c =
            temperature_column.and_then(|c| parse_temperature(RawTable::cell(record, c)));
        points.push(SeriesPoint::new(timestamp_ms, temperature_c));
    }

    if dropped_rows > 0 {
        warn!(dropped_rows, column = time_column, "dropped rows with unparseable timestamps");
    }
    debug!(
        points = points.len(),
        time_column,
        temperature_column = temperature_column.unwrap_or("-"),
        "extracted series"
    );

    ExtractedSeries {
        points,
        columns,
        dropped_rows,
        row_issues,
    }
}

fn normalize_headers(headers: &StringRecord) -> Vec<String> {
    headers.iter().map(normalize_header_name).collect()
}

fn normalize_header_name(name: &str) -> String {
    // Excel exports often carry a BOM on the first header.
    name.trim().trim_start_matches('\u{feff}').trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_with_bom_and_padding() {
        let csv = "\u{feff}Timestamp , DegC\n2024-01-01T00:00:00Z, 4.5\n2024-01-01T01:00:00Z,5.5\n";
        let ingested = read_csv_table(csv.as_bytes()).unwrap();
        assert_eq!(ingested.table.headers, vec!["Timestamp", "DegC"]);
        assert_eq!(ingested.rows_read, 2);
        assert_eq!(
            RawTable::cell(&ingested.table.rows[0], "DegC"),
            &RawValue::Text("4.5".to_string())
        );
    }

    #[test]
    fn short_rows_become_empty_cells() {
        let csv = "time,temp\n2024-01-01 00:00:00\n";
        let ingested = read_csv_table(csv.as_bytes()).unwrap();
        assert_eq!(RawTable::cell(&ingested.table.rows[0], "temp"), &RawValue::Empty);
    }

    #[test]
    fn extraction_drops_bad_timestamps_and_keeps_null_temperatures() {
        let csv = "Timestamp,DegC\n\
                   2024-01-01T00:00:00Z,4.0\n\
                   not a date,5.0\n\
                   2024-01-01T02:00:00Z,\n\
                   2024-01-01T03:00:00Z,6.0\n";
        let ingested = read_csv_table(csv.as_bytes()).unwrap();
        let series = extract_series(&ingested.table);

        assert_eq!(series.columns.time_column.as_deref(), Some("Timestamp"));
        assert_eq!(series.columns.temperature_column.as_deref(), Some("DegC"));
        assert_eq!(series.points.len(), 3);
        assert_eq!(series.dropped_rows, 1);
        assert_eq!(series.row_issues[0].row, 2);
        assert_eq!(series.points[1].temperature_c, None);
        assert_eq!(series.points[2].temperature_c, Some(6.0));
    }

    #[test]
    fn json_upload_with_and_without_headers() {
        let json = r#"{"headers":["time","temp"],"rows":[{"time":"2024-01-01T00:00:00Z","temp":4.0},{"time":1700000000,"temp":null}]}"#;
        let table = parse_json_table(json).unwrap().table;
        assert_eq!(table.headers, vec!["time", "temp"]);
        assert_eq!(RawTable::cell(&table.rows[0], "temp"), &RawValue::Number(4.0));
        assert_eq!(RawTable::cell(&table.rows[1], "temp"), &RawValue::Empty);

        let series = extract_series(&table);
        assert_eq!(series.points.len(), 2);
        assert_eq!(series.points[1].timestamp_ms, 1_700_000_000_000);

        let bare = r#"{"rows":[{"temp":1.0,"date":"2024-01-01"}]}"#;
        let table = parse_json_table(bare).unwrap().table;
        assert_eq!(table.headers, vec!["date", "temp"]);
    }

    #[test]
    fn nested_json_cells_are_dropped_per_cell() {
        let json = r#"{"rows":[
            {"time":"2024-01-01T00:00:00Z","temp":4.0},
            {"time":"2024-01-01T01:00:00Z","temp":{"value":5.0}},
            [1, 2],
            {"time":["2024-01-01T02:00:00Z"],"temp":6.0},
            {"time":"2024-01-01T03:00:00Z","temp":"7.5"}
        ]}"#;
        let ingested = parse_json_table(json).unwrap();
        assert_eq!(ingested.rows_read, 5);
        assert_eq!(ingested.table.rows.len(), 4);
        let rows: Vec<usize> = ingested.row_issues.iter().map(|i| i.row).collect();
        assert_eq!(rows, vec![2, 3, 4]);
        assert!(ingested.row_issues[0].message.contains("`temp`"));
        assert_eq!(RawTable::cell(&ingested.table.rows[1], "temp"), &RawValue::Empty);

        let series = extract_series(&ingested.table);
        assert_eq!(series.points.len(), 3);
        assert_eq!(series.dropped_rows, 1);
        assert_eq!(series.points[1].temperature_c, None);
        assert_eq!(series.points[2].temperature_c, Some(7.5));
    }

    #[test]
    fn twelve_hour_csv_export_is_kept() {
        let csv = "Timestamp,DegC\n\
                   3/1/2024 8:00:00 AM,4.0\n\
                   3/1/2024 9:00:00 AM,5.0\n\
                   3/1/2024 10:00:00 AM,6.0\n";
        let ingested = read_csv_table(csv.as_bytes()).unwrap();
        let series = extract_series(&ingested.table);
        assert_eq!(series.columns.time_column.as_deref(), Some("Timestamp"));
        assert_eq!(series.dropped_rows, 0);
        assert_eq!(series.points.len(), 3);
        assert_eq!(series.points[2].timestamp_ms - series.points[0].timestamp_ms, 2 * 3_600_000);
    }

    #[test]
    fn invalid_json_is_an_input_error() {
        let err = parse_json_table("{not json").unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(TableFormat::from_path(Path::new("a.JSON")), TableFormat::Json);
        assert_eq!(TableFormat::from_path(Path::new("a.csv")), TableFormat::Csv);
        assert_eq!(TableFormat::from_path(Path::new("upload")), TableFormat::Csv);
    }
}
