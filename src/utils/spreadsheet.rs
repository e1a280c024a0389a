//! Turns uploaded `.csv` / `.xlsx` bytes into a table of JSON records.

use std::collections::HashMap;
use std::io::Cursor;

use calamine::{Data, Reader, Xlsx};
use serde_json::{Number, Value};
use thiserror::Error;

use crate::model::upload::{Record, UploadFormat, UploadedTable};

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("malformed csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("malformed workbook: {0}")]
    Xlsx(#[from] calamine::XlsxError),

    #[error("workbook has no worksheets")]
    NoWorksheet,

    #[error("missing header row")]
    MissingHeader,
}

pub fn parse_table(format: UploadFormat, bytes: &[u8]) -> Result<UploadedTable, ParseError> {
    match format {
        UploadFormat::Csv => parse_csv(bytes),
        UploadFormat::Xlsx => parse_xlsx(bytes),
    }
}

fn parse_csv(bytes: &[u8]) -> Result<UploadedTable, ParseError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(bytes);

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(ParseError::MissingHeader);
    }
    let columns = dedupe_columns(headers);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row: Record = columns
            .iter()
            .zip(record.iter())
            .map(|(column, cell)| (column.clone(), infer_scalar(cell)))
            .collect();
        rows.push(row);
    }

    Ok(UploadedTable { columns, rows })
}

fn parse_xlsx(bytes: &[u8]) -> Result<UploadedTable, ParseError> {
    let mut workbook = Xlsx::new(Cursor::new(bytes))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(ParseError::NoWorksheet)??;

    let mut sheet_rows = range.rows();
    let header = sheet_rows.next().ok_or(ParseError::MissingHeader)?;
    let columns = dedupe_columns(header.iter().map(cell_label).collect());

    let rows = sheet_rows
        .filter(|cells| cells.iter().any(|c| !matches!(c, Data::Empty)))
        .map(|cells| {
            columns
                .iter()
                .zip(cells.iter())
                .map(|(column, cell)| (column.clone(), cell_value(cell)))
                .collect::<Record>()
        })
        .collect();

    Ok(UploadedTable { columns, rows })
}

/// Repeated names get a `.N` suffix so no column is silently overwritten.
fn dedupe_columns(headers: Vec<String>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    headers
        .into_iter()
        .map(|name| {
            let count = seen.entry(name.clone()).or_insert(0);
            let column = if *count == 0 {
                name
            } else {
                format!("{name}.{count}")
            };
            *count += 1;
            column
        })
        .collect()
}

fn float_value(f: f64) -> Value {
    Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
}

fn infer_scalar(cell: &str) -> Value {
    let cell = cell.trim();
    if cell.is_empty() {
        return Value::Null;
    }
    if let Ok(i) = cell.parse::<i64>() {
        return Value::from(i);
    }
    if let Ok(f) = cell.parse::<f64>() {
        return float_value(f);
    }
    match cell {
        "true" | "True" | "TRUE" => Value::Bool(true),
        "false" | "False" | "FALSE" => Value::Bool(false),
        _ => Value::String(cell.to_string()),
    }
}

fn cell_label(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

fn cell_value(cell: &Data) -> Value {
    match cell {
        Data::Empty => Value::Null,
        Data::Int(i) => Value::from(*i),
        Data::Float(f) => float_value(*f),
        Data::Bool(b) => Value::Bool(*b),
        Data::String(s) => Value::String(s.clone()),
        other => Value::String(other.to_string()),
    }
}
