//! `name,confidence,first_seen_sec` CSV files.
//!
//! Numbers are written in shortest round-trip form so reading a report back
//! yields the same values that were written.
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::aggregation::result_aggregator::ReportRow;
use crate::shared::constants::CSV_HEADER;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("failed to write report {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to read report {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("line {line}: {message}")]
    Malformed { line: usize, message: String },
    #[error("failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),
}

/// Writes rows to `path`, creating parent directories.
pub fn write_csv(path: &Path, rows: &[ReportRow]) -> Result<(), ReportError> {
    let write_err = |source| ReportError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    let mut file = io::BufWriter::new(fs::File::create(path).map_err(write_err)?);
    file.write_all(to_csv_string(rows).as_bytes())
        .map_err(write_err)?;
    file.flush().map_err(write_err)
}

pub fn to_csv_string(rows: &[ReportRow]) -> String {
    let mut out = CSV_HEADER.join(",");
    out.push('\n');
    for row in rows {
        out.push_str(&escape_field(&row.name));
        out.push(',');
        out.push_str(&format!("{:?}", row.confidence_percent));
        out.push(',');
        out.push_str(&format!("{:?}", row.first_seen_sec));
        out.push('\n');
    }
    out
}

fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

pub fn read_csv(path: &Path) -> Result<Vec<ReportRow>, ReportError> {
    let text = fs::read_to_string(path).map_err(|source| ReportError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_csv(&text)
}

pub fn parse_csv(text: &str) -> Result<Vec<ReportRow>, ReportError> {
    let records = split_records(text)?;
    let mut records = records.into_iter();

    match records.next() {
        Some((_, header)) if header == CSV_HEADER => {}
        Some((line, header)) => {
            return Err(ReportError::Malformed {
                line,
                message: format!("unexpected header {header:?}"),
            })
        }
        None => {
            return Err(ReportError::Malformed {
                line: 1,
                message: "missing header".to_string(),
            })
        }
    }

    records
        .map(|(line, fields)| {
            let [name, confidence, first_seen] = <[String; 3]>::try_from(fields).map_err(|f| {
                ReportError::Malformed {
                    line,
                    message: format!("expected 3 fields, found {}", f.len()),
                }
            })?;
            Ok(ReportRow {
                name,
                confidence_percent: parse_number(&confidence, line)?,
                first_seen_sec: parse_number(&first_seen, line)?,
            })
        })
        .collect()
}

fn parse_number(field: &str, line: usize) -> Result<f64, ReportError> {
    field.parse().map_err(|_| ReportError::Malformed {
        line,
        message: format!("invalid number '{field}'"),
    })
}

/// Splits CSV text into records of fields, tagged with the line each record
/// starts on. Quoted fields may contain separators, doubled quotes and
/// newlines. Blank lines are skipped.
fn split_records(text: &str) -> Result<Vec<(usize, Vec<String>)>, ReportError> {
    let mut records = Vec::new();
    let mut fields: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut line = 1;
    let mut record_line = 1;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }
        match c {
            '"' if field.is_empty() => in_quotes = true,
            ',' => fields.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                if !(fields.is_empty() && field.is_empty()) {
                    fields.push(std::mem::take(&mut field));
                    records.push((record_line, std::mem::take(&mut fields)));
                }
                line += 1;
                record_line = line;
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(ReportError::Malformed {
            line: record_line,
            message: "unterminated quoted field".to_string(),
        });
    }
    if !(fields.is_empty() && field.is_empty()) {
        fields.push(field);
        records.push((record_line, fields));
    }
    Ok(records)
}
