use std::fs;
use std::path::Path;

use crate::aggregation::result_aggregator::ReportRow;

use super::csv_report::ReportError;

pub fn to_json(rows: &[ReportRow]) -> Result<String, ReportError> {
    Ok(serde_json::to_string_pretty(rows)?)
}

pub fn write_json(path: &Path, rows: &[ReportRow]) -> Result<(), ReportError> {
    let write_err = |source| ReportError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    fs::write(path, to_json(rows)?).map_err(write_err)
}
