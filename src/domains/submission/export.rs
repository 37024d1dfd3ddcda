use crate::domains::submission::reconcile::SubmissionTable;
use crate::errors::{DomainError, ServiceError, ServiceResult};
use log::info;
use std::fs::File;
use std::io::Write;
use std::path::Path;

pub const SUBMITTED_AT_HEADER: &str = "Submitted at";

/// Options for CSV output.
#[derive(Debug, Clone, Copy)]
pub struct CsvOptions {
    pub delimiter: u8,
    /// Prefix a UTF-8 BOM so spreadsheet apps detect the encoding.
    pub with_bom: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self { delimiter: b',', with_bom: false }
    }
}

fn export_error(e: impl std::fmt::Display) -> ServiceError {
    ServiceError::Domain(DomainError::Internal(format!("CSV export failed: {}", e)))
}

/// Drops characters that break row layout in common viewers.
fn sanitize(cell: &str) -> String {
    cell.chars()
        .filter(|c| !matches!(c, '\u{2028}' | '\u{2029}'))
        .map(|c| if c == '\u{00A0}' { ' ' } else { c })
        .collect()
}

/// Writes a header row of column labels plus the submission time, then one row per submission.
pub fn write_csv<W: Write>(table: &SubmissionTable, mut writer: W, options: CsvOptions) -> ServiceResult<()> {
    if options.with_bom {
        writer.write_all(b"\xEF\xBB\xBF").map_err(export_error)?;
    }
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(options.delimiter)
        .from_writer(writer);

    let mut header: Vec<String> = table.columns.iter().map(|c| sanitize(&c.label)).collect();
    header.push(SUBMITTED_AT_HEADER.to_string());
    wtr.write_record(&header).map_err(export_error)?;

    for row in &table.rows {
        let mut record: Vec<String> = row.cells.iter().map(|c| sanitize(&c.display)).collect();
        record.push(row.submitted_at.format("%Y-%m-%d %H:%M:%S").to_string());
        wtr.write_record(&record).map_err(export_error)?;
    }
    wtr.flush().map_err(export_error)?;
    Ok(())
}

pub fn to_csv_string(table: &SubmissionTable) -> ServiceResult<String> {
    let mut buffer = Vec::new();
    write_csv(table, &mut buffer, CsvOptions::default())?;
    String::from_utf8(buffer).map_err(export_error)
}

pub fn export_to_file(table: &SubmissionTable, path: &Path, options: CsvOptions) -> ServiceResult<()> {
    let file = File::create(path).map_err(export_error)?;
    write_csv(table, file, options)?;
    info!("Exported {} submission(s) of form {} to {}", table.rows.len(), table.form_id, path.display());
    Ok(())
}
