//! Ingestion and validation of raw roster rows.
//!
//! Raw rows are repaired where possible (padding, `none` defaults, score
//! repair) and only rejected when the student ID is missing or the row
//! cannot be read at all.

use std::fs;
use std::path::Path;

use csv::{ByteRecord, ReaderBuilder};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::schema::{Column, StudentRecord, fill_text, repair_score};

pub const MISSING_STUDENT_ID: &str = "Missing Student ID";

/// A row that could not become a [`StudentRecord`], with the reason.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedRow {
    pub fields: Vec<String>,
    pub reason: String,
}

impl RejectedRow {
    pub fn new(fields: Vec<String>, reason: impl Into<String>) -> Self {
        Self {
            fields,
            reason: reason.into(),
        }
    }

    /// The raw fields followed by the reason as a trailing cell.
    pub fn with_reason(&self) -> Vec<String> {
        let mut row = self.fields.clone();
        row.push(self.reason.clone());
        row
    }
}

/// Outcome of one validation pass.
#[derive(Debug, Default)]
pub struct Ingest {
    pub valid: Vec<StudentRecord>,
    pub rejected: Vec<RejectedRow>,
    /// Set when the source file did not exist.
    pub missing_file: bool,
}

impl Ingest {
    fn push(&mut self, outcome: std::result::Result<StudentRecord, RejectedRow>) {
        match outcome {
            Ok(record) => self.valid.push(record),
            Err(rejected) => {
                debug!(reason = %rejected.reason, fields = ?rejected.fields, "Row rejected");
                self.rejected.push(rejected);
            }
        }
    }

    fn log_counts(&self) {
        info!(
            valid = self.valid.len(),
            rejected = self.rejected.len(),
            "Ingestion complete"
        );
    }
}

/// Validates already-split rows. The first row is the header and is skipped.
pub fn validate<I>(rows: I) -> Ingest
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut ingest = Ingest::default();
    for row in rows.into_iter().skip(1) {
        ingest.push(validate_row(row));
    }
    ingest.log_counts();
    ingest
}

/// Applies the repair policy to a single data row.
pub fn validate_row(mut raw: Vec<String>) -> std::result::Result<StudentRecord, RejectedRow> {
    raw.resize(Column::ALL.len(), String::new());

    let student_id = raw[Column::StudentId.index()].trim();
    if student_id.is_empty() {
        return Err(RejectedRow::new(raw, MISSING_STUDENT_ID));
    }

    let mut record = StudentRecord {
        student_id: student_id.to_string(),
        last_name: fill_text(&raw[Column::LastName.index()]),
        first_name: fill_text(&raw[Column::FirstName.index()]),
        section: fill_text(&raw[Column::Section.index()]),
        quiz1: None,
        quiz2: None,
        quiz3: None,
        quiz4: None,
        quiz5: None,
        midterm: None,
        final_exam: None,
        attendance_percent: None,
    };

    for column in Column::ALL.into_iter().filter(|c| c.is_numeric()) {
        if let Some(slot) = record.score_mut(column) {
            *slot = repair_score(&raw[column.index()]);
        }
    }

    Ok(record)
}

/// Reads and validates the canonical record file at `path`.
///
/// A missing file yields an empty [`Ingest`] with `missing_file` set; an
/// empty file yields an empty [`Ingest`]. Blank lines are data rows with no
/// fields, so they are rejected for the missing student ID.
#[tracing::instrument(skip(path), fields(path = %path.display()))]
pub fn load(path: &Path) -> Result<Ingest> {
    if !path.exists() {
        warn!("File not found");
        return Ok(Ingest {
            missing_file: true,
            ..Ingest::default()
        });
    }

    let data = fs::read(path)?;
    let mut lines = split_lines(&data).into_iter();

    let mut ingest = Ingest::default();
    match lines.next() {
        None => {
            debug!("File has no header row");
            return Ok(ingest);
        }
        Some(header) => debug!(bytes = header.len(), "Header read"),
    }

    for line in lines {
        let outcome = match parse_line(line) {
            Ok(record) => decode(&record).and_then(validate_row),
            Err(e) => Err(RejectedRow::new(Vec::new(), e.to_string())),
        };
        ingest.push(outcome);
    }

    ingest.log_counts();
    Ok(ingest)
}

/// Splits `data` into physical rows on line breaks outside quoted fields.
/// Terminators (`\n` or `\r\n`) are stripped; a final unterminated row is kept.
fn split_lines(data: &[u8]) -> Vec<&[u8]> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut quoted = false;
    for (i, &b) in data.iter().enumerate() {
        match b {
            b'"' => quoted = !quoted,
            b'\n' if !quoted => {
                let end = if i > start && data[i - 1] == b'\r' { i - 1 } else { i };
                lines.push(&data[start..end]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if start < data.len() {
        lines.push(&data[start..]);
    }
    lines
}

/// Parses one physical row. A blank row comes back with no fields.
fn parse_line(line: &[u8]) -> csv::Result<ByteRecord> {
    let mut record = ByteRecord::new();
    ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(line)
        .read_byte_record(&mut record)?;
    Ok(record)
}

fn decode(record: &ByteRecord) -> std::result::Result<Vec<String>, RejectedRow> {
    let mut fields = Vec::with_capacity(record.len());
    let mut bad_field = None;
    for (i, raw) in record.iter().enumerate() {
        match std::str::from_utf8(raw) {
            Ok(s) => fields.push(s.to_string()),
            Err(_) => {
                bad_field.get_or_insert(i);
                fields.push(String::from_utf8_lossy(raw).into_owned());
            }
        }
    }

    match bad_field {
        None => Ok(fields),
        Some(i) => Err(RejectedRow::new(
            fields,
            format!("invalid UTF-8 in field {}", i + 1),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn header() -> Vec<String> {
        Column::header().iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_missing_student_id_is_rejected() {
        let ingest = validate(vec![
            header(),
            row(&["", "Lee", "Ana", "A1", "90"]),
            row(&["   ", "Kim", "Bo", "A1"]),
        ]);

        assert!(ingest.valid.is_empty());
        assert_eq!(ingest.rejected.len(), 2);
        assert!(ingest.rejected.iter().all(|r| r.reason == MISSING_STUDENT_ID));
        assert_eq!(
            ingest.rejected[0].with_reason().last().map(String::as_str),
            Some(MISSING_STUDENT_ID)
        );
    }

    #[test]
    fn test_short_row_is_padded() {
        let record = validate_row(row(&["S1", "Lee", "Ana", "A1", "80", "90"])).unwrap();
        assert_eq!(record.quiz1, Some(80.0));
        assert_eq!(record.quiz2, Some(90.0));
        assert_eq!(record.quiz3, None);
        assert_eq!(record.attendance_percent, None);
    }

    #[test]
    fn test_blank_text_fields_become_none() {
        let record = validate_row(row(&["S1", "", " ", ""])).unwrap();
        assert_eq!(record.last_name, "none");
        assert_eq!(record.first_name, "none");
        assert_eq!(record.section, "none");
    }

    #[test]
    fn test_bad_scores_become_absent() {
        let record = validate_row(row(&[
            "S1", "Lee", "Ana", "A1", "abc", "101", "-1", "NONE", "", "75", "88.5", "100",
        ]))
        .unwrap();

        assert_eq!(record.quizzes(), [None; 5]);
        assert_eq!(record.midterm, Some(75.0));
        assert_eq!(record.final_exam, Some(88.5));
        assert_eq!(record.attendance_percent, Some(100.0));
    }

    #[test]
    fn test_order_preserved_and_header_skipped() {
        let ingest = validate(vec![
            header(),
            row(&["S2", "B", "B", "A1"]),
            row(&["", "X", "X", "A1"]),
            row(&["S1", "A", "A", "A1"]),
        ]);

        let ids: Vec<_> = ingest.valid.iter().map(|r| r.student_id.as_str()).collect();
        assert_eq!(ids, ["S2", "S1"]);
        assert_eq!(ingest.rejected.len(), 1);
    }

    #[test]
    fn test_duplicate_ids_are_kept() {
        let ingest = validate(vec![
            header(),
            row(&["S1", "A", "A", "A1"]),
            row(&["S1", "B", "B", "B1"]),
        ]);
        assert_eq!(ingest.valid.len(), 2);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let ingest = load(&dir.path().join("absent.csv")).unwrap();
        assert!(ingest.missing_file);
        assert!(ingest.valid.is_empty());
        assert!(ingest.rejected.is_empty());
    }

    #[test]
    fn test_load_empty_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let ingest = load(file.path()).unwrap();
        assert!(!ingest.missing_file);
        assert!(ingest.valid.is_empty());
        assert!(ingest.rejected.is_empty());
    }

    #[test]
    fn test_load_rejects_invalid_utf8_row() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{}", Column::header().join(",")).unwrap();
        writeln!(file, "S1,Lee,Ana,A1,90,,,,,80,85,100").unwrap();
        file.write_all(b"S2,L\xffe,Bo,A1\n").unwrap();

        let ingest = load(file.path()).unwrap();
        assert_eq!(ingest.valid.len(), 1);
        assert_eq!(ingest.rejected.len(), 1);
        assert_eq!(ingest.rejected[0].reason, "invalid UTF-8 in field 2");
    }

    #[test]
    fn test_load_rejects_blank_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"h\nS1,A,B,A1\n\nS2,A,B,A1\r\n\r\n").unwrap();

        let ingest = load(file.path()).unwrap();
        assert_eq!(ingest.valid.len(), 2);
        assert_eq!(ingest.rejected.len(), 2);
        assert!(ingest.rejected.iter().all(|r| r.reason == MISSING_STUDENT_ID));
        assert_eq!(ingest.rejected[0].fields, vec![String::new(); 12]);
    }

    #[test]
    fn test_split_lines_keeps_quoted_line_breaks() {
        let lines = split_lines(b"h\nS1,\"two\nlines\",A1\r\nS2");
        let expected: [&[u8]; 3] = [b"h", b"S1,\"two\nlines\",A1", b"S2"];
        assert_eq!(lines, expected);

        let record = parse_line(lines[1]).unwrap();
        assert_eq!(&record[1], b"two\nlines");
        assert!(parse_line(b"").unwrap().is_empty());
    }

    #[test]
    fn test_load_does_not_modify_source() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let content = format!("{}\n,Lee,Ana,A1\nS1,,,,200\n", Column::header().join(","));
        file.write_all(content.as_bytes()).unwrap();

        let ingest = load(file.path()).unwrap();
        assert_eq!(ingest.valid.len(), 1);
        assert_eq!(ingest.rejected.len(), 1);
        assert_eq!(std::fs::read_to_string(file.path()).unwrap(), content);
    }
}
