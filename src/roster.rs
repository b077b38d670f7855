//! Roster-level operations: sort, projection, delete and validated add.
//!
//! Operations that change the roster persist it straight away: additions
//! are appended, everything else rewrites the canonical file.

use std::cmp::Ordering;
use std::path::Path;

use tracing::info;

use crate::error::{Result, RosterError};
use crate::schema::{Column, SCORE_RANGE, StudentRecord, is_name, is_token};
use crate::store;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// Compares two records on `column`.
///
/// Scores compare numerically with absent below every number; text compares
/// case-insensitively.
pub fn compare(a: &StudentRecord, b: &StudentRecord, column: Column) -> Ordering {
    if column.is_numeric() {
        let key = |r: &StudentRecord| r.score(column).unwrap_or(f64::NEG_INFINITY);
        key(a).total_cmp(&key(b))
    } else {
        let key = |r: &StudentRecord| r.text(column).unwrap_or_default().to_lowercase();
        key(a).cmp(&key(b))
    }
}

/// Returns a new ordering of `records`. Equal keys keep their original
/// relative order in both directions.
pub fn sorted(records: &[StudentRecord], column: Column, order: SortOrder) -> Vec<StudentRecord> {
    let mut out = records.to_vec();
    out.sort_by(|a, b| match order {
        SortOrder::Ascending => compare(a, b, column),
        SortOrder::Descending => compare(b, a, column),
    });
    out
}

/// Sorts the roster and rewrites the canonical file in the new order.
pub fn sort_and_save(
    path: &Path,
    records: &[StudentRecord],
    column: Column,
    order: SortOrder,
) -> Result<Vec<StudentRecord>> {
    let out = sorted(records, column, order);
    store::write_records(path, &out)?;
    info!(column = %column, ?order, "Roster sorted");
    Ok(out)
}

/// Every value of `column`, as shown to the operator.
pub fn column_values(records: &[StudentRecord], column: Column) -> Vec<String> {
    records.iter().map(|r| r.display_value(column)).collect()
}

/// `(column, value)` pairs for the first record with `student_id`, in schema order.
pub fn row_values(records: &[StudentRecord], student_id: &str) -> Result<Vec<(Column, String)>> {
    let record = find(records, student_id)?;
    Ok(Column::ALL
        .into_iter()
        .map(|c| (c, record.display_value(c)))
        .collect())
}

pub fn find<'a>(records: &'a [StudentRecord], student_id: &str) -> Result<&'a StudentRecord> {
    let student_id = student_id.trim();
    records
        .iter()
        .find(|r| r.student_id == student_id)
        .ok_or_else(|| RosterError::StudentNotFound(student_id.to_string()))
}

/// Removes every record with `student_id` and rewrites the canonical file.
///
/// The file is left untouched when nothing matches.
pub fn delete_and_save(
    path: &Path,
    records: &[StudentRecord],
    student_id: &str,
) -> Result<Vec<StudentRecord>> {
    let student_id = student_id.trim();
    let remaining: Vec<StudentRecord> = records
        .iter()
        .filter(|r| r.student_id != student_id)
        .cloned()
        .collect();

    if remaining.len() == records.len() {
        return Err(RosterError::StudentNotFound(student_id.to_string()));
    }

    store::write_records(path, &remaining)?;
    info!(student_id, removed = records.len() - remaining.len(), "Student deleted");
    Ok(remaining)
}

/// Field values for a student being added by hand.
///
/// Unlike ingestion, nothing is repaired here: every field must already be
/// well formed and every score present.
#[derive(Debug, Clone, PartialEq)]
pub struct NewStudent {
    pub student_id: String,
    pub last_name: String,
    pub first_name: String,
    pub section: String,
    pub quizzes: [f64; 5],
    pub midterm: f64,
    pub final_exam: f64,
    pub attendance_percent: f64,
}

impl NewStudent {
    /// Checks every field and the ID's uniqueness against `existing`.
    pub fn validate(self, existing: &[StudentRecord]) -> Result<StudentRecord> {
        let student_id = self.student_id.trim().to_string();
        if student_id.is_empty() {
            return Err(RosterError::invalid("student_id", "cannot be empty"));
        }
        if !is_token(&student_id) {
            return Err(RosterError::invalid(
                "student_id",
                "must contain only letters, numbers, or hyphens (e.g., A-123)",
            ));
        }
        if existing.iter().any(|r| r.student_id == student_id) {
            return Err(RosterError::DuplicateId(student_id));
        }

        let last_name = checked_name("last_name", &self.last_name)?;
        let first_name = checked_name("first_name", &self.first_name)?;

        let section = self.section.trim().to_string();
        if !is_token(&section) {
            return Err(RosterError::invalid(
                "section",
                "must contain only letters, numbers, or hyphens (e.g., A1, B-2)",
            ));
        }

        let [q1, q2, q3, q4, q5] = self.quizzes;
        let record = StudentRecord {
            student_id,
            last_name,
            first_name,
            section,
            quiz1: Some(q1),
            quiz2: Some(q2),
            quiz3: Some(q3),
            quiz4: Some(q4),
            quiz5: Some(q5),
            midterm: Some(self.midterm),
            final_exam: Some(self.final_exam),
            attendance_percent: Some(self.attendance_percent),
        };

        for column in Column::ALL.into_iter().filter(|c| c.is_numeric()) {
            let value = record.score(column).unwrap_or(f64::NAN);
            if !SCORE_RANGE.contains(&value) {
                return Err(RosterError::invalid(
                    column.name(),
                    format!("{value} is not between 0 and 100"),
                ));
            }
        }

        Ok(record)
    }
}

fn checked_name(field: &'static str, raw: &str) -> Result<String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(RosterError::invalid(field, "cannot be empty"));
    }
    if !is_name(name) {
        return Err(RosterError::invalid(
            field,
            "can only contain letters, spaces, or hyphens",
        ));
    }
    Ok(name.to_string())
}

/// Validates the new students against the roster and each other, then
/// appends them to the canonical file. Nothing is written if any fails.
pub fn add_and_save(
    path: &Path,
    records: &[StudentRecord],
    new_students: Vec<NewStudent>,
) -> Result<Vec<StudentRecord>> {
    let mut all = records.to_vec();
    let mut added = Vec::with_capacity(new_students.len());
    for student in new_students {
        let record = student.validate(&all)?;
        all.push(record.clone());
        added.push(record);
    }

    store::append_records(path, &added)?;
    info!(added = added.len(), "Students added");
    Ok(all)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest;

    fn record(id: &str, last: &str, midterm: Option<f64>) -> StudentRecord {
        StudentRecord {
            student_id: id.into(),
            last_name: last.into(),
            first_name: "Ana".into(),
            section: "A1".into(),
            quiz1: None,
            quiz2: None,
            quiz3: None,
            quiz4: None,
            quiz5: None,
            midterm,
            final_exam: None,
            attendance_percent: None,
        }
    }

    fn ids(records: &[StudentRecord]) -> Vec<&str> {
        records.iter().map(|r| r.student_id.as_str()).collect()
    }

    fn new_student(id: &str) -> NewStudent {
        NewStudent {
            student_id: id.into(),
            last_name: "Dela Cruz".into(),
            first_name: "Jo-Ann".into(),
            section: "B-2".into(),
            quizzes: [80.0, 90.0, 70.0, 60.0, 100.0],
            midterm: 75.0,
            final_exam: 88.0,
            attendance_percent: 95.0,
        }
    }

    #[test]
    fn test_numeric_sort_places_absent_first_then_last() {
        let records = vec![
            record("S1", "a", Some(70.0)),
            record("S2", "b", None),
            record("S3", "c", Some(50.0)),
        ];

        assert_eq!(
            ids(&sorted(&records, Column::Midterm, SortOrder::Ascending)),
            ["S2", "S3", "S1"]
        );
        assert_eq!(
            ids(&sorted(&records, Column::Midterm, SortOrder::Descending)),
            ["S1", "S3", "S2"]
        );
    }

    #[test]
    fn test_sort_is_stable_both_directions() {
        let records = vec![
            record("S1", "x", Some(80.0)),
            record("S2", "y", Some(60.0)),
            record("S3", "z", Some(80.0)),
            record("S4", "w", Some(60.0)),
        ];

        assert_eq!(
            ids(&sorted(&records, Column::Midterm, SortOrder::Ascending)),
            ["S2", "S4", "S1", "S3"]
        );
        assert_eq!(
            ids(&sorted(&records, Column::Midterm, SortOrder::Descending)),
            ["S1", "S3", "S2", "S4"]
        );
    }

    #[test]
    fn test_text_sort_is_case_insensitive() {
        let records = vec![
            record("S1", "diaz", None),
            record("S2", "Bautista", None),
            record("S3", "abad", None),
        ];
        assert_eq!(
            ids(&sorted(&records, Column::LastName, SortOrder::Ascending)),
            ["S3", "S2", "S1"]
        );
    }

    #[test]
    fn test_sort_and_save_persists_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roster.csv");
        let records = vec![record("S1", "b", Some(90.0)), record("S2", "a", Some(40.0))];

        sort_and_save(&path, &records, Column::Midterm, SortOrder::Ascending).unwrap();

        let reloaded = ingest::load(&path).unwrap();
        assert_eq!(ids(&reloaded.valid), ["S2", "S1"]);
    }

    #[test]
    fn test_column_and_row_projection() {
        let records = vec![record("S1", "Lee", Some(70.0)), record("S2", "Kim", None)];

        assert_eq!(column_values(&records, Column::Midterm), ["70", "none"]);

        let row = row_values(&records, "S2").unwrap();
        assert_eq!(row.len(), 12);
        assert_eq!(row[0], (Column::StudentId, "S2".to_string()));
        assert_eq!(row[1], (Column::LastName, "Kim".to_string()));

        assert!(matches!(
            row_values(&records, "S9"),
            Err(RosterError::StudentNotFound(_))
        ));
    }

    #[test]
    fn test_delete_and_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roster.csv");
        let records = vec![record("S1", "a", None), record("S2", "b", None)];

        let remaining = delete_and_save(&path, &records, "S1").unwrap();
        assert_eq!(ids(&remaining), ["S2"]);
        assert_eq!(ids(&ingest::load(&path).unwrap().valid), ["S2"]);
    }

    #[test]
    fn test_delete_unknown_id_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roster.csv");
        let records = vec![record("S1", "a", None)];

        let result = delete_and_save(&path, &records, "S9");
        assert!(matches!(result, Err(RosterError::StudentNotFound(id)) if id == "S9"));
        assert!(!path.exists());
    }

    #[test]
    fn test_new_student_validation() {
        let record = new_student("A-123").validate(&[]).unwrap();
        assert_eq!(record.quiz5, Some(100.0));
        assert_eq!(record.section, "B-2");

        let existing = vec![record];
        assert!(matches!(
            new_student("A-123").validate(&existing),
            Err(RosterError::DuplicateId(_))
        ));
        assert!(matches!(
            new_student("A 123").validate(&[]),
            Err(RosterError::InvalidField { field: "student_id", .. })
        ));

        let mut bad_name = new_student("S1");
        bad_name.last_name = "O'Neil".into();
        assert!(matches!(
            bad_name.validate(&[]),
            Err(RosterError::InvalidField { field: "last_name", .. })
        ));

        let mut bad_score = new_student("S1");
        bad_score.midterm = 101.0;
        assert!(matches!(
            bad_score.validate(&[]),
            Err(RosterError::InvalidField { field: "midterm", .. })
        ));
    }

    #[test]
    fn test_add_and_save_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roster.csv");

        let all = add_and_save(&path, &[], vec![new_student("S1"), new_student("S2")]).unwrap();
        assert_eq!(ids(&all), ["S1", "S2"]);

        let all = add_and_save(&path, &all, vec![new_student("S3")]).unwrap();
        assert_eq!(ids(&all), ["S1", "S2", "S3"]);

        let reloaded = ingest::load(&path).unwrap();
        assert_eq!(reloaded.valid, all);
    }

    #[test]
    fn test_add_rejects_duplicates_within_batch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roster.csv");

        let result = add_and_save(&path, &[], vec![new_student("S1"), new_student("S1")]);
        assert!(matches!(result, Err(RosterError::DuplicateId(_))));
        assert!(!path.exists());
    }
}
