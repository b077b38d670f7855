//! Canonical roster schema: column list, the typed student record, and the
//! field-level rules shared by ingestion and the `add` flow.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::RosterError;

/// Placeholder stored for a missing name or section.
pub const NONE_SENTINEL: &str = "none";

/// Lowest and highest accepted score for every numeric column.
pub const SCORE_RANGE: std::ops::RangeInclusive<f64> = 0.0..=100.0;

/// One column of the canonical record file, in file order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Column {
    StudentId,
    LastName,
    FirstName,
    Section,
    Quiz1,
    Quiz2,
    Quiz3,
    Quiz4,
    Quiz5,
    Midterm,
    Final,
    AttendancePercent,
}

impl Column {
    pub const ALL: [Column; 12] = [
        Column::StudentId,
        Column::LastName,
        Column::FirstName,
        Column::Section,
        Column::Quiz1,
        Column::Quiz2,
        Column::Quiz3,
        Column::Quiz4,
        Column::Quiz5,
        Column::Midterm,
        Column::Final,
        Column::AttendancePercent,
    ];

    pub const QUIZZES: [Column; 5] = [
        Column::Quiz1,
        Column::Quiz2,
        Column::Quiz3,
        Column::Quiz4,
        Column::Quiz5,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Column::StudentId => "student_id",
            Column::LastName => "last_name",
            Column::FirstName => "first_name",
            Column::Section => "section",
            Column::Quiz1 => "quiz1",
            Column::Quiz2 => "quiz2",
            Column::Quiz3 => "quiz3",
            Column::Quiz4 => "quiz4",
            Column::Quiz5 => "quiz5",
            Column::Midterm => "midterm",
            Column::Final => "final",
            Column::AttendancePercent => "attendance_percent",
        }
    }

    /// Position of the column in a raw row.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn is_numeric(self) -> bool {
        self.index() >= Column::Quiz1.index()
    }

    /// Header row of the canonical file.
    pub fn header() -> [&'static str; 12] {
        Column::ALL.map(Column::name)
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Column {
    type Err = RosterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Column::ALL
            .into_iter()
            .find(|c| c.name() == s)
            .ok_or_else(|| RosterError::UnknownColumn(s.to_string()))
    }
}

/// A validated roster row.
///
/// Serializes to exactly the canonical header; absent scores become empty
/// cells.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentRecord {
    pub student_id: String,
    pub last_name: String,
    pub first_name: String,
    pub section: String,
    pub quiz1: Option<f64>,
    pub quiz2: Option<f64>,
    pub quiz3: Option<f64>,
    pub quiz4: Option<f64>,
    pub quiz5: Option<f64>,
    pub midterm: Option<f64>,
    #[serde(rename = "final")]
    pub final_exam: Option<f64>,
    pub attendance_percent: Option<f64>,
}

impl StudentRecord {
    pub fn quizzes(&self) -> [Option<f64>; 5] {
        [self.quiz1, self.quiz2, self.quiz3, self.quiz4, self.quiz5]
    }

    /// Numeric value of `column`, or `None` for absent scores and text columns.
    pub fn score(&self, column: Column) -> Option<f64> {
        match column {
            Column::Quiz1 => self.quiz1,
            Column::Quiz2 => self.quiz2,
            Column::Quiz3 => self.quiz3,
            Column::Quiz4 => self.quiz4,
            Column::Quiz5 => self.quiz5,
            Column::Midterm => self.midterm,
            Column::Final => self.final_exam,
            Column::AttendancePercent => self.attendance_percent,
            _ => None,
        }
    }

    pub(crate) fn score_mut(&mut self, column: Column) -> Option<&mut Option<f64>> {
        match column {
            Column::Quiz1 => Some(&mut self.quiz1),
            Column::Quiz2 => Some(&mut self.quiz2),
            Column::Quiz3 => Some(&mut self.quiz3),
            Column::Quiz4 => Some(&mut self.quiz4),
            Column::Quiz5 => Some(&mut self.quiz5),
            Column::Midterm => Some(&mut self.midterm),
            Column::Final => Some(&mut self.final_exam),
            Column::AttendancePercent => Some(&mut self.attendance_percent),
            _ => None,
        }
    }

    /// Text value of `column`, or `None` for numeric columns.
    pub fn text(&self, column: Column) -> Option<&str> {
        match column {
            Column::StudentId => Some(&self.student_id),
            Column::LastName => Some(&self.last_name),
            Column::FirstName => Some(&self.first_name),
            Column::Section => Some(&self.section),
            _ => None,
        }
    }

    /// Value of `column` as shown to the operator. Absent scores print as
    /// the `none` sentinel.
    pub fn display_value(&self, column: Column) -> String {
        match self.text(column) {
            Some(text) => text.to_string(),
            None => self
                .score(column)
                .map(|v| v.to_string())
                .unwrap_or_else(|| NONE_SENTINEL.to_string()),
        }
    }
}

/// Score repair policy.
///
/// Blank cells, the `none` sentinel, unparseable text and anything outside
/// [`SCORE_RANGE`] all collapse to an absent score. Never fails.
pub fn repair_score(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case(NONE_SENTINEL) {
        return None;
    }
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && SCORE_RANGE.contains(v))
}

/// Blank text becomes [`NONE_SENTINEL`]; anything else is kept verbatim.
pub fn fill_text(raw: &str) -> String {
    if raw.trim().is_empty() {
        NONE_SENTINEL.to_string()
    } else {
        raw.to_string()
    }
}

/// Letters, digits and hyphens, at least one character.
pub fn is_token(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

/// Letters, whitespace and hyphens, at least one character.
pub fn is_name(s: &str) -> bool {
    !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphabetic() || c.is_whitespace() || c == '-')
}
