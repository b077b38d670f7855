use std::fmt;

use serde::Serialize;

use crate::analyzers::utility::{mean, round2};
use crate::config::{LetterScale, Weights};
use crate::schema::StudentRecord;

/// Letter grade for a composite score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Letter {
    A,
    B,
    C,
    D,
    F,
    #[serde(rename = "N/A")]
    NotAvailable,
}

impl Letter {
    pub const ALL: [Letter; 6] = [
        Letter::A,
        Letter::B,
        Letter::C,
        Letter::D,
        Letter::F,
        Letter::NotAvailable,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Letter::A => "A",
            Letter::B => "B",
            Letter::C => "C",
            Letter::D => "D",
            Letter::F => "F",
            Letter::NotAvailable => "N/A",
        }
    }
}

impl fmt::Display for Letter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Converts a composite score into a letter grade.
///
/// With the default scale:
///
/// | Range  | Grade |
/// |--------|-------|
/// | >= 90  | A     |
/// | >= 80  | B     |
/// | >= 70  | C     |
/// | >= 60  | D     |
/// | < 60   | F     |
/// | absent | N/A   |
pub fn letter(score: Option<f64>, scale: &LetterScale) -> Letter {
    match score {
        None => Letter::NotAvailable,
        Some(s) if s >= scale.a => Letter::A,
        Some(s) if s >= scale.b => Letter::B,
        Some(s) if s >= scale.c => Letter::C,
        Some(s) if s >= scale.d => Letter::D,
        Some(_) => Letter::F,
    }
}

/// Composite score and letter for one record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Grade {
    pub composite: Option<f64>,
    pub letter: Letter,
}

impl Grade {
    /// Composite formatted to two decimals, or empty when absent.
    pub fn formatted(&self) -> String {
        self.composite.map(|g| format!("{g:.2}")).unwrap_or_default()
    }
}

/// Mean of the quizzes that are present; `0.0` when none are.
pub fn quiz_average(record: &StudentRecord) -> f64 {
    let present: Vec<f64> = record.quizzes().into_iter().flatten().collect();
    mean(&present).unwrap_or(0.0)
}

/// Weighted composite grade for `record`.
///
/// Missing midterm, final and attendance count as zero. A record with a zero
/// quiz average and none of the other three components has no numeric
/// evidence at all and gets an absent composite instead of `0.00`.
pub fn compute_grade(record: &StudentRecord, weights: &Weights, scale: &LetterScale) -> Grade {
    let quiz_avg = quiz_average(record);

    if quiz_avg == 0.0
        && record.midterm.is_none()
        && record.final_exam.is_none()
        && record.attendance_percent.is_none()
    {
        return Grade {
            composite: None,
            letter: Letter::NotAvailable,
        };
    }

    let weighted = quiz_avg * weights.quiz
        + record.midterm.unwrap_or(0.0) * weights.midterm
        + record.final_exam.unwrap_or(0.0) * weights.final_exam
        + record.attendance_percent.unwrap_or(0.0) * weights.attendance;

    let composite = Some(round2(weighted));
    Grade {
        composite,
        letter: letter(composite, scale),
    }
}
