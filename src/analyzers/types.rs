//! Data types used by the grading and reporting pipeline.

use std::path::PathBuf;

use serde::Serialize;

use crate::analyzers::grade::{Grade, Letter};
use crate::schema::StudentRecord;
use crate::stats::GradeStats;

/// A valid record together with its freshly computed grade.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradedRecord {
    pub record: StudentRecord,
    pub grade: Grade,
}

impl GradedRecord {
    pub fn composite(&self) -> Option<f64> {
        self.grade.composite
    }
}

/// One row of `summary.csv` and of the per-section files.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    pub student_id: String,
    pub last_name: String,
    pub first_name: String,
    pub section: String,
    pub final_grade: String,
    pub letter: Letter,
}

impl From<&GradedRecord> for SummaryRow {
    fn from(g: &GradedRecord) -> Self {
        Self {
            student_id: g.record.student_id.clone(),
            last_name: g.record.last_name.clone(),
            first_name: g.record.first_name.clone(),
            section: g.record.section.clone(),
            final_grade: g.grade.formatted(),
            letter: g.grade.letter,
        }
    }
}

/// One row of `at_risk_students.csv`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AtRiskRow {
    pub student_id: String,
    pub last_name: String,
    pub first_name: String,
    pub section: String,
    pub final_grade: String,
}

impl From<&GradedRecord> for AtRiskRow {
    fn from(g: &GradedRecord) -> Self {
        Self {
            student_id: g.record.student_id.clone(),
            last_name: g.record.last_name.clone(),
            first_name: g.record.first_name.clone(),
            section: g.record.section.clone(),
            final_grade: g.grade.formatted(),
        }
    }
}

/// What happened to a derived artifact.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExportOutcome {
    Written { path: PathBuf },
    /// Nothing qualified, so no file was touched.
    Skipped,
    Failed { path: PathBuf, error: String },
    /// The section name cannot be used as a file name, so nothing was written.
    InvalidName { name: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryReport {
    pub rows: Vec<GradedRecord>,
    pub stats: Option<GradeStats>,
    pub export: ExportOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct AtRiskReport {
    pub threshold: f64,
    pub rows: Vec<GradedRecord>,
    pub export: ExportOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionReport {
    /// Every non-empty section present in the roster, sorted.
    pub sections: Vec<String>,
    pub requested: Option<String>,
    pub members: Vec<GradedRecord>,
    pub exports: Vec<ExportOutcome>,
}

/// Count of records per letter, `N/A` included.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Distribution {
    pub counts: Vec<(Letter, usize)>,
    /// Records with a present composite.
    pub graded: usize,
}

impl Distribution {
    pub fn count(&self, letter: Letter) -> usize {
        self.counts
            .iter()
            .find(|(l, _)| *l == letter)
            .map(|(_, n)| *n)
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Percentiles<'a> {
    /// Records taken from each end.
    pub size: usize,
    pub top: Vec<&'a GradedRecord>,
    pub bottom: Vec<&'a GradedRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outlier<'a> {
    pub student: &'a GradedRecord,
    /// Signed distance from the mean in standard deviations.
    pub z_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutlierReport<'a> {
    pub mean: Option<f64>,
    pub stddev: f64,
    pub limit: f64,
    pub outliers: Vec<Outlier<'a>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Improvement<'a> {
    pub student: &'a StudentRecord,
    pub midterm: f64,
    pub final_exam: f64,
    pub delta: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImprovementReport<'a> {
    pub entries: Vec<Improvement<'a>>,
    pub average: Option<f64>,
}
