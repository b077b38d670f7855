use serde::Serialize;

use crate::analyzers::utility::{mean, median};

/// Summary statistics over the composite grades that are present.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradeStats {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub highest: f64,
    pub lowest: f64,
}

impl GradeStats {
    /// Returns `None` when there is no grade to summarize.
    pub fn from_grades(grades: &[f64]) -> Option<Self> {
        let mean = mean(grades)?;
        let median = median(grades)?;
        let highest = grades.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let lowest = grades.iter().copied().fold(f64::INFINITY, f64::min);

        Some(GradeStats {
            count: grades.len(),
            mean,
            median,
            highest,
            lowest,
        })
    }

    pub fn pct(part: usize, total: usize) -> f64 {
        if total == 0 {
            0.0
        } else {
            (part as f64 / total as f64) * 100.0
        }
    }
}
