//! Roster configuration.
//!
//! Everything the grade and report operations need is carried in one
//! immutable [`RosterConfig`] value. It can be stored as a JSON object on
//! disk; missing keys fall back to the defaults:
//! ```json
//! {
//!   "records_file": "studentRecord.csv",
//!   "reports_dir": "reports",
//!   "passing_grade": 75.0,
//!   "weights": { "quiz": 0.3, "midterm": 0.3, "final": 0.3, "attendance": 0.1 },
//!   "letter_scale": { "a": 90.0, "b": 80.0, "c": 70.0, "d": 60.0 }
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, RosterError};

pub const DEFAULT_RECORDS_FILE: &str = "studentRecord.csv";
pub const DEFAULT_REPORTS_DIR: &str = "reports";
pub const DEFAULT_PASSING_GRADE: f64 = 75.0;

pub const SUMMARY_FILE: &str = "summary.csv";
pub const AT_RISK_FILE: &str = "at_risk_students.csv";

/// Share of the composite grade contributed by each component.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Weights {
    pub quiz: f64,
    pub midterm: f64,
    #[serde(rename = "final")]
    pub final_exam: f64,
    pub attendance: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            quiz: 0.3,
            midterm: 0.3,
            final_exam: 0.3,
            attendance: 0.1,
        }
    }
}

impl Weights {
    pub fn total(&self) -> f64 {
        self.quiz + self.midterm + self.final_exam + self.attendance
    }
}

/// Inclusive lower bounds for the passing letters; anything below `d` is an F.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LetterScale {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
}

impl Default for LetterScale {
    fn default() -> Self {
        Self {
            a: 90.0,
            b: 80.0,
            c: 70.0,
            d: 60.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RosterConfig {
    /// Canonical record file.
    pub records_file: PathBuf,
    /// Directory that receives the derived artifacts.
    pub reports_dir: PathBuf,
    /// Composite grades strictly below this are at risk.
    pub passing_grade: f64,
    pub weights: Weights,
    pub letter_scale: LetterScale,
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            records_file: PathBuf::from(DEFAULT_RECORDS_FILE),
            reports_dir: PathBuf::from(DEFAULT_REPORTS_DIR),
            passing_grade: DEFAULT_PASSING_GRADE,
            weights: Weights::default(),
            letter_scale: LetterScale::default(),
        }
    }
}

impl RosterConfig {
    /// Loads and validates the config from a JSON file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: RosterConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let w = &self.weights;
        if [w.quiz, w.midterm, w.final_exam, w.attendance]
            .iter()
            .any(|v| !v.is_finite() || *v < 0.0)
        {
            return Err(RosterError::Config(
                "weights must be non-negative numbers".into(),
            ));
        }
        if (w.total() - 1.0).abs() > 1e-6 {
            return Err(RosterError::Config(format!(
                "weights must sum to 1.0, got {}",
                w.total()
            )));
        }

        let s = &self.letter_scale;
        if !(s.a > s.b && s.b > s.c && s.c > s.d) {
            return Err(RosterError::Config(
                "letter cutoffs must descend from a to d".into(),
            ));
        }

        if !self.passing_grade.is_finite() {
            return Err(RosterError::Config("passing_grade must be finite".into()));
        }

        Ok(())
    }

    pub fn summary_path(&self) -> PathBuf {
        self.reports_dir.join(SUMMARY_FILE)
    }

    pub fn at_risk_path(&self) -> PathBuf {
        self.reports_dir.join(AT_RISK_FILE)
    }

    pub fn section_path(&self, section: &str) -> PathBuf {
        self.reports_dir.join(format!("section_{section}.csv"))
    }
}
