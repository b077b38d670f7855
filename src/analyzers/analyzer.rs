use std::path::Path;

use tracing::{error, info, warn};

use crate::analyzers::aggregate::{at_risk, composites, grade_all, group_by_section};
use crate::analyzers::types::{
    AtRiskReport, AtRiskRow, ExportOutcome, GradedRecord, SectionReport, SummaryReport,
    SummaryRow,
};
use crate::config::RosterConfig;
use crate::schema::{StudentRecord, is_token};
use crate::stats::GradeStats;
use crate::store::write_rows;

const SUMMARY_HEADER: [&str; 6] = [
    "student_id",
    "last_name",
    "first_name",
    "section",
    "final_grade",
    "letter",
];

const AT_RISK_HEADER: [&str; 5] = [
    "student_id",
    "last_name",
    "first_name",
    "section",
    "final_grade",
];

/// Writes an artifact, turning a failure into [`ExportOutcome::Failed`]
/// so the surrounding report still completes.
fn save_artifact<T: serde::Serialize>(path: &Path, header: &[&str], rows: &[T]) -> ExportOutcome {
    match write_rows(path, header, rows) {
        Ok(()) => {
            info!(path = %path.display(), rows = rows.len(), "Artifact saved");
            ExportOutcome::Written {
                path: path.to_path_buf(),
            }
        }
        Err(e) => {
            error!(path = %path.display(), error = %e, "Artifact write failed");
            ExportOutcome::Failed {
                path: path.to_path_buf(),
                error: e.to_string(),
            }
        }
    }
}

/// Grades every record, computes statistics over the present grades and
/// saves `summary.csv`.
#[tracing::instrument(skip_all, fields(records = records.len()))]
pub fn summary_report(records: &[StudentRecord], config: &RosterConfig) -> SummaryReport {
    let rows = grade_all(records, config);
    let stats = GradeStats::from_grades(&composites(&rows));

    let summary: Vec<SummaryRow> = rows.iter().map(SummaryRow::from).collect();
    let export = save_artifact(&config.summary_path(), &SUMMARY_HEADER, &summary);

    SummaryReport {
        rows,
        stats,
        export,
    }
}

/// Selects records below `threshold` and saves `at_risk_students.csv`.
///
/// Nothing is written when no record qualifies.
#[tracing::instrument(skip(records, config), fields(records = records.len()))]
pub fn at_risk_report(
    records: &[StudentRecord],
    config: &RosterConfig,
    threshold: f64,
) -> AtRiskReport {
    let graded = grade_all(records, config);
    let rows: Vec<GradedRecord> = at_risk(&graded, threshold).into_iter().cloned().collect();

    let export = if rows.is_empty() {
        info!("No students are currently at risk");
        ExportOutcome::Skipped
    } else {
        let out: Vec<AtRiskRow> = rows.iter().map(AtRiskRow::from).collect();
        save_artifact(&config.at_risk_path(), &AT_RISK_HEADER, &out)
    };

    AtRiskReport {
        threshold,
        rows,
        export,
    }
}

/// Lists the sections present and, when `requested` names one, its members.
///
/// With `write_files` set, every section is also saved as
/// `section_<name>.csv`. Sections whose name is not a plain token are
/// listed but not saved.
#[tracing::instrument(skip(records, config), fields(records = records.len()))]
pub fn section_report(
    records: &[StudentRecord],
    config: &RosterConfig,
    requested: Option<&str>,
    write_files: bool,
) -> SectionReport {
    let graded = grade_all(records, config);
    let groups = group_by_section(&graded);

    let requested = requested.map(str::trim).filter(|s| !s.is_empty());
    let members: Vec<GradedRecord> = requested
        .and_then(|name| groups.get(name))
        .map(|members| members.iter().map(|&g| g.clone()).collect())
        .unwrap_or_default();

    let exports = if write_files {
        groups
            .iter()
            .map(|(name, members)| {
                if !is_token(name) {
                    warn!(section = %name, "Section name is not a valid file name");
                    return ExportOutcome::InvalidName { name: name.clone() };
                }
                let rows: Vec<SummaryRow> = members.iter().map(|&g| SummaryRow::from(g)).collect();
                save_artifact(&config.section_path(name), &SUMMARY_HEADER, &rows)
            })
            .collect()
    } else {
        Vec::new()
    };

    SectionReport {
        sections: groups.keys().cloned().collect(),
        requested: requested.map(str::to_string),
        members,
        exports,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn scoring(id: &str, section: &str, score: Option<f64>) -> StudentRecord {
        StudentRecord {
            student_id: id.into(),
            last_name: "Ramos".into(),
            first_name: "Lia".into(),
            section: section.into(),
            quiz1: score,
            quiz2: None,
            quiz3: None,
            quiz4: None,
            quiz5: None,
            midterm: score,
            final_exam: score,
            attendance_percent: score,
        }
    }

    fn config_in(dir: &Path) -> RosterConfig {
        RosterConfig {
            records_file: dir.join("roster.csv"),
            reports_dir: dir.join("reports"),
            ..RosterConfig::default()
        }
    }

    #[test]
    fn test_summary_report_writes_csv() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let records = vec![scoring("S1", "A1", Some(82.0)), scoring("S2", "A1", None)];

        let report = summary_report(&records, &config);

        assert_eq!(report.stats.as_ref().map(|s| s.count), Some(1));
        assert_eq!(
            report.export,
            ExportOutcome::Written {
                path: config.summary_path()
            }
        );
        let content = fs::read_to_string(config.summary_path()).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines[0], "student_id,last_name,first_name,section,final_grade,letter");
        assert_eq!(lines[1], "S1,Ramos,Lia,A1,82.00,B");
        assert_eq!(lines[2], "S2,Ramos,Lia,A1,,N/A");
    }

    #[test]
    fn test_summary_report_without_grades_has_no_stats() {
        let dir = tempfile::tempdir().unwrap();
        let report = summary_report(&[scoring("S1", "A1", None)], &config_in(dir.path()));
        assert!(report.stats.is_none());
    }

    #[test]
    fn test_summary_report_write_failure_still_completes() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("reports");
        fs::write(&blocker, "not a directory").unwrap();

        let report = summary_report(&[scoring("S1", "A1", Some(70.0))], &config_in(dir.path()));

        assert!(matches!(report.export, ExportOutcome::Failed { .. }));
        assert_eq!(report.rows.len(), 1);
        assert!(report.stats.is_some());
    }

    #[test]
    fn test_at_risk_report_exports_only_below_threshold() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let records = vec![scoring("S1", "A1", Some(82.0)), scoring("S2", "B1", Some(60.0))];

        let report = at_risk_report(&records, &config, 75.0);

        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rows[0].record.student_id, "S2");
        let content = fs::read_to_string(config.at_risk_path()).unwrap();
        assert_eq!(
            content,
            "student_id,last_name,first_name,section,final_grade\nS2,Ramos,Lia,B1,60.00\n"
        );
    }

    #[test]
    fn test_at_risk_report_skips_write_when_none_qualify() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());

        let report = at_risk_report(&[scoring("S1", "A1", Some(82.0))], &config, 75.0);

        assert!(report.rows.is_empty());
        assert_eq!(report.export, ExportOutcome::Skipped);
        assert!(!config.at_risk_path().exists());
    }

    #[test]
    fn test_section_report() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let records = vec![
            scoring("S1", "B2", Some(82.0)),
            scoring("S2", "A1", Some(60.0)),
            scoring("S3", "B2", Some(90.0)),
        ];

        let report = section_report(&records, &config, Some(" B2 "), true);

        assert_eq!(report.sections, ["A1", "B2"]);
        assert_eq!(report.requested.as_deref(), Some("B2"));
        let ids: Vec<_> = report.members.iter().map(|g| g.record.student_id.as_str()).collect();
        assert_eq!(ids, ["S1", "S3"]);
        assert_eq!(report.exports.len(), 2);
        assert!(config.section_path("A1").exists());
        assert!(config.section_path("B2").exists());
    }

    #[test]
    fn test_section_report_keeps_files_inside_reports_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = RosterConfig {
            records_file: dir.path().join("roster.csv"),
            reports_dir: dir.path().join("sub").join("reports"),
            ..RosterConfig::default()
        };
        let records = vec![
            scoring("S1", "../../../escaped", Some(82.0)),
            scoring("S2", "A1", Some(60.0)),
        ];

        let report = section_report(&records, &config, Some("A1"), true);

        assert_eq!(report.sections, ["../../../escaped", "A1"]);
        assert_eq!(
            report.exports[0],
            ExportOutcome::InvalidName {
                name: "../../../escaped".into()
            }
        );
        assert!(matches!(report.exports[1], ExportOutcome::Written { .. }));
        assert!(!dir.path().join("sub").join("escaped.csv").exists());
        assert!(!dir.path().join("escaped.csv").exists());
        assert!(!config.reports_dir.join("section_..").exists());
    }

    #[test]
    fn test_section_report_unknown_section() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());

        let report = section_report(&[scoring("S1", "A1", Some(82.0))], &config, Some("Z9"), false);

        assert!(report.members.is_empty());
        assert!(report.exports.is_empty());
        assert!(!config.reports_dir.exists());
    }
}
