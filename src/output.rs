//! Output formatting for roster reports.
//!
//! Supports fixed-width terminal tables and JSON serialization. Renderers
//! return strings so the binary decides where they go.

use std::fmt::Write;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::analyzers::grade::Letter;
use crate::analyzers::types::{
    Distribution, GradedRecord, ImprovementReport, OutlierReport, Percentiles,
};
use crate::error::Result;
use crate::ingest::RejectedRow;
use crate::schema::{Column, StudentRecord};
use crate::stats::GradeStats;

/// A report stamped with the time it was produced.
#[derive(Debug, Serialize)]
pub struct Stamped<'a, T: Serialize> {
    pub generated_at: DateTime<Utc>,
    pub report: &'a T,
}

/// Serializes `report` as pretty-printed JSON, stamped with the current time.
pub fn to_json<T: Serialize>(report: &T) -> Result<String> {
    let stamped = Stamped {
        generated_at: Utc::now(),
        report,
    };
    Ok(serde_json::to_string_pretty(&stamped)?)
}

fn summary_line(out: &mut String, cells: [&str; 6]) {
    let [id, last, first, section, grade, letter] = cells;
    let _ = writeln!(
        out,
        "{id:<12} {last:<15} {first:<15} {section:<10} {grade:>10} {letter:>8}"
    );
}

/// Fixed-width table of id, names, section, grade and letter.
pub fn render_grade_table(title: &str, rows: &[GradedRecord]) -> String {
    let mut out = format!("\n=== {title} ===\n");
    summary_line(
        &mut out,
        ["student_id", "last_name", "first_name", "section", "final_grade", "letter"],
    );
    out.push_str(&"-".repeat(76));
    out.push('\n');
    for g in rows {
        let r = &g.record;
        summary_line(
            &mut out,
            [
                &r.student_id,
                &r.last_name,
                &r.first_name,
                &r.section,
                &g.grade.formatted(),
                g.grade.letter.as_str(),
            ],
        );
    }
    out
}

pub fn render_stats(stats: Option<&GradeStats>) -> String {
    let Some(s) = stats else {
        return "\nNo valid numeric grade data available for statistics.\n".to_string();
    };
    let mut out = String::from("\n--- SUMMARY STATISTICS ---\n");
    let _ = writeln!(out, "Total Students (with valid grade): {}", s.count);
    let _ = writeln!(out, "Average Grade: {:.2}", s.mean);
    let _ = writeln!(out, "Median Grade: {:.2}", s.median);
    let _ = writeln!(out, "Highest Grade: {:.2}", s.highest);
    let _ = writeln!(out, "Lowest Grade: {:.2}", s.lowest);
    out
}

/// One section's members, without the section column.
pub fn render_section(name: &str, members: &[&GradedRecord]) -> String {
    if members.is_empty() {
        return format!("No students found in section {name}\n");
    }
    let mut out = format!("\n=== Section {name} ===\n");
    let _ = writeln!(
        out,
        "{:<12} {:<15} {:<15} {:>10} {:>8}",
        "student_id", "last_name", "first_name", "final_grade", "letter"
    );
    out.push_str(&"-".repeat(70));
    out.push('\n');
    for g in members {
        let _ = writeln!(
            out,
            "{:<12} {:<15} {:<15} {:>10} {:>8}",
            g.record.student_id,
            g.record.last_name,
            g.record.first_name,
            g.grade.formatted(),
            g.grade.letter
        );
    }
    out
}

pub fn render_at_risk(rows: &[GradedRecord], threshold: f64) -> String {
    if rows.is_empty() {
        return "No students are currently at risk.\n".to_string();
    }
    let mut out = String::from("\n AT-RISK STUDENTS\n");
    let _ = writeln!(
        out,
        "{:<12} {:<15} {:<15} {:<10} {:>10}",
        "student_id", "last_name", "first_name", "section", "final_grade"
    );
    out.push_str(&"-".repeat(70));
    out.push('\n');
    for g in rows {
        let r = &g.record;
        let _ = writeln!(
            out,
            "{:<12} {:<15} {:<15} {:<10} {:>10}",
            r.student_id,
            r.last_name,
            r.first_name,
            r.section,
            g.grade.formatted()
        );
    }
    let _ = writeln!(out, "\n{} student(s) found below {threshold}.", rows.len());
    out
}

pub fn render_distribution(d: &Distribution) -> String {
    let mut out = String::from("\n=== GRADE DISTRIBUTION ===\n");
    for (letter, count) in &d.counts {
        if *letter == Letter::NotAvailable {
            let _ = writeln!(out, "{letter:<4} {count:>4}");
        } else {
            let _ = writeln!(
                out,
                "{letter:<4} {count:>4}  ({:.1}%)",
                GradeStats::pct(*count, d.graded)
            );
        }
    }
    out
}

fn ranked_lines(out: &mut String, rows: &[&GradedRecord]) {
    for g in rows {
        let _ = writeln!(
            out,
            "  {:<12} {:<15} {:<15} {:>8}",
            g.record.student_id,
            g.record.last_name,
            g.record.first_name,
            g.grade.formatted()
        );
    }
}

pub fn render_percentiles(p: &Percentiles) -> String {
    if p.size == 0 {
        return "No valid numeric grade data available.\n".to_string();
    }
    let mut out = format!("\n=== TOP {} ===\n", p.size);
    ranked_lines(&mut out, &p.top);
    let _ = writeln!(out, "\n=== BOTTOM {} ===", p.size);
    ranked_lines(&mut out, &p.bottom);
    out
}

pub fn render_outliers(report: &OutlierReport) -> String {
    let Some(mean) = report.mean else {
        return "No valid numeric grade data available.\n".to_string();
    };
    let mut out = format!(
        "\nMean: {mean:.2}  SD: {:.2}  (limit ±{} SD)\n",
        report.stddev, report.limit
    );
    if report.outliers.is_empty() {
        out.push_str("No outliers found.\n");
        return out;
    }
    for o in &report.outliers {
        let _ = writeln!(
            out,
            "  {:<12} {:<15} {:<15} {:>8} {:>+7.2}",
            o.student.record.student_id,
            o.student.record.last_name,
            o.student.record.first_name,
            o.student.grade.formatted(),
            o.z_score
        );
    }
    out
}

pub fn render_improvement(report: &ImprovementReport) -> String {
    if report.entries.is_empty() {
        return "No students have both midterm and final scores.\n".to_string();
    }
    let mut out = String::from("\n=== IMPROVEMENT (final - midterm) ===\n");
    let _ = writeln!(
        out,
        "{:<12} {:<15} {:<15} {:>8} {:>8} {:>8}",
        "student_id", "last_name", "first_name", "midterm", "final", "change"
    );
    for e in &report.entries {
        let _ = writeln!(
            out,
            "{:<12} {:<15} {:<15} {:>8.2} {:>8.2} {:>+8.2}",
            e.student.student_id,
            e.student.last_name,
            e.student.first_name,
            e.midterm,
            e.final_exam,
            e.delta
        );
    }
    if let Some(avg) = report.average {
        let _ = writeln!(out, "\nAverage change: {avg:+.2}");
    }
    out
}

/// Valid rows in schema order, one per line.
pub fn render_records(records: &[StudentRecord]) -> String {
    let mut out = String::new();
    for r in records {
        let cells: Vec<String> = Column::ALL.iter().map(|&c| r.display_value(c)).collect();
        let _ = writeln!(out, "{}", cells.join(", "));
    }
    out
}

pub fn render_rejected(rejected: &[RejectedRow]) -> String {
    let mut out = String::new();
    for row in rejected {
        let _ = writeln!(out, "{:?} -> {}", row.fields, row.reason);
    }
    out
}

/// Logs the full report structure at debug level.
pub fn print_pretty<T: std::fmt::Debug>(report: &T) {
    debug!("{:#?}", report);
}
