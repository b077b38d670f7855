use std::collections::BTreeMap;

use crate::analyzers::grade::{Letter, compute_grade};
use crate::analyzers::types::{
    Distribution, GradedRecord, Improvement, ImprovementReport, Outlier, OutlierReport,
    Percentiles,
};
use crate::analyzers::utility::{mean, round2, stddev};
use crate::config::RosterConfig;
use crate::schema::StudentRecord;

/// Share of graded records reported at each end by [`percentiles`].
pub const PERCENTILE_FRACTION: f64 = 0.10;

/// Standard deviations from the mean beyond which a grade is an outlier.
pub const OUTLIER_LIMIT: f64 = 1.5;

/// Grades every record, keeping input order.
pub fn grade_all(records: &[StudentRecord], config: &RosterConfig) -> Vec<GradedRecord> {
    records
        .iter()
        .map(|record| GradedRecord {
            record: record.clone(),
            grade: compute_grade(record, &config.weights, &config.letter_scale),
        })
        .collect()
}

/// Composite grades that are present, in input order.
pub fn composites(graded: &[GradedRecord]) -> Vec<f64> {
    graded.iter().filter_map(GradedRecord::composite).collect()
}

/// Partitions records by trimmed section. Blank sections are left out.
pub fn group_by_section(graded: &[GradedRecord]) -> BTreeMap<String, Vec<&GradedRecord>> {
    let mut sections: BTreeMap<String, Vec<&GradedRecord>> = BTreeMap::new();
    for g in graded {
        let section = g.record.section.trim();
        if section.is_empty() {
            continue;
        }
        sections.entry(section.to_string()).or_default().push(g);
    }
    sections
}

/// Records with a present composite strictly below `threshold`.
pub fn at_risk(graded: &[GradedRecord], threshold: f64) -> Vec<&GradedRecord> {
    graded
        .iter()
        .filter(|g| g.composite().is_some_and(|c| c < threshold))
        .collect()
}

pub fn distribution(graded: &[GradedRecord]) -> Distribution {
    let counts = Letter::ALL
        .iter()
        .map(|&letter| {
            let n = graded.iter().filter(|g| g.grade.letter == letter).count();
            (letter, n)
        })
        .collect();

    Distribution {
        counts,
        graded: graded.iter().filter(|g| g.composite().is_some()).count(),
    }
}

/// Highest and lowest graded records, `max(1, ceil(n * 10%))` from each end.
///
/// Ties keep their input order.
pub fn percentiles(graded: &[GradedRecord]) -> Percentiles<'_> {
    let mut ranked: Vec<&GradedRecord> = graded.iter().filter(|g| g.composite().is_some()).collect();
    if ranked.is_empty() {
        return Percentiles {
            size: 0,
            top: Vec::new(),
            bottom: Vec::new(),
        };
    }

    let size = ((ranked.len() as f64 * PERCENTILE_FRACTION).ceil() as usize).max(1);

    ranked.sort_by(|a, b| a.composite().unwrap_or(0.0).total_cmp(&b.composite().unwrap_or(0.0)));
    let bottom = ranked.iter().take(size).copied().collect();

    ranked.sort_by(|a, b| b.composite().unwrap_or(0.0).total_cmp(&a.composite().unwrap_or(0.0)));
    let top = ranked.iter().take(size).copied().collect();

    Percentiles { size, top, bottom }
}

/// Graded records more than [`OUTLIER_LIMIT`] population standard
/// deviations away from the mean.
pub fn outliers(graded: &[GradedRecord]) -> OutlierReport<'_> {
    let grades = composites(graded);
    let Some(avg) = mean(&grades) else {
        return OutlierReport {
            mean: None,
            stddev: 0.0,
            limit: OUTLIER_LIMIT,
            outliers: Vec::new(),
        };
    };
    let sd = stddev(&grades, avg);

    let outliers = if sd == 0.0 {
        Vec::new()
    } else {
        graded
            .iter()
            .filter_map(|g| {
                let z = (g.composite()? - avg) / sd;
                (z.abs() > OUTLIER_LIMIT).then_some(Outlier {
                    student: g,
                    z_score: round2(z),
                })
            })
            .collect()
    };

    OutlierReport {
        mean: Some(avg),
        stddev: sd,
        limit: OUTLIER_LIMIT,
        outliers,
    }
}

/// `final - midterm` for every record with both scores, largest gain first.
pub fn improvement(records: &[StudentRecord]) -> ImprovementReport<'_> {
    let mut entries: Vec<Improvement> = records
        .iter()
        .filter_map(|r| {
            let (midterm, final_exam) = (r.midterm?, r.final_exam?);
            Some(Improvement {
                student: r,
                midterm,
                final_exam,
                delta: round2(final_exam - midterm),
            })
        })
        .collect();

    entries.sort_by(|a, b| b.delta.total_cmp(&a.delta));

    let deltas: Vec<f64> = entries.iter().map(|e| e.delta).collect();
    ImprovementReport {
        average: mean(&deltas).map(round2),
        entries,
    }
}
