//! CLI entry point for the roster rater.
//!
//! Each subcommand reads the canonical roster file fresh, runs one
//! operation, and rewrites or appends to the file when the roster changes.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand};
use roster_rater::{
    analyzers::{
        aggregate::{distribution, grade_all, improvement, outliers, percentiles},
        analyzer::{at_risk_report, section_report, summary_report},
        types::ExportOutcome,
    },
    config::RosterConfig,
    error::RosterError,
    ingest,
    output::{self, to_json},
    roster::{self, NewStudent, SortOrder},
    schema::{Column, StudentRecord},
};
use tracing::{error, info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "roster_rater")]
#[command(about = "Validate a student roster CSV and report weighted grades", long_about = None)]
struct Cli {
    /// JSON configuration file (weights, cutoffs, paths)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Canonical roster CSV (overrides the config)
    #[arg(short, long, global = true, value_name = "PATH")]
    file: Option<PathBuf>,

    /// Directory for derived reports (overrides the config)
    #[arg(long, global = true, value_name = "DIR")]
    reports_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a student and append it to the roster file
    Add {
        #[arg(long)]
        id: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        section: String,
        /// Five quiz scores, 0-100
        #[arg(long, num_args = 5, value_name = "SCORE", allow_negative_numbers = true)]
        quizzes: Vec<f64>,
        #[arg(long, allow_negative_numbers = true)]
        midterm: f64,
        #[arg(long = "final", allow_negative_numbers = true)]
        final_exam: f64,
        #[arg(long, allow_negative_numbers = true)]
        attendance: f64,
    },
    /// Re-read the roster and list valid and rejected rows
    Load,
    /// Delete a student by ID
    Delete { id: String },
    /// Show every value of one column
    Column { name: String },
    /// Show one student's record
    Row { id: String },
    /// Sort the roster by a column and save the new order
    Sort {
        column: String,
        #[arg(short, long)]
        descending: bool,
    },
    /// Grade analytics and reports
    Analytics {
        #[command(subcommand)]
        report: AnalyticsCommand,

        /// Print the report as JSON instead of a table
        #[arg(long, global = true)]
        json: bool,
    },
    /// List sections, or show one and export every section's CSV
    Section { name: Option<String> },
}

#[derive(Subcommand)]
enum AnalyticsCommand {
    /// Composite grade and letter for every student
    Grades,
    /// Count of students per letter grade
    Distribution,
    /// Top and bottom 10% by composite grade
    Percentiles,
    /// Grades more than 1.5 standard deviations from the mean
    Outliers,
    /// Change from midterm to final
    Improvement,
    /// Summary table, statistics and summary.csv
    Summary,
    /// Students below the passing grade, saved to at_risk_students.csv
    AtRisk {
        /// Override the configured passing grade
        #[arg(long)]
        threshold: Option<f64>,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/roster_rater.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("roster_rater.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => RosterConfig::load(path)?,
        None => RosterConfig::default(),
    };
    if let Some(file) = cli.file {
        config.records_file = file;
    }
    if let Some(dir) = cli.reports_dir {
        config.reports_dir = dir;
    }

    if let Err(e) = run(cli.command, &config) {
        if let Some(re) = e
            .downcast_ref::<RosterError>()
            .filter(|re| re.is_invalid_request())
        {
            warn!(error = %re, "Request rejected");
            println!("{re}");
            return Ok(());
        }
        error!(error = %e, "Command failed");
        return Err(e);
    }

    Ok(())
}

/// Reads the roster fresh and reports the valid/bad row counts.
fn load_roster(config: &RosterConfig) -> Result<ingest::Ingest> {
    let ingest = ingest::load(&config.records_file)?;
    if ingest.missing_file {
        println!("File not found: {}", config.records_file.display());
    } else {
        println!("\nValid rows: {}", ingest.valid.len());
        println!("Bad rows: {}", ingest.rejected.len());
    }
    Ok(ingest)
}

fn run(command: Commands, config: &RosterConfig) -> Result<()> {
    let ingest = load_roster(config)?;
    let records = &ingest.valid;

    match command {
        Commands::Add {
            id,
            last_name,
            first_name,
            section,
            quizzes,
            midterm,
            final_exam,
            attendance,
        } => {
            let quizzes: [f64; 5] = quizzes
                .try_into()
                .map_err(|q: Vec<f64>| anyhow!("expected 5 quiz scores, got {}", q.len()))?;
            let student = NewStudent {
                student_id: id,
                last_name,
                first_name,
                section,
                quizzes,
                midterm,
                final_exam,
                attendance_percent: attendance,
            };
            roster::add_and_save(&config.records_file, records, vec![student])?;
            println!("Data saved to {}", config.records_file.display());
        }
        Commands::Load => {
            if !ingest.valid.is_empty() {
                println!("\nValid rows:");
                print!("{}", output::render_records(&ingest.valid));
            }
            if !ingest.rejected.is_empty() {
                println!("\nRejected rows:");
                print!("{}", output::render_rejected(&ingest.rejected));
            }
        }
        Commands::Delete { id } => {
            roster::delete_and_save(&config.records_file, records, &id)?;
            println!("Deleted Student ID: {} successfully.", id.trim());
        }
        Commands::Column { name } => {
            let column: Column = name.parse()?;
            if records.is_empty() {
                println!("No valid data.");
                return Ok(());
            }
            println!("\nValues under '{column}':");
            for value in roster::column_values(records, column) {
                println!("{value}");
            }
        }
        Commands::Row { id } => {
            let row = roster::row_values(records, &id)?;
            println!("\nStudent Information:");
            for (column, value) in row {
                println!("{column}: {value}");
            }
        }
        Commands::Sort { column, descending } => {
            let column: Column = column.parse()?;
            if records.is_empty() {
                println!("No valid data to sort.");
                return Ok(());
            }
            let order = if descending {
                SortOrder::Descending
            } else {
                SortOrder::Ascending
            };
            roster::sort_and_save(&config.records_file, records, column, order)?;
            println!(
                "\nData sorted by '{column}' ({})",
                if descending { "descending" } else { "ascending" }
            );
        }
        Commands::Analytics { report, json } => run_analytics(report, json, records, config)?,
        Commands::Section { name } => {
            let report = section_report(records, config, name.as_deref(), name.is_some());
            if report.sections.is_empty() {
                println!("\nNo sections found in the records.");
                return Ok(());
            }
            println!("\nAvailable Sections:\n{}", report.sections.join(", "));
            if let Some(requested) = &report.requested {
                let members: Vec<_> = report.members.iter().collect();
                print!("{}", output::render_section(requested, &members));
            }
            report_exports(&report.exports);
        }
    }

    Ok(())
}

fn run_analytics(
    command: AnalyticsCommand,
    json: bool,
    records: &[StudentRecord],
    config: &RosterConfig,
) -> Result<()> {
    let graded = grade_all(records, config);

    let text = match command {
        AnalyticsCommand::Grades if json => to_json(&graded)?,
        AnalyticsCommand::Grades => output::render_grade_table("WEIGHTED GRADES", &graded),
        AnalyticsCommand::Distribution => {
            let d = distribution(&graded);
            if json { to_json(&d)? } else { output::render_distribution(&d) }
        }
        AnalyticsCommand::Percentiles => {
            let p = percentiles(&graded);
            if json { to_json(&p)? } else { output::render_percentiles(&p) }
        }
        AnalyticsCommand::Outliers => {
            let o = outliers(&graded);
            if json { to_json(&o)? } else { output::render_outliers(&o) }
        }
        AnalyticsCommand::Improvement => {
            let i = improvement(records);
            if json { to_json(&i)? } else { output::render_improvement(&i) }
        }
        AnalyticsCommand::Summary => {
            let report = summary_report(records, config);
            output::print_pretty(&report.stats);
            report_exports(std::slice::from_ref(&report.export));
            if json {
                to_json(&report)?
            } else {
                let mut text = output::render_grade_table("SUMMARY REPORT", &report.rows);
                text.push_str(&output::render_stats(report.stats.as_ref()));
                text
            }
        }
        AnalyticsCommand::AtRisk { threshold } => {
            let threshold = threshold.unwrap_or(config.passing_grade);
            let report = at_risk_report(records, config, threshold);
            report_exports(std::slice::from_ref(&report.export));
            if json {
                to_json(&report)?
            } else {
                output::render_at_risk(&report.rows, threshold)
            }
        }
    };

    print!("{text}");
    Ok(())
}

fn report_exports(exports: &[ExportOutcome]) {
    for outcome in exports {
        match outcome {
            ExportOutcome::Written { path } => {
                info!(path = %path.display(), "Report saved");
                println!("Saved report to: {}", path.display());
            }
            ExportOutcome::Failed { path, error } => {
                println!("Could not save {}: {error}", path.display());
            }
            ExportOutcome::InvalidName { name } => {
                println!("Skipped section '{name}': not a valid file name");
            }
            ExportOutcome::Skipped => {}
        }
    }
}
