//! Error types for roster operations.

use std::path::PathBuf;

use thiserror::Error;

/// Failures that stop a single roster operation.
///
/// Row-level problems never show up here: the validator collects them as
/// [`RejectedRow`](crate::ingest::RejectedRow)s and keeps going.
#[derive(Debug, Error)]
pub enum RosterError {
    #[error("Invalid column name: {0}")]
    UnknownColumn(String),

    #[error("No student found with ID {0}")]
    StudentNotFound(String),

    #[error("Student ID {0} already exists")]
    DuplicateId(String),

    #[error("Invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Could not write {}: {source}", .path.display())]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RosterError>;

impl RosterError {
    /// True for errors caused by the request itself (bad column, unknown ID,
    /// invalid field) rather than by the environment.
    pub fn is_invalid_request(&self) -> bool {
        matches!(
            self,
            RosterError::UnknownColumn(_)
                | RosterError::StudentNotFound(_)
                | RosterError::DuplicateId(_)
                | RosterError::InvalidField { .. }
        )
    }

    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        RosterError::InvalidField {
            field,
            reason: reason.into(),
        }
    }

    pub(crate) fn write_failure(path: impl Into<PathBuf>, source: impl Into<csv::Error>) -> Self {
        RosterError::WriteFailure {
            path: path.into(),
            source: source.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_request_classification() {
        assert!(RosterError::UnknownColumn("grade".into()).is_invalid_request());
        assert!(RosterError::invalid("section", "cannot be empty").is_invalid_request());
        assert!(!RosterError::Config("bad".into()).is_invalid_request());

        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert!(!RosterError::write_failure("reports/summary.csv", io).is_invalid_request());
    }

    #[test]
    fn test_write_failure_names_path() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = RosterError::write_failure("reports/summary.csv", io);
        assert!(err.to_string().starts_with("Could not write reports/summary.csv"));
    }
}
