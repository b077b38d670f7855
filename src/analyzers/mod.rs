//! Grading and reporting over a validated roster.
//!
//! This module computes the weighted composite grade for each record,
//! assigns letter grades, and builds the summary, section, at-risk and
//! analytics views, writing the CSV artifacts that go with them.

pub mod aggregate;
pub mod analyzer;
pub mod grade;
pub mod types;
pub mod utility;
