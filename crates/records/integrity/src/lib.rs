//! Lab Report Integrity
//!
//! Defines the append-only lab report row, its insert shape and validation,
//! and the newest-first ordering lab histories are presented in.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use hms_shared::{
    validate_required_text, RecordKey, ValidationErrorCode, ValidationResult, MAX_TEXT_LEN,
};
use serde::{Deserialize, Serialize};

/// Lab report row as stored in `lab_reports`
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LabReport {
    pub id: RecordKey,
    pub patient_id: RecordKey,
    pub test_name: String,
    pub test_result: String,
    #[serde(default)]
    pub notes: Option<String>,
    /// Stamped by the submitting desk; display only, never used for ordering
    pub test_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Lab form fields
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct NewLabReport {
    pub patient_id: RecordKey,
    pub test_name: String,
    pub test_result: String,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewLabReport {
    /// Trim every text field; blank notes become `None`
    pub fn trimmed(self) -> Self {
        Self {
            test_name: self.test_name.trim().to_string(),
            test_result: self.test_result.trim().to_string(),
            notes: self
                .notes
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty()),
            ..self
        }
    }
}

/// Insert shape for `lab_reports`, stamped with the insertion instant
#[derive(Clone, Debug, Serialize)]
pub struct LabReportInsert<'a> {
    #[serde(flatten)]
    pub fields: &'a NewLabReport,
    pub test_date: DateTime<Utc>,
}

pub fn validate_new_lab_report(report: &NewLabReport) -> ValidationResult {
    let mut result = ValidationResult::new();

    if report.patient_id.as_str().trim().is_empty() {
        result.add_error("patient_id", "Patient is required", ValidationErrorCode::Required);
    }
    result.merge(validate_required_text("test_name", "Test name", &report.test_name));
    result.merge(validate_required_text("test_result", "Test result", &report.test_result));
    if let Some(notes) = &report.notes {
        if notes.chars().count() > MAX_TEXT_LEN {
            result.add_error(
                "notes",
                &format!("Notes cannot exceed {} characters", MAX_TEXT_LEN),
                ValidationErrorCode::TooLong,
            );
        }
    }

    result
}

/// Newest first by the store-assigned creation instant, then key.
/// `test_date` comes from the submitting desk's clock and takes no part.
pub fn newest_first(a: &LabReport, b: &LabReport) -> Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| b.id.cmp(&a.id))
}

pub fn sort_newest_first(reports: &mut [LabReport]) {
    reports.sort_by(newest_first);
}
