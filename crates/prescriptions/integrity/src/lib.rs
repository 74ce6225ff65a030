//! Prescription Integrity
//!
//! Defines the append-only prescription row, the insert shape, the history
//! entry carrying the prescribing doctor, and the newest-first ordering
//! histories are presented in.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use hms_shared::{validate_required_text, RecordKey, ValidationErrorCode, ValidationResult};
use provider_integrity::DoctorSummary;
use serde::{Deserialize, Serialize};

/// Shown in place of a doctor that could not be resolved
pub const UNKNOWN_DOCTOR: &str = "Unknown doctor";

/// Prescription row as stored in `prescriptions`
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Prescription {
    pub id: RecordKey,
    pub patient_id: RecordKey,
    pub doctor_id: RecordKey,
    pub diagnosis: String,
    pub prescription_text: String,
    /// Informational only; never used for ordering
    #[serde(default)]
    pub visit_date: Option<DateTime<Utc>>,
    /// Sole ordering key
    pub created_at: DateTime<Utc>,
}

/// Insert shape for `prescriptions`
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct NewPrescription {
    pub patient_id: RecordKey,
    pub doctor_id: RecordKey,
    pub diagnosis: String,
    pub prescription_text: String,
}

impl NewPrescription {
    pub fn trimmed(self) -> Self {
        Self {
            diagnosis: self.diagnosis.trim().to_string(),
            prescription_text: self.prescription_text.trim().to_string(),
            ..self
        }
    }
}

pub fn validate_new_prescription(prescription: &NewPrescription) -> ValidationResult {
    let mut result = ValidationResult::new();

    if prescription.patient_id.as_str().trim().is_empty() {
        result.add_error("patient_id", "Patient is required", ValidationErrorCode::Required);
    }
    if prescription.doctor_id.as_str().trim().is_empty() {
        result.add_error("doctor_id", "Doctor is required", ValidationErrorCode::Required);
    }
    result.merge(validate_required_text("diagnosis", "Diagnosis", &prescription.diagnosis));
    result.merge(validate_required_text(
        "prescription_text",
        "Prescription",
        &prescription.prescription_text,
    ));

    result
}

/// A prescription with the prescribing doctor, when the doctor could be resolved
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PrescriptionEntry {
    pub prescription: Prescription,
    pub doctor: Option<DoctorSummary>,
}

impl PrescriptionEntry {
    pub fn doctor_display_name(&self) -> &str {
        self.doctor
            .as_ref()
            .map(|d| d.full_name.as_str())
            .unwrap_or(UNKNOWN_DOCTOR)
    }
}

/// Newest first by creation instant, key descending on ties
pub fn newest_first(a: &Prescription, b: &Prescription) -> Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| b.id.cmp(&a.id))
}

pub fn sort_newest_first(prescriptions: &mut [Prescription]) {
    prescriptions.sort_by(newest_first);
}
