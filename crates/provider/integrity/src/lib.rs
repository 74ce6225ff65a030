//! Doctor Directory Integrity
//!
//! Defines the doctor row and the denormalized summary carried by
//! prescriptions. Doctors are seeded by an administrative process; the front
//! desk only reads them.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use hms_shared::{validate_required_text, RecordKey, ValidationResult};
use serde::{Deserialize, Serialize};

/// Doctor row as stored in `doctors`
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Doctor {
    pub id: RecordKey,
    pub full_name: String,
    pub specialization: String,
    /// Present when the row was written through a store that stamps it
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Doctor {
    pub fn summary(&self) -> DoctorSummary {
        DoctorSummary {
            full_name: self.full_name.clone(),
            specialization: self.specialization.clone(),
        }
    }

    /// Directory order: full name, then key so equal names stay stable
    pub fn directory_order(a: &Doctor, b: &Doctor) -> Ordering {
        a.full_name
            .cmp(&b.full_name)
            .then_with(|| a.id.cmp(&b.id))
    }
}

/// Doctor fields shown next to a prescription
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DoctorSummary {
    pub full_name: String,
    pub specialization: String,
}

impl std::fmt::Display for DoctorSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.full_name, self.specialization)
    }
}

/// Administrative seeding input
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct NewDoctor {
    pub full_name: String,
    pub specialization: String,
}

pub fn validate_new_doctor(doctor: &NewDoctor) -> ValidationResult {
    let mut result = validate_required_text("full_name", "Full name", &doctor.full_name);
    result.merge(validate_required_text(
        "specialization",
        "Specialization",
        &doctor.specialization,
    ));
    result
}
