//! Patient Coordinator
//!
//! Resolves human-entered patient numbers, registers new patients and applies
//! contact-information updates.
//!
//! Contact updates are last-write-wins: no version token is checked, so two
//! actors editing the same patient at once overwrite each other.

use chrono::{Datelike, Utc};
use hms_shared::{
    decode_row, encode_row, log_data_access, DataCategory, HmsError, HmsResult, Permission,
    Query, RecordKey, RegistrationSettings, StoreClient, StoreError, Table,
};
use patient_integrity::*;
use rand::Rng;
use tracing::{debug, info, warn};

/// Resolve a patient number to at most one patient
///
/// The input is trimmed first; an empty number is a validation error and no
/// query is issued. `Ok(None)` is the normal outcome of a typo.
pub async fn resolve_patient(
    store: &StoreClient,
    patient_number: &str,
) -> HmsResult<Option<Patient>> {
    let number = patient_number.trim();
    if number.is_empty() {
        return Err(HmsError::validation("Patient number is required"));
    }

    // Two rows is enough to tell "unique" from "duplicated"
    let rows = store
        .select(
            Table::Patients,
            Query::new().eq("patient_number", number).limit(2),
        )
        .await?;

    if rows.len() > 1 {
        warn!(patient_number = number, "patient number resolves to more than one row");
        return Err(HmsError::DuplicateIdentifier(number.to_string()));
    }

    let Some(row) = rows.into_iter().next() else {
        debug!(patient_number = number, "no patient with this number");
        return Ok(None);
    };

    let patient: Patient = decode_row(Table::Patients, row)?;
    log_data_access(&patient.id, &[DataCategory::Demographics], Permission::Read);
    Ok(Some(patient))
}

/// Fetch a patient by internal key
pub async fn get_patient(store: &StoreClient, key: &RecordKey) -> HmsResult<Option<Patient>> {
    let rows = store
        .select(Table::Patients, Query::new().eq("id", key).limit(1))
        .await?;

    match rows.into_iter().next() {
        Some(row) => {
            let patient: Patient = decode_row(Table::Patients, row)?;
            log_data_access(&patient.id, &[DataCategory::Demographics], Permission::Read);
            Ok(Some(patient))
        }
        None => Ok(None),
    }
}

/// Draw a patient number for the current year
pub fn generate_patient_number<R: Rng + ?Sized>(
    settings: &RegistrationSettings,
    rng: &mut R,
) -> PatientNumber {
    PatientNumber::generate(&settings.prefix, Utc::now().year(), rng)
}

/// Register a new patient and return the stored row
///
/// A fresh number is drawn whenever the store reports a uniqueness violation
/// on `patient_number`, up to `settings.max_attempts` draws.
pub async fn register_patient<R>(
    store: &StoreClient,
    settings: &RegistrationSettings,
    input: NewPatient,
    rng: &mut R,
) -> HmsResult<Patient>
where
    R: Rng + Send + ?Sized,
{
    let input = input.trimmed();
    validate_new_patient(&input, Utc::now().date_naive()).into_result()?;

    for attempt in 1..=settings.max_attempts {
        let number = generate_patient_number(settings, rng);
        let row = encode_row(
            Table::Patients,
            &PatientInsert {
                patient_number: &number,
                fields: &input,
            },
        )?;

        match store.insert(Table::Patients, row).await {
            Ok(stored) => {
                let patient: Patient = decode_row(Table::Patients, stored)?;
                info!(
                    patient = %patient.id,
                    patient_number = %patient.patient_number,
                    attempt,
                    "patient registered"
                );
                log_data_access(&patient.id, &[DataCategory::Demographics], Permission::Write);
                return Ok(patient);
            }
            Err(StoreError::UniqueViolation { column, .. }) if column == "patient_number" => {
                warn!(%number, attempt, "patient number already issued, drawing another");
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(HmsError::IdentifierSpaceExhausted {
        attempts: settings.max_attempts,
    })
}

/// Apply a contact-information patch and return the updated patient
pub async fn update_contact_info(
    store: &StoreClient,
    key: &RecordKey,
    update: ContactUpdate,
) -> HmsResult<Patient> {
    let update = update.trimmed();
    validate_contact_update(&update).into_result()?;

    let patch = encode_row(Table::Patients, &update)?;
    let stored = store
        .update(Table::Patients, key, patch)
        .await
        .map_err(|e| match e {
            StoreError::RowNotFound { key, .. } => HmsError::Referential {
                entity: "patient",
                key,
            },
            other => other.into(),
        })?;

    let patient: Patient = decode_row(Table::Patients, stored)?;
    info!(patient = %patient.id, fields = ?update.changed_fields(), "contact information updated");
    log_data_access(&patient.id, &[DataCategory::Demographics], Permission::Write);
    Ok(patient)
}
