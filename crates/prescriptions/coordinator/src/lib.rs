//! Prescription Coordinator
//!
//! Appends prescriptions and lists a patient's prescriptions newest first,
//! each joined with the prescribing doctor on a best-effort basis.

use hms_shared::{
    decode_row, decode_rows, encode_row, log_data_access, DataCategory, HmsError, HmsResult,
    Permission, Query, RecordKey, StoreClient, StoreError, Table,
};
use prescriptions_integrity::*;
use provider::{doctors_by_keys, get_doctor};
use tracing::{info, warn};

/// Append a prescription for an existing patient and doctor
///
/// The doctor is looked up before writing; an unknown doctor is a
/// referential error and nothing is inserted. An unknown patient is reported
/// by the store's foreign key.
pub async fn add_prescription(
    store: &StoreClient,
    input: NewPrescription,
) -> HmsResult<Prescription> {
    let input = input.trimmed();
    validate_new_prescription(&input).into_result()?;

    if get_doctor(store, &input.doctor_id).await?.is_none() {
        return Err(HmsError::Referential {
            entity: "doctor",
            key: input.doctor_id,
        });
    }

    let row = encode_row(Table::Prescriptions, &input)?;
    let stored = store
        .insert(Table::Prescriptions, row)
        .await
        .map_err(|e| referential(e, &input))?;

    let prescription: Prescription = decode_row(Table::Prescriptions, stored)?;
    info!(
        prescription = %prescription.id,
        patient = %prescription.patient_id,
        doctor = %prescription.doctor_id,
        "prescription added"
    );
    log_data_access(&prescription.patient_id, &[DataCategory::Medications], Permission::Write);
    Ok(prescription)
}

fn referential(err: StoreError, input: &NewPrescription) -> HmsError {
    match err {
        StoreError::ForeignKeyViolation { ref column, .. } if column == "doctor_id" => {
            HmsError::Referential {
                entity: "doctor",
                key: input.doctor_id.clone(),
            }
        }
        StoreError::ForeignKeyViolation { .. } => HmsError::Referential {
            entity: "patient",
            key: input.patient_id.clone(),
        },
        other => other.into(),
    }
}

/// A patient's prescriptions, newest first, with doctor names where resolvable
///
/// A failed doctor lookup leaves every entry without a doctor rather than
/// failing the section.
pub async fn list_patient_prescriptions(
    store: &StoreClient,
    patient: &RecordKey,
) -> HmsResult<Vec<PrescriptionEntry>> {
    let rows = store
        .select(
            Table::Prescriptions,
            Query::new()
                .eq("patient_id", patient)
                .order_by("created_at", false),
        )
        .await?;
    let mut prescriptions: Vec<Prescription> = decode_rows(Table::Prescriptions, rows)?;
    sort_newest_first(&mut prescriptions);

    let doctor_keys: Vec<RecordKey> = prescriptions.iter().map(|p| p.doctor_id.clone()).collect();
    let doctors = match doctors_by_keys(store, &doctor_keys).await {
        Ok(doctors) => doctors,
        Err(e) => {
            warn!(%patient, error = %e, "doctor lookup failed, showing prescriptions without doctors");
            Default::default()
        }
    };

    log_data_access(patient, &[DataCategory::Medications], Permission::Read);
    Ok(prescriptions
        .into_iter()
        .map(|prescription| {
            let doctor = doctors.get(&prescription.doctor_id).map(|d| d.summary());
            PrescriptionEntry {
                prescription,
                doctor,
            }
        })
        .collect())
}
