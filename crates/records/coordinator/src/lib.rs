//! Lab Records Coordinator
//!
//! Appends lab reports, lists a patient's lab reports newest first, and
//! aggregates the full history shown on the doctor and patient desks.

use chrono::Utc;
use hms_shared::{
    decode_row, decode_rows, encode_row, log_data_access, DataCategory, HmsError, HmsResult,
    Permission, Query, RecordKey, StoreClient, StoreError, Table,
};
use records_integrity::*;
use tracing::info;

pub mod history;

pub use history::{aggregate_history, PatientHistory, SectionState};

/// Append a lab report, dated at the moment of insertion
pub async fn add_lab_report(store: &StoreClient, input: NewLabReport) -> HmsResult<LabReport> {
    let input = input.trimmed();
    validate_new_lab_report(&input).into_result()?;

    let row = encode_row(
        Table::LabReports,
        &LabReportInsert {
            fields: &input,
            test_date: Utc::now(),
        },
    )?;
    let stored = store
        .insert(Table::LabReports, row)
        .await
        .map_err(|e| match e {
            StoreError::ForeignKeyViolation { .. } => HmsError::Referential {
                entity: "patient",
                key: input.patient_id.clone(),
            },
            other => other.into(),
        })?;

    let report: LabReport = decode_row(Table::LabReports, stored)?;
    info!(
        lab_report = %report.id,
        patient = %report.patient_id,
        test_name = %report.test_name,
        "lab report added"
    );
    log_data_access(&report.patient_id, &[DataCategory::LabResults], Permission::Write);
    Ok(report)
}

/// A patient's lab reports, newest first
pub async fn list_patient_lab_reports(
    store: &StoreClient,
    patient: &RecordKey,
) -> HmsResult<Vec<LabReport>> {
    let rows = store
        .select(
            Table::LabReports,
            Query::new()
                .eq("patient_id", patient)
                .order_by("created_at", false),
        )
        .await?;
    let mut reports: Vec<LabReport> = decode_rows(Table::LabReports, rows)?;
    sort_newest_first(&mut reports);

    log_data_access(patient, &[DataCategory::LabResults], Permission::Read);
    Ok(reports)
}
