//! Doctor desk: doctor selection, patient search with history, prescriptions
//!
//! The doctor directory is loaded once per desk and the first doctor becomes
//! the default selection. The selection survives each submitted
//! prescription; only the diagnosis and prescription text are per-submission.

use std::sync::Arc;

use hms_shared::{BusyGate, HmsError, HmsResult, RecordKey};
use patient_integrity::Patient;
use prescriptions::add_prescription;
use prescriptions_integrity::{NewPrescription, Prescription};
use provider::DoctorDirectory;
use provider_integrity::Doctor;
use records::PatientHistory;
use tokio::sync::RwLock;
use tracing::info;

use crate::session::PatientSession;
use crate::DeskContext;

#[derive(Debug)]
pub struct DoctorDesk {
    ctx: DeskContext,
    gate: BusyGate,
    directory: DoctorDirectory,
    selected: RwLock<Option<RecordKey>>,
    session: PatientSession,
}

impl DoctorDesk {
    pub fn new(ctx: DeskContext) -> Self {
        Self {
            directory: DoctorDirectory::new(ctx.store.clone()),
            ctx,
            gate: BusyGate::new(),
            selected: RwLock::new(None),
            session: PatientSession::new(true),
        }
    }

    /// Load the directory (cached after the first call) and default the selection
    pub async fn load_doctors(&self) -> HmsResult<Arc<Vec<Doctor>>> {
        let _busy = self.gate.try_enter()?;

        let doctors = self.directory.doctors().await?;
        let mut selected = self.selected.write().await;
        if selected.is_none() {
            *selected = doctors.first().map(|d| d.id.clone());
        }
        Ok(doctors)
    }

    /// Select a doctor from the directory; keys outside it are refused
    pub async fn select_doctor(&self, key: &RecordKey) -> HmsResult<Doctor> {
        let _busy = self.gate.try_enter()?;

        let doctor = self
            .directory
            .find(key)
            .await?
            .ok_or_else(|| HmsError::Referential {
                entity: "doctor",
                key: key.clone(),
            })?;
        *self.selected.write().await = Some(doctor.id.clone());
        Ok(doctor)
    }

    pub async fn selected_doctor(&self) -> Option<RecordKey> {
        self.selected.read().await.clone()
    }

    /// Resolve a patient number and load that patient's history
    pub async fn search_patient(&self, patient_number: &str) -> HmsResult<Patient> {
        let _busy = self.gate.try_enter()?;
        self.session.search(&self.ctx.store, patient_number).await
    }

    /// Prescribe for the current patient as the selected doctor, then refresh the history
    pub async fn add_prescription(
        &self,
        diagnosis: &str,
        prescription_text: &str,
    ) -> HmsResult<Prescription> {
        let _busy = self.gate.try_enter()?;

        let patient = self.session.require_patient().await?;
        let doctor = self
            .selected_doctor()
            .await
            .ok_or_else(|| HmsError::validation("Select a doctor first"))?;

        let prescription = add_prescription(
            &self.ctx.store,
            NewPrescription {
                patient_id: patient.id.clone(),
                doctor_id: doctor,
                diagnosis: diagnosis.to_string(),
                prescription_text: prescription_text.to_string(),
            },
        )
        .await?;

        info!(patient = %patient.patient_number, "refreshing history after prescription");
        self.session.refresh_history(&self.ctx.store).await?;
        Ok(prescription)
    }

    pub async fn current_patient(&self) -> Option<Patient> {
        self.session.patient().await
    }

    pub async fn history(&self) -> Option<PatientHistory> {
        self.session.history().await
    }
}
