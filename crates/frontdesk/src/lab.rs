//! Lab desk: patient search and lab reports. The lab view shows no history.

use hms_shared::{BusyGate, HmsResult};
use patient_integrity::Patient;
use records::add_lab_report;
use records_integrity::{LabReport, NewLabReport};

use crate::session::PatientSession;
use crate::DeskContext;

#[derive(Debug)]
pub struct LabDesk {
    ctx: DeskContext,
    gate: BusyGate,
    session: PatientSession,
}

impl LabDesk {
    pub fn new(ctx: DeskContext) -> Self {
        Self {
            ctx,
            gate: BusyGate::new(),
            session: PatientSession::new(false),
        }
    }

    pub async fn search_patient(&self, patient_number: &str) -> HmsResult<Patient> {
        let _busy = self.gate.try_enter()?;
        self.session.search(&self.ctx.store, patient_number).await
    }

    /// Record a test result for the current patient
    pub async fn add_lab_report(
        &self,
        test_name: &str,
        test_result: &str,
        notes: Option<&str>,
    ) -> HmsResult<LabReport> {
        let _busy = self.gate.try_enter()?;

        let patient = self.session.require_patient().await?;
        add_lab_report(
            &self.ctx.store,
            NewLabReport {
                patient_id: patient.id,
                test_name: test_name.to_string(),
                test_result: test_result.to_string(),
                notes: notes.map(str::to_string),
            },
        )
        .await
    }

    pub async fn current_patient(&self) -> Option<Patient> {
        self.session.patient().await
    }
}
