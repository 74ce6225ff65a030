//! Patient portal: self-service search, history and contact updates
//!
//! Contact updates are last-write-wins. An edit made here and one made by
//! another desk at the same time silently overwrite each other.

use hms_shared::{BusyGate, HmsResult};
use patient::update_contact_info;
use patient_integrity::{ContactUpdate, Patient};
use records::PatientHistory;
use serde_json::Value;

use crate::session::PatientSession;
use crate::DeskContext;

#[derive(Debug)]
pub struct PatientPortal {
    ctx: DeskContext,
    gate: BusyGate,
    session: PatientSession,
}

impl PatientPortal {
    pub fn new(ctx: DeskContext) -> Self {
        Self {
            ctx,
            gate: BusyGate::new(),
            session: PatientSession::new(true),
        }
    }

    pub async fn search_patient(&self, patient_number: &str) -> HmsResult<Patient> {
        let _busy = self.gate.try_enter()?;
        self.session.search(&self.ctx.store, patient_number).await
    }

    /// Update the current patient's contact fields and reload the view
    pub async fn update_contact_info(&self, update: ContactUpdate) -> HmsResult<Patient> {
        let _busy = self.gate.try_enter()?;

        let current = self.session.require_patient().await?;
        let updated = update_contact_info(&self.ctx.store, &current.id, update).await?;
        self.session.set_patient(&self.ctx.store, updated.clone()).await;
        Ok(updated)
    }

    /// Same as [`update_contact_info`](Self::update_contact_info) for a form
    /// submitted as JSON; immutable and unknown fields are refused by name
    pub async fn submit_contact_form(&self, form: &Value) -> HmsResult<Patient> {
        let update = ContactUpdate::from_json(form)?;
        self.update_contact_info(update).await
    }

    pub async fn current_patient(&self) -> Option<Patient> {
        self.session.patient().await
    }

    pub async fn history(&self) -> Option<PatientHistory> {
        self.session.history().await
    }
}
