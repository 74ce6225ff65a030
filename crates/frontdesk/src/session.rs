//! Current-patient state shared by the doctor, lab and portal desks

use hms_shared::{HmsError, HmsResult, StoreClient};
use patient::resolve_patient;
use patient_integrity::Patient;
use records::{aggregate_history, PatientHistory};
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Default)]
struct Current {
    patient: Option<Patient>,
    history: Option<PatientHistory>,
}

#[derive(Debug)]
pub(crate) struct PatientSession {
    with_history: bool,
    current: RwLock<Current>,
}

impl PatientSession {
    pub(crate) fn new(with_history: bool) -> Self {
        Self {
            with_history,
            current: RwLock::new(Current::default()),
        }
    }

    /// Resolve a patient number and make it the current patient
    ///
    /// Any failure, including not-found, clears the current patient.
    pub(crate) async fn search(&self, store: &StoreClient, patient_number: &str) -> HmsResult<Patient> {
        let patient = match resolve_patient(store, patient_number).await {
            Ok(Some(patient)) => patient,
            Ok(None) => {
                self.clear().await;
                return Err(HmsError::PatientNotFound(patient_number.trim().to_string()));
            }
            Err(e) => {
                self.clear().await;
                return Err(e);
            }
        };

        self.set_patient(store, patient.clone()).await;
        Ok(patient)
    }

    /// Replace the current patient and reload its history when this desk shows one
    pub(crate) async fn set_patient(&self, store: &StoreClient, patient: Patient) {
        let history = if self.with_history {
            Some(aggregate_history(store, &patient.id).await)
        } else {
            None
        };

        let mut current = self.current.write().await;
        current.patient = Some(patient);
        current.history = history;
    }

    /// Reload the current patient's history
    pub(crate) async fn refresh_history(&self, store: &StoreClient) -> HmsResult<Option<PatientHistory>> {
        if !self.with_history {
            return Ok(None);
        }
        let patient = self.require_patient().await?;
        debug!(patient = %patient.id, "refreshing history");

        let history = aggregate_history(store, &patient.id).await;
        self.current.write().await.history = Some(history.clone());
        Ok(Some(history))
    }

    pub(crate) async fn require_patient(&self) -> HmsResult<Patient> {
        self.patient()
            .await
            .ok_or_else(|| HmsError::validation("Search for a patient first"))
    }

    pub(crate) async fn patient(&self) -> Option<Patient> {
        self.current.read().await.patient.clone()
    }

    pub(crate) async fn history(&self) -> Option<PatientHistory> {
        self.current.read().await.history.clone()
    }

    pub(crate) async fn clear(&self) {
        *self.current.write().await = Current::default();
    }
}
