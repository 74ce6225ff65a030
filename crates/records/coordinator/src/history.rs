//! History aggregation
//!
//! A patient's history is two independent sections, prescriptions and lab
//! reports. Both queries run concurrently and each section keeps its own
//! outcome, so a failed lab query still leaves prescriptions on screen.

use hms_shared::{HmsError, HmsResult, RecordKey, StoreClient};
use prescriptions::list_patient_prescriptions;
use prescriptions_integrity::PrescriptionEntry;
use records_integrity::LabReport;
use tracing::{debug, warn};

use crate::list_patient_lab_reports;

/// Loading state of one history section
#[derive(Clone, Debug, PartialEq)]
pub enum SectionState<T> {
    Pending,
    Loaded(Vec<T>),
    Failed(HmsError),
}

impl<T> SectionState<T> {
    pub fn is_pending(&self) -> bool {
        matches!(self, SectionState::Pending)
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, SectionState::Loaded(_))
    }

    pub fn items(&self) -> Option<&[T]> {
        match self {
            SectionState::Loaded(items) => Some(items),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&HmsError> {
        match self {
            SectionState::Failed(err) => Some(err),
            _ => None,
        }
    }
}

impl<T> From<HmsResult<Vec<T>>> for SectionState<T> {
    fn from(result: HmsResult<Vec<T>>) -> Self {
        match result {
            Ok(items) => SectionState::Loaded(items),
            Err(err) => SectionState::Failed(err),
        }
    }
}

/// Prescriptions and lab reports of one patient
#[derive(Clone, Debug, PartialEq)]
pub struct PatientHistory {
    pub patient: RecordKey,
    pub prescriptions: SectionState<PrescriptionEntry>,
    pub lab_reports: SectionState<LabReport>,
}

impl PatientHistory {
    /// Both sections still loading
    pub fn pending(patient: RecordKey) -> Self {
        Self {
            patient,
            prescriptions: SectionState::Pending,
            lab_reports: SectionState::Pending,
        }
    }

    /// Neither section is still loading, whatever their outcome
    pub fn is_complete(&self) -> bool {
        !self.prescriptions.is_pending() && !self.lab_reports.is_pending()
    }

    /// Both sections loaded successfully
    pub fn is_fully_loaded(&self) -> bool {
        self.prescriptions.is_loaded() && self.lab_reports.is_loaded()
    }
}

/// Load both history sections for a patient concurrently
pub async fn aggregate_history(store: &StoreClient, patient: &RecordKey) -> PatientHistory {
    let (prescriptions, lab_reports) = tokio::join!(
        list_patient_prescriptions(store, patient),
        list_patient_lab_reports(store, patient),
    );

    if let Err(e) = &prescriptions {
        warn!(%patient, error = %e, "prescription history failed to load");
    }
    if let Err(e) = &lab_reports {
        warn!(%patient, error = %e, "lab history failed to load");
    }

    let history = PatientHistory {
        patient: patient.clone(),
        prescriptions: prescriptions.into(),
        lab_reports: lab_reports.into(),
    };
    debug!(
        %patient,
        prescriptions = ?history.prescriptions.items().map(<[_]>::len),
        lab_reports = ?history.lab_reports.items().map(<[_]>::len),
        "history aggregated"
    );
    history
}
