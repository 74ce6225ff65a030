//! HMS Front Desk
//!
//! One desk per role-based view:
//! - [`ReceptionDesk`]: registers patients and shows the issued number
//! - [`DoctorDesk`]: doctor selection, patient search with history, prescriptions
//! - [`LabDesk`]: patient search and lab reports
//! - [`PatientPortal`]: self-service search, history and contact updates
//!
//! Each desk is a single logical actor. A busy gate rejects a second
//! operation while one is outstanding, and all state is session-local.

use std::sync::Arc;

use hms_shared::{telemetry, HmsConfig, RecordStore, StoreClient};

mod session;

pub mod doctor;
pub mod lab;
pub mod portal;
pub mod reception;

pub use doctor::DoctorDesk;
pub use lab::LabDesk;
pub use portal::PatientPortal;
pub use reception::ReceptionDesk;

/// Store handle and configuration shared by every desk
#[derive(Clone, Debug)]
pub struct DeskContext {
    pub store: StoreClient,
    pub config: Arc<HmsConfig>,
}

impl DeskContext {
    pub fn new(backend: Arc<dyn RecordStore>, config: HmsConfig) -> Self {
        Self {
            store: StoreClient::new(backend, &config.store),
            config: Arc::new(config),
        }
    }

    /// Build a context and install logging from the configuration
    pub fn bootstrap(backend: Arc<dyn RecordStore>, config: HmsConfig) -> Self {
        telemetry::init(&config.logging);
        Self::new(backend, config)
    }

    pub fn reception(&self) -> ReceptionDesk {
        ReceptionDesk::new(self.clone())
    }

    pub fn doctor(&self) -> DoctorDesk {
        DoctorDesk::new(self.clone())
    }

    pub fn lab(&self) -> LabDesk {
        LabDesk::new(self.clone())
    }

    pub fn portal(&self) -> PatientPortal {
        PatientPortal::new(self.clone())
    }
}
