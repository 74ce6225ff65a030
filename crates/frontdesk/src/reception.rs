//! Reception desk: patient registration

use hms_shared::{BusyGate, HmsResult};
use patient::register_patient;
use patient_integrity::{NewPatient, Patient, PatientNumber};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::{Mutex, RwLock};

use crate::DeskContext;

#[derive(Debug)]
pub struct ReceptionDesk {
    ctx: DeskContext,
    gate: BusyGate,
    rng: Mutex<StdRng>,
    last_registered: RwLock<Option<Patient>>,
}

impl ReceptionDesk {
    pub fn new(ctx: DeskContext) -> Self {
        Self::with_rng(ctx, StdRng::from_entropy())
    }

    /// Desk drawing patient numbers from the given generator
    pub fn with_rng(ctx: DeskContext, rng: StdRng) -> Self {
        Self {
            ctx,
            gate: BusyGate::new(),
            rng: Mutex::new(rng),
            last_registered: RwLock::new(None),
        }
    }

    /// Register a patient and return the number to hand to them
    pub async fn register(&self, input: NewPatient) -> HmsResult<PatientNumber> {
        let _busy = self.gate.try_enter()?;

        let mut rng = self.rng.lock().await;
        let patient = register_patient(
            &self.ctx.store,
            &self.ctx.config.registration,
            input,
            &mut *rng,
        )
        .await?;

        let number = patient.patient_number.clone();
        *self.last_registered.write().await = Some(patient);
        Ok(number)
    }

    /// The patient registered by the last successful `register`
    pub async fn last_registered(&self) -> Option<Patient> {
        self.last_registered.read().await.clone()
    }

    pub fn is_busy(&self) -> bool {
        self.gate.is_busy()
    }
}
