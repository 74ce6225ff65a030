//! Doctor Directory Coordinator
//!
//! Loads the doctor directory that backs prescription doctor selection, and
//! resolves doctor keys for the prescription history join.

use std::collections::HashMap;
use std::sync::Arc;

use hms_shared::{
    decode_row, decode_rows, encode_row, HmsResult, Query, RecordKey, StoreClient, Table,
};
use provider_integrity::*;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Seed a doctor (administrative use)
pub async fn create_doctor(store: &StoreClient, input: NewDoctor) -> HmsResult<Doctor> {
    let input = NewDoctor {
        full_name: input.full_name.trim().to_string(),
        specialization: input.specialization.trim().to_string(),
    };
    validate_new_doctor(&input).into_result()?;

    let row = encode_row(Table::Doctors, &input)?;
    let stored = store.insert(Table::Doctors, row).await?;
    let doctor: Doctor = decode_row(Table::Doctors, stored)?;
    info!(doctor = %doctor.id, full_name = %doctor.full_name, "doctor created");
    Ok(doctor)
}

/// Every doctor, sorted by full name
///
/// The store is asked to order by name; the result is sorted again with the
/// key as tie-break so repeated calls return the same sequence.
pub async fn list_doctors(store: &StoreClient) -> HmsResult<Vec<Doctor>> {
    let rows = store
        .select(Table::Doctors, Query::new().order_by("full_name", true))
        .await?;
    let mut doctors: Vec<Doctor> = decode_rows(Table::Doctors, rows)?;
    doctors.sort_by(Doctor::directory_order);
    debug!(count = doctors.len(), "doctor directory loaded");
    Ok(doctors)
}

pub async fn get_doctor(store: &StoreClient, key: &RecordKey) -> HmsResult<Option<Doctor>> {
    let rows = store
        .select(Table::Doctors, Query::new().eq("id", key).limit(1))
        .await?;
    rows.into_iter()
        .next()
        .map(|row| decode_row(Table::Doctors, row))
        .transpose()
}

/// Fetch the doctors behind a set of keys in one query
///
/// Keys without a matching row are simply absent from the map.
pub async fn doctors_by_keys(
    store: &StoreClient,
    keys: &[RecordKey],
) -> HmsResult<HashMap<RecordKey, Doctor>> {
    let mut wanted: Vec<&RecordKey> = keys.iter().collect();
    wanted.sort();
    wanted.dedup();
    if wanted.is_empty() {
        return Ok(HashMap::new());
    }

    let values: Vec<Value> = wanted.into_iter().map(Value::from).collect();
    let rows = store
        .select(Table::Doctors, Query::new().any_of("id", values))
        .await?;
    let doctors: Vec<Doctor> = decode_rows(Table::Doctors, rows)?;
    Ok(doctors.into_iter().map(|d| (d.id.clone(), d)).collect())
}

/// Session-lifetime cache of the doctor directory
///
/// Loaded on first use; `refresh` re-reads it. The directory is small and
/// changes only through administrative seeding.
#[derive(Debug)]
pub struct DoctorDirectory {
    store: StoreClient,
    cached: RwLock<Option<Arc<Vec<Doctor>>>>,
}

impl DoctorDirectory {
    pub fn new(store: StoreClient) -> Self {
        Self {
            store,
            cached: RwLock::new(None),
        }
    }

    /// The cached directory, loading it if this is the first call
    pub async fn doctors(&self) -> HmsResult<Arc<Vec<Doctor>>> {
        if let Some(doctors) = self.cached.read().await.as_ref() {
            return Ok(doctors.clone());
        }

        let mut cached = self.cached.write().await;
        // Another caller may have loaded it while we waited for the lock
        if let Some(doctors) = cached.as_ref() {
            return Ok(doctors.clone());
        }
        let doctors = Arc::new(list_doctors(&self.store).await?);
        *cached = Some(doctors.clone());
        Ok(doctors)
    }

    /// Discard the cache and load the directory again
    pub async fn refresh(&self) -> HmsResult<Arc<Vec<Doctor>>> {
        let doctors = Arc::new(list_doctors(&self.store).await?);
        *self.cached.write().await = Some(doctors.clone());
        Ok(doctors)
    }

    /// Look a doctor up in the directory
    pub async fn find(&self, key: &RecordKey) -> HmsResult<Option<Doctor>> {
        let doctors = self.doctors().await?;
        Ok(doctors.iter().find(|d| &d.id == key).cloned())
    }

    pub async fn is_loaded(&self) -> bool {
        self.cached.read().await.is_some()
    }
}
