//! HMS Shared Utilities
//!
//! This crate provides common functionality for all HMS front desk crates:
//! - Record store client seam and the in-memory store
//! - Error types and user-facing messages
//! - Field validation accumulator
//! - Audit logging of patient data access
//! - Busy gate for single-operation desk sessions
//! - Configuration and logging setup

use serde::{Deserialize, Serialize};

pub mod config;
pub mod error;
pub mod memory;
pub mod store;
pub mod telemetry;

// Re-export commonly used items
pub use audit::*;
pub use config::{HmsConfig, LoggingSettings, RegistrationSettings, StoreSettings};
pub use error::{ErrorKind, HmsError, HmsResult, StoreError};
pub use gate::*;
pub use memory::InMemoryStore;
pub use store::{
    decode_row, decode_rows, encode_row, Filter, Order, Query, RecordKey, RecordStore, Row,
    StoreClient, Table,
};
pub use validation::*;

/// Field validation with accumulated, coded errors
pub mod validation {
    use super::*;

    /// Validation error with detailed context
    #[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
    pub struct ValidationError {
        pub field: String,
        pub message: String,
        pub code: ValidationErrorCode,
    }

    /// Specific validation error codes for programmatic handling
    #[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
    pub enum ValidationErrorCode {
        Required,
        InvalidFormat,
        OutOfRange,
        TooLong,
        InvalidCharacters,
        Immutable,
        UnknownField,
    }

    impl std::fmt::Display for ValidationError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{}: {} ({:?})", self.field, self.message, self.code)
        }
    }

    /// Validation result that can accumulate multiple errors
    #[derive(Clone, Debug, Default)]
    pub struct ValidationResult {
        pub errors: Vec<ValidationError>,
    }

    impl ValidationResult {
        pub fn new() -> Self {
            Self { errors: Vec::new() }
        }

        pub fn add_error(&mut self, field: &str, message: &str, code: ValidationErrorCode) {
            self.errors.push(ValidationError {
                field: field.to_string(),
                message: message.to_string(),
                code,
            });
        }

        pub fn is_valid(&self) -> bool {
            self.errors.is_empty()
        }

        pub fn has_error(&self, field: &str, code: ValidationErrorCode) -> bool {
            self.errors.iter().any(|e| e.field == field && e.code == code)
        }

        pub fn into_result(self) -> HmsResult<()> {
            if self.is_valid() {
                Ok(())
            } else {
                let messages: Vec<String> = self.errors.iter().map(|e| e.to_string()).collect();
                Err(HmsError::Validation(messages.join("; ")))
            }
        }

        pub fn merge(&mut self, other: ValidationResult) {
            self.errors.extend(other.errors);
        }
    }

    /// Maximum length of any free-text column
    pub const MAX_TEXT_LEN: usize = 4000;

    /// Require a non-blank value no longer than [`MAX_TEXT_LEN`]
    pub fn validate_required_text(field: &str, label: &str, value: &str) -> ValidationResult {
        let mut result = ValidationResult::new();

        if value.trim().is_empty() {
            result.add_error(field, &format!("{} is required", label), ValidationErrorCode::Required);
        } else if value.chars().count() > MAX_TEXT_LEN {
            result.add_error(
                field,
                &format!("{} cannot exceed {} characters", label, MAX_TEXT_LEN),
                ValidationErrorCode::TooLong,
            );
        }

        result
    }
}

/// Audit logging module - records every read and write of patient data
pub mod audit {
    use super::*;
    use tracing::info;

    /// Permission types for data access
    #[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
    pub enum Permission {
        Read,
        Write,
    }

    impl std::fmt::Display for Permission {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Permission::Read => write!(f, "Read"),
                Permission::Write => write!(f, "Write"),
            }
        }
    }

    /// Data categories touched by the front desk
    #[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
    pub enum DataCategory {
        Demographics,
        Medications,
        LabResults,
    }

    impl std::fmt::Display for DataCategory {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                DataCategory::Demographics => write!(f, "Demographics"),
                DataCategory::Medications => write!(f, "Medications"),
                DataCategory::LabResults => write!(f, "LabResults"),
            }
        }
    }

    /// Emit an audit event on the `hms::audit` target
    pub fn log_data_access(patient: &RecordKey, categories: &[DataCategory], access: Permission) {
        let categories: Vec<String> = categories.iter().map(|c| c.to_string()).collect();
        info!(
            target: "hms::audit",
            patient = %patient,
            categories = %categories.join(","),
            access = %access,
            "patient data access"
        );
    }
}

/// Busy gate - one outstanding operation per desk session
pub mod gate {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[derive(Debug, Default)]
    pub struct BusyGate {
        busy: AtomicBool,
    }

    /// Held for the duration of an operation; releases the gate on drop
    #[derive(Debug)]
    pub struct BusyGuard<'a> {
        gate: &'a BusyGate,
    }

    impl BusyGate {
        pub fn new() -> Self {
            Self::default()
        }

        /// Enter the gate, or fail with `HmsError::Busy` if an operation is outstanding
        pub fn try_enter(&self) -> HmsResult<BusyGuard<'_>> {
            self.busy
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .map(|_| BusyGuard { gate: self })
                .map_err(|_| HmsError::Busy)
        }

        pub fn is_busy(&self) -> bool {
            self.busy.load(Ordering::Acquire)
        }
    }

    impl Drop for BusyGuard<'_> {
        fn drop(&mut self) {
            self.gate.busy.store(false, Ordering::Release);
        }
    }
}
