//! Error types shared by every HMS crate
//!
//! `StoreError` is what the record store client reports. `HmsError` is what
//! resolver, aggregator, mutator and desk operations return to their callers.
//! Each `HmsError` belongs to exactly one `ErrorKind`, and every kind has its
//! own user-facing message so a typo (not found) never reads like an outage.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::store::{RecordKey, Table};

/// Failures reported by a record store client
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    #[error("record store unavailable: {0}")]
    Unavailable(String),

    #[error("query rejected by record store: {0}")]
    Rejected(String),

    #[error("duplicate value for {table}.{column}")]
    UniqueViolation { table: Table, column: String },

    #[error("{table}.{column} references a row that does not exist")]
    ForeignKeyViolation { table: Table, column: String },

    #[error("no row in {table} with id {key}")]
    RowNotFound { table: Table, key: RecordKey },

    #[error("record store did not answer within {after_ms} ms")]
    Timeout { after_ms: u64 },
}

/// Coarse classification used by presenters to pick a message and a recovery action
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Expected outcome of a typo; retry typing
    NotFound,
    /// Input rejected before anything was written
    Validation,
    /// Store unreachable, rejected the query or returned an unexpected shape; retry later
    Transport,
    /// A mutator referenced a doctor or patient that does not exist
    Referential,
    /// Uniqueness could not be established
    Conflict,
    /// The session is still running a previous operation
    Busy,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::NotFound => write!(f, "NotFound"),
            ErrorKind::Validation => write!(f, "Validation"),
            ErrorKind::Transport => write!(f, "Transport"),
            ErrorKind::Referential => write!(f, "Referential"),
            ErrorKind::Conflict => write!(f, "Conflict"),
            ErrorKind::Busy => write!(f, "Busy"),
        }
    }
}

/// Errors returned by HMS operations
#[derive(Debug, Clone, Error, PartialEq)]
pub enum HmsError {
    #[error("no patient found with number {0}")]
    PatientNotFound(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("patient number {0} matches more than one patient")]
    DuplicateIdentifier(String),

    #[error("{entity} {key} does not exist")]
    Referential { entity: &'static str, key: RecordKey },

    #[error("could not allocate a unique patient number after {attempts} attempts")]
    IdentifierSpaceExhausted { attempts: u32 },

    #[error("another operation is still in progress")]
    Busy,

    #[error("unexpected {table} row shape: {reason}")]
    Schema { table: Table, reason: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl HmsError {
    pub fn validation(message: impl Into<String>) -> Self {
        HmsError::Validation(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            HmsError::PatientNotFound(_) => ErrorKind::NotFound,
            HmsError::Validation(_) => ErrorKind::Validation,
            HmsError::DuplicateIdentifier(_) => ErrorKind::Conflict,
            HmsError::Referential { .. } => ErrorKind::Referential,
            HmsError::IdentifierSpaceExhausted { .. } => ErrorKind::Conflict,
            HmsError::Busy => ErrorKind::Busy,
            HmsError::Schema { .. } => ErrorKind::Transport,
            HmsError::Store(StoreError::ForeignKeyViolation { .. })
            | HmsError::Store(StoreError::RowNotFound { .. }) => ErrorKind::Referential,
            HmsError::Store(StoreError::UniqueViolation { .. }) => ErrorKind::Conflict,
            HmsError::Store(_) => ErrorKind::Transport,
        }
    }

    /// True for failures where retrying later may succeed
    pub fn is_transport(&self) -> bool {
        self.kind() == ErrorKind::Transport
    }

    /// Message suitable for showing to the person at the desk
    pub fn user_message(&self) -> String {
        match self.kind() {
            ErrorKind::NotFound => {
                "Patient not found. Check the patient number and try again.".to_string()
            }
            ErrorKind::Validation => match self {
                HmsError::Validation(msg) => msg.clone(),
                other => other.to_string(),
            },
            ErrorKind::Transport => {
                "The records service is not responding. Please try again later.".to_string()
            }
            ErrorKind::Referential => {
                "The selected doctor or patient no longer exists. Reload and try again."
                    .to_string()
            }
            ErrorKind::Conflict => {
                "The record conflicts with existing data. Please contact an administrator."
                    .to_string()
            }
            ErrorKind::Busy => "Please wait for the current operation to finish.".to_string(),
        }
    }
}

pub type HmsResult<T> = Result<T, HmsError>;
