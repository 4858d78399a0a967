//! The module contains the errors the engine can throw.
//!
//! The errors follow the reconciliation taxonomy:
//!
//! - [`Invariant`] a structural or business rule was violated (sole bag
//!   deletion, envelope without a bag parent, disallowed value type...). The
//!   caller must correct the request.
//! - [`Unconfigured`] reference data is missing from the catalog (incident type,
//!   denomination...). Master data needs updating.
//! - [`InvalidState`] the requested transition is not allowed from the current
//!   state, which is carried so the caller can resynchronize its view.
//! - [`Incomplete`] the finalize gate failed.
//! - [`Database`] unexpected persistence failure.
//!
//!  [`Invariant`]: EngineError::Invariant
//!  [`Unconfigured`]: EngineError::Unconfigured
//!  [`InvalidState`]: EngineError::InvalidState
//!  [`Incomplete`]: EngineError::Incomplete
//!  [`Database`]: EngineError::Database
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invariant violation: {0}")]
    Invariant(String),
    #[error("Unconfigured reference data: {0}")]
    Unconfigured(String),
    #[error("Invalid state ({current}): {message}")]
    InvalidState { current: String, message: String },
    #[error("Incomplete: {0}")]
    Incomplete(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid id: {0}")]
    InvalidId(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl EngineError {
    pub(crate) fn invalid_state(current: impl ToString, message: impl Into<String>) -> Self {
        Self::InvalidState {
            current: current.to_string(),
            message: message.into(),
        }
    }

    /// A stored row holds a value the engine cannot read back.
    pub(crate) fn corrupt_row(message: impl Into<String>) -> Self {
        Self::Database(DbErr::Custom(message.into()))
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Invariant(a), Self::Invariant(b)) => a == b,
            (Self::Unconfigured(a), Self::Unconfigured(b)) => a == b,
            (
                Self::InvalidState {
                    current: a,
                    message: m,
                },
                Self::InvalidState {
                    current: b,
                    message: n,
                },
            ) => a == b && m == n,
            (Self::Incomplete(a), Self::Incomplete(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InvalidId(a), Self::InvalidId(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
