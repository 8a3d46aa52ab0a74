//! The module contains the errors the form engine can throw.
//!
//! The errors are:
//!
//! - [`Validation`] thrown when a submit is attempted on an invalid form.
//! - [`Configuration`] thrown when a form definition is inconsistent or a mode
//!   selector receives a value outside its enumerated set.
//! - [`RemoteRead`] and [`RemoteWrite`] wrapping a [`ServiceError`] from the
//!   backend collaborator.
//!
//!  [`Validation`]: FormError::Validation
//!  [`Configuration`]: FormError::Configuration
//!  [`RemoteRead`]: FormError::RemoteRead
//!  [`RemoteWrite`]: FormError::RemoteWrite
use thiserror::Error;

use crate::{controller::Phase, rules::ValidationReport};

/// Failures reported by the backend collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("forbidden")]
    Forbidden,
    #[error("not found")]
    NotFound,
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("rejected by server: {0}")]
    Validation(String),
    #[error("server error: {0}")]
    Server(String),
    #[error("transport error: {0}")]
    Transport(String),
}

/// Form engine errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormError {
    #[error("form is invalid: {0}")]
    Validation(ValidationReport),
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("\"{0}\" field not found!")]
    UnknownField(String),
    #[error("invalid input for \"{field}\": {reason}")]
    InvalidInput { field: String, reason: String },
    #[error("failed to load entity: {0}")]
    RemoteRead(ServiceError),
    #[error("failed to save entity: {0}")]
    RemoteWrite(ServiceError),
    #[error("a submit is already in flight")]
    AlreadySubmitting,
    #[error("form is locked while submitting")]
    Locked,
    #[error("form is not ready (phase: {0})")]
    NotReady(Phase),
    #[error("no submit in flight")]
    NotSubmitting,
}

impl FormError {
    pub(crate) fn invalid_input(field: &str, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}
