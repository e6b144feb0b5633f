use candid::CandidType;
use derive_more::Display;
use disambig_core::error::{ErrorClass, ErrorOrigin as CoreErrorOrigin, InternalError};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

///
/// Error
/// Public error type with a stable kind + origin taxonomy.
///

#[derive(CandidType, Debug, Deserialize, Serialize, ThisError)]
#[error("{message}")]
pub struct Error {
    pub kind: ErrorKind,
    pub origin: ErrorOrigin,
    pub message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            kind,
            origin,
            message: message.into(),
        }
    }
}

impl From<InternalError> for Error {
    fn from(err: InternalError) -> Self {
        Self::new(err.class.into(), err.origin.into(), err.message)
    }
}

///
/// ErrorKind
/// Public error taxonomy for callers and canister interfaces.
///

#[derive(CandidType, Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
pub enum ErrorKind {
    /// Host type is not registered or its declaration is invalid.
    Configuration,

    /// Row or ledger entry already exists.
    Conflict,

    /// Row or ledger entry does not exist.
    NotFound,

    /// Stored state is unreadable or inconsistent.
    Corruption,

    /// The caller cannot remediate this.
    Internal,
}

impl From<ErrorClass> for ErrorKind {
    fn from(class: ErrorClass) -> Self {
        match class {
            ErrorClass::Configuration => Self::Configuration,
            ErrorClass::Conflict => Self::Conflict,
            ErrorClass::NotFound => Self::NotFound,
            ErrorClass::Corruption | ErrorClass::InvariantViolation => Self::Corruption,
            ErrorClass::Internal => Self::Internal,
        }
    }
}

///
/// ErrorOrigin
///

#[derive(CandidType, Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
pub enum ErrorOrigin {
    Registry,
    Serialize,
    Store,
    Ledger,
    Engine,
    Hook,
}

impl From<CoreErrorOrigin> for ErrorOrigin {
    fn from(origin: CoreErrorOrigin) -> Self {
        match origin {
            CoreErrorOrigin::Registry => Self::Registry,
            CoreErrorOrigin::Serialize => Self::Serialize,
            CoreErrorOrigin::Store => Self::Store,
            CoreErrorOrigin::Ledger => Self::Ledger,
            CoreErrorOrigin::Engine => Self::Engine,
            CoreErrorOrigin::Hook => Self::Hook,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_error_keeps_class_and_origin() {
        let err: Error = InternalError::ledger_conflict("dummy#1").into();

        assert_eq!(err.kind, ErrorKind::Conflict);
        assert_eq!(err.origin, ErrorOrigin::Ledger);
        assert!(err.message.contains("dummy#1"));
    }

    #[test]
    fn invariant_violations_surface_as_corruption() {
        assert_eq!(
            ErrorKind::from(ErrorClass::InvariantViolation),
            ErrorKind::Corruption
        );
    }

    #[test]
    fn error_serializes_with_labels() {
        let err = Error::new(ErrorKind::NotFound, ErrorOrigin::Store, "missing");
        let json = serde_json::to_value(&err).unwrap();

        assert_eq!(json["kind"], "NotFound");
        assert_eq!(json["origin"], "Store");
    }
}
