use crate::db::registry::ConfigError;
use std::fmt;
use thiserror::Error as ThisError;

///
/// InternalError
///
/// Structured runtime error with a stable internal classification.
/// Every failure of a save, delete, or renumbering pass surfaces as one of
/// these; there is no separate error channel for disambiguation.
///

#[derive(Debug, ThisError)]
#[error("{message}")]
pub struct InternalError {
    pub class: ErrorClass,
    pub origin: ErrorOrigin,
    pub message: String,

    /// Optional structured error detail.
    /// The variant (if present) must correspond to `origin`.
    pub detail: Option<ErrorDetail>,
}

impl InternalError {
    /// Construct an InternalError with optional origin-specific detail.
    /// Store and ledger invariant/corruption classes get a default
    /// `StoreError` detail; other combinations carry none.
    pub fn new(class: ErrorClass, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        let message = message.into();

        let detail = match (class, origin) {
            (ErrorClass::Corruption, ErrorOrigin::Store | ErrorOrigin::Ledger) => {
                Some(ErrorDetail::Store(StoreError::Corrupt {
                    message: message.clone(),
                }))
            }
            (ErrorClass::InvariantViolation, ErrorOrigin::Store | ErrorOrigin::Ledger) => {
                Some(ErrorDetail::Store(StoreError::InvariantViolation {
                    message: message.clone(),
                }))
            }
            _ => None,
        };

        Self {
            class,
            origin,
            message,
            detail,
        }
    }

    /// Construct a ledger-origin invariant violation.
    pub(crate) fn ledger_invariant(message: impl Into<String>) -> Self {
        Self::new(
            ErrorClass::InvariantViolation,
            ErrorOrigin::Ledger,
            message.into(),
        )
    }

    /// Construct an engine-origin invariant violation.
    pub(crate) fn engine_invariant(message: impl Into<String>) -> Self {
        Self::new(
            ErrorClass::InvariantViolation,
            ErrorOrigin::Engine,
            message.into(),
        )
    }

    /// Construct a store-origin corruption error.
    pub(crate) fn store_corruption(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Corruption, ErrorOrigin::Store, message.into())
    }

    /// Construct a ledger-origin corruption error.
    pub(crate) fn ledger_corruption(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Corruption, ErrorOrigin::Ledger, message.into())
    }

    /// Construct a store-origin internal error.
    pub(crate) fn store_internal(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Internal, ErrorOrigin::Store, message.into())
    }

    /// Construct a host-row conflict (insert over an existing key).
    pub fn store_conflict(key: impl Into<String>) -> Self {
        let key = key.into();

        Self {
            class: ErrorClass::Conflict,
            origin: ErrorOrigin::Store,
            message: format!("data key already exists: {key}"),
            detail: Some(ErrorDetail::Store(StoreError::Conflict { key })),
        }
    }

    pub fn store_not_found(key: impl Into<String>) -> Self {
        let key = key.into();

        Self {
            class: ErrorClass::NotFound,
            origin: ErrorOrigin::Store,
            message: format!("data key not found: {key}"),
            detail: Some(ErrorDetail::Store(StoreError::NotFound { key })),
        }
    }

    /// Construct a ledger uniqueness violation.
    pub fn ledger_conflict(key: impl Into<String>) -> Self {
        let key = key.into();

        Self {
            class: ErrorClass::Conflict,
            origin: ErrorOrigin::Ledger,
            message: format!("ledger constraint violation: entry already exists for {key}"),
            detail: Some(ErrorDetail::Store(StoreError::Conflict { key })),
        }
    }

    pub fn ledger_not_found(key: impl Into<String>) -> Self {
        let key = key.into();

        Self {
            class: ErrorClass::NotFound,
            origin: ErrorOrigin::Ledger,
            message: format!("ledger entry not found: {key}"),
            detail: Some(ErrorDetail::Store(StoreError::NotFound { key })),
        }
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self.detail,
            Some(ErrorDetail::Store(StoreError::NotFound { .. }))
        )
    }

    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self.class, ErrorClass::Conflict)
    }

    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self.class, ErrorClass::Configuration)
    }

    #[must_use]
    pub fn display_with_class(&self) -> String {
        format!("{}:{}: {}", self.origin, self.class, self.message)
    }
}

///
/// ErrorDetail
///
/// Structured, origin-specific error detail carried by [`InternalError`].
///

#[derive(Debug, ThisError)]
pub enum ErrorDetail {
    #[error("{0}")]
    Store(StoreError),
    #[error("{0}")]
    Config(ConfigError),
    #[error("{0}")]
    Hook(HookError),
}

impl From<ConfigError> for InternalError {
    fn from(err: ConfigError) -> Self {
        Self {
            class: ErrorClass::Configuration,
            origin: ErrorOrigin::Registry,
            message: err.to_string(),
            detail: Some(ErrorDetail::Config(err)),
        }
    }
}

impl From<HookError> for InternalError {
    fn from(err: HookError) -> Self {
        Self {
            class: ErrorClass::Internal,
            origin: ErrorOrigin::Hook,
            message: err.to_string(),
            detail: Some(ErrorDetail::Hook(err)),
        }
    }
}

///
/// StoreError
///
/// Store-specific structured error detail.
/// Never returned directly; always wrapped in [`ErrorDetail::Store`].
///

#[derive(Debug, ThisError)]
pub enum StoreError {
    #[error("key not found: {key}")]
    NotFound { key: String },

    #[error("key already exists: {key}")]
    Conflict { key: String },

    #[error("store corruption: {message}")]
    Corrupt { message: String },

    #[error("store invariant violation: {message}")]
    InvariantViolation { message: String },
}

///
/// HookError
///
/// Failure reported by a host type's completion hook.
/// Aborts the triggering save/delete like any other store failure.
///

#[derive(Debug, ThisError)]
#[error("completion hook failed for {entity_path}: {message}")]
pub struct HookError {
    pub entity_path: &'static str,
    pub message: String,
}

impl HookError {
    pub fn new(entity_path: &'static str, message: impl Into<String>) -> Self {
        Self {
            entity_path,
            message: message.into(),
        }
    }
}

///
/// ErrorClass
/// Internal error taxonomy for runtime classification.
/// Not a stable API; may change without notice.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    Configuration,
    Corruption,
    NotFound,
    Internal,
    Conflict,
    InvariantViolation,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Configuration => "configuration",
            Self::Corruption => "corruption",
            Self::NotFound => "not_found",
            Self::Internal => "internal",
            Self::Conflict => "conflict",
            Self::InvariantViolation => "invariant_violation",
        };
        write!(f, "{label}")
    }
}

///
/// ErrorOrigin
/// Internal origin taxonomy for runtime classification.
/// Not a stable API; may change without notice.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorOrigin {
    Registry,
    Serialize,
    Store,
    Ledger,
    Engine,
    Hook,
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Registry => "registry",
            Self::Serialize => "serialize",
            Self::Store => "store",
            Self::Ledger => "ledger",
            Self::Engine => "engine",
            Self::Hook => "hook",
        };
        write!(f, "{label}")
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ledger_conflict_is_classified_as_conflict() {
        let err = InternalError::ledger_conflict("dummy#1");

        assert!(err.is_conflict());
        assert_eq!(err.origin, ErrorOrigin::Ledger);
        assert!(matches!(
            err.detail,
            Some(ErrorDetail::Store(StoreError::Conflict { .. }))
        ));
    }

    #[test]
    fn invariant_on_ledger_carries_store_detail() {
        let err = InternalError::ledger_invariant("two entries for one host");

        assert_eq!(err.class, ErrorClass::InvariantViolation);
        assert!(matches!(
            err.detail,
            Some(ErrorDetail::Store(StoreError::InvariantViolation { .. }))
        ));
    }

    #[test]
    fn hook_error_maps_to_hook_origin() {
        let err: InternalError = HookError::new("tests::Dummy", "boom").into();

        assert_eq!(err.origin, ErrorOrigin::Hook);
        assert_eq!(err.class, ErrorClass::Internal);
        assert_eq!(
            err.display_with_class(),
            "hook:internal: completion hook failed for tests::Dummy: boom"
        );
    }

    #[test]
    fn not_found_detail_is_detected() {
        assert!(InternalError::store_not_found("dummy#9").is_not_found());
        assert!(InternalError::ledger_not_found("dummy#9").is_not_found());
        assert!(!InternalError::store_conflict("dummy#9").is_not_found());
    }
}
