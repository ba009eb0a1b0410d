use derive_more::Display;
use ledgerdex_core::error::{ErrorClass, ErrorOrigin as CoreErrorOrigin, InternalError};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

///
/// Error
/// Public error type with a stable kind + origin taxonomy.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize, ThisError)]
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

    /// Rejected caller input at the interface boundary.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, ErrorOrigin::Interface, message)
    }

    #[must_use]
    pub fn is_validation(&self) -> bool {
        self.kind == ErrorKind::Validation
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.kind == ErrorKind::NotFound
    }

    #[must_use]
    pub fn is_already_exists(&self) -> bool {
        self.kind == ErrorKind::AlreadyExists
    }
}

impl From<InternalError> for Error {
    fn from(err: InternalError) -> Self {
        Self::new(err.class.into(), err.origin.into(), err.message)
    }
}

///
/// ErrorKind
/// Public error taxonomy for callers.
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
pub enum ErrorKind {
    AlreadyExists,
    NotFound,
    MalformedKey,
    StoreUnavailable,
    Validation,

    /// The caller cannot remediate this.
    Internal,
}

// Corruption is not actionable by callers; it surfaces as Internal.
impl From<ErrorClass> for ErrorKind {
    fn from(class: ErrorClass) -> Self {
        match class {
            ErrorClass::AlreadyExists => Self::AlreadyExists,
            ErrorClass::NotFound => Self::NotFound,
            ErrorClass::MalformedKey => Self::MalformedKey,
            ErrorClass::StoreUnavailable => Self::StoreUnavailable,
            ErrorClass::Validation => Self::Validation,
            ErrorClass::Corruption | ErrorClass::Internal => Self::Internal,
        }
    }
}

///
/// ErrorOrigin
/// Public origin taxonomy for callers.
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
pub enum ErrorOrigin {
    Codec,
    Commit,
    Config,
    Index,
    Interface,
    Ledger,
    Private,
    Query,
    Record,
    Serialize,
}

impl From<CoreErrorOrigin> for ErrorOrigin {
    fn from(origin: CoreErrorOrigin) -> Self {
        match origin {
            CoreErrorOrigin::Codec => Self::Codec,
            CoreErrorOrigin::Commit => Self::Commit,
            CoreErrorOrigin::Config => Self::Config,
            CoreErrorOrigin::Index => Self::Index,
            CoreErrorOrigin::Interface => Self::Interface,
            CoreErrorOrigin::Ledger => Self::Ledger,
            CoreErrorOrigin::Private => Self::Private,
            CoreErrorOrigin::Query => Self::Query,
            CoreErrorOrigin::Record => Self::Record,
            CoreErrorOrigin::Serialize => Self::Serialize,
        }
    }
}

///
/// TESTS
///
