use crate::db::ledger::LedgerError;
use std::fmt;
use thiserror::Error as ThisError;

///
/// InternalError
///
/// Structured runtime error with a stable classification.
/// The class is what callers branch on; the message is for humans.
///

#[derive(Debug, ThisError)]
#[error("{message}")]
pub struct InternalError {
    pub class: ErrorClass,
    pub origin: ErrorOrigin,
    pub message: String,

    /// Optional structured error detail.
    pub detail: Option<ErrorDetail>,
}

impl InternalError {
    #[must_use]
    pub fn new(class: ErrorClass, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            class,
            origin,
            message: message.into(),
            detail: None,
        }
    }

    /// Construct a not-found error for a primary key.
    pub fn not_found(origin: ErrorOrigin, key: impl Into<String>) -> Self {
        let key = key.into();

        Self {
            class: ErrorClass::NotFound,
            origin,
            message: format!("record does not exist: {key}"),
            detail: Some(ErrorDetail::Store(StoreError::NotFound { key })),
        }
    }

    /// Construct a not-found error scoped to a private partition.
    pub fn private_not_found(partition: impl Into<String>, key: impl Into<String>) -> Self {
        let (partition, key) = (partition.into(), key.into());

        Self {
            class: ErrorClass::NotFound,
            origin: ErrorOrigin::Private,
            message: format!("partition '{partition}': record does not exist: {key}"),
            detail: Some(ErrorDetail::Store(StoreError::PrivateNotFound {
                partition,
                key,
            })),
        }
    }

    /// Construct an already-exists error for a primary key.
    pub fn already_exists(origin: ErrorOrigin, key: impl Into<String>) -> Self {
        let key = key.into();

        Self {
            class: ErrorClass::AlreadyExists,
            origin,
            message: format!("record already exists: {key}"),
            detail: Some(ErrorDetail::Store(StoreError::AlreadyExists { key })),
        }
    }

    pub(crate) fn malformed_key(origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self::new(ErrorClass::MalformedKey, origin, message)
    }

    pub fn validation(origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Validation, origin, message)
    }

    pub(crate) fn corruption(origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Corruption, origin, message)
    }

    pub(crate) fn internal(origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Internal, origin, message)
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self.class, ErrorClass::NotFound)
    }

    #[must_use]
    pub const fn is_already_exists(&self) -> bool {
        matches!(self.class, ErrorClass::AlreadyExists)
    }

    #[must_use]
    pub const fn is_malformed_key(&self) -> bool {
        matches!(self.class, ErrorClass::MalformedKey)
    }

    #[must_use]
    pub const fn is_store_unavailable(&self) -> bool {
        matches!(self.class, ErrorClass::StoreUnavailable)
    }

    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self.class, ErrorClass::Validation)
    }

    #[must_use]
    pub const fn is_corruption(&self) -> bool {
        matches!(self.class, ErrorClass::Corruption)
    }

    #[must_use]
    pub fn display_with_class(&self) -> String {
        format!("{}:{}: {}", self.origin, self.class, self.message)
    }
}

// Ledger failures are infrastructure faults; the message is kept verbatim.
impl From<LedgerError> for InternalError {
    fn from(err: LedgerError) -> Self {
        Self {
            class: ErrorClass::StoreUnavailable,
            origin: ErrorOrigin::Ledger,
            message: err.to_string(),
            detail: Some(ErrorDetail::Ledger(err)),
        }
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
    Ledger(LedgerError),
}

///
/// StoreError
///
/// Record-level structured detail.
/// Never returned directly; always wrapped in [`ErrorDetail::Store`].
///

#[derive(Debug, ThisError)]
pub enum StoreError {
    #[error("key not found: {key}")]
    NotFound { key: String },

    #[error("key already exists: {key}")]
    AlreadyExists { key: String },

    #[error("key not found in partition '{partition}': {key}")]
    PrivateNotFound { partition: String, key: String },
}

///
/// ErrorClass
/// Error taxonomy callers branch on.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    AlreadyExists,
    NotFound,
    MalformedKey,
    StoreUnavailable,
    Validation,
    Corruption,
    Internal,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::AlreadyExists => "already_exists",
            Self::NotFound => "not_found",
            Self::MalformedKey => "malformed_key",
            Self::StoreUnavailable => "store_unavailable",
            Self::Validation => "validation",
            Self::Corruption => "corruption",
            Self::Internal => "internal",
        };
        write!(f, "{label}")
    }
}

///
/// ErrorOrigin
/// Which layer raised the error.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorOrigin {
    Codec,
    Index,
    Record,
    Query,
    Private,
    Commit,
    Ledger,
    Serialize,
    Config,
    Interface,
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Codec => "codec",
            Self::Index => "index",
            Self::Record => "record",
            Self::Query => "query",
            Self::Private => "private",
            Self::Commit => "commit",
            Self::Ledger => "ledger",
            Self::Serialize => "serialize",
            Self::Config => "config",
            Self::Interface => "interface",
        };
        write!(f, "{label}")
    }
}

///
/// TESTS
///
