//! JSON serialization for record payloads and commit markers.
//!
//! This module is format-level only:
//! - Callers that need a different decode bound use [`deserialize_bounded`].
//! - Ledger-specific value quirks (NUL padding) are stripped before decode.

mod json;

use crate::{
    MAX_RECORD_BYTES,
    error::{ErrorOrigin, InternalError},
};
use serde::{Serialize, de::DeserializeOwned};
use std::fmt;
use thiserror::Error as ThisError;

///
/// SerializeError
///

#[derive(Debug, ThisError)]
pub enum SerializeError {
    #[error("serialize error: {0}")]
    Serialize(String),

    #[error("deserialize error: {0}")]
    Deserialize(String),

    #[error("deserialize size limit exceeded: {len} bytes (limit {max_bytes})")]
    DeserializeSizeLimitExceeded { len: usize, max_bytes: usize },
}

///
/// SerializeErrorKind
///
/// Stable error-kind taxonomy for serializer failures.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SerializeErrorKind {
    Serialize,
    Deserialize,
    DeserializeSizeLimitExceeded,
}

impl SerializeErrorKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Serialize => "serialize",
            Self::Deserialize => "deserialize",
            Self::DeserializeSizeLimitExceeded => "deserialize_size_limit_exceeded",
        }
    }
}

impl fmt::Display for SerializeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl SerializeError {
    /// Return a stable error kind independent of backend error-message text.
    #[must_use]
    pub const fn kind(&self) -> SerializeErrorKind {
        match self {
            Self::Serialize(_) => SerializeErrorKind::Serialize,
            Self::Deserialize(_) => SerializeErrorKind::Deserialize,
            Self::DeserializeSizeLimitExceeded { .. } => {
                SerializeErrorKind::DeserializeSizeLimitExceeded
            }
        }
    }
}

// A payload that cannot be decoded was written by someone else or damaged;
// encoding failures are ours.
impl From<SerializeError> for InternalError {
    fn from(err: SerializeError) -> Self {
        match err.kind() {
            SerializeErrorKind::Serialize => {
                Self::internal(ErrorOrigin::Serialize, err.to_string())
            }
            SerializeErrorKind::Deserialize | SerializeErrorKind::DeserializeSizeLimitExceeded => {
                Self::corruption(ErrorOrigin::Serialize, err.to_string())
            }
        }
    }
}

/// Serialize a value into JSON bytes.
pub fn serialize<T>(value: &T) -> Result<Vec<u8>, SerializeError>
where
    T: Serialize,
{
    json::serialize(value)
}

/// Deserialize a value produced by [`serialize`], bounded by [`MAX_RECORD_BYTES`].
pub fn deserialize<T>(bytes: &[u8]) -> Result<T, SerializeError>
where
    T: DeserializeOwned,
{
    json::deserialize_bounded(bytes, MAX_RECORD_BYTES)
}

/// Deserialize a value produced by [`serialize`], with an explicit size limit.
pub fn deserialize_bounded<T>(bytes: &[u8], max_bytes: usize) -> Result<T, SerializeError>
where
    T: DeserializeOwned,
{
    json::deserialize_bounded(bytes, max_bytes)
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorClass;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq, Serialize)]
    struct Probe {
        id: String,
        n: i64,
    }

    #[test]
    fn nul_padding_is_ignored_on_decode() {
        let mut bytes = vec![0u8, 0u8];
        bytes.extend(serialize(&Probe { id: "a".into(), n: 3 }).expect("probe should encode"));
        bytes.push(0);

        let probe: Probe = deserialize(&bytes).expect("padded probe should decode");
        assert_eq!(probe, Probe { id: "a".into(), n: 3 });
    }

    #[test]
    fn oversized_payload_is_rejected_before_decode() {
        let bytes = serialize(&Probe { id: "abcdef".into(), n: 1 }).expect("probe should encode");
        let err = deserialize_bounded::<Probe>(&bytes, 4).expect_err("limit should apply");

        assert_eq!(err.kind(), SerializeErrorKind::DeserializeSizeLimitExceeded);
    }

    #[test]
    fn decode_failures_map_to_corruption() {
        let err = deserialize::<Probe>(b"{not json").expect_err("garbage should fail");
        let err: InternalError = err.into();

        assert_eq!(err.class, ErrorClass::Corruption);
        assert_eq!(err.origin, ErrorOrigin::Serialize);
    }
}
