use crate::{
    db::commit::MAX_COMMIT_BYTES,
    error::{ErrorOrigin, InternalError},
    serialize::{deserialize_bounded, serialize},
};
use serde::{Deserialize, Serialize};
use std::fmt;
use xxhash_rust::xxh3::xxh3_64;

const CHECKSUM_BYTES: usize = 8;

///
/// CommitKind
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitKind {
    Create,
    Update,
    Delete,
}

impl fmt::Display for CommitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        };

        f.write_str(label)
    }
}

///
/// CommitOp
///
/// One physical write: a put when `value` is set, a delete otherwise.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CommitOp {
    pub key: String,
    pub value: Option<Vec<u8>>,
}

impl CommitOp {
    #[must_use]
    pub fn put(key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: Some(value.into()),
        }
    }

    #[must_use]
    pub fn delete(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: None,
        }
    }

    #[must_use]
    pub const fn is_delete(&self) -> bool {
        self.value.is_none()
    }
}

///
/// CommitMarker
///
/// Persisted mutation plan. Recovery replays `ops` exactly as stored.
/// Unknown fields are rejected as corruption.
///
/// Stored form: 8-byte big-endian xxh3-64 of the JSON body, then the body.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CommitMarker {
    pub path: String,
    pub id: String,
    pub kind: CommitKind,
    pub ops: Vec<CommitOp>,
}

impl CommitMarker {
    #[must_use]
    pub fn new(
        path: impl Into<String>,
        id: impl Into<String>,
        kind: CommitKind,
        ops: Vec<CommitOp>,
    ) -> Self {
        Self {
            path: path.into(),
            id: id.into(),
            kind,
            ops,
        }
    }

    pub(crate) fn encode(&self) -> Result<Vec<u8>, InternalError> {
        let body = serialize(self)?;
        if body.len() > MAX_COMMIT_BYTES {
            return Err(InternalError::validation(
                ErrorOrigin::Commit,
                format!(
                    "commit marker exceeds max size: {} bytes (limit {MAX_COMMIT_BYTES})",
                    body.len()
                ),
            ));
        }

        let mut raw = Vec::with_capacity(CHECKSUM_BYTES + body.len());
        raw.extend_from_slice(&xxh3_64(&body).to_be_bytes());
        raw.extend_from_slice(&body);

        Ok(raw)
    }

    pub(crate) fn decode(raw: &[u8]) -> Result<Self, InternalError> {
        if raw.len() < CHECKSUM_BYTES {
            return Err(commit_corruption(format!(
                "commit marker truncated: {} bytes",
                raw.len()
            )));
        }

        let (checksum, body) = raw.split_at(CHECKSUM_BYTES);
        let mut expected = [0u8; CHECKSUM_BYTES];
        expected.copy_from_slice(checksum);
        let expected = u64::from_be_bytes(expected);
        let actual = xxh3_64(body);
        if expected != actual {
            return Err(commit_corruption(format!(
                "commit marker checksum mismatch: stored {expected:016x}, computed {actual:016x}"
            )));
        }

        deserialize_bounded(body, MAX_COMMIT_BYTES)
            .map_err(|err| commit_corruption(format!("commit marker decode failed: {err}")))
    }
}

fn commit_corruption(message: String) -> InternalError {
    InternalError::corruption(ErrorOrigin::Commit, message)
}
