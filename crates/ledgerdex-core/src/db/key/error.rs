use crate::error::{ErrorOrigin, InternalError};
use thiserror::Error as ThisError;

///
/// KeyCodecError
///
/// Stable reasons a composite key could not be built or parsed.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum KeyCodecError {
    #[error("malformed composite key: empty index name")]
    EmptyIndexName,

    #[error("malformed composite key: index name contains a reserved character")]
    ReservedInIndexName,

    #[error("malformed composite key: attribute {position} contains a reserved character")]
    ReservedInAttribute { position: usize },

    #[error("malformed composite key: missing namespace prefix")]
    MissingNamespace,

    #[error("malformed composite key: missing terminator")]
    MissingTerminator,
}

impl From<KeyCodecError> for InternalError {
    fn from(err: KeyCodecError) -> Self {
        Self::malformed_key(ErrorOrigin::Codec, err.to_string())
    }
}
