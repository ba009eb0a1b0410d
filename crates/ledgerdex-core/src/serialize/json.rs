use crate::serialize::SerializeError;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{from_slice, to_vec};

/// Serialize a value into compact JSON bytes.
pub(super) fn serialize<T>(t: &T) -> Result<Vec<u8>, SerializeError>
where
    T: Serialize,
{
    to_vec(t).map_err(|e| SerializeError::Serialize(e.to_string()))
}

/// Deserialize JSON bytes into a value.
///
/// Leading and trailing NUL bytes are stripped first; some ledgers pad
/// stored values with them.
pub(super) fn deserialize_bounded<T>(bytes: &[u8], max_bytes: usize) -> Result<T, SerializeError>
where
    T: DeserializeOwned,
{
    let trimmed = trim_nul(bytes);
    if trimmed.len() > max_bytes {
        return Err(SerializeError::DeserializeSizeLimitExceeded {
            len: trimmed.len(),
            max_bytes,
        });
    }

    from_slice(trimmed).map_err(|e| SerializeError::Deserialize(e.to_string()))
}

fn trim_nul(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
    let end = bytes.iter().rposition(|&b| b != 0).map_or(start, |pos| pos + 1);

    &bytes[start..end]
}
