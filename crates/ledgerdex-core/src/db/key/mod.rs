//! Module: key
//! Responsibility: composite-key construction, parsing and prefix-scan bounds.
//! Does not own: which attributes are indexed or when entries are written.
//! Boundary: the only module that knows the physical key layout.
//!
//! Layout: `NS name SEP (attr SEP)*`, where `NS` and `SEP` are both U+0000.
//! Every composite key therefore sorts before any plain record id, and keys
//! sharing an attribute prefix are contiguous in ledger order.

mod error;


pub use error::KeyCodecError;

use derive_more::{Deref, Display};

///
/// Constants
///

/// First character of every composite key.
pub const NAMESPACE: char = '\u{0}';

/// Terminates the index name and every attribute.
pub const SEPARATOR: char = '\u{0}';

/// Largest scalar value; appended to a prefix to form its exclusive upper bound.
pub const MAX_RUNE: char = char::MAX;

///
/// CompositeKey
///
/// One physical ledger key encoding an index name plus ordered attributes.
/// Construction through [`CompositeKey::encode`] guarantees decodability.
///

#[derive(Clone, Debug, Deref, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct CompositeKey(String);

impl CompositeKey {
    /// Encode an index name and attributes into a composite key.
    pub fn encode<S: AsRef<str>>(
        index_name: &str,
        attributes: &[S],
    ) -> Result<Self, KeyCodecError> {
        validate_index_name(index_name)?;

        let mut capacity = 2 + index_name.len();
        for attribute in attributes {
            capacity += attribute.as_ref().len() + 1;
        }

        let mut key = String::with_capacity(capacity);
        key.push(NAMESPACE);
        key.push_str(index_name);
        key.push(SEPARATOR);

        for (position, attribute) in attributes.iter().enumerate() {
            let attribute = attribute.as_ref();
            validate_attribute(attribute, position)?;
            key.push_str(attribute);
            key.push(SEPARATOR);
        }

        Ok(Self(key))
    }

    /// Wrap a key read back from the ledger without validating it.
    ///
    /// Use [`CompositeKey::decode`] before trusting its structure.
    #[must_use]
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Split this key into its index name and attributes.
    pub fn decode(&self) -> Result<DecodedKey, KeyCodecError> {
        decode(&self.0)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }

    /// Exclusive upper bound covering every key that extends this one.
    #[must_use]
    pub fn range_end(&self) -> String {
        let mut end = String::with_capacity(self.0.len() + MAX_RUNE.len_utf8());
        end.push_str(&self.0);
        end.push(MAX_RUNE);

        end
    }
}

impl AsRef<str> for CompositeKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

///
/// DecodedKey
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DecodedKey {
    pub index_name: String,
    pub attributes: Vec<String>,
}

/// True when a raw ledger key lives in the composite-key namespace.
#[must_use]
pub fn is_composite(key: &str) -> bool {
    key.starts_with(NAMESPACE)
}

/// Encode an index name and attributes; see [`CompositeKey::encode`].
pub fn encode<S: AsRef<str>>(
    index_name: &str,
    attributes: &[S],
) -> Result<CompositeKey, KeyCodecError> {
    CompositeKey::encode(index_name, attributes)
}

/// Decode a raw ledger key into its index name and attributes.
pub fn decode(key: &str) -> Result<DecodedKey, KeyCodecError> {
    let Some(body) = key.strip_prefix(NAMESPACE) else {
        return Err(KeyCodecError::MissingNamespace);
    };
    let Some(body) = body.strip_suffix(SEPARATOR) else {
        return Err(KeyCodecError::MissingTerminator);
    };

    let mut parts = body.split(SEPARATOR);
    let index_name = parts.next().unwrap_or_default();
    if index_name.is_empty() {
        return Err(KeyCodecError::EmptyIndexName);
    }
    if index_name.contains(MAX_RUNE) {
        return Err(KeyCodecError::ReservedInIndexName);
    }

    let mut attributes = Vec::new();
    for (position, attribute) in parts.enumerate() {
        if attribute.contains(MAX_RUNE) {
            return Err(KeyCodecError::ReservedInAttribute { position });
        }
        attributes.push(attribute.to_string());
    }

    Ok(DecodedKey {
        index_name: index_name.to_string(),
        attributes,
    })
}

/// Half-open `[start, end)` bounds covering every key of `index_name` whose
/// attributes begin with `prefix`.
pub fn prefix_bounds<S: AsRef<str>>(
    index_name: &str,
    prefix: &[S],
) -> Result<(CompositeKey, String), KeyCodecError> {
    let start = CompositeKey::encode(index_name, prefix)?;
    let end = start.range_end();

    Ok((start, end))
}

fn validate_index_name(index_name: &str) -> Result<(), KeyCodecError> {
    if index_name.is_empty() {
        return Err(KeyCodecError::EmptyIndexName);
    }
    if index_name.contains(SEPARATOR) || index_name.contains(MAX_RUNE) {
        return Err(KeyCodecError::ReservedInIndexName);
    }

    Ok(())
}

fn validate_attribute(attribute: &str, position: usize) -> Result<(), KeyCodecError> {
    if attribute.contains(SEPARATOR) || attribute.contains(MAX_RUNE) {
        return Err(KeyCodecError::ReservedInAttribute { position });
    }

    Ok(())
}
