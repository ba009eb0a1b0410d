use crate::db::{
    commit::COMMIT_MARKER_INDEX,
    key::{KeyCodecError, encode},
};
use derive_more::Deref;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashSet,
    fmt::{self, Display},
};
use thiserror::Error as ThisError;

///
/// IndexDeclaration
///
/// Maps a logical query name to the physical index it reads and the record
/// attribute its entries are derived from.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct IndexDeclaration {
    pub query: String,
    pub index: String,
    pub attribute: String,
}

impl IndexDeclaration {
    #[must_use]
    pub fn new(
        query: impl Into<String>,
        index: impl Into<String>,
        attribute: impl Into<String>,
    ) -> Self {
        Self {
            query: query.into(),
            index: index.into(),
            attribute: attribute.into(),
        }
    }
}

impl Display for IndexDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} => {}({})", self.query, self.index, self.attribute)
    }
}

///
/// IndexTableError
///

#[derive(Debug, Eq, PartialEq, ThisError)]
pub enum IndexTableError {
    #[error("index declaration has an empty {field}")]
    EmptyField { field: &'static str },

    #[error("duplicate index query name '{0}'")]
    DuplicateQuery(String),

    #[error("duplicate index name '{0}'")]
    DuplicateIndex(String),

    #[error("index name '{0}' is reserved")]
    ReservedIndexName(String),

    #[error("index name '{name}' cannot be encoded: {source}")]
    InvalidIndexName {
        name: String,
        source: KeyCodecError,
    },
}

///
/// IndexTable
///
/// Ordered set of index declarations for one record type.
/// Iteration follows declaration order, which is also write order.
///

#[derive(Clone, Debug, Default, Deref, Deserialize, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct IndexTable(Vec<IndexDeclaration>);

impl IndexTable {
    /// Build a table, rejecting empty or duplicate names.
    pub fn new(declarations: Vec<IndexDeclaration>) -> Result<Self, IndexTableError> {
        let table = Self(declarations);
        table.validate()?;

        Ok(table)
    }

    /// The asset indexes: by type and by owner.
    #[must_use]
    pub fn asset_defaults() -> Self {
        Self(vec![
            IndexDeclaration::new("AssetType", "DemoAsset~Type", "type"),
            IndexDeclaration::new("AssetOwner", "DemoAsset~Owner", "owner"),
        ])
    }

    pub fn validate(&self) -> Result<(), IndexTableError> {
        let mut queries = HashSet::new();
        let mut indexes = HashSet::new();

        for decl in &self.0 {
            for (field, value) in [
                ("query", &decl.query),
                ("index", &decl.index),
                ("attribute", &decl.attribute),
            ] {
                if value.is_empty() {
                    return Err(IndexTableError::EmptyField { field });
                }
            }

            if decl.index == COMMIT_MARKER_INDEX {
                return Err(IndexTableError::ReservedIndexName(decl.index.clone()));
            }
            encode::<&str>(&decl.index, &[]).map_err(|source| {
                IndexTableError::InvalidIndexName {
                    name: decl.index.clone(),
                    source,
                }
            })?;

            if !queries.insert(decl.query.as_str()) {
                return Err(IndexTableError::DuplicateQuery(decl.query.clone()));
            }
            if !indexes.insert(decl.index.as_str()) {
                return Err(IndexTableError::DuplicateIndex(decl.index.clone()));
            }
        }

        Ok(())
    }

    /// Find a declaration by query name, physical index name, or the
    /// attribute it reads. An attribute shared by several declarations
    /// resolves to none of them.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<&IndexDeclaration> {
        self.0
            .iter()
            .find(|decl| decl.query == name)
            .or_else(|| self.0.iter().find(|decl| decl.index == name))
            .or_else(|| self.resolve_attribute(name))
    }

    fn resolve_attribute(&self, attribute: &str) -> Option<&IndexDeclaration> {
        let mut matches = self.0.iter().filter(|decl| decl.attribute == attribute);
        let decl = matches.next()?;

        matches.next().is_none().then_some(decl)
    }
}

///
/// TESTS
///
