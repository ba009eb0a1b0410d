//! Module: index
//! Responsibility: derive secondary-index entries from records and write or
//! remove them.
//! Does not own: previously stored values. Staleness on update is the record
//! store's concern.
//! Boundary: all index key derivation goes through [`IndexManager::index_keys`].


use crate::{
    INDEX_SENTINEL,
    db::{
        commit::{self, CommitOp},
        key::CompositeKey,
        ledger::Ledger,
    },
    error::{ErrorOrigin, InternalError},
    model::{
        index::{IndexDeclaration, IndexTable},
        record::Record,
    },
};
use std::collections::BTreeSet;

///
/// IndexDelta
///
/// Keys that differ between two snapshots of one record.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct IndexDelta {
    pub removes: Vec<CompositeKey>,
    pub inserts: Vec<CompositeKey>,
}

impl IndexDelta {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.removes.is_empty() && self.inserts.is_empty()
    }
}

///
/// IndexManager
///
/// Stateless over the ledger: holds only the declaration table.
///

#[derive(Clone, Debug)]
pub struct IndexManager {
    table: IndexTable,
}

impl IndexManager {
    #[must_use]
    pub const fn new(table: IndexTable) -> Self {
        Self { table }
    }

    #[must_use]
    pub const fn table(&self) -> &IndexTable {
        &self.table
    }

    /// Find a declaration by query name, index name or unambiguous attribute.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<&IndexDeclaration> {
        self.table.resolve(name)
    }

    /// One `(index, [attribute value, id])` key per declaration, in
    /// declaration order.
    pub fn index_keys<R: Record>(&self, record: &R) -> Result<Vec<CompositeKey>, InternalError> {
        self.table
            .iter()
            .map(|decl| -> Result<CompositeKey, InternalError> {
                let value = record.index_value(&decl.attribute).ok_or_else(|| {
                    InternalError::validation(
                        ErrorOrigin::Index,
                        format!(
                            "index '{}' reads attribute '{}' which {} does not have",
                            decl.index,
                            decl.attribute,
                            R::PATH
                        ),
                    )
                })?;

                Ok(CompositeKey::encode(&decl.index, &[value.as_str(), record.id()])?)
            })
            .collect()
    }

    /// Sentinel writes for every index entry of `record`.
    pub fn put_ops<R: Record>(&self, record: &R) -> Result<Vec<CommitOp>, InternalError> {
        Ok(self
            .index_keys(record)?
            .iter()
            .map(|key| CommitOp::put(key.as_str(), INDEX_SENTINEL))
            .collect())
    }

    /// Removals for every index entry of `record`.
    pub fn delete_ops<R: Record>(&self, record: &R) -> Result<Vec<CommitOp>, InternalError> {
        Ok(self
            .index_keys(record)?
            .iter()
            .map(|key| CommitOp::delete(key.as_str()))
            .collect())
    }

    /// Write every index entry of `record` straight to the ledger, outside
    /// any commit marker. The first failure aborts; entries already written
    /// stay.
    pub fn create_indexes<L, R>(&self, ledger: &mut L, record: &R) -> Result<(), InternalError>
    where
        L: Ledger + ?Sized,
        R: Record,
    {
        commit::apply_ops(ledger, &self.put_ops(record)?)
    }

    /// Remove every index entry `record` derives, outside any commit marker.
    pub fn delete_indexes<L, R>(&self, ledger: &mut L, record: &R) -> Result<(), InternalError>
    where
        L: Ledger + ?Sized,
        R: Record,
    {
        commit::apply_ops(ledger, &self.delete_ops(record)?)
    }

    /// Entries `old` produces that `new` does not, and the reverse.
    pub fn diff<R: Record>(&self, old: &R, new: &R) -> Result<IndexDelta, InternalError> {
        let old_keys = self.index_keys(old)?;
        let new_keys = self.index_keys(new)?;

        let old_set: BTreeSet<_> = old_keys.iter().collect();
        let new_set: BTreeSet<_> = new_keys.iter().collect();

        let removes = old_keys
            .iter()
            .filter(|key| !new_set.contains(key))
            .cloned()
            .collect();
        let inserts = new_keys
            .iter()
            .filter(|key| !old_set.contains(key))
            .cloned()
            .collect();

        Ok(IndexDelta { removes, inserts })
    }
}
