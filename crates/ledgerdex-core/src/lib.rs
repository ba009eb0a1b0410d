//! Core runtime for ledgerdex: composite keys, secondary indexes, record CRUD
//! and lazy queries layered over an ordered, versioned ledger store.
//!
//! The ledger itself (ordering, commit, durability) is an external
//! collaborator reached through [`db::ledger::Ledger`].

pub mod config;
pub mod db;
pub mod error;
pub mod model;
pub mod obs;
pub mod serialize;

///
/// CONSTANTS
///

/// Maximum encoded size of one record payload accepted by the decoder.
pub const MAX_RECORD_BYTES: usize = 4 * 1024 * 1024;

/// Value stored under every index entry.
///
/// Index entries are markers; the payload lives only under the primary key.
pub const INDEX_SENTINEL: &[u8] = &[0x00];

///
/// Prelude
///
/// Domain vocabulary only.
///

pub mod prelude {
    pub use crate::{
        config::{EngineConfig, UpdatePolicy},
        db::{
            Db,
            key::CompositeKey,
            ledger::{Ledger, MemoryLedger},
            query::HistoryEntry,
        },
        error::InternalError,
        model::{
            asset::Asset,
            index::{IndexDeclaration, IndexTable},
            record::Record,
        },
    };
}
