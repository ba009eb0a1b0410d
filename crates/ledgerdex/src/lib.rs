//! ledgerdex: typed records with secondary indexes over an ordered,
//! versioned ledger.
//!
//! ## Crate layout
//! - `core`: key codec, index manager, record store, lazy queries, private
//!   partitions, commit markers and the in-memory ledger.
//! - `error`: the public error taxonomy callers match on.
//! - `router`: operation-name dispatch for the asset operations.
//!
//! The `prelude` module carries the names an embedding usually needs.

pub use ledgerdex_core as core;

pub mod error;
pub mod router;

pub use error::{Error, ErrorKind, ErrorOrigin};
pub use router::{Handler, Router};

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

///
/// Prelude
///

pub mod prelude {
    pub use crate::{
        core::prelude::*,
        error::{Error, ErrorKind},
        router::Router,
    };
}
