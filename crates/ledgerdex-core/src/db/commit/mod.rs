//! Commit protocol closing the gap between a primary write and its index
//! entries.
//!
//! Contract:
//! - `commit` persists a marker listing every physical write of one mutation,
//!   applies the writes in order, then clears the marker.
//! - A marker still present at the next operation means the previous mutation
//!   stopped part-way; `ensure_recovered` replays it. Every op is an
//!   idempotent put or delete, so replaying completed ops is harmless.
//! - The marker is authoritative: recovery never re-derives index keys.

mod marker;
mod recovery;

pub use marker::{CommitKind, CommitMarker, CommitOp};
pub use recovery::ensure_recovered;

use crate::{
    db::ledger::Ledger,
    error::{ErrorOrigin, InternalError},
};

/// Reserved composite key holding the in-flight marker.
///
/// Encodes as index name `ledgerdex~commit` with no attributes, so primary
/// scans skip it and no declared index may share the name.
pub const COMMIT_MARKER_KEY: &str = "\u{0}ledgerdex~commit\u{0}";

/// Index name reserved by [`COMMIT_MARKER_KEY`].
pub const COMMIT_MARKER_INDEX: &str = "ledgerdex~commit";

/// Maximum encoded marker size accepted on decode.
pub const MAX_COMMIT_BYTES: usize = 16 * 1024 * 1024;

/// True when an interrupted mutation left a marker behind.
pub fn commit_marker_present<L: Ledger + ?Sized>(ledger: &L) -> Result<bool, InternalError> {
    Ok(ledger
        .get_state(COMMIT_MARKER_KEY)?
        .is_some_and(|bytes| !bytes.is_empty()))
}

/// Run one mutation under a marker.
///
/// On an apply failure the marker stays in place and the error is returned;
/// the next `ensure_recovered` completes the mutation.
pub(crate) fn commit<L: Ledger + ?Sized>(
    ledger: &mut L,
    marker: &CommitMarker,
) -> Result<(), InternalError> {
    if commit_marker_present(ledger)? {
        return Err(InternalError::internal(
            ErrorOrigin::Commit,
            "commit marker already present before begin",
        ));
    }

    let raw = marker.encode()?;
    ledger.put_state(COMMIT_MARKER_KEY, &raw)?;

    // COMMIT WINDOW: a failure from here on is completed by recovery.
    apply_ops(ledger, &marker.ops)?;

    ledger.del_state(COMMIT_MARKER_KEY)?;

    Ok(())
}

/// Apply ops in order; the first failure aborts.
pub(crate) fn apply_ops<L: Ledger + ?Sized>(
    ledger: &mut L,
    ops: &[CommitOp],
) -> Result<(), InternalError> {
    for op in ops {
        match &op.value {
            Some(value) => ledger.put_state(&op.key, value)?,
            None => ledger.del_state(&op.key)?,
        }
    }

    Ok(())
}
