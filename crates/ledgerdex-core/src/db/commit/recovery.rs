//! Commit recovery.
//!
//! Runs at operation boundaries, before any mutation planning or query
//! execution. A present marker is decoded in full before any op is replayed,
//! so a corrupt marker leaves the ledger untouched.

use crate::{
    db::{
        commit::{COMMIT_MARKER_KEY, CommitMarker, apply_ops},
        ledger::Ledger,
    },
    error::InternalError,
    obs::sink::{self, MetricsEvent},
};

/// Replay and clear a marker left by an interrupted mutation.
///
/// Idempotent: with no marker present this is a single point read.
pub fn ensure_recovered<L: Ledger + ?Sized>(ledger: &mut L) -> Result<(), InternalError> {
    let Some(raw) = ledger.get_state(COMMIT_MARKER_KEY)? else {
        return Ok(());
    };
    if raw.is_empty() {
        return Ok(());
    }

    let marker = CommitMarker::decode(&raw)?;

    tracing::warn!(
        target: "ledgerdex",
        path = %marker.path,
        id = %marker.id,
        kind = %marker.kind,
        ops = marker.ops.len(),
        "replaying interrupted commit"
    );

    apply_ops(ledger, &marker.ops)?;
    ledger.del_state(COMMIT_MARKER_KEY)?;

    sink::record(MetricsEvent::CommitReplayed {
        ops: marker.ops.len() as u64,
    });

    Ok(())
}
