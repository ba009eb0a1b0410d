//! Module: record
//! Responsibility: typed create/update/get/delete over primary keys, keeping
//! index entries in step.
//! Does not own: index key derivation (`db::index`) or the commit protocol
//! (`db::commit`).
//! Boundary: every mutation is planned as a list of physical writes, then
//! handed to the commit window in one piece.


use crate::{
    MAX_RECORD_BYTES,
    config::UpdatePolicy,
    db::{
        Db,
        commit::{self, CommitKind, CommitMarker, CommitOp},
        key::SEPARATOR,
        ledger::Ledger,
    },
    error::{ErrorOrigin, InternalError},
    model::record::Record,
    obs::sink::{self, MetricsEvent, OpKind, Span},
    serialize::{deserialize, serialize},
};
use std::marker::PhantomData;

///
/// RecordStore
///
/// Mutations and point reads for one record type.
///

pub struct RecordStore<'a, L: Ledger, R: Record> {
    db: &'a mut Db<L>,
    _marker: PhantomData<R>,
}

impl<'a, L: Ledger, R: Record> RecordStore<'a, L, R> {
    pub(crate) const fn new(db: &'a mut Db<L>) -> Self {
        Self {
            db,
            _marker: PhantomData,
        }
    }

    // ======================================================================
    // Mutations
    // ======================================================================

    /// Insert a new record; `AlreadyExists` when its id is taken.
    pub fn create(&mut self, record: R) -> Result<R, InternalError> {
        self.db.ensure_recovered()?;
        let mut span = Span::new(OpKind::Create, R::PATH);

        let id = record.id();
        validate_id(id)?;
        let payload = encode_record(&record)?;
        if self.stored_bytes(id)?.is_some() {
            return Err(InternalError::already_exists(ErrorOrigin::Record, id));
        }

        let index_ops = self.db.indexes.put_ops(&record)?;
        let inserts = index_ops.len();
        let mut ops = Vec::with_capacity(1 + inserts);
        ops.push(CommitOp::put(id, payload));
        ops.extend(index_ops);

        self.apply(CommitKind::Create, id, ops)?;
        record_index_delta::<R>(inserts, 0);

        self.db
            .debug_log(format!("create {} (id={id}, indexes={inserts})", R::PATH));
        span.set_rows(1);

        Ok(record)
    }

    /// Overwrite an existing record; `NotFound` when absent.
    ///
    /// Index maintenance follows the configured [`UpdatePolicy`].
    pub fn update(&mut self, record: R) -> Result<R, InternalError> {
        self.db.ensure_recovered()?;
        let mut span = Span::new(OpKind::Update, R::PATH);

        let id = record.id();
        validate_id(id)?;
        let payload = encode_record(&record)?;
        let Some(stored) = self.stored_bytes(id)? else {
            return Err(InternalError::not_found(ErrorOrigin::Record, id));
        };

        let index_ops = self.db.indexes.put_ops(&record)?;
        let inserts = index_ops.len();
        let removes = match self.db.config.update_policy {
            UpdatePolicy::Recreate => Vec::new(),
            UpdatePolicy::Diff => {
                let previous: R = deserialize(&stored)?;
                self.db.indexes.diff(&previous, &record)?.removes
            }
        };

        let mut ops = Vec::with_capacity(1 + removes.len() + inserts);
        ops.push(CommitOp::put(id, payload));
        ops.extend(removes.iter().map(|key| CommitOp::delete(key.as_str())));
        ops.extend(index_ops);

        self.apply(CommitKind::Update, id, ops)?;
        record_index_delta::<R>(inserts, removes.len());

        self.db.debug_log(format!(
            "update {} (id={id}, policy={:?}, removes={}, inserts={inserts})",
            R::PATH,
            self.db.config.update_policy,
            removes.len(),
        ));
        span.set_rows(1);

        Ok(record)
    }

    /// Remove a record and the index entries its stored snapshot derives.
    /// Returns the removed snapshot.
    pub fn delete(&mut self, id: &str) -> Result<R, InternalError> {
        self.db.ensure_recovered()?;
        let mut span = Span::new(OpKind::Delete, R::PATH);

        let Some(stored) = self.stored_bytes(id)? else {
            return Err(InternalError::not_found(ErrorOrigin::Record, id));
        };
        let snapshot: R = deserialize(&stored)?;

        let index_ops = self.db.indexes.delete_ops(&snapshot)?;
        let removes = index_ops.len();
        let mut ops = Vec::with_capacity(1 + removes);
        ops.push(CommitOp::delete(id));
        ops.extend(index_ops);

        self.apply(CommitKind::Delete, id, ops)?;
        record_index_delta::<R>(0, removes);

        self.db
            .debug_log(format!("delete {} (id={id}, indexes={removes})", R::PATH));
        span.set_rows(1);

        Ok(snapshot)
    }

    // ======================================================================
    // Point reads
    // ======================================================================

    /// Load one record; `NotFound` when absent, `Corruption` when the stored
    /// payload does not decode.
    pub fn get(&mut self, id: &str) -> Result<R, InternalError> {
        self.db.ensure_recovered()?;
        let mut span = Span::new(OpKind::Get, R::PATH);

        let Some(stored) = self.stored_bytes(id)? else {
            return Err(InternalError::not_found(ErrorOrigin::Record, id));
        };
        let record = deserialize(&stored)?;
        span.set_rows(1);

        Ok(record)
    }

    pub fn exists(&mut self, id: &str) -> Result<bool, InternalError> {
        self.db.ensure_recovered()?;

        Ok(self.stored_bytes(id)?.is_some())
    }

    // ======================================================================
    // Internals
    // ======================================================================

    // An empty stored value counts as absent.
    fn stored_bytes(&self, id: &str) -> Result<Option<Vec<u8>>, InternalError> {
        let bytes = self.db.ledger.get_state(id)?;

        Ok(bytes.filter(|bytes| !bytes.is_empty()))
    }

    fn apply(
        &mut self,
        kind: CommitKind,
        id: &str,
        ops: Vec<CommitOp>,
    ) -> Result<(), InternalError> {
        if self.db.config.commit_markers {
            let marker = CommitMarker::new(R::PATH, id, kind, ops);
            commit::commit(&mut self.db.ledger, &marker)
        } else {
            commit::apply_ops(&mut self.db.ledger, &ops)
        }
    }
}

fn validate_id(id: &str) -> Result<(), InternalError> {
    if id.is_empty() {
        return Err(InternalError::validation(
            ErrorOrigin::Record,
            "record id must not be empty",
        ));
    }
    if id.contains(SEPARATOR) {
        return Err(InternalError::validation(
            ErrorOrigin::Record,
            format!("record id {id:?} contains the key separator"),
        ));
    }

    Ok(())
}

// Anything past the decode bound could be written but never read back.
fn encode_record<R: Record>(record: &R) -> Result<Vec<u8>, InternalError> {
    let bytes = serialize(record)?;
    if bytes.len() > MAX_RECORD_BYTES {
        return Err(InternalError::validation(
            ErrorOrigin::Record,
            format!(
                "{} '{}' encodes to {} bytes (limit {MAX_RECORD_BYTES})",
                R::PATH,
                record.id(),
                bytes.len()
            ),
        ));
    }

    Ok(bytes)
}

fn record_index_delta<R: Record>(inserts: usize, removes: usize) {
    sink::record(MetricsEvent::IndexDelta {
        record_path: R::PATH,
        inserts: inserts as u64,
        removes: removes as u64,
    });
}
