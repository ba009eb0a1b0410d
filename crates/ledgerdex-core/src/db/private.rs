//! Private partition access.
//!
//! Partitions are separate namespaces held by the ledger. Nothing written
//! here is indexed, scanned or covered by commit markers.

use crate::{
    db::{Db, ledger::Ledger},
    error::{ErrorOrigin, InternalError},
    model::record::Record,
    obs::sink::{OpKind, Span},
    serialize::{deserialize, serialize},
};

/// Metrics path for untyped partition payloads.
const RAW_PATH: &str = "private";

///
/// PrivateStore
///

pub struct PrivateStore<'a, L: Ledger> {
    db: &'a mut Db<L>,
}

impl<'a, L: Ledger> PrivateStore<'a, L> {
    pub(crate) const fn new(db: &'a mut Db<L>) -> Self {
        Self { db }
    }

    /// Raw bytes under `(partition, id)`; `NotFound` naming both when absent.
    pub fn get_private(&self, partition: &str, id: &str) -> Result<Vec<u8>, InternalError> {
        let mut span = Span::new(OpKind::PrivateGet, RAW_PATH);
        let bytes = self.load(partition, id)?;
        span.set_rows(1);

        Ok(bytes)
    }

    pub fn put_private(
        &mut self,
        partition: &str,
        id: &str,
        bytes: &[u8],
    ) -> Result<(), InternalError> {
        let mut span = Span::new(OpKind::PrivatePut, RAW_PATH);
        self.store(partition, id, bytes)?;
        span.set_rows(1);

        Ok(())
    }

    /// Decode a record stored with [`Self::put_private_record`].
    pub fn get_private_record<R: Record>(
        &self,
        partition: &str,
        id: &str,
    ) -> Result<R, InternalError> {
        let mut span = Span::new(OpKind::PrivateGet, R::PATH);
        let record = deserialize(&self.load(partition, id)?)?;
        span.set_rows(1);

        Ok(record)
    }

    /// Store a record as JSON under its own id, unindexed.
    pub fn put_private_record<R: Record>(
        &mut self,
        partition: &str,
        record: &R,
    ) -> Result<(), InternalError> {
        let mut span = Span::new(OpKind::PrivatePut, R::PATH);
        let bytes = serialize(record)?;
        self.store(partition, record.id(), &bytes)?;
        span.set_rows(1);

        Ok(())
    }

    fn load(&self, partition: &str, id: &str) -> Result<Vec<u8>, InternalError> {
        validate_location(partition, id)?;

        match self.db.ledger.get_private_data(partition, id)? {
            Some(bytes) if !bytes.is_empty() => Ok(bytes),
            _ => Err(InternalError::private_not_found(partition, id)),
        }
    }

    fn store(&mut self, partition: &str, id: &str, bytes: &[u8]) -> Result<(), InternalError> {
        validate_location(partition, id)?;
        self.db.ledger.put_private_data(partition, id, bytes)?;
        self.db.debug_log(format!(
            "put private (partition={partition}, id={id}, bytes={})",
            bytes.len()
        ));

        Ok(())
    }
}

fn validate_location(partition: &str, id: &str) -> Result<(), InternalError> {
    if partition.is_empty() {
        return Err(InternalError::validation(
            ErrorOrigin::Private,
            "private partition name must not be empty",
        ));
    }
    if id.is_empty() {
        return Err(InternalError::validation(
            ErrorOrigin::Private,
            "private record id must not be empty",
        ));
    }

    Ok(())
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use crate::{
        config::EngineConfig,
        db::{Db, ledger::MemoryLedger},
        error::{ErrorDetail, StoreError},
        model::asset::Asset,
    };

    fn db() -> Db<MemoryLedger> {
        Db::new(MemoryLedger::new(), EngineConfig::default()).expect("config should validate")
    }

    #[test]
    fn put_then_get_round_trips_bytes() {
        let mut db = db();
        let mut private = db.private();

        private
            .put_private("collectionMarbles", "m1", b"secret")
            .expect("put should succeed");

        assert_eq!(
            private
                .get_private("collectionMarbles", "m1")
                .expect("get should succeed"),
            b"secret".to_vec()
        );
    }

    #[test]
    fn missing_entry_names_partition_and_id() {
        let mut db = db();

        let err = db
            .private()
            .get_private("collectionMarbles", "m404")
            .expect_err("missing entry should fail");

        assert!(err.is_not_found());
        assert!(matches!(
            err.detail,
            Some(ErrorDetail::Store(StoreError::PrivateNotFound { ref partition, ref key }))
                if partition == "collectionMarbles" && key == "m404"
        ));
    }

    #[test]
    fn empty_partition_or_id_is_a_validation_error() {
        let mut db = db();
        let mut private = db.private();

        assert!(private.put_private("", "m1", b"x").expect_err("empty partition").is_validation());
        assert!(private.put_private("p", "", b"x").expect_err("empty id").is_validation());
        assert!(private.get_private("", "m1").expect_err("empty partition").is_validation());
    }

    #[test]
    fn private_records_stay_out_of_the_main_namespace() {
        let mut db = db();
        let asset = Asset::new("001", "secret", "food", "cathy", true, "2018-05-25", 0);

        db.private()
            .put_private_record("vault", &asset)
            .expect("put should succeed");

        assert!(db.ledger().is_empty());
        let loaded: Asset = db
            .private()
            .get_private_record("vault", "001")
            .expect("get should succeed");
        assert_eq!(loaded, asset);
        assert!(
            db.records::<Asset>()
                .get("001")
                .expect_err("main namespace should be empty")
                .is_not_found()
        );
    }
}
