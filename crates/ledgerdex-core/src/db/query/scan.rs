use crate::{
    db::{
        key::{CompositeKey, is_composite},
        ledger::{KeyValue, Ledger},
        query::cursor::CursorGuard,
    },
    error::{ErrorOrigin, InternalError},
    model::record::Record,
    obs::sink::{self, MetricsEvent, Span},
    serialize::deserialize,
};
use std::{iter::FusedIterator, marker::PhantomData};

///
/// RecordScan
///
/// Lazy `(key, record)` sequence over a primary-namespace cursor.
/// Composite keys are skipped; an undecodable payload is a `Corruption` item.
///

pub struct RecordScan<'a, R: Record> {
    cursor: CursorGuard<'a, KeyValue>,
    span: Span,
    _marker: PhantomData<R>,
}

impl<'a, R: Record> RecordScan<'a, R> {
    pub(crate) const fn new(cursor: CursorGuard<'a, KeyValue>, span: Span) -> Self {
        Self {
            cursor,
            span,
            _marker: PhantomData,
        }
    }

    /// Release the cursor now instead of at drop.
    pub fn close(&mut self) -> Result<(), InternalError> {
        self.cursor.close()
    }
}

impl<R: Record> Iterator for RecordScan<'_, R> {
    type Item = Result<(String, R), InternalError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let kv = match self.cursor.next_item()? {
                Ok(kv) => kv,
                Err(err) => return Some(Err(err)),
            };
            if is_composite(&kv.key) {
                continue;
            }

            self.span.add_row();
            return Some(decode_row(kv));
        }
    }
}

impl<R: Record> FusedIterator for RecordScan<'_, R> {}

///
/// FreeQuery
///
/// Rows of a ledger-native query, passed through in ledger order with their
/// keys untouched. Only the payload is decoded.
///

pub struct FreeQuery<'a, R: Record> {
    cursor: CursorGuard<'a, KeyValue>,
    span: Span,
    _marker: PhantomData<R>,
}

impl<'a, R: Record> FreeQuery<'a, R> {
    pub(crate) const fn new(cursor: CursorGuard<'a, KeyValue>, span: Span) -> Self {
        Self {
            cursor,
            span,
            _marker: PhantomData,
        }
    }

    pub fn close(&mut self) -> Result<(), InternalError> {
        self.cursor.close()
    }
}

impl<R: Record> Iterator for FreeQuery<'_, R> {
    type Item = Result<(String, R), InternalError>;

    fn next(&mut self) -> Option<Self::Item> {
        let kv = match self.cursor.next_item()? {
            Ok(kv) => kv,
            Err(err) => return Some(Err(err)),
        };
        self.span.add_row();

        Some(decode_row(kv))
    }
}

impl<R: Record> FusedIterator for FreeQuery<'_, R> {}

fn decode_row<R: Record>(kv: KeyValue) -> Result<(String, R), InternalError> {
    let record = deserialize(&kv.value)?;

    Ok((kv.key, record))
}

///
/// IndexScan
///
/// Lazy record sequence resolved through index entries.
///
/// Each entry's last attribute is the record id. Entries whose record is gone
/// are skipped; entries that do not decode are `MalformedKey` items. A ledger
/// failure while resolving a record ends the scan.
///

pub struct IndexScan<'a, L: Ledger, R: Record> {
    ledger: &'a L,
    cursor: CursorGuard<'a, KeyValue>,
    span: Span,
    _marker: PhantomData<R>,
}

impl<'a, L: Ledger, R: Record> IndexScan<'a, L, R> {
    pub(crate) const fn new(ledger: &'a L, cursor: CursorGuard<'a, KeyValue>, span: Span) -> Self {
        Self {
            ledger,
            cursor,
            span,
            _marker: PhantomData,
        }
    }

    pub fn close(&mut self) -> Result<(), InternalError> {
        self.cursor.close()
    }

    fn resolve(&self, kv: &KeyValue) -> Result<Option<R>, InternalError> {
        let decoded = CompositeKey::from_raw(kv.key.as_str()).decode()?;
        if decoded.attributes.len() < 2 {
            return Err(InternalError::malformed_key(
                ErrorOrigin::Query,
                format!(
                    "index entry {:?} has {} attributes, expected at least 2",
                    kv.key,
                    decoded.attributes.len()
                ),
            ));
        }
        let Some(id) = decoded.attributes.last() else {
            return Ok(None);
        };

        match self.ledger.get_state(id)? {
            Some(bytes) if !bytes.is_empty() => Ok(Some(deserialize(&bytes)?)),
            _ => {
                tracing::debug!(
                    target: "ledgerdex",
                    record = R::PATH,
                    index = %decoded.index_name,
                    id = %id,
                    "skipping dangling index entry"
                );
                sink::record(MetricsEvent::DanglingIndexSkipped {
                    record_path: R::PATH,
                });

                Ok(None)
            }
        }
    }
}

impl<L: Ledger, R: Record> Iterator for IndexScan<'_, L, R> {
    type Item = Result<R, InternalError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let kv = match self.cursor.next_item()? {
                Ok(kv) => kv,
                Err(err) => return Some(Err(err)),
            };

            match self.resolve(&kv) {
                Ok(Some(record)) => {
                    self.span.add_row();
                    return Some(Ok(record));
                }
                Ok(None) => {}
                Err(err) => {
                    if err.is_store_unavailable() {
                        self.cursor.release();
                    }
                    return Some(Err(err));
                }
            }
        }
    }
}

impl<L: Ledger, R: Record> FusedIterator for IndexScan<'_, L, R> {}
