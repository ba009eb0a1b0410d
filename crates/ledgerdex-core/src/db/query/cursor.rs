use crate::{db::ledger::LedgerCursor, error::InternalError};

///
/// CursorGuard
///
/// Owns a ledger cursor and closes it exactly once: on exhaustion, on the
/// first ledger error, on explicit `close`, or on drop.
///

pub(crate) struct CursorGuard<'a, T> {
    cursor: Option<Box<dyn LedgerCursor<T> + 'a>>,
}

impl<'a, T> CursorGuard<'a, T> {
    pub(crate) fn new(cursor: Box<dyn LedgerCursor<T> + 'a>) -> Self {
        Self {
            cursor: Some(cursor),
        }
    }

    /// Next raw item. Ends (and releases) after the first ledger error.
    pub(crate) fn next_item(&mut self) -> Option<Result<T, InternalError>> {
        let cursor = self.cursor.as_mut()?;

        match cursor.next() {
            Some(Ok(item)) => Some(Ok(item)),
            Some(Err(err)) => {
                self.release();
                Some(Err(err.into()))
            }
            None => match self.close() {
                Ok(()) => None,
                Err(err) => Some(Err(err)),
            },
        }
    }

    pub(crate) fn close(&mut self) -> Result<(), InternalError> {
        if let Some(mut cursor) = self.cursor.take() {
            cursor.close()?;
        }

        Ok(())
    }

    /// Close, logging instead of returning a close failure.
    pub(crate) fn release(&mut self) {
        if let Err(err) = self.close() {
            tracing::warn!(target: "ledgerdex", error = %err, "ledger cursor close failed");
        }
    }
}

impl<T> Drop for CursorGuard<'_, T> {
    fn drop(&mut self) {
        self.release();
    }
}
