use serde::{Serialize, de::DeserializeOwned};
use std::fmt::Debug;

///
/// Record
///
/// A typed entity stored as one JSON document under its primary key.
///
/// `index_value` exposes the fields index declarations may derive entries
/// from; `None` means the record type has no such attribute.
///

pub trait Record: Clone + Debug + Serialize + DeserializeOwned {
    /// Stable name of the record type, used in logs and metrics.
    const PATH: &'static str;

    /// Primary key. Immutable once created.
    fn id(&self) -> &str;

    fn index_value(&self, attribute: &str) -> Option<String>;
}
