use crate::model::record::Record;
use serde::{Deserialize, Serialize};

///
/// Asset
///
/// The demo asset tracked by the ledger: an owned, typed item with a flag and
/// two independent notions of time (a free-form date and a Unix timestamp).
///
/// `kind` is upper-cased on construction so type lookups are
/// case-insensitive.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Asset {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub owner: String,
    pub flag: bool,
    #[serde(rename = "updatedDate")]
    pub updated_date: String,
    #[serde(rename = "timeStamp")]
    pub timestamp: i64,
}

impl Asset {
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        kind: &str,
        owner: impl Into<String>,
        flag: bool,
        updated_date: impl Into<String>,
        timestamp: i64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind: normalize_kind(kind),
            owner: owner.into(),
            flag,
            updated_date: updated_date.into(),
            timestamp,
        }
    }
}

/// Canonical form of an asset type for storage and lookup.
#[must_use]
pub fn normalize_kind(kind: &str) -> String {
    kind.to_uppercase()
}

impl Record for Asset {
    const PATH: &'static str = "DemoAsset";

    fn id(&self) -> &str {
        &self.id
    }

    fn index_value(&self, attribute: &str) -> Option<String> {
        let value = match attribute {
            "id" => self.id.clone(),
            "name" => self.name.clone(),
            "type" => self.kind.clone(),
            "owner" => self.owner.clone(),
            "flag" => self.flag.to_string(),
            "updatedDate" => self.updated_date.clone(),
            "timeStamp" => self.timestamp.to_string(),
            _ => return None,
        };

        Some(value)
    }
}

///
/// TESTS
///
