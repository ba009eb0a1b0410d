//! Asset operation handlers.
//!
//! Each handler validates its positional arguments, calls the core and
//! renders the result as JSON bytes. This is the only place query sequences
//! are collected into memory.

use crate::{
    error::Error,
    router::args::{expect_arity, non_empty, parse_bool, parse_int},
};
use ledgerdex_core::{
    db::{Db, ledger::Ledger, query::HistoryEntry},
    error::InternalError,
    model::asset::{Asset, normalize_kind},
    serialize::serialize,
};
use serde::Serialize;

/// Query names of the asset indexes.
const BY_TYPE: &str = "AssetType";
const BY_OWNER: &str = "AssetOwner";

///
/// KeyedRecord
///

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct KeyedRecord {
    key: String,
    record: Asset,
}

///
/// HistoryRecord
///

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct HistoryRecord {
    tx_id: String,
    value: Option<Asset>,
    timestamp: String,
    is_delete: bool,
}

impl HistoryRecord {
    fn from_entry(entry: &HistoryEntry) -> Result<Self, Error> {
        Ok(Self {
            tx_id: entry.tx_id.clone(),
            value: entry.record::<Asset>()?,
            timestamp: entry.timestamp.to_string(),
            is_delete: entry.is_delete,
        })
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<Vec<u8>, Error> {
    serialize(value).map_err(|err| InternalError::from(err).into())
}

// args: id, name, type, owner, flag, updatedDate, timeStamp
fn asset_from_args(args: &[&str]) -> Result<Asset, Error> {
    expect_arity(args, 7, "7")?;
    let id = non_empty(args, 0)?;
    let name = non_empty(args, 1)?;
    let kind = non_empty(args, 2)?;
    let owner = non_empty(args, 3)?;
    let flag = parse_bool(args, 4)?;
    let timestamp = parse_int(args, 6)?;

    Ok(Asset::new(id, name, kind, owner, flag, args[5], timestamp))
}

pub fn create_asset<L: Ledger>(db: &mut Db<L>, args: &[&str]) -> Result<Vec<u8>, Error> {
    let asset = asset_from_args(args)?;
    db.records::<Asset>().create(asset)?;

    Ok(Vec::new())
}

pub fn update_asset<L: Ledger>(db: &mut Db<L>, args: &[&str]) -> Result<Vec<u8>, Error> {
    let asset = asset_from_args(args)?;
    db.records::<Asset>().update(asset)?;

    Ok(Vec::new())
}

/// Returns the removed snapshot.
pub fn delete_asset<L: Ledger>(db: &mut Db<L>, args: &[&str]) -> Result<Vec<u8>, Error> {
    expect_arity(args, 1, "id of the asset to delete")?;
    let removed = db.records::<Asset>().delete(non_empty(args, 0)?)?;

    to_json(&removed)
}

pub fn get_asset<L: Ledger>(db: &mut Db<L>, args: &[&str]) -> Result<Vec<u8>, Error> {
    expect_arity(args, 1, "id of the asset to query")?;
    let asset = db.records::<Asset>().get(non_empty(args, 0)?)?;

    to_json(&asset)
}

/// `[{"Key": id, "Record": asset}, ...]` in key order.
pub fn get_all_assets<L: Ledger>(db: &mut Db<L>, _args: &[&str]) -> Result<Vec<u8>, Error> {
    let rows = db
        .query::<Asset>()?
        .scan_all()?
        .map(|row| row.map(|(key, record)| KeyedRecord { key, record }))
        .collect::<Result<Vec<_>, _>>()?;

    to_json(&rows)
}

/// Assets of one type; the type is matched case-insensitively.
pub fn get_asset_by_type<L: Ledger>(db: &mut Db<L>, args: &[&str]) -> Result<Vec<u8>, Error> {
    expect_arity(args, 1, "type to query")?;
    let kind = normalize_kind(args[0]);

    scan_index(db, BY_TYPE, &kind)
}

pub fn get_asset_by_owner<L: Ledger>(db: &mut Db<L>, args: &[&str]) -> Result<Vec<u8>, Error> {
    expect_arity(args, 1, "owner to query")?;

    scan_index(db, BY_OWNER, args[0])
}

fn scan_index<L: Ledger>(db: &mut Db<L>, index: &str, value: &str) -> Result<Vec<u8>, Error> {
    let assets = db
        .query::<Asset>()?
        .scan_by_index(index, &[value])?
        .collect::<Result<Vec<_>, _>>()?;

    to_json(&assets)
}

/// `[{"TxId", "Value", "Timestamp", "IsDelete"}, ...]` oldest first;
/// `Value` is null for deletions.
pub fn get_history_for_record<L: Ledger>(
    db: &mut Db<L>,
    args: &[&str],
) -> Result<Vec<u8>, Error> {
    expect_arity(args, 1, "1")?;
    let query = db.query::<Asset>()?;

    let mut history = Vec::new();
    for entry in query.history(args[0])? {
        history.push(HistoryRecord::from_entry(&entry?)?);
    }

    to_json(&history)
}

/// Pass a ledger-native query through; rows render like `getAllAssets`.
pub fn rich_query<L: Ledger>(db: &mut Db<L>, args: &[&str]) -> Result<Vec<u8>, Error> {
    expect_arity(args, 1, "1")?;
    let rows = db
        .query::<Asset>()?
        .free_query(args[0])?
        .map(|row| row.map(|(key, record)| KeyedRecord { key, record }))
        .collect::<Result<Vec<_>, _>>()?;

    to_json(&rows)
}

// args: partition, id
pub fn get_private_data<L: Ledger>(db: &mut Db<L>, args: &[&str]) -> Result<Vec<u8>, Error> {
    expect_arity(args, 2, "2")?;
    let bytes = db.private().get_private(args[0], args[1])?;

    Ok(bytes)
}

// args: partition, JSON document carrying its own `MarbleID`
pub fn put_private_data<L: Ledger>(db: &mut Db<L>, args: &[&str]) -> Result<Vec<u8>, Error> {
    expect_arity(args, 2, "2")?;
    let partition = non_empty(args, 0)?;
    let document = non_empty(args, 1)?;

    let parsed: serde_json::Value = serde_json::from_str(document)
        .map_err(|err| Error::validation(format!("2nd argument must be a JSON object: {err}")))?;
    let id = parsed
        .get("MarbleID")
        .and_then(serde_json::Value::as_str)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| Error::validation("2nd argument must carry a non-empty MarbleID"))?;

    db.private()
        .put_private(partition, id, document.as_bytes())?;

    Ok(Vec::new())
}
