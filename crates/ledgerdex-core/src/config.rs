//! Engine configuration.
//!
//! Index declarations, the update policy and the commit-marker switch are
//! plain data: built in code or loaded from TOML, then handed to [`Db`].
//!
//! ```toml
//! update_policy = "diff"
//! commit_markers = true
//!
//! [[indexes]]
//! query = "AssetType"
//! index = "DemoAsset~Type"
//! attribute = "type"
//! ```
//!
//! [`Db`]: crate::db::Db

use crate::{
    error::{ErrorOrigin, InternalError},
    model::index::{IndexTable, IndexTableError},
};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

///
/// ConfigError
///

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("config parse error: {0}")]
    Parse(String),

    #[error("invalid index table: {0}")]
    Indexes(#[from] IndexTableError),
}

impl From<ConfigError> for InternalError {
    fn from(err: ConfigError) -> Self {
        Self::validation(ErrorOrigin::Config, err.to_string())
    }
}

///
/// UpdatePolicy
///
/// How `update` maintains index entries.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdatePolicy {
    /// Re-derive entries from the new snapshot only. Entries derived from the
    /// previous values of a changed attribute are left behind.
    #[default]
    Recreate,

    /// Remove entries derived from the stored snapshot that the new snapshot
    /// no longer produces, then write the new ones.
    Diff,
}

///
/// EngineConfig
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub indexes: IndexTable,
    pub update_policy: UpdatePolicy,

    /// Persist an intent marker around every mutation so a write interrupted
    /// between the primary key and its index entries is replayed later.
    pub commit_markers: bool,

    /// Emit per-operation debug events.
    pub debug: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            indexes: IndexTable::asset_defaults(),
            update_policy: UpdatePolicy::default(),
            commit_markers: true,
            debug: false,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a TOML document. Missing keys take defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.indexes.validate()?;

        Ok(())
    }

    #[must_use]
    pub fn with_indexes(mut self, indexes: IndexTable) -> Self {
        self.indexes = indexes;
        self
    }

    #[must_use]
    pub const fn with_update_policy(mut self, policy: UpdatePolicy) -> Self {
        self.update_policy = policy;
        self
    }

    #[must_use]
    pub const fn with_commit_markers(mut self, enabled: bool) -> Self {
        self.commit_markers = enabled;
        self
    }

    #[must_use]
    pub const fn debug(mut self) -> Self {
        self.debug = true;
        self
    }
}

///
/// TESTS
///
