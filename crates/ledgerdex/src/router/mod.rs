//! Operation-name routing.
//!
//! A [`Router`] maps operation names to handler functions. Handlers receive
//! positional string arguments and answer with JSON bytes.

pub mod args;
pub mod handlers;

use crate::error::Error;
use ledgerdex_core::db::{Db, ledger::Ledger};
use std::collections::HashMap;

/// Signature shared by every routed operation.
pub type Handler<L> = fn(&mut Db<L>, &[&str]) -> Result<Vec<u8>, Error>;

///
/// Router
///
/// Built once, then used for every invocation.
///

pub struct Router<L: Ledger> {
    routes: HashMap<&'static str, Handler<L>>,
}

impl<L: Ledger> Default for Router<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: Ledger> Router<L> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            routes: HashMap::new(),
        }
    }

    /// Every asset operation. `creatAsset` is kept as an alias of
    /// `createAsset` for existing clients.
    #[must_use]
    pub fn asset_routes() -> Self {
        Self::new()
            .route("createAsset", handlers::create_asset::<L>)
            .route("creatAsset", handlers::create_asset::<L>)
            .route("updateAsset", handlers::update_asset::<L>)
            .route("deleteAsset", handlers::delete_asset::<L>)
            .route("getAsset", handlers::get_asset::<L>)
            .route("getAllAssets", handlers::get_all_assets::<L>)
            .route("getAssetByType", handlers::get_asset_by_type::<L>)
            .route("getAssetByOwner", handlers::get_asset_by_owner::<L>)
            .route("getHistoryForRecord", handlers::get_history_for_record::<L>)
            .route("richQuery", handlers::rich_query::<L>)
            .route("getPrivateData", handlers::get_private_data::<L>)
            .route("putPrivateData", handlers::put_private_data::<L>)
    }

    #[must_use]
    pub fn route(mut self, name: &'static str, handler: Handler<L>) -> Self {
        self.register(name, handler);
        self
    }

    /// Add or replace a route; returns the replaced handler.
    pub fn register(&mut self, name: &'static str, handler: Handler<L>) -> Option<Handler<L>> {
        self.routes.insert(name, handler)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.routes.contains_key(name)
    }

    /// Registered operation names, sorted.
    #[must_use]
    pub fn operations(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.routes.keys().copied().collect();
        names.sort_unstable();

        names
    }

    /// Dispatch one invocation.
    pub fn invoke<S: AsRef<str>>(
        &self,
        db: &mut Db<L>,
        function: &str,
        args: &[S],
    ) -> Result<Vec<u8>, Error> {
        let Some(handler) = self.routes.get(function) else {
            tracing::warn!(target: "ledgerdex", function, "unknown function invocation");
            return Err(Error::validation(format!(
                "Received unknown function invocation: {function}"
            )));
        };

        let args: Vec<&str> = args.iter().map(AsRef::as_ref).collect();
        tracing::debug!(target: "ledgerdex", function, args = args.len(), "invoke");

        let result = handler(db, &args);
        if let Err(err) = &result {
            tracing::debug!(
                target: "ledgerdex",
                function,
                kind = %err.kind,
                error = %err.message,
                "invoke failed"
            );
        }

        result
    }
}
