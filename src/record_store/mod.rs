//! Insert-only access to the hosted record store.
//!
//! Every backend translates its own failures into [`StoreError`] right after
//! the call, so handlers only ever see the closed set of outcomes below.

use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

mod memory;
mod rest;

pub use memory::MemoryStore;
pub use rest::RestStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Subscribers,
    UserQueries,
}

impl Table {
    pub fn name(&self) -> &'static str {
        match self {
            Table::Subscribers => "subscribers",
            Table::UserQueries => "user_queries",
        }
    }

    /// Column the store enforces uniqueness on, if any.
    pub fn unique_key(&self) -> Option<&'static str> {
        match self {
            Table::Subscribers => Some("email"),
            Table::UserQueries => None,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("The record store is not configured.")]
    NotConfigured,
    #[error("Unique constraint violated. {0}")]
    DuplicateKey(String),
    #[error("The record store is unavailable. {0}")]
    Unavailable(String),
    #[error("The record store rejected the insert. {0}")]
    Unknown(String),
}

pub trait RecordStore: Send + Sync + 'static {
    /// `false` when credentials were missing at startup. Such a store never
    /// touches the network.
    fn is_configured(&self) -> bool;

    /// Inserts a single record and returns the rows the store reports back.
    /// One attempt; no retries.
    fn insert<R>(
        &self,
        table: Table,
        record: &R,
    ) -> impl Future<Output = Result<Value, StoreError>> + Send
    where
        R: Serialize + Sync;
}

impl<S: RecordStore> RecordStore for Arc<S> {
    fn is_configured(&self) -> bool {
        S::is_configured(self)
    }

    fn insert<R>(
        &self,
        table: Table,
        record: &R,
    ) -> impl Future<Output = Result<Value, StoreError>> + Send
    where
        R: Serialize + Sync,
    {
        S::insert(self, table, record)
    }
}
