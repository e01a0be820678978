//! StreamGoal — Catalog Store
//!
//! Thin shim over the backend-as-a-service tables (matches, teams,
//! competitions, live_tvs, advertisements) and its counter RPCs.
//!
//! - `RemoteStore`: generic select/insert/update/delete/rpc seam
//! - `SupabaseStore`: PostgREST over reqwest
//! - `MemoryStore`: same query semantics in-process (offline mode, tests)
//! - `CatalogApi`: typed operations per entity
//!
//! No caching, no retries, no transactions. Writes are never optimistic;
//! callers re-fetch the canonical list after a successful write.

use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

pub mod api;
pub mod error;
pub mod memory;
pub mod models;
pub mod query;
pub mod supabase;

pub use api::{CatalogApi, MATCH_SELECT};
pub use error::RemoteError;
pub use memory::MemoryStore;
pub use models::*;
pub use query::{Filter, Order, Query};
pub use supabase::SupabaseStore;

pub type RemoteResult<T> = Result<T, RemoteError>;

/// Generic table access. Every call resolves with data or a `RemoteError`.
pub trait RemoteStore: Send + Sync {
    fn select(&self, table: Table, query: &Query) -> impl Future<Output = RemoteResult<Vec<Value>>> + Send;

    /// Returns the created row when the backend echoes it, `Value::Null` otherwise.
    fn insert(&self, table: Table, payload: Value) -> impl Future<Output = RemoteResult<Value>> + Send;

    fn update(&self, table: Table, id: &str, payload: Value) -> impl Future<Output = RemoteResult<()>> + Send;

    fn delete(&self, table: Table, id: &str) -> impl Future<Output = RemoteResult<()>> + Send;

    fn rpc(&self, function: &str, args: Value) -> impl Future<Output = RemoteResult<Value>> + Send;
}

impl<S: RemoteStore> RemoteStore for Arc<S> {
    fn select(&self, table: Table, query: &Query) -> impl Future<Output = RemoteResult<Vec<Value>>> + Send {
        (**self).select(table, query)
    }

    fn insert(&self, table: Table, payload: Value) -> impl Future<Output = RemoteResult<Value>> + Send {
        (**self).insert(table, payload)
    }

    fn update(&self, table: Table, id: &str, payload: Value) -> impl Future<Output = RemoteResult<()>> + Send {
        (**self).update(table, id, payload)
    }

    fn delete(&self, table: Table, id: &str) -> impl Future<Output = RemoteResult<()>> + Send {
        (**self).delete(table, id)
    }

    fn rpc(&self, function: &str, args: Value) -> impl Future<Output = RemoteResult<Value>> + Send {
        (**self).rpc(function, args)
    }
}

/// Store picked at startup: hosted when credentials are present, demo data otherwise.
pub enum Backend {
    Supabase(SupabaseStore),
    Memory(MemoryStore),
}

impl Backend {
    pub fn connect(url: Option<&str>, anon_key: Option<&str>) -> RemoteResult<Self> {
        match (url, anon_key) {
            (Some(url), Some(key)) if !url.trim().is_empty() && !key.trim().is_empty() => {
                Ok(Backend::Supabase(SupabaseStore::new(url, key)?))
            }
            _ => {
                tracing::warn!("SUPABASE_URL / SUPABASE_ANON_KEY missing, using offline demo catalog");
                Ok(Backend::Memory(MemoryStore::demo()))
            }
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Backend::Supabase(_) => "supabase",
            Backend::Memory(_)   => "memory",
        }
    }
}

impl RemoteStore for Backend {
    async fn select(&self, table: Table, query: &Query) -> RemoteResult<Vec<Value>> {
        match self {
            Backend::Supabase(s) => s.select(table, query).await,
            Backend::Memory(s)   => s.select(table, query).await,
        }
    }

    async fn insert(&self, table: Table, payload: Value) -> RemoteResult<Value> {
        match self {
            Backend::Supabase(s) => s.insert(table, payload).await,
            Backend::Memory(s)   => s.insert(table, payload).await,
        }
    }

    async fn update(&self, table: Table, id: &str, payload: Value) -> RemoteResult<()> {
        match self {
            Backend::Supabase(s) => s.update(table, id, payload).await,
            Backend::Memory(s)   => s.update(table, id, payload).await,
        }
    }

    async fn delete(&self, table: Table, id: &str) -> RemoteResult<()> {
        match self {
            Backend::Supabase(s) => s.delete(table, id).await,
            Backend::Memory(s)   => s.delete(table, id).await,
        }
    }

    async fn rpc(&self, function: &str, args: Value) -> RemoteResult<Value> {
        match self {
            Backend::Supabase(s) => s.rpc(function, args).await,
            Backend::Memory(s)   => s.rpc(function, args).await,
        }
    }
}
