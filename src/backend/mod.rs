//! Blocking KV backend
//!
//! The watch core only needs point writes, prefix listings and a long-poll
//! prefix listing from the store. Two implementations ship with the crate:
//! - [`MemoryBackend`] - in-process store
//! - [`SledBackend`] - embedded sled database
//!
//! # Blocking query contract
//! [`KvBackend::blocking_list`] returns immediately when
//! `QueryOptions::wait_index` is 0 or when the store index has already moved
//! past it. Otherwise it suspends until a change is committed or
//! `QueryOptions::wait_time` elapses, then answers with the full, current
//! listing of the prefix and the store index it reflects.

mod connector;
mod memory;
mod sled_adapter;

pub use connector::*;
pub use memory::*;
pub use sled_adapter::*;


use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
#[cfg(test)]
use mockall::automock;

use crate::KvPair;
use crate::Result;

/// Parameters of one blocking query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    /// Index returned by the previous query; 0 asks for an immediate answer
    pub wait_index: u64,
    /// Upper bound on how long the store may hold the query
    pub wait_time: Duration,
}

/// Answer to a blocking query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryResult {
    /// Store index the listing reflects
    pub index: u64,
    /// Every key under the queried prefix, sorted by key
    pub pairs: Vec<KvPair>,
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait KvBackend: Send + Sync + 'static {
    /// Live (non-empty) pairs whose key starts with `prefix`
    async fn list(
        &self,
        prefix: &str,
    ) -> Result<Vec<KvPair>>;

    async fn put(
        &self,
        key: &str,
        value: Bytes,
    ) -> Result<()>;

    /// Deleting an absent key is not an error
    async fn delete(
        &self,
        key: &str,
    ) -> Result<()>;

    /// Long-poll listing of `prefix`, see the module docs
    async fn blocking_list(
        &self,
        prefix: &str,
        options: QueryOptions,
    ) -> Result<QueryResult>;
}
