//! Client-side watches over a blocking key-value store
//!
//! A [`KvWatchClient`] keeps one long-poll loop per watched path, delivers
//! each real change to the caller's handler exactly once and survives store
//! outages by retrying with a fixed backoff. Reads and writes resolve paths
//! under a configured root prefix.

mod backend;
mod client;
mod config;
mod constants;
mod errors;
mod kv;
mod watch;
pub mod utils;

pub use backend::*;
pub use client::*;
pub use config::*;
pub use constants::LOG_FILE_NAME;
pub use errors::*;
pub use kv::*;
pub use watch::*;

//-----------------------------------------------------------
// Test utils

#[cfg(test)]
pub mod test_utils;
