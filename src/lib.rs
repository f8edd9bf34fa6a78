//! Memo Store - a memoizing record store
//!
//! An in-process LRU cache with lazy TTL expiry in front of an embedded LMDB
//! database, with single-flight recomputation of missing values.

pub mod api;
pub mod cache;
pub mod coalesce;
pub mod codec;
pub mod config;
pub mod error;
pub mod models;
pub mod persist;
pub mod record_store;

pub use api::AppState;
pub use codec::{Codec, Json};
pub use config::{Config, StoreOptions};
pub use error::{Result, StoreError};
pub use record_store::{RecordStore, DEFAULT_NAMESPACE};
