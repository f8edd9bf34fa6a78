//! Request DTOs for the HTTP API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

/// Request body for `PUT /kv/:namespace/:key`
///
/// # Fields
/// - `value`: The value to store
/// - `ttl`: Optional TTL in seconds, absent or 0 means never expires
#[derive(Debug, Clone, Deserialize)]
pub struct PutRequest {
    /// The value to store
    pub value: String,
    /// Optional TTL in seconds
    #[serde(default)]
    pub ttl: Option<u64>,
}

impl PutRequest {
    /// TTL in seconds with "absent" folded into 0.
    pub fn ttl_secs(&self) -> u64 {
        self.ttl.unwrap_or(0)
    }
}
