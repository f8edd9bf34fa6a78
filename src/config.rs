//! Configuration Module
//!
//! Handles loading store and server configuration from environment variables.

use std::env;
use std::path::PathBuf;

/// Number of write attempts used when none (or zero) is configured.
pub const DEFAULT_NUM_RETRIES: u8 = 3;

/// Options that shape a `RecordStore`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOptions {
    /// Write attempts before a put is reported as failed
    pub retries: u8,
    /// Open the engine read-only
    pub read_only: bool,
    /// In-process cache capacity, 0 disables the cache
    pub cache_capacity: usize,
    /// LMDB map size in megabytes
    pub map_size_mb: usize,
}

impl StoreOptions {
    /// Write attempts with zero normalised to the default.
    pub fn effective_retries(&self) -> u8 {
        if self.retries == 0 {
            DEFAULT_NUM_RETRIES
        } else {
            self.retries
        }
    }
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            retries: DEFAULT_NUM_RETRIES,
            read_only: false,
            cache_capacity: 1000,
            map_size_mb: 64,
        }
    }
}

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the LMDB environment
    pub db_path: PathBuf,
    /// Write attempts per put
    pub num_retries: u8,
    /// Open the database read-only
    pub read_only: bool,
    /// Maximum number of entries the cache can hold (0 = disabled)
    pub cache_capacity: usize,
    /// LMDB map size in megabytes
    pub map_size_mb: usize,
    /// HTTP server port
    pub server_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `DB_PATH` - LMDB directory (default: memo_store.mdb)
    /// - `NUM_RETRIES` - Write attempts (default: 3)
    /// - `READ_ONLY` - `true` or `1` to open read-only (default: false)
    /// - `CACHE_CAPACITY` - Maximum cache entries, 0 disables (default: 1000)
    /// - `MAP_SIZE_MB` - LMDB map size (default: 64)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            db_path: env::var("DB_PATH")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
            num_retries: env::var("NUM_RETRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.num_retries),
            read_only: env::var("READ_ONLY")
                .ok()
                .map(|v| matches!(v.to_ascii_lowercase().as_str(), "true" | "1"))
                .unwrap_or(defaults.read_only),
            cache_capacity: env::var("CACHE_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.cache_capacity),
            map_size_mb: env::var("MAP_SIZE_MB")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.map_size_mb),
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.server_port),
        }
    }

    /// Store options derived from this configuration.
    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            retries: self.num_retries,
            read_only: self.read_only,
            cache_capacity: self.cache_capacity,
            map_size_mb: self.map_size_mb,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("memo_store.mdb"),
            num_retries: DEFAULT_NUM_RETRIES,
            read_only: false,
            cache_capacity: 1000,
            map_size_mb: 64,
            server_port: 3000,
        }
    }
}
