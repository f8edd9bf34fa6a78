//! API Module
//!
//! HTTP handlers and routing over a shared `RecordStore`.
//!
//! # Endpoints
//! - `PUT /kv/:namespace/:key` - Store a value with optional TTL
//! - `GET /kv/:namespace/:key` - Retrieve a value
//! - `DELETE /kv/:namespace/:key` - Delete a value
//! - `DELETE /kv/:namespace` - Delete a whole namespace
//! - `GET /stats` - Cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
