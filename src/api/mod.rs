//! API Module
//!
//! HTTP handlers and routing exposing a shared cache store.
//!
//! # Endpoints
//! - `PUT /set` - Store a key-value pair
//! - `GET /get/:key` - Retrieve a value by key
//! - `DELETE /del/:key` - Remove a key
//! - `GET|PUT /snapshot` - Export or replace every entry
//! - `POST /purge` - Sweep expired entries
//! - `GET /stats` - Get cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
