//! API Module
//!
//! Loopback HTTP facade over [`OfflineService`](crate::service::OfflineService),
//! letting a host app shell drive the offline layer.
//!
//! # Endpoints
//! - `PUT /cache`, `DELETE /cache` - Cache a payload / clear the cache
//! - `GET|DELETE /cache/:category/:key` - Read or remove one entry
//! - `POST /cache/cleanup`, `GET /cache/stats` - Sweep expired entries / cache statistics
//! - `POST /actions`, `GET /actions` - Submit a mutation / list pending ones
//! - `DELETE /actions/:id` - Withdraw a pending mutation
//! - `GET|DELETE /actions/failed` - Inspect or clear exhausted mutations
//! - `POST /sync` - Drain the queue now
//! - `GET|PUT /connectivity` - Read or push network state
//! - `GET /stats`, `GET /health`

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
