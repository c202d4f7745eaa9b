//! Request and Response models for the HTTP facade
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{CacheRequest, ConnectivityRequest};
pub use responses::{
    CachedDataResponse, ClearResponse, ConnectivityResponse, HealthResponse,
    MessageResponse, PerformResponse,
};
