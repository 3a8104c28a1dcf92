//! Streaming-provider client: paginated saved-tracks access, profile and
//! token-liveness probes, PKCE token exchange, and normalization into the
//! canonical track shape.

pub mod auth;
pub mod client;
pub mod transform;

pub use client::{CatalogClient, CatalogSource};
