//! waxtag: client engine for mirroring a streaming provider's saved tracks
//! into a private backend and organizing them with a hierarchical tag
//! taxonomy.
//!
//! The three moving parts:
//! - [`services::SyncEngine`] drains the provider catalog and pushes one
//!   bulk upsert to the backend
//! - [`services::TrackFeed`] paginates the synced collection for display,
//!   with a concurrency guard and halt-on-error semantics
//! - [`services::TagTreeStore`] holds the tag hierarchy snapshot, expansion
//!   state, and the create/delete mutations with cascading reference fix-up

pub mod auth;
pub mod backend;
pub mod config;
pub mod error;
pub mod models;
pub mod provider;
pub mod services;

pub use config::Config;
pub use error::Error;
