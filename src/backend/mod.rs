//! Private-backend HTTP client: a thin shared wrapper plus one module per
//! resource (user, tracks, tags).

pub mod common;
pub mod tags;
pub mod tracks;
pub mod user;

pub use common::BackendClient;
