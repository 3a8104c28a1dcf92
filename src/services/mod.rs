//! Orchestration services: catalog sync, the local track feed state machine,
//! and the tag hierarchy store.

pub mod feed;
pub mod sync;
pub mod tag_tree;

pub use feed::TrackFeed;
pub use sync::SyncEngine;
pub use tag_tree::TagTreeStore;
