//! Tag hierarchy store
//!
//! Owns the client-held snapshot of the user's tag tree: fetch/refresh
//! lifecycle, per-node expansion state, and the create/delete mutations with
//! their cascading consistency rules. The tree is fetched whole in one
//! snapshot; expansion is a rendering overlay, not a lazy backend fetch.
//!
//! Overlapping refreshes are resolved by a generation counter: every refresh
//! stamps itself, and a response whose generation has been superseded is
//! discarded instead of clobbering a newer snapshot.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::backend::{self, BackendClient};
use crate::error::Error;
use crate::models::tags::{Tag, TagDeleteReport, TagIn, TagValueType, ROOT_TAG_ID};

/// The backend surface the store needs
#[async_trait]
pub trait TagService: Send + Sync {
    async fn fetch_hierarchy(&self) -> Result<Tag, Error>;
    async fn create_tag(&self, tag: &TagIn) -> Result<Tag, Error>;
    async fn delete_tag(&self, tag_id: i64) -> Result<TagDeleteReport, Error>;
}

/// Production service: the backend tag endpoints scoped to one user
pub struct BackendTagService {
    pub client: Arc<BackendClient>,
    pub user_id: i64,
}

#[async_trait]
impl TagService for BackendTagService {
    async fn fetch_hierarchy(&self) -> Result<Tag, Error> {
        backend::tags::fetch_hierarchy(&self.client, self.user_id).await
    }

    async fn create_tag(&self, tag: &TagIn) -> Result<Tag, Error> {
        backend::tags::create_tag(&self.client, self.user_id, tag).await
    }

    async fn delete_tag(&self, tag_id: i64) -> Result<TagDeleteReport, Error> {
        backend::tags::delete_tag(&self.client, self.user_id, tag_id).await
    }
}

/// Whether a refresh's response was applied or superseded by a newer one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Applied,
    Stale,
}

/// One row of the rendered tree: pre-order, depth-first, expansion-aware
#[derive(Debug, Clone, PartialEq)]
pub struct VisibleNode {
    pub id: i64,
    pub name: String,
    pub depth: usize,
    pub expanded: bool,
    /// False for leaf nodes, whose expansion affordance is disabled
    pub expandable: bool,
}

#[derive(Default)]
struct TreeState {
    root: Option<Tag>,
    loading: bool,
    error: Option<String>,
    expanded: HashSet<i64>,
}

/// Client-held tag hierarchy with snapshot refresh and optimistic mutations
pub struct TagTreeStore {
    service: Arc<dyn TagService>,
    owner_id: i64,
    state: Mutex<TreeState>,
    generation: AtomicU64,
}

impl TagTreeStore {
    pub fn new(service: Arc<dyn TagService>, owner_id: i64) -> Self {
        TagTreeStore {
            service,
            owner_id,
            state: Mutex::new(TreeState::default()),
            generation: AtomicU64::new(0),
        }
    }

    /// Fetch a fresh hierarchy snapshot and replace the held tree wholesale.
    ///
    /// On failure the previous tree stays available (stale beats blank) and
    /// the error message is recorded. A response superseded by a newer
    /// refresh is discarded and reported as `Stale`.
    pub async fn refresh(&self) -> Result<RefreshOutcome, Error> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut state = self.state.lock().expect("tree state poisoned");
            state.loading = true;
        }

        let result = self.service.fetch_hierarchy().await;

        let mut state = self.state.lock().expect("tree state poisoned");
        if self.generation.load(Ordering::SeqCst) != generation {
            // A newer refresh owns the state now, loading flag included
            return Ok(RefreshOutcome::Stale);
        }
        state.loading = false;

        match result {
            Ok(root) => {
                // Expansion state may not reference ids absent from the
                // latest snapshot
                let mut expanded = std::mem::take(&mut state.expanded);
                expanded.retain(|id| root.find(*id).is_some());
                state.expanded = expanded;
                state.root = Some(root);
                state.error = None;
                Ok(RefreshOutcome::Applied)
            }
            Err(e) => {
                state.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Create a tag under `parent_id` and refresh the snapshot.
    ///
    /// Rejects an empty or whitespace-only name before any request is sent.
    pub async fn create_tag(&self, name: &str, parent_id: i64) -> Result<Tag, Error> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::Validation("tag name must not be empty".to_string()));
        }

        let tag = TagIn {
            name: name.to_string(),
            value_type: TagValueType::String,
            parent_id,
            locked: false,
            owner_id: self.owner_id,
        };
        let created = self.service.create_tag(&tag).await?;

        if let Err(e) = self.refresh().await {
            log::warn!("tag created but refresh failed: {}", e);
        }
        Ok(created)
    }

    /// Delete a tag, refresh, and report every removed id to `on_deleted` so
    /// external references (e.g. a creation form's selected parent) can fall
    /// back to the root sentinel. The backend owns the cascade/locked
    /// policy; its rejection surfaces verbatim as `Error::Conflict`.
    pub async fn delete_tag<F>(&self, tag_id: i64, mut on_deleted: F) -> Result<TagDeleteReport, Error>
    where
        F: FnMut(&[i64]),
    {
        if tag_id == ROOT_TAG_ID {
            return Err(Error::Validation("the root tag cannot be deleted".to_string()));
        }

        let report = self.service.delete_tag(tag_id).await?;

        if let Err(e) = self.refresh().await {
            log::warn!("tag deleted but refresh failed: {}", e);
            // The refresh would have pruned these; do it by hand so no
            // expansion state points at a deleted id
            let mut state = self.state.lock().expect("tree state poisoned");
            for id in &report.deleted_ids {
                state.expanded.remove(id);
            }
        }

        on_deleted(&report.deleted_ids);
        Ok(report)
    }

    /// Flip a node's expansion. Leaf nodes and unknown ids are not
    /// toggleable; returns the node's resulting expansion state.
    pub fn toggle_expansion(&self, tag_id: i64) -> bool {
        let mut state = self.state.lock().expect("tree state poisoned");
        let expandable = state
            .root
            .as_ref()
            .and_then(|root| root.find(tag_id))
            .map(Tag::has_children)
            .unwrap_or(false);
        if !expandable {
            return false;
        }
        if state.expanded.remove(&tag_id) {
            false
        } else {
            state.expanded.insert(tag_id);
            true
        }
    }

    pub fn is_expanded(&self, tag_id: i64) -> bool {
        self.state
            .lock()
            .expect("tree state poisoned")
            .expanded
            .contains(&tag_id)
    }

    /// The rows a tree renderer would draw: depth-first pre-order starting
    /// from the root's children (the synthetic root itself is never a row),
    /// descending only into expanded nodes, backend child order preserved.
    pub fn visible_nodes(&self) -> Vec<VisibleNode> {
        let state = self.state.lock().expect("tree state poisoned");
        let mut rows = Vec::new();
        if let Some(root) = &state.root {
            for child in &root.children {
                collect_visible(child, 1, &state.expanded, &mut rows);
            }
        }
        rows
    }

    pub fn root(&self) -> Option<Tag> {
        self.state.lock().expect("tree state poisoned").root.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.lock().expect("tree state poisoned").loading
    }

    pub fn error(&self) -> Option<String> {
        self.state.lock().expect("tree state poisoned").error.clone()
    }
}

fn collect_visible(tag: &Tag, depth: usize, expanded: &HashSet<i64>, rows: &mut Vec<VisibleNode>) {
    let is_expanded = expanded.contains(&tag.id);
    rows.push(VisibleNode {
        id: tag.id,
        name: tag.name.clone(),
        depth,
        expanded: is_expanded,
        expandable: tag.has_children(),
    });
    if is_expanded {
        for child in &tag.children {
            collect_visible(child, depth + 1, expanded, rows);
        }
    }
}

// ============================================================================
// Parent selection (the external consumer deletion must not dangle)
// ============================================================================

/// The tag-creation form's "selected parent" reference. Defaults to the
/// root sentinel and falls back to it whenever the selected tag is among a
/// deletion's removed ids, so it can never hold a dangling tag id.
pub struct ParentSelection {
    owner_id: i64,
    selected: Tag,
}

impl ParentSelection {
    pub fn new(owner_id: i64) -> Self {
        ParentSelection {
            owner_id,
            selected: Tag::root_sentinel(owner_id),
        }
    }

    pub fn select(&mut self, tag: Tag) {
        self.selected = tag;
    }

    pub fn selected(&self) -> &Tag {
        &self.selected
    }

    pub fn reset_to_root(&mut self) {
        self.selected = Tag::root_sentinel(self.owner_id);
    }

    /// Hook for `TagTreeStore::delete_tag`'s completion callback
    pub fn on_tags_deleted(&mut self, deleted_ids: &[i64]) {
        if deleted_ids.contains(&self.selected.id) {
            self.reset_to_root();
        }
    }
}
