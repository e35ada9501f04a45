use std::sync::Arc;

use crate::{
    error::AppResult,
    models::{ContentType, EntryMeta, ListKind, UserProfile},
};

use super::{Cache, CacheKey, ProfileStore};

/// How long a cached profile stays valid
const PROFILE_CACHE_TTL: u64 = 86_400; // 1 day

/// One mutation against a user's swipe lists
#[derive(Debug, Clone, PartialEq)]
pub enum ListOp {
    Add {
        list: ListKind,
        title: String,
        meta: EntryMeta,
    },
    Remove {
        list: ListKind,
        title: String,
    },
}

/// Command object for one swipe decision
///
/// Carries the forward mutations and their compensation so a decision can be
/// undone without re-deriving what it changed. Mark-seen captures the
/// displaced watch-list entry for exact restoration.
#[derive(Debug, Clone)]
pub struct SwipeCommand {
    pub user_id: String,
    pub content_type: ContentType,
    forward: Vec<ListOp>,
    compensation: Vec<ListOp>,
}

impl SwipeCommand {
    pub fn mark_seen(
        user_id: &str,
        content_type: ContentType,
        title: &str,
        meta: EntryMeta,
        displaced_watch_entry: Option<EntryMeta>,
    ) -> Self {
        let mut forward = vec![ListOp::Add {
            list: ListKind::Seen,
            title: title.to_string(),
            meta,
        }];
        let mut compensation = vec![ListOp::Remove {
            list: ListKind::Seen,
            title: title.to_string(),
        }];

        if let Some(prior) = displaced_watch_entry {
            forward.push(ListOp::Remove {
                list: ListKind::ToWatch,
                title: title.to_string(),
            });
            compensation.push(ListOp::Add {
                list: ListKind::ToWatch,
                title: title.to_string(),
                meta: prior,
            });
        }

        Self {
            user_id: user_id.to_string(),
            content_type,
            forward,
            compensation,
        }
    }

    pub fn add_to_watch(
        user_id: &str,
        content_type: ContentType,
        title: &str,
        meta: EntryMeta,
    ) -> Self {
        Self {
            user_id: user_id.to_string(),
            content_type,
            forward: vec![ListOp::Add {
                list: ListKind::ToWatch,
                title: title.to_string(),
                meta,
            }],
            compensation: vec![ListOp::Remove {
                list: ListKind::ToWatch,
                title: title.to_string(),
            }],
        }
    }

    pub fn reject(user_id: &str, content_type: ContentType, title: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            content_type,
            forward: vec![ListOp::Add {
                list: ListKind::Rejected,
                title: title.to_string(),
                meta: EntryMeta::default(),
            }],
            compensation: vec![ListOp::Remove {
                list: ListKind::Rejected,
                title: title.to_string(),
            }],
        }
    }

    pub fn forward_ops(&self) -> &[ListOp] {
        &self.forward
    }

    /// The compensating command: applying it reverts this one
    pub fn inverse(&self) -> SwipeCommand {
        SwipeCommand {
            user_id: self.user_id.clone(),
            content_type: self.content_type,
            forward: self.compensation.clone(),
            compensation: self.forward.clone(),
        }
    }
}

/// Bridges feed-queue decisions into the durable store and the local cache
///
/// Reads consult the cache before the store (cold-start fast path, cache
/// errors degrade to a miss). Writes go to the durable store first, then the
/// refreshed profile is pushed to the cache fire-and-forget.
#[derive(Clone)]
pub struct PersistenceBridge {
    store: Arc<dyn ProfileStore>,
    cache: Cache,
}

impl PersistenceBridge {
    pub fn new(store: Arc<dyn ProfileStore>, cache: Cache) -> Self {
        Self { store, cache }
    }

    /// Loads the per-user document, local cache first
    pub async fn load_profile(&self, user_id: &str) -> AppResult<UserProfile> {
        let key = CacheKey::Profile(user_id.to_string());

        match self.cache.get_from_cache::<UserProfile>(&key).await {
            Ok(Some(profile)) => {
                tracing::debug!(user_id = %user_id, "Profile cache hit");
                return Ok(profile);
            }
            Ok(None) => {
                tracing::debug!(user_id = %user_id, "Profile cache miss");
            }
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "Profile cache read failed, falling through to store");
            }
        }

        let profile = self.store.load_profile(user_id).await?;
        self.cache.set_in_background(&key, &profile, PROFILE_CACHE_TTL);
        Ok(profile)
    }

    /// Applies one command to both sinks
    ///
    /// The durable writes are awaited; the cache refresh is best-effort and
    /// never fails the command.
    pub async fn apply(&self, command: &SwipeCommand) -> AppResult<()> {
        for op in command.forward_ops() {
            match op {
                ListOp::Add { list, title, meta } => {
                    self.store
                        .add_entry(&command.user_id, command.content_type, *list, title, meta)
                        .await?;
                }
                ListOp::Remove { list, title } => {
                    self.store
                        .remove_entry(&command.user_id, command.content_type, *list, title)
                        .await?;
                }
            }
        }

        self.refresh_cache(&command.user_id).await;
        Ok(())
    }

    /// Removes one entry from one list on both sinks
    pub async fn remove_entry(
        &self,
        user_id: &str,
        content_type: ContentType,
        list: ListKind,
        title: &str,
    ) -> AppResult<()> {
        self.store
            .remove_entry(user_id, content_type, list, title)
            .await?;
        self.refresh_cache(user_id).await;
        Ok(())
    }

    /// Empties one list on both sinks
    pub async fn clear_list(
        &self,
        user_id: &str,
        content_type: ContentType,
        list: ListKind,
    ) -> AppResult<()> {
        self.store.clear_list(user_id, content_type, list).await?;
        self.refresh_cache(user_id).await;
        Ok(())
    }

    async fn refresh_cache(&self, user_id: &str) {
        match self.store.load_profile(user_id).await {
            Ok(profile) => {
                let key = CacheKey::Profile(user_id.to_string());
                self.cache.set_in_background(&key, &profile, PROFILE_CACHE_TTL);
            }
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "Skipping cache refresh after failed profile reload");
            }
        }
    }
}
