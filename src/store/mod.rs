use crate::{
    error::AppResult,
    models::{ContentType, EntryMeta, ListKind, UserProfile},
};

pub mod bridge;
pub mod cache;
pub mod postgres;

pub use bridge::{ListOp, PersistenceBridge, SwipeCommand};
pub use cache::{create_redis_client, Cache, CacheKey, CacheWriterHandle};
pub use postgres::{create_pool, PgProfileStore};

/// Durable per-user profile store
///
/// The authoritative sink for every swipe decision, read on session start.
/// Single-item removal exists alongside the full-list clear so the
/// monotonic growth of `seen`/`rejected` can be relaxed deliberately.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ProfileStore: Send + Sync {
    /// The full per-user document; empty lists for unknown users
    async fn load_profile(&self, user_id: &str) -> AppResult<UserProfile>;

    /// Upserts one entry into one list
    async fn add_entry(
        &self,
        user_id: &str,
        content_type: ContentType,
        list: ListKind,
        title: &str,
        meta: &EntryMeta,
    ) -> AppResult<()>;

    /// Removes one entry from one list; removing an absent entry is not an error
    async fn remove_entry(
        &self,
        user_id: &str,
        content_type: ContentType,
        list: ListKind,
        title: &str,
    ) -> AppResult<()>;

    /// Empties one list entirely
    async fn clear_list(
        &self,
        user_id: &str,
        content_type: ContentType,
        list: ListKind,
    ) -> AppResult<()>;
}
