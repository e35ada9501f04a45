/// External catalog provider abstraction
///
/// This module provides a pluggable architecture for catalog data sources.
/// Each provider implements faceted discovery, free-text title search, and
/// the per-item cast lookup used by the enricher. Keeping all three on one
/// trait ensures a single provider's ID space is used end to end.
use crate::{
    error::AppResult,
    models::{ContentType, RawItem},
};

pub mod tmdb;

pub use tmdb::TmdbCatalog;

/// Trait for catalog data providers
///
/// All calls are single HTTP round trips with a bounded timeout. Failures are
/// returned as error values; nothing panics across this boundary.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogProvider: Send + Sync {
    /// One page of faceted discovery results
    ///
    /// Always excludes adult content, sorts by rating descending, and
    /// constrains the release window to `year_range`.
    async fn discover(
        &self,
        content_type: ContentType,
        country_code: &str,
        year_range: (i32, i32),
        rating_floor: f64,
        page: u32,
    ) -> AppResult<Vec<RawItem>>;

    /// Free-text title search, used by the manual "add a seen item" flow
    async fn search_titles(
        &self,
        content_type: ContentType,
        query: &str,
        year_hint: Option<i32>,
    ) -> AppResult<Vec<RawItem>>;

    /// Up to 3 lead cast names for one item
    async fn fetch_top_cast(
        &self,
        content_type: ContentType,
        external_id: &str,
    ) -> AppResult<Vec<String>>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
