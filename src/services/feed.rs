use std::collections::HashSet;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::{
    error::{AppError, AppResult},
    models::{Candidate, ContentType},
    services::{
        aggregator::aggregate, enricher::enrich, facets::FacetPlan, providers::CatalogProvider,
        ranker::rank_candidates,
    },
};

/// The aggregation pipeline behind the discovery feed
///
/// Composes aggregation, dedup/ranking, and enrichment behind one call shared
/// by the feed endpoint and the swipeable queue. Holds no per-request state.
#[derive(Clone)]
pub struct FeedPipeline {
    catalog: Arc<dyn CatalogProvider>,
}

impl FeedPipeline {
    pub fn new(catalog: Arc<dyn CatalogProvider>) -> Self {
        Self { catalog }
    }

    /// The underlying provider, for the manual title-search flow
    pub fn catalog(&self) -> Arc<dyn CatalogProvider> {
        Arc::clone(&self.catalog)
    }

    /// Runs aggregation -> dedup/rank -> enrichment for one batch.
    ///
    /// `exclusions` is the combined seen-union-rejected set; candidates whose
    /// normalized title is in it never come back. Output length is at most
    /// `count`, ordered by rating descending.
    pub async fn fetch_candidates(
        &self,
        content_type: ContentType,
        plan: &FacetPlan,
        count: usize,
        exclusions: &HashSet<String>,
        genre_hint: Option<&str>,
        cancel: &CancellationToken,
    ) -> AppResult<Vec<Candidate>> {
        if count == 0 {
            return Err(AppError::InvalidInput(
                "Requested candidate count must be positive".to_string(),
            ));
        }

        let pool = aggregate(Arc::clone(&self.catalog), content_type, plan, cancel).await?;
        let ranked = rank_candidates(pool, exclusions, count);
        let mut candidates = enrich(Arc::clone(&self.catalog), content_type, ranked, cancel).await;

        if cancel.is_cancelled() {
            return Err(AppError::Cancelled);
        }

        // Best-effort annotation for items the provider left without a genre
        if let Some(hint) = genre_hint {
            for candidate in &mut candidates {
                if candidate.genre_hint.is_none() {
                    candidate.genre_hint = Some(hint.to_string());
                }
            }
        }

        tracing::info!(
            content_type = %content_type,
            requested = count,
            returned = candidates.len(),
            "Feed batch assembled"
        );

        Ok(candidates)
    }
}
