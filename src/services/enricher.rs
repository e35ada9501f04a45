use std::sync::Arc;

use futures::future::join_all;
use tokio_util::sync::CancellationToken;

use crate::{
    models::{Candidate, ContentType},
    services::providers::CatalogProvider,
};

/// Cast lookups in flight at once; the next chunk starts only after the
/// current one fully completes
const ENRICH_CHUNK_SIZE: usize = 5;

/// Populates the `cast` field of the ranked shortlist under bounded
/// concurrency.
///
/// A failed lookup leaves that one candidate with an empty cast and never
/// aborts the batch; the set and order established by the ranker are
/// preserved exactly. Cancellation stops further lookups, leaving the
/// remaining candidates unenriched.
pub async fn enrich(
    catalog: Arc<dyn CatalogProvider>,
    content_type: ContentType,
    mut candidates: Vec<Candidate>,
    cancel: &CancellationToken,
) -> Vec<Candidate> {
    let total = candidates.len();

    for chunk_start in (0..total).step_by(ENRICH_CHUNK_SIZE) {
        if cancel.is_cancelled() {
            tracing::debug!(
                enriched = chunk_start,
                total = total,
                "Enrichment cancelled, leaving remaining candidates bare"
            );
            break;
        }

        let chunk_end = usize::min(chunk_start + ENRICH_CHUNK_SIZE, total);
        let mut tasks = Vec::new();

        for index in chunk_start..chunk_end {
            let catalog = Arc::clone(&catalog);
            let external_id = candidates[index].external_id.clone();
            let cancel = cancel.clone();

            tasks.push(tokio::spawn(async move {
                let result = tokio::select! {
                    _ = cancel.cancelled() => Ok(Vec::new()),
                    result = catalog.fetch_top_cast(content_type, &external_id) => result,
                };
                (index, external_id, result)
            }));
        }

        for joined in join_all(tasks).await {
            match joined {
                Ok((index, _, Ok(cast))) => {
                    candidates[index].cast = cast;
                }
                Ok((index, external_id, Err(e))) => {
                    tracing::warn!(
                        external_id = %external_id,
                        error = %e,
                        "Cast fetch failed, keeping candidate without cast"
                    );
                    candidates[index].cast = Vec::new();
                }
                Err(e) => {
                    tracing::error!(error = %e, "Enrichment task join error");
                }
            }
        }
    }

    candidates
}
