use std::sync::Arc;

use futures::future::join_all;
use tokio_util::sync::CancellationToken;

use crate::{
    error::{AppError, AppResult},
    models::{ContentType, RawItem},
    services::{facets::FacetPlan, providers::CatalogProvider},
};

/// Discovery pages fetched per facet code
const DISCOVER_PAGES: u32 = 2;

/// Fans out discovery calls across every facet code and page concurrently,
/// then joins before returning the combined raw pool.
///
/// A failed facet/page is logged and omitted; the aggregation only fails as a
/// whole when every unit failed, so the caller can tell "nothing matched"
/// apart from "the catalog was unreachable". A configuration failure (missing
/// credentials) short-circuits past the generic aggregation error.
pub async fn aggregate(
    catalog: Arc<dyn CatalogProvider>,
    content_type: ContentType,
    plan: &FacetPlan,
    cancel: &CancellationToken,
) -> AppResult<Vec<RawItem>> {
    let mut tasks = Vec::new();

    for code in &plan.codes {
        for page in 1..=DISCOVER_PAGES {
            let catalog = Arc::clone(&catalog);
            let code = code.clone();
            let year_range = plan.year_range;
            let rating_floor = plan.rating_floor;
            let cancel = cancel.clone();

            tasks.push(tokio::spawn(async move {
                let result = tokio::select! {
                    _ = cancel.cancelled() => Err(AppError::Cancelled),
                    result = catalog.discover(
                        content_type,
                        &code,
                        year_range,
                        rating_floor,
                        page,
                    ) => result,
                };
                (code, page, result)
            }));
        }
    }

    if tasks.is_empty() {
        return Ok(Vec::new());
    }

    let total_units = tasks.len();
    let mut pool = Vec::new();
    let mut failed_units = 0;
    let mut configuration_error = None;

    // Barrier: ranking never runs on a partial result
    for joined in join_all(tasks).await {
        match joined {
            Ok((code, page, Ok(items))) => {
                tracing::debug!(
                    country = %code,
                    page = page,
                    items = items.len(),
                    "Facet page aggregated"
                );
                pool.extend(items);
            }
            Ok((_, _, Err(AppError::Cancelled))) => {
                return Err(AppError::Cancelled);
            }
            Ok((code, page, Err(e))) => {
                tracing::warn!(
                    country = %code,
                    page = page,
                    error = %e,
                    "Facet page failed, omitting partial result"
                );
                if matches!(e, AppError::Configuration(_)) && configuration_error.is_none() {
                    configuration_error = Some(e);
                }
                failed_units += 1;
            }
            Err(e) => {
                tracing::error!(error = %e, "Aggregation task join error");
                failed_units += 1;
            }
        }
    }

    if cancel.is_cancelled() {
        return Err(AppError::Cancelled);
    }

    if failed_units == total_units {
        // Missing credentials are fatal and deserve a precise error
        if let Some(e) = configuration_error {
            return Err(e);
        }
        tracing::error!(units = total_units, "Every facet page failed");
        return Err(AppError::AggregationFailed);
    }

    tracing::info!(
        units = total_units,
        failed = failed_units,
        pooled = pool.len(),
        "Aggregation completed"
    );

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::facets::plan_facets;
    use crate::services::providers::MockCatalogProvider;

    fn item(id: &str, title: &str) -> RawItem {
        RawItem {
            external_id: id.to_string(),
            title: title.to_string(),
            year: Some(2010),
            rating: 7.5,
            popularity: 10.0,
            poster_url: None,
            synopsis: String::new(),
            country: "US".to_string(),
            genre_hint: None,
        }
    }

    fn two_code_plan() -> FacetPlan {
        plan_facets(
            &["United States".to_string(), "France".to_string()],
            7.0,
            (2000, 2020),
        )
    }

    #[tokio::test]
    async fn test_aggregate_fans_out_two_pages_per_code() {
        let mut catalog = MockCatalogProvider::new();
        catalog
            .expect_discover()
            .times(4)
            .returning(|_, code, _, _, page| {
                Ok(vec![item(&format!("{}-{}", code, page), "Some Film")])
            });

        let pool = aggregate(
            Arc::new(catalog),
            ContentType::Movie,
            &two_code_plan(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(pool.len(), 4);
    }

    #[tokio::test]
    async fn test_aggregate_omits_failed_facet() {
        let mut catalog = MockCatalogProvider::new();
        catalog
            .expect_discover()
            .times(4)
            .returning(|_, code, _, _, page| {
                if code == "FR" {
                    Err(AppError::Upstream("boom".to_string()))
                } else {
                    Ok(vec![item(&format!("US-{}", page), "Some Film")])
                }
            });

        let pool = aggregate(
            Arc::new(catalog),
            ContentType::Movie,
            &two_code_plan(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(pool.len(), 2);
    }

    #[tokio::test]
    async fn test_aggregate_all_failed_is_aggregation_failed() {
        let mut catalog = MockCatalogProvider::new();
        catalog
            .expect_discover()
            .times(4)
            .returning(|_, _, _, _, _| Err(AppError::Upstream("down".to_string())));

        let result = aggregate(
            Arc::new(catalog),
            ContentType::Movie,
            &two_code_plan(),
            &CancellationToken::new(),
        )
        .await;

        assert!(matches!(result, Err(AppError::AggregationFailed)));
    }

    #[tokio::test]
    async fn test_aggregate_surfaces_configuration_error() {
        let mut catalog = MockCatalogProvider::new();
        catalog
            .expect_discover()
            .times(4)
            .returning(|_, _, _, _, _| {
                Err(AppError::Configuration("no api key".to_string()))
            });

        let result = aggregate(
            Arc::new(catalog),
            ContentType::Movie,
            &two_code_plan(),
            &CancellationToken::new(),
        )
        .await;

        assert!(matches!(result, Err(AppError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_aggregate_empty_pool_on_no_matches_is_ok() {
        let mut catalog = MockCatalogProvider::new();
        catalog
            .expect_discover()
            .times(4)
            .returning(|_, _, _, _, _| Ok(Vec::new()));

        let pool = aggregate(
            Arc::new(catalog),
            ContentType::Movie,
            &two_code_plan(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert!(pool.is_empty());
    }

    #[tokio::test]
    async fn test_aggregate_cancelled_before_start() {
        let mut catalog = MockCatalogProvider::new();
        catalog
            .expect_discover()
            .returning(|_, _, _, _, _| Ok(Vec::new()));

        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = aggregate(
            Arc::new(catalog),
            ContentType::Movie,
            &two_code_plan(),
            &cancel,
        )
        .await;

        assert!(matches!(result, Err(AppError::Cancelled)));
    }
}
