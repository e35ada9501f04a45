use std::collections::HashSet;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{Datelike, Utc};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::{
    error::{AppError, AppResult},
    models::{
        normalize_title, ContentType, EntryMeta, FeedRequest, FeedResponse, ListClearRequest,
        ListItemRequest, ListKind, RawItem, RejectRequest, SwipeRequest, SwipeResponse,
        SwipeWireAction,
    },
    services::plan_facets,
    store::SwipeCommand,
};

use super::AppState;

const DEFAULT_FEED_COUNT: usize = 20;
const MAX_FEED_COUNT: usize = 50;

/// Health check endpoint
pub async fn health_check() -> StatusCode {
    StatusCode::OK
}

/// One batch of ranked, enriched, exclusion-filtered candidates
pub async fn feed(
    State(state): State<AppState>,
    Json(request): Json<FeedRequest>,
) -> AppResult<Json<FeedResponse>> {
    let year_range = request
        .year_range
        .map(|[min, max]| (min, max))
        .unwrap_or((1900, Utc::now().year()));
    let plan = plan_facets(
        &request.countries,
        request.rating_floor.unwrap_or(0.0),
        year_range,
    );

    let count = request
        .count
        .unwrap_or(DEFAULT_FEED_COUNT)
        .min(MAX_FEED_COUNT);

    // seen and rejected act as one exclusion set for querying
    let exclusions: HashSet<String> = request
        .seen_titles
        .iter()
        .chain(request.rejected_titles.iter())
        .map(|title| normalize_title(title))
        .collect();

    let candidates = state
        .pipeline
        .fetch_candidates(
            request.content_type,
            &plan,
            count,
            &exclusions,
            request.genre_hint.as_deref(),
            &CancellationToken::new(),
        )
        .await?;

    Ok(Json(FeedResponse { candidates }))
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    q: String,
    year: Option<i32>,
    content_type: Option<ContentType>,
}

/// Free-text title search backing the manual "add a seen item" flow
pub async fn search_titles(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> AppResult<Json<Vec<RawItem>>> {
    let content_type = params.content_type.unwrap_or(ContentType::Movie);
    let items = state
        .pipeline
        .catalog()
        .search_titles(content_type, &params.q, params.year)
        .await?;
    Ok(Json(items))
}

/// Records a seen or to-watch decision
///
/// A persistence failure reports `success: false` instead of failing the
/// request; the client keeps its optimistic state either way.
pub async fn swipe(
    State(state): State<AppState>,
    Json(request): Json<SwipeRequest>,
) -> AppResult<Json<SwipeResponse>> {
    let title = normalize_title(&request.title);
    if title.is_empty() {
        return Err(AppError::InvalidInput("Title cannot be empty".to_string()));
    }

    let meta = EntryMeta {
        poster_url: request.poster_url.clone(),
        year: request.year,
        rating: request.rating,
        viewed_at: Some(Utc::now()),
    };

    let command = match request.action {
        SwipeWireAction::Seen => {
            // Marking seen takes the title off the watch list; capture the
            // displaced entry so the command can compensate exactly
            let displaced = state
                .bridge
                .load_profile(&request.user_id)
                .await
                .ok()
                .and_then(|profile| {
                    profile
                        .lists(request.content_type)
                        .to_watch
                        .get(&title)
                        .cloned()
                });
            SwipeCommand::mark_seen(&request.user_id, request.content_type, &title, meta, displaced)
        }
        SwipeWireAction::ToWatch => {
            SwipeCommand::add_to_watch(&request.user_id, request.content_type, &title, meta)
        }
    };

    let success = match state.bridge.apply(&command).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(
                user_id = %request.user_id,
                title = %title,
                error = %e,
                "Swipe write failed"
            );
            false
        }
    };

    Ok(Json(SwipeResponse { success }))
}

/// The separate add-to-rejected write
pub async fn reject(
    State(state): State<AppState>,
    Json(request): Json<RejectRequest>,
) -> AppResult<Json<SwipeResponse>> {
    let title = normalize_title(&request.title);
    if title.is_empty() {
        return Err(AppError::InvalidInput("Title cannot be empty".to_string()));
    }

    let command = SwipeCommand::reject(&request.user_id, request.content_type, &title);
    let success = match state.bridge.apply(&command).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(
                user_id = %request.user_id,
                title = %title,
                error = %e,
                "Reject write failed"
            );
            false
        }
    };

    Ok(Json(SwipeResponse { success }))
}

/// Single-item removal from one of the three lists
pub async fn remove_list_item(
    State(state): State<AppState>,
    Path(list): Path<String>,
    Json(request): Json<ListItemRequest>,
) -> AppResult<Json<SwipeResponse>> {
    let list = ListKind::parse(&list)
        .ok_or_else(|| AppError::InvalidInput(format!("Unknown list '{}'", list)))?;
    let title = normalize_title(&request.title);

    state
        .bridge
        .remove_entry(&request.user_id, request.content_type, list, &title)
        .await?;

    Ok(Json(SwipeResponse { success: true }))
}

/// Full-list clear, the only bulk removal
pub async fn clear_list(
    State(state): State<AppState>,
    Path(list): Path<String>,
    Json(request): Json<ListClearRequest>,
) -> AppResult<Json<SwipeResponse>> {
    let list = ListKind::parse(&list)
        .ok_or_else(|| AppError::InvalidInput(format!("Unknown list '{}'", list)))?;

    state
        .bridge
        .clear_list(&request.user_id, request.content_type, list)
        .await?;

    Ok(Json(SwipeResponse { success: true }))
}
