use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum_test::TestServer;
use serde_json::json;

use cineswipe_api::api::{create_router, AppState};
use cineswipe_api::error::{AppError, AppResult};
use cineswipe_api::models::{ContentType, EntryMeta, ListKind, RawItem, UserProfile};
use cineswipe_api::services::providers::CatalogProvider;
use cineswipe_api::services::FeedPipeline;
use cineswipe_api::store::{
    create_redis_client, Cache, PersistenceBridge, ProfileStore,
};

/// Catalog stub honoring the discovery contract (rating floor, year window)
/// over a fixed fixture set
struct StubCatalog {
    fail_discovery: bool,
}

fn fixture(id: &str, title: &str, year: i32, rating: f64, popularity: f64) -> RawItem {
    RawItem {
        external_id: id.to_string(),
        title: title.to_string(),
        year: Some(year),
        rating,
        popularity,
        poster_url: None,
        synopsis: String::new(),
        country: "US".to_string(),
        genre_hint: None,
    }
}

#[async_trait::async_trait]
impl CatalogProvider for StubCatalog {
    async fn discover(
        &self,
        _content_type: ContentType,
        country_code: &str,
        year_range: (i32, i32),
        rating_floor: f64,
        page: u32,
    ) -> AppResult<Vec<RawItem>> {
        if self.fail_discovery {
            return Err(AppError::Upstream("catalog offline".to_string()));
        }
        if page > 1 {
            return Ok(Vec::new());
        }

        let all = match country_code {
            "US" => vec![
                fixture("1", "Inception", 2010, 8.4, 80.0),
                fixture("2", "Tenet", 2020, 7.3, 60.0),
                fixture("3", "Dogville", 2003, 7.9, 20.0),
                fixture("4", "Heat", 1995, 8.3, 40.0),
                fixture("5", "Clerks", 2006, 6.4, 15.0),
            ],
            "FR" => vec![
                fixture("6", "Amelie", 2001, 8.0, 55.0),
                fixture("7", "Inception", 2010, 8.4, 80.0),
            ],
            _ => Vec::new(),
        };

        Ok(all
            .into_iter()
            .filter(|item| {
                let year = item.year.unwrap_or(0);
                item.rating >= rating_floor && year >= year_range.0 && year <= year_range.1
            })
            .collect())
    }

    async fn search_titles(
        &self,
        _content_type: ContentType,
        query: &str,
        _year_hint: Option<i32>,
    ) -> AppResult<Vec<RawItem>> {
        Ok(vec![fixture("1", query, 2010, 8.4, 80.0)])
    }

    async fn fetch_top_cast(
        &self,
        _content_type: ContentType,
        external_id: &str,
    ) -> AppResult<Vec<String>> {
        Ok(vec![format!("Lead of {}", external_id)])
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

/// In-memory durable store standing in for postgres
#[derive(Default)]
struct MemoryStore {
    profiles: Mutex<HashMap<String, UserProfile>>,
}

#[async_trait::async_trait]
impl ProfileStore for MemoryStore {
    async fn load_profile(&self, user_id: &str) -> AppResult<UserProfile> {
        Ok(self
            .profiles
            .lock()
            .unwrap()
            .get(user_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn add_entry(
        &self,
        user_id: &str,
        content_type: ContentType,
        list: ListKind,
        title: &str,
        meta: &EntryMeta,
    ) -> AppResult<()> {
        let mut profiles = self.profiles.lock().unwrap();
        let lists = profiles
            .entry(user_id.to_string())
            .or_default()
            .lists_mut(content_type);
        match list {
            ListKind::Seen => {
                lists.seen.insert(title.to_string(), meta.clone());
            }
            ListKind::ToWatch => {
                lists.to_watch.insert(title.to_string(), meta.clone());
            }
            ListKind::Rejected => {
                lists.rejected.insert(title.to_string());
            }
        }
        Ok(())
    }

    async fn remove_entry(
        &self,
        user_id: &str,
        content_type: ContentType,
        list: ListKind,
        title: &str,
    ) -> AppResult<()> {
        let mut profiles = self.profiles.lock().unwrap();
        if let Some(profile) = profiles.get_mut(user_id) {
            profile.lists_mut(content_type).remove(list, title);
        }
        Ok(())
    }

    async fn clear_list(
        &self,
        user_id: &str,
        content_type: ContentType,
        list: ListKind,
    ) -> AppResult<()> {
        let mut profiles = self.profiles.lock().unwrap();
        if let Some(profile) = profiles.get_mut(user_id) {
            profile.lists_mut(content_type).clear(list);
        }
        Ok(())
    }
}

/// Durable store that always fails, for the degraded-write path
struct FailingStore;

#[async_trait::async_trait]
impl ProfileStore for FailingStore {
    async fn load_profile(&self, _user_id: &str) -> AppResult<UserProfile> {
        Ok(UserProfile::default())
    }

    async fn add_entry(
        &self,
        _user_id: &str,
        _content_type: ContentType,
        _list: ListKind,
        _title: &str,
        _meta: &EntryMeta,
    ) -> AppResult<()> {
        Err(AppError::Persistence("store offline".to_string()))
    }

    async fn remove_entry(
        &self,
        _user_id: &str,
        _content_type: ContentType,
        _list: ListKind,
        _title: &str,
    ) -> AppResult<()> {
        Err(AppError::Persistence("store offline".to_string()))
    }

    async fn clear_list(
        &self,
        _user_id: &str,
        _content_type: ContentType,
        _list: ListKind,
    ) -> AppResult<()> {
        Err(AppError::Persistence("store offline".to_string()))
    }
}

async fn create_test_server_with(
    catalog: StubCatalog,
    store: Arc<dyn ProfileStore>,
) -> TestServer {
    // Unreachable redis: every cache read degrades to a miss
    let client = create_redis_client("redis://127.0.0.1:1").unwrap();
    let (cache, _handle) = Cache::new(client).await;

    let pipeline = FeedPipeline::new(Arc::new(catalog));
    let bridge = PersistenceBridge::new(store, cache);
    let state = AppState::new(pipeline, bridge);
    TestServer::new(create_router(state)).unwrap()
}

async fn create_test_server() -> (TestServer, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::default());
    let server = create_test_server_with(
        StubCatalog {
            fail_discovery: false,
        },
        store.clone(),
    )
    .await;
    (server, store)
}

#[tokio::test]
async fn test_health_check() {
    let (server, _) = create_test_server().await;
    let response = server.get("/health").await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_feed_applies_facets_and_exclusions() {
    let (server, _) = create_test_server().await;

    let response = server
        .post("/api/v1/feed")
        .json(&json!({
            "content_type": "movie",
            "countries": ["United States", "France"],
            "year_range": [2000, 2020],
            "rating_floor": 7.0,
            "count": 5,
            "seen_titles": ["Inception"],
            "rejected_titles": []
        }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    let candidates = body["candidates"].as_array().unwrap();

    assert!(!candidates.is_empty());
    assert!(candidates.len() <= 5);
    for candidate in candidates {
        assert!(candidate["rating"].as_f64().unwrap() >= 7.0);
        let year = candidate["year"].as_i64().unwrap();
        assert!((2000..=2020).contains(&year));
        assert_ne!(candidate["normalized_title"], "inception");
        // Enrichment populated the cast for the stub's items
        assert!(!candidate["cast"].as_array().unwrap().is_empty());
    }

    // No duplicate normalized titles in one batch
    let mut titles: Vec<&str> = candidates
        .iter()
        .map(|c| c["normalized_title"].as_str().unwrap())
        .collect();
    titles.sort_unstable();
    let before = titles.len();
    titles.dedup();
    assert_eq!(before, titles.len());
}

#[tokio::test]
async fn test_feed_total_outage_is_bad_gateway() {
    let store: Arc<dyn ProfileStore> = Arc::new(MemoryStore::default());
    let server = create_test_server_with(
        StubCatalog {
            fail_discovery: true,
        },
        store,
    )
    .await;

    let response = server
        .post("/api/v1/feed")
        .json(&json!({
            "content_type": "movie",
            "countries": ["United States"],
            "count": 5
        }))
        .await;

    response.assert_status(axum::http::StatusCode::BAD_GATEWAY);
    let body: serde_json::Value = response.json();
    assert!(body["error"].as_str().is_some());
}

#[tokio::test]
async fn test_swipe_seen_moves_title_off_watch_list() {
    let (server, store) = create_test_server().await;

    // Dunkirk starts on the watch list
    store
        .add_entry(
            "user-1",
            ContentType::Movie,
            ListKind::ToWatch,
            "dunkirk",
            &EntryMeta::default(),
        )
        .await
        .unwrap();

    let response = server
        .post("/api/v1/swipe")
        .json(&json!({
            "user_id": "user-1",
            "content_type": "movie",
            "title": "Dunkirk",
            "action": "seen",
            "year": 2017
        }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], true);

    let profile = store.load_profile("user-1").await.unwrap();
    let lists = profile.lists(ContentType::Movie);
    assert!(lists.contains(ListKind::Seen, "dunkirk"));
    assert!(!lists.contains(ListKind::ToWatch, "dunkirk"));
}

#[tokio::test]
async fn test_swipe_to_watch_records_entry() {
    let (server, store) = create_test_server().await;

    let response = server
        .post("/api/v1/swipe")
        .json(&json!({
            "user_id": "user-1",
            "content_type": "series",
            "title": "Severance",
            "action": "to_watch"
        }))
        .await;

    response.assert_status_ok();

    let profile = store.load_profile("user-1").await.unwrap();
    assert!(profile
        .lists(ContentType::Series)
        .contains(ListKind::ToWatch, "severance"));
}

#[tokio::test]
async fn test_swipe_reports_failure_without_erroring() {
    let server = create_test_server_with(
        StubCatalog {
            fail_discovery: false,
        },
        Arc::new(FailingStore),
    )
    .await;

    let response = server
        .post("/api/v1/swipe")
        .json(&json!({
            "user_id": "user-1",
            "content_type": "movie",
            "title": "Dunkirk",
            "action": "seen"
        }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_reject_uses_separate_write() {
    let (server, store) = create_test_server().await;

    let response = server
        .post("/api/v1/lists/rejected")
        .json(&json!({
            "user_id": "user-1",
            "content_type": "movie",
            "title": "Tenet"
        }))
        .await;

    response.assert_status_ok();

    let profile = store.load_profile("user-1").await.unwrap();
    assert!(profile
        .lists(ContentType::Movie)
        .contains(ListKind::Rejected, "tenet"));
}

#[tokio::test]
async fn test_single_item_removal() {
    let (server, store) = create_test_server().await;

    store
        .add_entry(
            "user-1",
            ContentType::Movie,
            ListKind::Rejected,
            "tenet",
            &EntryMeta::default(),
        )
        .await
        .unwrap();

    let response = server
        .delete("/api/v1/lists/rejected/items")
        .json(&json!({
            "user_id": "user-1",
            "content_type": "movie",
            "title": "Tenet"
        }))
        .await;

    response.assert_status_ok();

    let profile = store.load_profile("user-1").await.unwrap();
    assert!(!profile
        .lists(ContentType::Movie)
        .contains(ListKind::Rejected, "tenet"));
}

#[tokio::test]
async fn test_clear_list() {
    let (server, store) = create_test_server().await;

    for title in ["tenet", "clerks"] {
        store
            .add_entry(
                "user-1",
                ContentType::Movie,
                ListKind::Rejected,
                title,
                &EntryMeta::default(),
            )
            .await
            .unwrap();
    }

    let response = server
        .delete("/api/v1/lists/rejected")
        .json(&json!({
            "user_id": "user-1",
            "content_type": "movie"
        }))
        .await;

    response.assert_status_ok();

    let profile = store.load_profile("user-1").await.unwrap();
    assert!(profile.lists(ContentType::Movie).rejected.is_empty());
}

#[tokio::test]
async fn test_unknown_list_is_bad_request() {
    let (server, _) = create_test_server().await;

    let response = server
        .delete("/api/v1/lists/watched")
        .json(&json!({
            "user_id": "user-1",
            "content_type": "movie"
        }))
        .await;

    response.assert_status(axum::http::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_title_search() {
    let (server, _) = create_test_server().await;

    let response = server
        .get("/api/v1/titles/search")
        .add_query_param("q", "Inception")
        .await;

    response.assert_status_ok();
    let results: Vec<serde_json::Value> = response.json();
    assert_eq!(results[0]["title"], "Inception");
}
