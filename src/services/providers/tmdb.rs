/// TMDB catalog provider
///
/// Stateless adapter over the TMDB v3 REST API covering the three catalog
/// operations: faceted discovery, title search, and top-cast lookup.
///
/// API flow:
/// 1. Discovery: /discover/{movie|tv} with origin country, release window,
///    rating floor, and page
/// 2. Search: /search/{movie|tv} with free-text query and optional year hint
/// 3. Cast: /{movie|tv}/{id}/credits, truncated to the top 3 names
use std::time::Duration;

use reqwest::{Client as HttpClient, StatusCode};

use crate::{
    error::{AppError, AppResult},
    models::{CatalogCredits, CatalogItem, CatalogPage, ContentType, RawItem},
};

use super::CatalogProvider;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const TOP_CAST_LIMIT: usize = 3;

/// TMDB genre id lookup, shared by movie and TV discovery payloads
const GENRE_NAMES: &[(i32, &str)] = &[
    (28, "Action"),
    (12, "Adventure"),
    (16, "Animation"),
    (35, "Comedy"),
    (80, "Crime"),
    (99, "Documentary"),
    (18, "Drama"),
    (10751, "Family"),
    (14, "Fantasy"),
    (36, "History"),
    (27, "Horror"),
    (10402, "Music"),
    (9648, "Mystery"),
    (10749, "Romance"),
    (878, "Science Fiction"),
    (53, "Thriller"),
    (10752, "War"),
    (37, "Western"),
    (10759, "Action & Adventure"),
    (10765, "Sci-Fi & Fantasy"),
];

#[derive(Clone)]
pub struct TmdbCatalog {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    language: String,
}

impl TmdbCatalog {
    pub fn new(api_key: String, api_url: String, language: String) -> Self {
        let http_client = HttpClient::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self {
            http_client,
            api_key,
            api_url,
            language,
        }
    }

    /// Missing credentials are fatal, surfaced before any request goes out
    fn ensure_configured(&self) -> AppResult<()> {
        if self.api_key.trim().is_empty() {
            return Err(AppError::Configuration(
                "catalog API key is not configured".to_string(),
            ));
        }
        Ok(())
    }

    /// URL path segment for the content type
    fn path_kind(content_type: ContentType) -> &'static str {
        match content_type {
            ContentType::Movie => "movie",
            ContentType::Series => "tv",
        }
    }

    /// Maps a non-2xx status to the error taxonomy: overload gets its own
    /// variant so the caller can surface a friendlier message.
    fn classify_failure(status: StatusCode, body: String) -> AppError {
        match status {
            StatusCode::TOO_MANY_REQUESTS | StatusCode::SERVICE_UNAVAILABLE => {
                AppError::UpstreamOverloaded
            }
            _ => AppError::Upstream(format!("catalog returned status {}: {}", status, body)),
        }
    }

    async fn check_response(response: reqwest::Response) -> AppResult<reqwest::Response> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Self::classify_failure(status, body));
        }
        Ok(response)
    }

    fn genre_name(id: i32) -> Option<&'static str> {
        GENRE_NAMES
            .iter()
            .find(|(genre_id, _)| *genre_id == id)
            .map(|(_, name)| *name)
    }

    /// Converts a catalog row into the pipeline's raw item, falling back to
    /// the facet code when the payload carries no origin country.
    fn to_raw_item(item: CatalogItem, fallback_country: &str) -> RawItem {
        let country = item
            .origin_country
            .as_ref()
            .and_then(|countries| countries.first().cloned())
            .unwrap_or_else(|| fallback_country.to_string());

        let genre_hint = item
            .genre_ids
            .as_ref()
            .and_then(|ids| ids.iter().find_map(|id| Self::genre_name(*id)))
            .map(|name| name.to_string());

        RawItem {
            external_id: item.id.to_string(),
            year: item.release_year(),
            rating: item.vote_average,
            popularity: item.popularity,
            poster_url: item
                .poster_path
                .as_deref()
                .map(|p| format!("https://image.tmdb.org/t/p/w500{}", p)),
            synopsis: item.overview.clone().unwrap_or_default(),
            country,
            genre_hint,
            title: item.title,
        }
    }
}

#[async_trait::async_trait]
impl CatalogProvider for TmdbCatalog {
    async fn discover(
        &self,
        content_type: ContentType,
        country_code: &str,
        year_range: (i32, i32),
        rating_floor: f64,
        page: u32,
    ) -> AppResult<Vec<RawItem>> {
        self.ensure_configured()?;

        let kind = Self::path_kind(content_type);
        let url = format!("{}/discover/{}", self.api_url, kind);

        // Movies and series use different release-date parameter names
        let (date_gte, date_lte) = match content_type {
            ContentType::Movie => ("primary_release_date.gte", "primary_release_date.lte"),
            ContentType::Series => ("first_air_date.gte", "first_air_date.lte"),
        };

        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("language", self.language.as_str()),
                ("include_adult", "false"),
                ("sort_by", "vote_average.desc"),
                ("with_origin_country", country_code),
            ])
            .query(&[
                ("vote_average.gte", rating_floor.to_string()),
                (date_gte, format!("{}-01-01", year_range.0)),
                (date_lte, format!("{}-12-31", year_range.1)),
                ("page", page.to_string()),
            ])
            .send()
            .await?;

        let response = Self::check_response(response).await?;

        let body: CatalogPage = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("malformed discover response: {}", e)))?;

        let items: Vec<RawItem> = body
            .results
            .into_iter()
            .map(|item| Self::to_raw_item(item, country_code))
            .collect();

        tracing::debug!(
            country = %country_code,
            page = page,
            results = items.len(),
            provider = "tmdb",
            "Discovery page fetched"
        );

        Ok(items)
    }

    async fn search_titles(
        &self,
        content_type: ContentType,
        query: &str,
        year_hint: Option<i32>,
    ) -> AppResult<Vec<RawItem>> {
        self.ensure_configured()?;

        if query.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Search query cannot be empty".to_string(),
            ));
        }

        let kind = Self::path_kind(content_type);
        let url = format!("{}/search/{}", self.api_url, kind);

        let year_param = match content_type {
            ContentType::Movie => "year",
            ContentType::Series => "first_air_date_year",
        };

        let mut request = self.http_client.get(&url).query(&[
            ("api_key", self.api_key.as_str()),
            ("language", self.language.as_str()),
            ("query", query),
            ("include_adult", "false"),
        ]);
        if let Some(year) = year_hint {
            request = request.query(&[(year_param, year.to_string())]);
        }

        let response = Self::check_response(request.send().await?).await?;

        let body: CatalogPage = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("malformed search response: {}", e)))?;

        let items: Vec<RawItem> = body
            .results
            .into_iter()
            .map(|item| Self::to_raw_item(item, ""))
            .collect();

        tracing::info!(
            query = %query,
            results = items.len(),
            provider = "tmdb",
            "Title search completed"
        );

        Ok(items)
    }

    async fn fetch_top_cast(
        &self,
        content_type: ContentType,
        external_id: &str,
    ) -> AppResult<Vec<String>> {
        self.ensure_configured()?;

        let kind = Self::path_kind(content_type);
        let url = format!("{}/{}/{}/credits", self.api_url, kind, external_id);

        let response = self
            .http_client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .send()
            .await?;

        let response = Self::check_response(response).await?;

        let credits: CatalogCredits = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("malformed credits response: {}", e)))?;

        Ok(credits
            .cast
            .into_iter()
            .take(TOP_CAST_LIMIT)
            .map(|member| member.name)
            .collect())
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}
