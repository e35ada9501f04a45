use serde::{Deserialize, Serialize};
use std::fmt::Display;

pub mod exclusions;

pub use exclusions::{EntryMeta, ListKind, TitleLists, UserProfile};

/// Type of content the feed serves
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Movie,
    Series,
}

impl Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContentType::Movie => write!(f, "movie"),
            ContentType::Series => write!(f, "series"),
        }
    }
}

/// Lower-cases and trims a title for equality and exclusion checks
pub fn normalize_title(title: &str) -> String {
    title.trim().to_lowercase()
}

/// One catalog row as produced by the aggregation fan-out, before dedup
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawItem {
    /// Opaque provider identifier
    pub external_id: String,
    pub title: String,
    pub year: Option<i32>,
    /// Provider rating on a 0-10 scale
    pub rating: f64,
    /// Provider-defined popularity score
    pub popularity: f64,
    pub poster_url: Option<String>,
    pub synopsis: String,
    /// Best-effort origin country, falls back to the facet code
    pub country: String,
    pub genre_hint: Option<String>,
}

/// A catalog item under consideration for the feed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Candidate {
    pub external_id: String,
    pub title: String,
    /// Derived from `title`; used for all equality and exclusion checks
    pub normalized_title: String,
    pub year: Option<i32>,
    pub rating: f64,
    pub popularity: f64,
    pub poster_url: Option<String>,
    pub synopsis: String,
    /// Up to 3 lead names, empty until enriched
    pub cast: Vec<String>,
    pub country: String,
    pub genre_hint: Option<String>,
}

impl Candidate {
    /// Builds a candidate from a raw catalog row, deriving the normalized title
    pub fn from_raw(raw: RawItem) -> Self {
        Self {
            normalized_title: normalize_title(&raw.title),
            external_id: raw.external_id,
            title: raw.title,
            year: raw.year,
            rating: raw.rating,
            popularity: raw.popularity,
            poster_url: raw.poster_url,
            synopsis: raw.synopsis,
            cast: Vec::new(),
            country: raw.country,
            genre_hint: raw.genre_hint,
        }
    }

    /// Persistable metadata for seen/watch-list entries
    pub fn entry_meta(&self) -> EntryMeta {
        EntryMeta {
            poster_url: self.poster_url.clone(),
            year: self.year,
            rating: Some(self.rating),
            viewed_at: Some(chrono::Utc::now()),
        }
    }
}

// ============================================================================
// Catalog API Types
// ============================================================================

/// One page of a paginated catalog response
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogPage {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub results: Vec<CatalogItem>,
}

/// Raw catalog API item (discover and search responses share this shape)
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogItem {
    pub id: u64,
    /// Movies use `title`, series use `name`
    #[serde(alias = "name")]
    pub title: String,
    /// Movies use `release_date`, series use `first_air_date`
    #[serde(default, alias = "first_air_date")]
    pub release_date: Option<String>,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub popularity: f64,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub origin_country: Option<Vec<String>>,
    #[serde(default)]
    pub genre_ids: Option<Vec<i32>>,
}

impl CatalogItem {
    /// Year parsed from the leading `YYYY` of the release date
    pub fn release_year(&self) -> Option<i32> {
        self.release_date
            .as_deref()
            .and_then(|d| d.get(..4))
            .and_then(|y| y.parse().ok())
    }
}

/// Credits response for the cast-detail operation
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogCredits {
    #[serde(default)]
    pub cast: Vec<CastMember>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CastMember {
    pub name: String,
}

// ============================================================================
// Feed API Types
// ============================================================================

/// Request body for the feed endpoint
#[derive(Debug, Deserialize)]
pub struct FeedRequest {
    pub content_type: ContentType,
    #[serde(default)]
    pub countries: Vec<String>,
    /// `[min, max]`, clamped by the facet planner
    pub year_range: Option<[i32; 2]>,
    pub rating_floor: Option<f64>,
    pub count: Option<usize>,
    #[serde(default)]
    pub seen_titles: Vec<String>,
    #[serde(default)]
    pub rejected_titles: Vec<String>,
    pub genre_hint: Option<String>,
}

/// Response body for the feed endpoint
#[derive(Debug, Serialize)]
pub struct FeedResponse {
    pub candidates: Vec<Candidate>,
}

/// Swipe actions exposed on the HTTP surface
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SwipeWireAction {
    Seen,
    ToWatch,
}

/// Request body for the swipe endpoint
#[derive(Debug, Deserialize)]
pub struct SwipeRequest {
    pub user_id: String,
    pub content_type: ContentType,
    pub title: String,
    pub action: SwipeWireAction,
    pub poster_url: Option<String>,
    pub year: Option<i32>,
    pub rating: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct SwipeResponse {
    pub success: bool,
}

/// Request body for the add-to-rejected write
#[derive(Debug, Deserialize)]
pub struct RejectRequest {
    pub user_id: String,
    pub content_type: ContentType,
    pub title: String,
}

/// Request body for single-item list removal
#[derive(Debug, Deserialize)]
pub struct ListItemRequest {
    pub user_id: String,
    pub content_type: ContentType,
    pub title: String,
}

/// Request body for a full-list clear
#[derive(Debug, Deserialize)]
pub struct ListClearRequest {
    pub user_id: String,
    pub content_type: ContentType,
}
