//! Client for the movie/TV metadata provider and the secondary ratings provider.
//!
//! The metadata calls (`search`, `get_detail`) propagate failures to the
//! caller. The ratings call is decorative: any failure turns into `"N/A"`.

pub mod wire;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::model::{MediaDetail, MediaKind, SearchResult};
use crate::settings::Settings;
use wire::{MultiSearchResponse, RatingResponse, RawDetail};

pub const DEFAULT_API_BASE: &str = "https://api.themoviedb.org/3/";
pub const DEFAULT_IMAGE_BASE: &str = "https://image.tmdb.org/t/p/";
pub const DEFAULT_RATINGS_BASE: &str = "https://www.omdbapi.com/";
pub const PLACEHOLDER_POSTER: &str = "https://via.placeholder.com/92x138.png?text=No+Image";

/// Poster size used in result lists
pub const THUMBNAIL_SIZE: &str = "w92";
/// Poster size substituted into notes
pub const POSTER_SIZE: &str = "w500";

// Source of search results and details. The search controller and note
// generator only see this trait.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    async fn search(&self, query: &str, settings: &Settings) -> Result<Vec<SearchResult>>;

    async fn detail(&self, id: u64, kind: MediaKind, settings: &Settings) -> Result<MediaDetail>;
}

/// Base URLs of the remote services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub api_base: String,
    pub image_base: String,
    pub ratings_base: String,
    pub placeholder_poster: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            image_base: DEFAULT_IMAGE_BASE.to_string(),
            ratings_base: DEFAULT_RATINGS_BASE.to_string(),
            placeholder_poster: PLACEHOLDER_POSTER.to_string(),
        }
    }
}

impl Endpoints {
    /// Point the metadata and ratings APIs at other hosts, e.g. a local mock.
    pub fn with_bases(api_base: impl Into<String>, ratings_base: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into(),
            ratings_base: ratings_base.into(),
            ..Self::default()
        }
    }

    pub fn thumbnail_url(&self, poster_path: &str) -> String {
        self.image_url(THUMBNAIL_SIZE, poster_path)
    }

    pub fn poster_url(&self, poster_path: &str) -> String {
        self.image_url(POSTER_SIZE, poster_path)
    }

    fn image_url(&self, size: &str, poster_path: &str) -> String {
        format!(
            "{}/{}/{}",
            self.image_base.trim_end_matches('/'),
            size,
            poster_path.trim_start_matches('/')
        )
    }

    fn api_url(&self, path: &str) -> Result<Url> {
        let base = format!("{}/", self.api_base.trim_end_matches('/'));
        Ok(Url::parse(&base)?.join(path)?)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MetadataClient {
    http: reqwest::Client,
    endpoints: Endpoints,
}

impl MetadataClient {
    pub fn new(endpoints: Endpoints) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoints,
        }
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Multi-type search, filtered to movies and TV shows.
    pub async fn search(&self, query: &str, settings: &Settings) -> Result<Vec<SearchResult>> {
        let api_key = settings.metadata_key().ok_or(Error::MissingApiKey)?;
        let url = self.endpoints.api_url("search/multi")?;
        debug!(query, "searching metadata provider");

        let response: MultiSearchResponse = self
            .get_json("search", url, &[("api_key", api_key), ("query", query)])
            .await?;

        Ok(response
            .results
            .into_iter()
            .filter_map(|item| item.into_result(&self.endpoints))
            .collect())
    }

    /// Full detail for one title, enriched with the external rating when a
    /// ratings key is configured and the title has an external id.
    pub async fn get_detail(
        &self,
        id: u64,
        kind: MediaKind,
        settings: &Settings,
    ) -> Result<MediaDetail> {
        let api_key = settings.metadata_key().ok_or(Error::MissingApiKey)?;
        let url = self
            .endpoints
            .api_url(&format!("{}/{}", kind.provider_tag(), id))?;
        debug!(id, kind = %kind, "fetching detail");

        let raw: RawDetail = self
            .get_json(
                "detail",
                url,
                &[
                    ("api_key", api_key),
                    ("append_to_response", "external_ids,credits"),
                ],
            )
            .await?;

        let mut detail = raw.into_detail(kind, &self.endpoints);

        if settings.ratings_key().is_some() {
            if let Some(external_id) = detail.external_id.clone() {
                detail.external_rating =
                    Some(self.get_secondary_rating(&external_id, settings).await);
            }
        }

        Ok(detail)
    }

    /// Best-effort rating lookup. Never fails; problems become `"N/A"`.
    pub async fn get_secondary_rating(&self, external_id: &str, settings: &Settings) -> String {
        let Some(api_key) = settings.ratings_key() else {
            return "N/A".to_string();
        };

        let url = match Url::parse(&self.endpoints.ratings_base) {
            Ok(url) => url,
            Err(e) => {
                warn!("Invalid ratings URL: {e}");
                return "N/A".to_string();
            }
        };

        match self
            .get_json::<RatingResponse>("rating", url, &[("i", external_id), ("apikey", api_key)])
            .await
        {
            Ok(response) => response.rating(),
            Err(e) => {
                warn!(external_id, "Failed to fetch external rating: {e}");
                "N/A".to_string()
            }
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        url: Url,
        params: &[(&str, &str)],
    ) -> Result<T> {
        let response = self
            .http
            .get(url)
            .query(params)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| Error::request(endpoint, e))?;

        response
            .json::<T>()
            .await
            .map_err(|e| Error::request(endpoint, e))
    }
}

#[async_trait]
impl MetadataSource for MetadataClient {
    async fn search(&self, query: &str, settings: &Settings) -> Result<Vec<SearchResult>> {
        MetadataClient::search(self, query, settings).await
    }

    async fn detail(&self, id: u64, kind: MediaKind, settings: &Settings) -> Result<MediaDetail> {
        self.get_detail(id, kind, settings).await
    }
}
