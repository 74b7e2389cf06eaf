//! Response shapes of the metadata and ratings providers.
//!
//! Every field is optional on the wire; the conversions below apply the
//! defaulting rules once so the rest of the crate works with plain records.

use serde::{Deserialize, Deserializer};

use super::Endpoints;
use crate::model::{year_of, MediaDetail, MediaKind, SearchResult};

/// Maximum number of cast names kept in a detail record
pub const TOP_CAST_LIMIT: usize = 5;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct MultiSearchResponse {
    #[serde(deserialize_with = "null_as_default")]
    pub results: Vec<RawSearchItem>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawSearchItem {
    pub media_type: Option<String>,
    pub id: u64,
    pub title: Option<String>,
    pub name: Option<String>,
    pub release_date: Option<String>,
    pub first_air_date: Option<String>,
    pub poster_path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawDetail {
    pub title: Option<String>,
    pub name: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub genres: Vec<Named>,
    pub release_date: Option<String>,
    pub first_air_date: Option<String>,
    pub runtime: Option<u32>,
    #[serde(deserialize_with = "null_as_default")]
    pub episode_run_time: Vec<u32>,
    #[serde(deserialize_with = "null_as_default")]
    pub credits: Credits,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
    pub original_language: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub production_countries: Vec<Named>,
    #[serde(deserialize_with = "null_as_default")]
    pub external_ids: ExternalIds,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Named {
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Credits {
    #[serde(deserialize_with = "null_as_default")]
    pub cast: Vec<Named>,
    #[serde(deserialize_with = "null_as_default")]
    pub crew: Vec<CrewMember>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CrewMember {
    pub name: Option<String>,
    pub job: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ExternalIds {
    pub imdb_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RatingResponse {
    #[serde(rename = "imdbRating")]
    pub imdb_rating: Option<String>,
}

// Providers send `null` for empty collections as often as they omit them.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// Empty strings count as absent.
fn present(value: Option<&String>) -> Option<&str> {
    value.map(|s| s.trim()).filter(|s| !s.is_empty())
}

fn names(list: &[Named]) -> Vec<String> {
    list.iter()
        .filter_map(|n| present(n.name.as_ref()))
        .map(str::to_string)
        .collect()
}

impl RawSearchItem {
    /// Map one search hit, or `None` for people and other media types.
    pub fn into_result(self, endpoints: &Endpoints) -> Option<SearchResult> {
        let kind = MediaKind::from_provider_tag(self.media_type.as_deref()?)?;

        let title = present(self.title.as_ref())
            .or_else(|| present(self.name.as_ref()))
            .unwrap_or_default()
            .to_string();

        let year = present(self.release_date.as_ref())
            .or_else(|| present(self.first_air_date.as_ref()))
            .and_then(year_of)
            .unwrap_or_else(|| "Unknown".to_string());

        let poster_url = match present(self.poster_path.as_ref()) {
            Some(path) => endpoints.thumbnail_url(path),
            None => endpoints.placeholder_poster.clone(),
        };

        Some(SearchResult {
            id: self.id,
            title,
            year,
            poster_url,
            kind,
        })
    }
}

impl RawDetail {
    /// Build the detail record; the external rating is merged by the caller.
    pub fn into_detail(self, kind: MediaKind, endpoints: &Endpoints) -> MediaDetail {
        let title = present(self.title.as_ref())
            .or_else(|| present(self.name.as_ref()))
            .unwrap_or("Untitled")
            .to_string();

        let release_date = present(self.release_date.as_ref())
            .or_else(|| present(self.first_air_date.as_ref()))
            .map(str::to_string);

        // A runtime of 0 means the provider does not know it
        let runtime_minutes = self
            .runtime
            .filter(|minutes| *minutes > 0)
            .or_else(|| self.episode_run_time.first().copied());

        let director = self
            .credits
            .crew
            .iter()
            .find(|member| member.job.as_deref() == Some("Director"))
            .and_then(|member| present(member.name.as_ref()))
            .map(str::to_string);

        let mut top_cast = names(&self.credits.cast);
        top_cast.truncate(TOP_CAST_LIMIT);

        MediaDetail {
            title,
            kind,
            genres: names(&self.genres),
            year: release_date.as_deref().and_then(year_of),
            release_date,
            runtime_minutes,
            director,
            top_cast,
            external_rating: None,
            overview: present(self.overview.as_ref()).map(str::to_string),
            poster_url: present(self.poster_path.as_ref()).map(|path| endpoints.poster_url(path)),
            original_language: present(self.original_language.as_ref()).map(str::to_string),
            countries: names(&self.production_countries),
            external_id: present(self.external_ids.imdb_id.as_ref()).map(str::to_string),
        }
    }
}

impl RatingResponse {
    pub fn rating(self) -> String {
        present(self.imdb_rating.as_ref())
            .unwrap_or("N/A")
            .to_string()
    }
}
