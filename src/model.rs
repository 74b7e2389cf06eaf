use serde::{Deserialize, Serialize};
use std::fmt;

// --- Media kind ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Movie,
    Tv,
}

impl MediaKind {
    /// Label shown to users and substituted for `{{VALUE:Type}}`.
    pub fn label(&self) -> &'static str {
        match self {
            MediaKind::Movie => "Movie",
            MediaKind::Tv => "TV",
        }
    }

    /// Provider `media_type` tag, also the detail endpoint path segment.
    pub fn provider_tag(&self) -> &'static str {
        match self {
            MediaKind::Movie => "movie",
            MediaKind::Tv => "tv",
        }
    }

    pub fn from_provider_tag(tag: &str) -> Option<Self> {
        match tag {
            "movie" => Some(MediaKind::Movie),
            "tv" => Some(MediaKind::Tv),
            _ => None,
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl Serialize for MediaKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for MediaKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        match s.as_str() {
            "Movie" => Ok(MediaKind::Movie),
            "TV" => Ok(MediaKind::Tv),
            other => Err(serde::de::Error::custom(format!(
                "Invalid media kind '{}'. Must be one of: Movie, TV",
                other
            ))),
        }
    }
}

// --- Records ---

/// One row of a multi-search, already filtered to movies and TV shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub id: u64,
    pub title: String,
    /// Four-digit year or `"Unknown"`
    pub year: String,
    pub poster_url: String,
    pub kind: MediaKind,
}

/// Full metadata for one title, merged with the optional external rating.
///
/// Absent values stay `None` (or empty for lists) and are rendered as `N/A`
/// when the note is filled in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaDetail {
    pub title: String,
    pub kind: MediaKind,
    pub genres: Vec<String>,
    pub release_date: Option<String>,
    pub runtime_minutes: Option<u32>,
    pub director: Option<String>,
    pub top_cast: Vec<String>,
    pub external_rating: Option<String>,
    pub overview: Option<String>,
    pub poster_url: Option<String>,
    pub year: Option<String>,
    pub original_language: Option<String>,
    pub countries: Vec<String>,
    pub external_id: Option<String>,
}

impl MediaDetail {
    /// A detail record with only the title and kind known.
    pub fn new(title: impl Into<String>, kind: MediaKind) -> Self {
        Self {
            title: title.into(),
            kind,
            genres: Vec::new(),
            release_date: None,
            runtime_minutes: None,
            director: None,
            top_cast: Vec::new(),
            external_rating: None,
            overview: None,
            poster_url: None,
            year: None,
            original_language: None,
            countries: Vec::new(),
            external_id: None,
        }
    }
}

/// Year part of a provider date (`"1999-03-31"` -> `"1999"`).
pub fn year_of(date: &str) -> Option<String> {
    date.split('-')
        .next()
        .map(str::trim)
        .filter(|year| !year.is_empty())
        .map(str::to_string)
}
