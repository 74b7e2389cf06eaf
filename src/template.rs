//! Placeholder substitution for note templates.
//!
//! Templates are plain text containing `{{VALUE:<Name>}}` tokens. Every
//! occurrence of a known name is replaced; unknown names are left as written.

use regex::{Captures, Regex};
use std::sync::LazyLock;

use crate::model::MediaDetail;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{VALUE:([A-Za-z]+)\}\}").expect("placeholder regex should compile")
});

const NOT_AVAILABLE: &str = "N/A";

/// Characters removed from note file names
const ILLEGAL_FILE_NAME_CHARS: [char; 8] = ['/', ':', '*', '?', '"', '<', '>', '|'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    Title,
    Type,
    Genre,
    Released,
    Runtime,
    Director,
    Actors,
    ImdbRating,
    Plot,
    Poster,
    Year,
    Language,
    Country,
    ImdbId,
}

impl Placeholder {
    pub const ALL: [Placeholder; 14] = [
        Placeholder::Title,
        Placeholder::Type,
        Placeholder::Genre,
        Placeholder::Released,
        Placeholder::Runtime,
        Placeholder::Director,
        Placeholder::Actors,
        Placeholder::ImdbRating,
        Placeholder::Plot,
        Placeholder::Poster,
        Placeholder::Year,
        Placeholder::Language,
        Placeholder::Country,
        Placeholder::ImdbId,
    ];

    /// Field name as written inside the token.
    pub fn name(&self) -> &'static str {
        match self {
            Placeholder::Title => "Title",
            Placeholder::Type => "Type",
            Placeholder::Genre => "Genre",
            Placeholder::Released => "Released",
            Placeholder::Runtime => "Runtime",
            Placeholder::Director => "Director",
            Placeholder::Actors => "Actors",
            Placeholder::ImdbRating => "imdbRating",
            Placeholder::Plot => "Plot",
            Placeholder::Poster => "Poster",
            Placeholder::Year => "Year",
            Placeholder::Language => "Language",
            Placeholder::Country => "Country",
            Placeholder::ImdbId => "imdbID",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Placeholder::ALL.into_iter().find(|p| p.name() == name)
    }

    /// The full token, e.g. `{{VALUE:Title}}`.
    pub fn token(&self) -> String {
        format!("{{{{VALUE:{}}}}}", self.name())
    }

    /// Unescaped value of this field for `detail`.
    pub fn raw_value(&self, detail: &MediaDetail) -> String {
        match self {
            Placeholder::Title => detail.title.clone(),
            Placeholder::Type => detail.kind.label().to_string(),
            Placeholder::Genre => join_or_na(&detail.genres),
            Placeholder::Released => or_na(detail.release_date.as_deref()),
            Placeholder::Runtime => match detail.runtime_minutes {
                Some(minutes) => format!("{} minutes", minutes),
                None => format!("{} minutes", NOT_AVAILABLE),
            },
            Placeholder::Director => or_na(detail.director.as_deref()),
            Placeholder::Actors => join_or_na(&detail.top_cast),
            Placeholder::ImdbRating => or_na(detail.external_rating.as_deref()),
            Placeholder::Plot => or_na(detail.overview.as_deref()),
            Placeholder::Poster => or_na(detail.poster_url.as_deref()),
            Placeholder::Year => or_na(detail.year.as_deref()),
            Placeholder::Language => or_na(detail.original_language.as_deref()),
            Placeholder::Country => join_or_na(&detail.countries),
            Placeholder::ImdbId => or_na(detail.external_id.as_deref()),
        }
    }
}

fn or_na(value: Option<&str>) -> String {
    value.unwrap_or(NOT_AVAILABLE).to_string()
}

fn join_or_na(values: &[String]) -> String {
    if values.is_empty() {
        NOT_AVAILABLE.to_string()
    } else {
        values.join(", ")
    }
}

/// Make a value safe inside a double-quoted template context.
pub fn escape_value(value: &str) -> String {
    value.replace('"', "\\\"").replace('\n', "\\n")
}

/// Replace every known placeholder in `template` with the escaped value from `detail`.
pub fn fill_template(template: &str, detail: &MediaDetail) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| match Placeholder::from_name(&caps[1]) {
            Some(placeholder) => escape_value(&placeholder.raw_value(detail)),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Note file name (without extension) derived from a title.
pub fn sanitize_file_name(title: &str) -> String {
    let sanitized: String = title
        .chars()
        .filter(|c| !ILLEGAL_FILE_NAME_CHARS.contains(c))
        .collect();

    let trimmed = sanitized.trim();
    if trimmed.is_empty() {
        "Untitled".to_string()
    } else {
        trimmed.to_string()
    }
}
