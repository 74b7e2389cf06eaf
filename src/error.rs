use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the search-to-note pipeline.
#[derive(Debug, Error)]
pub enum Error {
    /// The metadata provider key is empty, so no request can be made
    #[error("Metadata API key is not set. Run `cinenote config set metadata-api-key <KEY>`")]
    MissingApiKey,

    /// Transport failure or non-success status from a provider endpoint
    #[error("{endpoint} request failed: {source}")]
    Request {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("Invalid provider URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Template file not found: {0}")]
    TemplateNotFound(String),

    /// The vault refuses to overwrite an existing note
    #[error("A note already exists at {}", .0.display())]
    NoteExists(PathBuf),

    #[error("Unknown setting '{0}'. Valid: metadata-api-key, ratings-api-key, template-path, output-folder")]
    UnknownSetting(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Wrap a reqwest error, dropping the URL so API keys in the query string
    /// never reach notices or logs.
    pub(crate) fn request(endpoint: &'static str, source: reqwest::Error) -> Self {
        Error::Request {
            endpoint,
            source: source.without_url(),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
