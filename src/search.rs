use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::warn;

use crate::model::SearchResult;
use crate::provider::MetadataSource;
use crate::settings::Settings;
use crate::throttle::Throttle;

/// Minimum spacing between two outbound searches
pub const SEARCH_THROTTLE: Duration = Duration::from_millis(500);

/// A change to the published result list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchUpdate {
    /// Results for `query`. May arrive out of order relative to later queries.
    Results {
        query: String,
        results: Vec<SearchResult>,
    },
    /// The query became blank.
    Cleared,
}

/// Owns the query string and turns edits into throttled provider searches.
pub struct SearchController {
    query: String,
    throttle: Throttle<String>,
    updates: mpsc::UnboundedSender<SearchUpdate>,
}

impl SearchController {
    /// Start a controller on the current runtime. Updates are delivered on the
    /// returned receiver.
    pub fn spawn<S>(
        source: Arc<S>,
        settings: Arc<Settings>,
        window: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<SearchUpdate>)
    where
        S: MetadataSource + ?Sized + 'static,
    {
        let (updates, rx) = mpsc::unbounded_channel();
        let publish = updates.clone();

        let throttle = Throttle::spawn(window, move |query: String| {
            let source = Arc::clone(&source);
            let settings = Arc::clone(&settings);
            let publish = publish.clone();
            // Each search runs on its own; a newer one never cancels it.
            tokio::spawn(async move {
                match source.search(&query, &settings).await {
                    Ok(results) => {
                        let _ = publish.send(SearchUpdate::Results { query, results });
                    }
                    Err(e) => warn!(query, "Search failed: {e}"),
                }
            });
        });

        (
            Self {
                query: String::new(),
                throttle,
                updates,
            },
            rx,
        )
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Record the new query right away and schedule a search for it.
    /// Blank queries clear the results without touching the network.
    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();

        if self.query.trim().is_empty() {
            self.throttle.cancel();
            let _ = self.updates.send(SearchUpdate::Cleared);
            return;
        }

        self.throttle.call(self.query.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use crate::model::{MediaDetail, MediaKind};
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSource {
        queries: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait]
    impl MetadataSource for RecordingSource {
        async fn search(&self, query: &str, _settings: &Settings) -> Result<Vec<SearchResult>> {
            self.queries.lock().unwrap().push(query.to_string());
            if self.fail {
                return Err(Error::MissingApiKey);
            }
            Ok(vec![SearchResult {
                id: 1,
                title: query.to_string(),
                year: "2010".to_string(),
                poster_url: String::new(),
                kind: MediaKind::Movie,
            }])
        }

        async fn detail(&self, _id: u64, kind: MediaKind, _settings: &Settings) -> Result<MediaDetail> {
            Ok(MediaDetail::new("unused", kind))
        }
    }

    fn controller(source: &Arc<RecordingSource>) -> (SearchController, mpsc::UnboundedReceiver<SearchUpdate>) {
        SearchController::spawn(
            Arc::clone(source),
            Arc::new(Settings::default()),
            SEARCH_THROTTLE,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_keystroke_burst_is_throttled() {
        let source = Arc::new(RecordingSource::default());
        let (mut controller, mut updates) = controller(&source);

        let typed = "Inception";
        for end in 1..=typed.len() {
            controller.set_query(&typed[..end]);
            assert_eq!(controller.query(), &typed[..end]);
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        tokio::time::sleep(Duration::from_secs(1)).await;

        let queries = source.queries.lock().unwrap().clone();
        assert_eq!(queries, vec!["I".to_string(), "Inception".to_string()]);

        let mut last = None;
        while let Ok(update) = updates.try_recv() {
            last = Some(update);
        }
        match last {
            Some(SearchUpdate::Results { query, results }) => {
                assert_eq!(query, "Inception");
                assert_eq!(results.len(), 1);
            }
            other => panic!("unexpected update: {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_query_clears_without_request() {
        let source = Arc::new(RecordingSource::default());
        let (mut controller, mut updates) = controller(&source);

        controller.set_query("   ");
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert!(source.queries.lock().unwrap().is_empty());
        assert_eq!(updates.try_recv().unwrap(), SearchUpdate::Cleared);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clearing_drops_pending_trailing_search() {
        let source = Arc::new(RecordingSource::default());
        let (mut controller, _updates) = controller(&source);

        controller.set_query("a");
        controller.set_query("ab");
        controller.set_query("");
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(*source.queries.lock().unwrap(), vec!["a".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_errors_are_swallowed() {
        let source = Arc::new(RecordingSource {
            fail: true,
            ..Default::default()
        });
        let (mut controller, mut updates) = controller(&source);

        controller.set_query("Inception");
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(source.queries.lock().unwrap().len(), 1);
        assert!(updates.try_recv().is_err());
    }
}
