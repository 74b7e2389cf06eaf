//! Composes search, result list and note generation into one dialog session.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use crate::dialog::{Dialog, DialogEvent, DialogView, Notice, Outcome};
use crate::error::{Error, Result};
use crate::model::SearchResult;
use crate::note::{CreatedNote, NoteGenerator, Vault};
use crate::provider::MetadataSource;
use crate::search::SearchController;
use crate::settings::Settings;

/// A UI layer able to show the search dialog.
#[async_trait]
pub trait DialogHost: Send {
    fn open(&mut self) -> Result<()>;

    /// Next user input, or `None` once the host has gone away.
    /// Must be cancel safe.
    async fn next_event(&mut self) -> Option<DialogEvent>;

    fn render(&mut self, view: DialogView<'_>) -> Result<()>;

    fn notice(&mut self, notice: Notice);

    fn close(&mut self);
}

/// Run one dialog session: search until the user selects or cancels, then
/// create the note for the selection. The host is always closed on return.
pub async fn run_dialog<H, S, V>(
    host: &mut H,
    generator: &NoteGenerator<S, V>,
    source: Arc<S>,
    settings: Arc<Settings>,
    throttle: Duration,
) -> Result<Option<CreatedNote>>
where
    H: DialogHost + ?Sized,
    S: MetadataSource + ?Sized + 'static,
    V: Vault,
{
    if settings.metadata_key().is_none() {
        host.notice(Notice::error(Error::MissingApiKey.to_string()));
        return Err(Error::MissingApiKey);
    }

    host.open()?;
    let outcome = drive(host, generator, source, settings, throttle).await;
    host.close();
    outcome
}

async fn drive<H, S, V>(
    host: &mut H,
    generator: &NoteGenerator<S, V>,
    source: Arc<S>,
    settings: Arc<Settings>,
    throttle: Duration,
) -> Result<Option<CreatedNote>>
where
    H: DialogHost + ?Sized,
    S: MetadataSource + ?Sized + 'static,
    V: Vault,
{
    let (mut controller, mut updates) =
        SearchController::spawn(source, Arc::clone(&settings), throttle);
    let mut dialog = Dialog::default();
    host.render(dialog.view())?;

    let selection = loop {
        tokio::select! {
            event = host.next_event() => match event {
                None => break None,
                Some(event) => match dialog.handle(event) {
                    Outcome::Idle => {}
                    Outcome::QueryChanged => controller.set_query(dialog.query()),
                    Outcome::Select(selected) => break Some(selected),
                    Outcome::Cancel => break None,
                },
            },
            Some(update) = updates.recv() => dialog.apply(update),
        }
        host.render(dialog.view())?;
    };
    drop(controller);

    let Some(selected) = selection else {
        return Ok(None);
    };

    dialog.set_status(format!("Creating note for {}…", selected.title));
    host.render(dialog.view())?;

    // Input is not read while the note is created, so the flow always finishes.
    match generator.create(&selected, &settings).await {
        Ok(note) => {
            host.notice(Notice::info(format!("Created {}", note.vault_path)));
            Ok(Some(note))
        }
        Err(e) => {
            error!("Failed to create note for {}: {e}", selected.title);
            host.notice(Notice::error(format!("Failed to create note: {}", e)));
            Ok(None)
        }
    }
}

/// Non-interactive pipeline: search once, take result `pick`, create the note.
pub async fn create_from_query<S, V>(
    generator: &NoteGenerator<S, V>,
    source: &S,
    query: &str,
    pick: usize,
    settings: &Settings,
) -> Result<Option<(SearchResult, CreatedNote)>>
where
    S: MetadataSource + ?Sized,
    V: Vault,
{
    if query.trim().is_empty() {
        return Ok(None);
    }

    let results = source.search(query, settings).await?;
    let Some(selected) = results.into_iter().nth(pick) else {
        info!(query, pick, "No search result at that position");
        return Ok(None);
    };

    let note = generator.create(&selected, settings).await?;
    Ok(Some((selected, note)))
}
