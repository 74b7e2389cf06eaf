use async_trait::async_trait;
use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::model::SearchResult;
use crate::provider::MetadataSource;
use crate::settings::Settings;
use crate::template::{fill_template, sanitize_file_name};

pub const NOTE_EXTENSION: &str = "md";

// Storage holding templates and generated notes. Paths are vault-relative
// strings as they appear in settings.
#[async_trait]
pub trait Vault: Send + Sync {
    /// Contents of the document at `path`, or `None` if it does not exist.
    async fn read(&self, path: &str) -> Result<Option<String>>;

    /// Create `path` and its parents if missing.
    async fn ensure_folder(&self, path: &str) -> Result<()>;

    /// Create a new document. Fails with [`Error::NoteExists`] if one is already there.
    async fn create(&self, path: &str, contents: &str) -> Result<PathBuf>;

    /// Show the document to the user.
    async fn open(&self, location: &Path) -> Result<()>;
}

/// A vault backed by a directory on disk.
#[derive(Debug, Clone)]
pub struct FsVault {
    root: PathBuf,
    open_notes: bool,
}

impl FsVault {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            open_notes: true,
        }
    }

    /// Whether `open` launches the system handler. Disabled, it is a no-op.
    pub fn with_open_notes(mut self, open_notes: bool) -> Self {
        self.open_notes = open_notes;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn resolve(&self, path: &str) -> PathBuf {
        let relative = Path::new(path);
        if relative.is_absolute() {
            relative.to_path_buf()
        } else {
            self.root.join(relative)
        }
    }
}

#[async_trait]
impl Vault for FsVault {
    async fn read(&self, path: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.resolve(path)).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn ensure_folder(&self, path: &str) -> Result<()> {
        let folder = self.resolve(path);
        if !folder.exists() {
            fs::create_dir_all(&folder).await?;
        }
        Ok(())
    }

    async fn create(&self, path: &str, contents: &str) -> Result<PathBuf> {
        let file_path = self.resolve(path);
        let mut file = match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&file_path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(Error::NoteExists(file_path));
            }
            Err(e) => return Err(e.into()),
        };

        write_or_remove(&mut file, &file_path, contents).await?;
        Ok(file_path)
    }

    async fn open(&self, location: &Path) -> Result<()> {
        if !self.open_notes {
            return Ok(());
        }
        let location = location.to_path_buf();
        tokio::task::spawn_blocking(move || open::that(location))
            .await
            .map_err(std::io::Error::other)??;
        Ok(())
    }
}

// Write the whole note or delete the half-written file, so a later attempt
// is not blocked by a partial note.
async fn write_or_remove<W>(file: &mut W, file_path: &Path, contents: &str) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let written = match file.write_all(contents.as_bytes()).await {
        Ok(()) => file.flush().await,
        Err(e) => Err(e),
    };

    if let Err(e) = written {
        if let Err(remove_err) = fs::remove_file(file_path).await {
            warn!("Failed to remove partial note {}: {remove_err}", file_path.display());
        }
        return Err(e.into());
    }
    Ok(())
}

/// A note written by the generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedNote {
    pub title: String,
    /// Vault-relative path, e.g. `Movies/MovieData/Inception.md`
    pub vault_path: String,
    pub location: PathBuf,
}

/// Turns a selected search result into a note in the vault.
pub struct NoteGenerator<S: ?Sized, V> {
    source: Arc<S>,
    vault: V,
}

impl<S, V> NoteGenerator<S, V>
where
    S: MetadataSource + ?Sized,
    V: Vault,
{
    pub fn new(source: Arc<S>, vault: V) -> Self {
        Self { source, vault }
    }

    pub fn vault(&self) -> &V {
        &self.vault
    }

    /// Fetch the detail, fill the template and write the note, then open it.
    ///
    /// Nothing is written unless the detail fetch and template read both
    /// succeed. Failing to open the written note is only logged.
    pub async fn create(&self, selected: &SearchResult, settings: &Settings) -> Result<CreatedNote> {
        let detail = self
            .source
            .detail(selected.id, selected.kind, settings)
            .await?;

        let template = self
            .vault
            .read(&settings.template_path)
            .await?
            .ok_or_else(|| Error::TemplateNotFound(settings.template_path.clone()))?;

        let content = fill_template(&template, &detail);
        let file_name = sanitize_file_name(&detail.title);

        self.vault.ensure_folder(&settings.output_folder).await?;

        let vault_path = note_path(&settings.output_folder, &file_name);
        let location = self.vault.create(&vault_path, &content).await?;
        info!(path = %location.display(), "Created note for {}", detail.title);

        if let Err(e) = self.vault.open(&location).await {
            warn!("Failed to open {}: {e}", location.display());
        }

        Ok(CreatedNote {
            title: detail.title,
            vault_path,
            location,
        })
    }
}

/// `<folder>/<name>.md`, or just `<name>.md` for an empty folder.
pub fn note_path(folder: &str, file_name: &str) -> String {
    let folder = folder.trim().trim_end_matches('/');
    if folder.is_empty() {
        format!("{}.{}", file_name, NOTE_EXTENSION)
    } else {
        format!("{}/{}.{}", folder, file_name, NOTE_EXTENSION)
    }
}
