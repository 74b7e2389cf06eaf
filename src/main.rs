use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::warn;

use cinenote::note::{FsVault, NoteGenerator};
use cinenote::provider::{Endpoints, MetadataClient};
use cinenote::search::SEARCH_THROTTLE;
use cinenote::settings::{self, SettingKey, Settings};
use cinenote::shell::{create_from_query, run_dialog};
use cinenote::tui::TerminalHost;
use cinenote::{logging, Error};

#[derive(Parser, Debug)]
#[command(name = "cinenote", version, about, long_about = None)]
struct Cli {
    /// Settings file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Vault directory holding templates and notes
    #[arg(long, global = true, env = "CINENOTE_VAULT")]
    vault: Option<PathBuf>,

    /// Do not open created notes with the system handler
    #[arg(long, global = true)]
    no_open: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// Show search popup
    Search,
    /// Create a note from the Nth search result without the popup
    Create {
        #[arg(value_parser = non_blank_query)]
        query: String,
        /// 1-based position in the search results
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
        pick: u64,
    },
    /// Print search results
    Find {
        #[arg(value_parser = non_blank_query)]
        query: String,
        #[arg(long)]
        json: bool,
    },
    /// Inspect or change settings
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },
}

#[derive(Subcommand, Debug, Clone)]
enum ConfigCommand {
    /// Print all settings, API keys masked
    Show,
    /// Print the settings file location
    Path,
    /// Change one setting
    Set { key: String, value: String },
}

fn non_blank_query(value: &str) -> Result<String, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err("query must not be blank".to_string())
    } else {
        Ok(trimmed.to_string())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command.clone().unwrap_or(Command::Search);
    let config_path = cli.config.clone().unwrap_or_else(settings::default_settings_path);

    // Held until exit so queued file logs are flushed.
    let _log_guard = if matches!(command, Command::Search) {
        let log_dir = settings::default_settings_path()
            .parent()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        match logging::init_file(&log_dir) {
            Ok(guard) => Some(guard),
            Err(e) => {
                eprintln!("Logging disabled: {e}");
                None
            }
        }
    } else {
        logging::init_stderr();
        None
    };

    let settings = settings::load_settings(&config_path);
    let vault_root = match cli.vault {
        Some(root) => root,
        None => std::env::current_dir().context("Failed to resolve current directory")?,
    };
    let vault = FsVault::new(vault_root).with_open_notes(!cli.no_open);
    let client = Arc::new(MetadataClient::new(Endpoints::default()));

    match command {
        Command::Search => search(client, vault, settings).await,
        Command::Create { query, pick } => create(client, vault, &settings, &query, pick).await,
        Command::Find { query, json } => find(&client, &settings, &query, json).await,
        Command::Config { action } => config(action, &config_path),
    }
}

async fn search(client: Arc<MetadataClient>, vault: FsVault, settings: Settings) -> Result<()> {
    let generator = NoteGenerator::new(Arc::clone(&client), vault);
    let mut host = TerminalHost::new();
    match run_dialog(&mut host, &generator, client, Arc::new(settings), SEARCH_THROTTLE).await {
        Ok(_) => Ok(()),
        Err(Error::MissingApiKey) => {
            warn!("Search popup refused: metadata API key is not set");
            Ok(())
        }
        Err(e) => Err(e).context("Search popup failed"),
    }
}

async fn create(
    client: Arc<MetadataClient>,
    vault: FsVault,
    settings: &Settings,
    query: &str,
    pick: u64,
) -> Result<()> {
    let generator = NoteGenerator::new(Arc::clone(&client), vault);
    let index = usize::try_from(pick - 1).context("--pick is too large")?;
    let created = create_from_query(&generator, client.as_ref(), query, index, settings)
        .await
        .with_context(|| format!("Failed to create a note for {:?}", query))?;

    match created {
        Some((selected, note)) => {
            println!(
                "Created {} from {} ({}, {})",
                note.location.display(),
                selected.title,
                selected.year,
                selected.kind
            );
            Ok(())
        }
        None => bail!("No search result #{} for {:?}", pick, query),
    }
}

async fn find(client: &MetadataClient, settings: &Settings, query: &str, json: bool) -> Result<()> {
    let results = client
        .search(query, settings)
        .await
        .with_context(|| format!("Search for {:?} failed", query))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else if results.is_empty() {
        println!("No results");
    } else {
        for (i, result) in results.iter().enumerate() {
            println!("{:>3}. {} | {} | {}", i + 1, result.title, result.year, result.kind);
        }
    }
    Ok(())
}

fn config(action: ConfigCommand, path: &Path) -> Result<()> {
    match action {
        ConfigCommand::Show => {
            let settings = settings::load_settings(path);
            for key in SettingKey::ALL {
                let value = settings.get(key);
                if key.is_secret() {
                    println!("{} = {}", key, settings::mask(value));
                } else {
                    println!("{} = {}", key, value);
                }
            }
        }
        ConfigCommand::Path => println!("{}", path.display()),
        ConfigCommand::Set { key, value } => {
            let key: SettingKey = key.parse()?;
            let mut settings = settings::load_settings(path);
            settings.set(key, value);
            settings::save_settings(path, &settings)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Updated {}", key);
        }
    }
    Ok(())
}
