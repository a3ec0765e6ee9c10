//! Medialist CLI
//!
//! Command-line interface for medialist - lists of movies, series and anime.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use medialist_core::{Anime, Backend, Config, MediaKind, Movie, Store, StoreError, TvSeries};

mod commands;
mod output;

use output::{Output, OutputFormat};

/// Environment variable holding the log filter
const LOG_ENV: &str = "MEDIALIST_LOG";

#[derive(Parser)]
#[command(name = "medialist")]
#[command(about = "Medialist - curated lists of movies, series and anime")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Storage backend for this run (memory, file, sqlite)
    #[arg(long, global = true)]
    backend: Option<Backend>,

    /// Path to an alternative config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage lists
    List {
        #[command(subcommand)]
        command: ListCommands,
    },
    /// Add a title to a list
    Add {
        #[command(subcommand)]
        command: AddCommands,
    },
    /// Remove a title from a list
    #[command(alias = "rm")]
    Remove {
        /// Media kind (movie, series, anime)
        kind: MediaKind,
        /// List ID
        list: i64,
        /// Title ID
        id: i64,
    },
    /// Show every stored title of a kind
    Catalog {
        /// Media kind (movie, series, anime)
        kind: MediaKind,
    },
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
    /// Show status (backend, storage location, counts)
    Status,
}

#[derive(Subcommand)]
enum ListCommands {
    /// Create a new list
    Create {
        /// List ID
        id: i64,
        /// List name
        name: String,
        /// Owning user
        #[arg(short, long)]
        owner: String,
    },
    /// Show a list and its members
    Show {
        /// List ID
        id: i64,
    },
    /// Show all lists of a user
    Ls {
        /// Owning user
        #[arg(short, long)]
        owner: String,
    },
    /// Delete a list and its memberships
    #[command(alias = "rm")]
    Delete {
        /// List ID
        id: i64,
    },
    /// Remove every member from a list
    Clear {
        /// List ID
        id: i64,
    },
}

#[derive(Subcommand)]
enum AddCommands {
    /// Add a movie
    Movie {
        /// List ID
        list: i64,
        /// Catalog ID
        id: i64,
        /// Title
        title: String,
        /// Runtime in minutes
        #[arg(long, default_value_t = 0)]
        runtime: i64,
        /// Release year
        #[arg(long, default_value_t = 0)]
        year: i64,
    },
    /// Add a TV series
    Series {
        /// List ID
        list: i64,
        /// Catalog ID
        id: i64,
        /// Title
        title: String,
        /// Number of seasons
        #[arg(long, default_value_t = 0)]
        seasons: i64,
        /// Number of episodes
        #[arg(long, default_value_t = 0)]
        episodes: i64,
    },
    /// Add an anime
    Anime {
        /// List ID
        list: i64,
        /// Catalog ID
        id: i64,
        /// Title
        title: String,
        /// Number of episodes
        #[arg(long, default_value_t = 0)]
        episodes: i64,
        /// Release year
        #[arg(long, default_value_t = 0)]
        year: i64,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, backend, delimiter, pool_size, log_file)
        key: String,
        /// Configuration value
        value: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));

    match run(cli, &output) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_error(&err, &output);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli, output: &Output) -> Result<()> {
    let config_path = cli.config.as_ref();

    // Commands that don't need the store
    if let Commands::Config { command } = &cli.command {
        return handle_config_command(command.clone(), config_path, output);
    }

    let mut config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;
    if let Some(backend) = cli.backend {
        config.backend = backend;
    }
    init_logging(&config);

    let store = Store::open_with_config(config)?;
    debug!("Using {} backend", store.backend());

    match cli.command {
        Commands::List { command } => handle_list_command(command, &store, output),
        Commands::Add { command } => handle_add_command(command, &store, output),
        Commands::Remove { kind, list, id } => {
            commands::media::remove(&store, kind, list, id, output)
        }
        Commands::Catalog { kind } => commands::media::catalog(&store, kind, output),
        Commands::Status => commands::status::show(&store, output),
        Commands::Config { .. } => Ok(()), // Handled above
    }
}

fn handle_list_command(command: ListCommands, store: &Store, output: &Output) -> Result<()> {
    match command {
        ListCommands::Create { id, name, owner } => {
            commands::list::create(store, id, name, owner, output)
        }
        ListCommands::Show { id } => commands::list::show(store, id, output),
        ListCommands::Ls { owner } => commands::list::owned_by(store, &owner, output),
        ListCommands::Delete { id } => commands::list::delete(store, id, output),
        ListCommands::Clear { id } => commands::list::clear(store, id, output),
    }
}

fn handle_add_command(command: AddCommands, store: &Store, output: &Output) -> Result<()> {
    match command {
        AddCommands::Movie {
            list,
            id,
            title,
            runtime,
            year,
        } => {
            let movie = Movie::new(id, title, runtime).with_release_year(year);
            commands::media::add(store, list, movie, output)
        }
        AddCommands::Series {
            list,
            id,
            title,
            seasons,
            episodes,
        } => commands::media::add(store, list, TvSeries::new(id, title, seasons, episodes), output),
        AddCommands::Anime {
            list,
            id,
            title,
            episodes,
            year,
        } => {
            let anime = Anime::new(id, title, episodes).with_release_year(year);
            commands::media::add(store, list, anime, output)
        }
    }
}

fn handle_config_command(
    command: Option<ConfigCommands>,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::show(config_path, output),
        Some(ConfigCommands::Set { key, value }) => {
            commands::config::set(key, value, config_path, output)
        }
    }
}

/// Install a subscriber when MEDIALIST_LOG is set
///
/// Logs go to the configured log file, or stderr when none is set.
fn init_logging(config: &Config) {
    let Ok(env_filter) = EnvFilter::try_from_env(LOG_ENV) else {
        return;
    };

    match &config.log_file {
        Some(path) => {
            let file = match OpenOptions::new().create(true).append(true).open(path) {
                Ok(f) => f,
                Err(e) => {
                    eprintln!("Warning: Could not open log file {:?}: {}", path, e);
                    return;
                }
            };
            let _ = tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_ansi(false)
                .with_writer(file)
                .try_init();
        }
        None => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .try_init();
        }
    }
}

/// Print an error with the store's recovery hint, if it has one
fn report_error(err: &anyhow::Error, output: &Output) {
    let hint = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<StoreError>())
        .and_then(StoreError::recovery_suggestion);

    if output.is_json() {
        println!(
            "{}",
            serde_json::json!({
                "status": "error",
                "message": format!("{:#}", err),
                "hint": hint
            })
        );
        return;
    }

    eprintln!("Error: {:#}", err);
    if let Some(hint) = hint {
        eprintln!("Hint: {}", hint);
    }
}
