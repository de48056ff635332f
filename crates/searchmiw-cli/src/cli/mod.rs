//! CLI entry and dispatch.

use anyhow::{Context, Result};
use clap::Parser;
use searchmiw_core::api::{Dispatcher, RequestError};
use searchmiw_core::config::Config;
use searchmiw_core::logging;

mod commands;

#[derive(Parser)]
#[command(name = "searchmiw")]
#[command(version)]
#[command(about = "Search Wikidata through the SearchMIW gateway")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Print search, history, profile and stats output as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Log in and store the session
    Login {
        #[arg(long)]
        email: String,
        /// Read from stdin when omitted
        #[arg(long, env = "SEARCHMIW_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Create an account and store the session
    Register {
        #[arg(long)]
        email: String,
        /// Display name
        #[arg(long)]
        name: String,
        /// Read from stdin when omitted
        #[arg(long, env = "SEARCHMIW_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Clear the stored session
    Logout,
    /// Show who is logged in
    Status,

    /// Search Wikidata
    Search {
        #[arg(value_name = "QUERY")]
        query: String,
        /// Result language (default from config)
        #[arg(short, long)]
        language: Option<String>,
        /// Also save the query to your history
        #[arg(long)]
        save: bool,
    },

    /// Manage your search history
    History {
        #[command(subcommand)]
        command: HistoryCommands,
    },
    /// Show your profile
    Profile,
    /// Show daily searches and registrations
    Stats,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum HistoryCommands {
    /// Lists saved searches
    List {
        /// Zero-based page number
        #[arg(long, default_value_t = 0)]
        page: u32,
        #[arg(long, default_value_t = 20)]
        size: u32,
    },
    /// Deletes one entry
    Delete {
        #[arg(value_name = "ID")]
        id: String,
    },
    /// Deletes all entries
    Clear,
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
    /// Set the gateway base URL
    SetBaseUrl {
        #[arg(value_name = "URL")]
        url: String,
    },
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load().context("load config")?;
    let _log_guard = logging::init(config.log_file_path().as_deref()).context("init logging")?;

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;
    rt.block_on(async move { dispatch(cli.command, cli.json, &config).await })
}

async fn dispatch(command: Commands, json: bool, config: &Config) -> Result<()> {
    let connect = || Dispatcher::from_config(config).context("create API client");

    match command {
        Commands::Login { email, password } => {
            commands::auth::login(&connect()?, &email, password).await
        }
        Commands::Register {
            email,
            name,
            password,
        } => commands::auth::register(&connect()?, &email, &name, password).await,
        Commands::Logout => commands::auth::logout(&connect()?),
        Commands::Status => {
            commands::auth::status(&connect()?);
            Ok(())
        }

        Commands::Search {
            query,
            language,
            save,
        } => {
            let dispatcher = connect()?;
            let language = language.as_deref().unwrap_or(config.effective_language());
            let opts = commands::search::SearchOptions {
                query: &query,
                language,
                save,
                json,
            };
            let result = commands::search::run(&dispatcher, config, opts).await;
            expire_on_rejection(&dispatcher, result)
        }
        Commands::History { command } => {
            let dispatcher = connect()?;
            let result = match command {
                HistoryCommands::List { page, size } => {
                    commands::history::list(&dispatcher, page, size, json).await
                }
                HistoryCommands::Delete { id } => {
                    commands::history::delete(&dispatcher, &id).await
                }
                HistoryCommands::Clear => commands::history::clear(&dispatcher).await,
            };
            expire_on_rejection(&dispatcher, result)
        }
        Commands::Profile => {
            let dispatcher = connect()?;
            let result = commands::profile::show(&dispatcher, json).await;
            expire_on_rejection(&dispatcher, result)
        }
        Commands::Stats => {
            let dispatcher = connect()?;
            let result = commands::stats::show(&dispatcher, json).await;
            expire_on_rejection(&dispatcher, result)
        }

        Commands::Config { command } => match command {
            ConfigCommands::Path => {
                commands::config::path();
                Ok(())
            }
            ConfigCommands::Init => commands::config::init(),
            ConfigCommands::SetBaseUrl { url } => commands::config::set_base_url(&url),
        },
    }
}

/// Clears the session when the gateway rejected its token.
///
/// Only wraps commands that send the stored token; a rejected `login` or
/// `register` means bad credentials and leaves the session alone.
fn expire_on_rejection(dispatcher: &Dispatcher, result: Result<()>) -> Result<()> {
    let Err(e) = result else {
        return Ok(());
    };
    let Some(request_error) = e.downcast_ref::<RequestError>() else {
        return Err(e);
    };
    if !request_error.is_auth_rejected() {
        return Err(e);
    }

    if request_error.http_status.is_none() {
        // Rejected locally: there was no session to begin with.
        eprintln!("Not logged in. Run `searchmiw login` first.");
        return Err(e);
    }

    if let Err(clear_err) = dispatcher.session().clear() {
        tracing::warn!("failed to clear rejected session: {clear_err:#}");
    }
    eprintln!("Session expired. Please log in again.");
    Err(e)
}
