use std::process::ExitCode;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use inquire::{Confirm, Password, PasswordDisplayMode};
use weatherboard_core::{
    Config, Dashboard, DashboardSettings, FileStore, IpGeolocator, KeyValueStore, MemoryStore,
    ProviderId, favorites, provider::default_provider_from_config,
};

use crate::{
    interactive,
    render::{self, TerminalPresenter},
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weatherboard", version, about = "Terminal weather dashboard")]
pub struct Cli {
    /// Print debug logs to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Keep saved locations in memory for this run only.
    #[arg(long, global = true)]
    pub ephemeral: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure credentials for a specific provider.
    Configure {
        /// Provider short name, e.g. "openweather" or "weatherapi".
        provider: String,
    },

    /// Show current weather and forecast for a city.
    Show {
        /// City name; several words are joined with spaces.
        #[arg(required = true, num_args = 1..)]
        city: Vec<String>,
    },

    /// Show weather for the current position.
    Here,

    /// Repeat the last city search.
    Last,

    /// List or edit saved locations.
    Favorites {
        #[command(subcommand)]
        action: Option<FavoritesAction>,
    },

    /// Interactive dashboard.
    Dashboard,
}

#[derive(Debug, Subcommand)]
pub enum FavoritesAction {
    /// Print saved locations, most recent first.
    List,

    /// Forget a saved location.
    Remove {
        #[arg(required = true, num_args = 1..)]
        name: Vec<String>,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<ExitCode> {
        let config = Config::load()?;

        if self.ephemeral {
            return self.command.execute(config, MemoryStore::new()).await;
        }

        let store = match &config.dashboard.storage_path {
            Some(path) => FileStore::new(path),
            None => FileStore::open_default()?,
        };
        tracing::debug!(path = %store.path().display(), "using storage file");

        self.command.execute(config, store).await
    }
}

impl Command {
    async fn execute<S: KeyValueStore>(self, mut config: Config, store: S) -> anyhow::Result<ExitCode> {
        // Dashboard failures have already been shown as notices; they only
        // affect the exit code here.
        let succeeded = match self {
            Command::Configure { provider } => {
                configure(&mut config, &provider)?;
                true
            }
            Command::Favorites { action } => {
                let names = match action.unwrap_or(FavoritesAction::List) {
                    FavoritesAction::List => favorites::list(&store),
                    FavoritesAction::Remove { name } => favorites::remove(&store, &name.join(" "))?,
                };
                println!("{}", render::format_favorites(&names));
                true
            }
            Command::Show { city } => {
                build_dashboard(&config, store)?.search(&city.join(" ")).await.is_ok()
            }
            Command::Here => build_dashboard(&config, store)?.search_here().await.is_ok(),
            Command::Last => match build_dashboard(&config, store)?.restore_last_search().await {
                Ok(Some(_)) => true,
                Ok(None) => {
                    eprintln!("No previous search. Hint: run `weatherboard show <city>` first.");
                    false
                }
                Err(_) => false,
            },
            Command::Dashboard => return interactive::run(&build_dashboard(&config, store)?).await,
        };

        Ok(if succeeded { ExitCode::SUCCESS } else { ExitCode::FAILURE })
    }
}

fn build_dashboard<S: KeyValueStore>(
    config: &Config,
    store: S,
) -> anyhow::Result<Dashboard<S, TerminalPresenter>> {
    let provider = default_provider_from_config(config)?;

    let mut dashboard = Dashboard::new(provider, store, TerminalPresenter::new())
        .with_settings(DashboardSettings::from(&config.dashboard));

    if config.dashboard.geolocation {
        let geolocator = IpGeolocator::new().context("Failed to set up geolocation client")?;
        dashboard = dashboard.with_geolocator(Box::new(geolocator));
    }

    Ok(dashboard)
}

fn configure(config: &mut Config, provider: &str) -> anyhow::Result<()> {
    let id = ProviderId::try_from(provider)?;

    let api_key = Password::new(&format!("API key for {id}:"))
        .without_confirmation()
        .with_display_mode(PasswordDisplayMode::Masked)
        .prompt()
        .context("Failed to read API key")?;

    let api_key = api_key.trim();
    if api_key.is_empty() {
        bail!("API key must not be empty");
    }

    config.upsert_provider_api_key(id, api_key.to_string());

    if config.default_provider_id().ok() != Some(id) {
        let make_default = Confirm::new(&format!("Use {id} as the default provider?"))
            .with_default(true)
            .prompt()
            .context("Failed to read answer")?;

        if make_default {
            config.set_default_provider(id);
        }
    }

    config.save()?;
    println!("Saved {id} credentials to {}", Config::config_file_path()?.display());

    Ok(())
}
