mod config;
mod http_server;
mod logging;
mod ports;
mod services;
mod spotify_rs;
#[cfg(test)]
mod test_utils;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::{
    Result,
    eyre::{Context, OptionExt},
};

use crate::{
    config::Config,
    http_server::app::HttpServerConfig,
    logging::init_tracing,
    services::{
        auth::Authenticator,
        background::SyncScheduleConfig,
        playlist_sync::{PlaylistSyncConfig, PlaylistSyncService},
    },
    spotify_rs::{auth::SpotifyApiCredentials, client::SpotifyClient},
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The config file to use
    #[arg(short, long, env = "PLAYLIST_AGGREGATOR_CONFIG")]
    config: Option<PathBuf>,

    /// Log filter, e.g. `info` or `playlist_aggregator=debug`
    #[arg(long, default_value = "info", global = true, env = "LOG_LEVEL")]
    log_level: String,

    /// Export traces to this OTLP/gRPC endpoint
    #[arg(long, global = true, env = "OTEL_EXPORTER_OTLP_ENDPOINT")]
    otlp_endpoint: Option<String>,

    /// Playlist that collects the tracks, overrides the config file
    #[arg(long, global = true, env = "SPOTIFY_AGGREGATION_LIST_ID")]
    destination_playlist_id: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the authorization endpoints and sync on a schedule once authorized
    Serve {
        /// The port to run the server on
        #[arg(short, long, default_value = "8080", env = "PLAYLIST_AGGREGATOR_HTTP_PORT")]
        port: u16,

        /// Spotify application client id
        #[arg(long, env = "SPOTIFY_CLIENT_ID")]
        client_id: String,

        /// Spotify application client secret
        #[arg(long, env = "SPOTIFY_CLIENT_SECRET")]
        client_secret: String,
    },
    /// Run a single sync with an existing access token
    Sync {
        /// A Spotify access token with the playlist scopes
        #[arg(long, env = "SPOTIFY_ACCESS_TOKEN")]
        access_token: String,
    },
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Create a default config file, if it doesn't exist
    CreateDefault,
    /// Print the path to the config file
    Path,
}

const MISSING_DESTINATION: &str = "No destination playlist. Set destination_playlist_id in \
    the config file or SPOTIFY_AGGREGATION_LIST_ID";

fn schedule_config(
    config: &Config,
    destination_playlist_id: Option<String>,
) -> Result<SyncScheduleConfig> {
    let destination_playlist_id = destination_playlist_id
        .or_else(|| config.destination_playlist_id.clone())
        .ok_or_eyre(MISSING_DESTINATION)?;

    Ok(SyncScheduleConfig {
        sync: PlaylistSyncConfig {
            source_playlist_name: config.source_playlist_name.clone(),
            destination_playlist_id,
        },
        interval: config.sync_interval()?,
        api_base_url: config.api_base_url()?,
        request_timeout: config.request_timeout()?,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    let tracer_provider = init_tracing(&args.log_level, args.otlp_endpoint.as_deref())?;

    tracing::debug!("Loading configuration");
    let config = {
        if let Some(config) = &args.config {
            Config::from_file(config)
        } else {
            Config::load()
        }
    }
    .wrap_err("Failed to load playlist-aggregator config")?;

    match args.command {
        Commands::Serve {
            port,
            client_id,
            client_secret,
        } => {
            let schedule = schedule_config(&config, args.destination_playlist_id)?;
            let credentials =
                SpotifyApiCredentials::new(client_id, client_secret, config.redirect_url.clone());

            http_server::app::start(HttpServerConfig {
                port,
                authenticator: Arc::new(Authenticator::new(credentials)),
                schedule,
            })
            .await?;
        }
        Commands::Sync { access_token } => {
            let schedule = schedule_config(&config, args.destination_playlist_id)?;
            let client = SpotifyClient::new(schedule.api_base_url, access_token)
                .with_timeout(schedule.request_timeout);

            let outcome = PlaylistSyncService::new(client, schedule.sync)
                .sync_playlist()
                .await
                .wrap_err("Failed to sync playlist")?;
            println!("{outcome:?}");
        }
        Commands::Config(config_commands) => match config_commands {
            ConfigCommands::CreateDefault => {
                let path = Config::create_default()?;
                println!("{}", path.display());
            }
            ConfigCommands::Path => match Config::config_path() {
                Some(path) => println!("{}", path.display()),
                None => println!("No default config path found"),
            },
        },
    }

    if let Some(tracer_provider) = tracer_provider {
        tracer_provider
            .shutdown()
            .wrap_err("Failed to shut down tracer provider")?;
    }

    Ok(())
}
