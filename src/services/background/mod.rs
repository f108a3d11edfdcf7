use std::fmt::Debug;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use color_eyre::eyre::{Result, WrapErr};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::instrument;
use url::Url;

use crate::services::auth::Authenticator;
use crate::services::playlist_sync::{PlaylistSyncConfig, PlaylistSyncService, SyncOutcome};
use crate::spotify_rs::client::SpotifyClient;

#[derive(Debug, Clone)]
pub struct SyncScheduleConfig {
    pub sync: PlaylistSyncConfig,
    pub interval: Duration,
    pub api_base_url: Url,
    pub request_timeout: Duration,
}

/// Calls `tick` right away and then every `period`, forever.
///
/// A failed tick is logged and the next one still fires on schedule.
pub async fn run_schedule<F, Fut, T>(period: Duration, mut tick: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
    T: Debug,
{
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;
        match tick().await {
            Ok(outcome) => tracing::info!(?outcome, "Scheduled sync finished"),
            Err(e) => tracing::error!(error = ?e, "Scheduled sync failed"),
        }
    }
}

/// One sync run with a freshly built client for the current access token.
#[instrument(skip_all)]
pub async fn run_sync_tick(
    authenticator: &Authenticator,
    config: &SyncScheduleConfig,
    tick_lock: Arc<Mutex<()>>,
) -> Result<SyncOutcome> {
    let access_token = authenticator
        .access_token()
        .await
        .wrap_err("Failed to get a Spotify access token")?;

    let client = SpotifyClient::new(config.api_base_url.clone(), access_token)
        .with_timeout(config.request_timeout);

    PlaylistSyncService::new(client, config.sync.clone())
        .with_tick_lock(tick_lock)
        .sync_playlist()
        .await
        .wrap_err("Failed to sync playlist")
}

pub fn spawn_sync_schedule(
    authenticator: Arc<Authenticator>,
    config: SyncScheduleConfig,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tracing::info!(
            interval = %humantime::format_duration(config.interval),
            source = %config.sync.source_playlist_name,
            destination = %config.sync.destination_playlist_id,
            "Starting playlist sync schedule"
        );
        let tick_lock = Arc::new(Mutex::new(()));
        run_schedule(config.interval, || {
            run_sync_tick(&authenticator, &config, tick_lock.clone())
        })
        .await;
    })
}
