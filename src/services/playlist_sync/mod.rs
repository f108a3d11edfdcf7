use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::instrument;

use crate::ports::spotify::SpotifyApi;
use crate::spotify_rs::error::SpotifyApiError;
use crate::spotify_rs::types::{AddTracksRequest, MalformedPlaylistUri};

pub mod delta;
pub mod fetch_tracks;

pub use delta::compute_delta;
pub use fetch_tracks::{TRACK_PAGE_SIZE, fetch_all_tracks};

/// Which playlist feeds which.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistSyncConfig {
    /// Exact name of the playlist in the user's listing to copy tracks from.
    pub source_playlist_name: String,
    /// Id of the aggregation playlist that receives the tracks.
    pub destination_playlist_id: String,
}

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Source playlist cannot be synced: {0}")]
    MalformedIdentifier(#[from] MalformedPlaylistUri),
    #[error(transparent)]
    Api(#[from] SpotifyApiError),
}

/// What a single sync run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// No playlist in the listing carries the source name.
    SourceNotFound,
    /// Every source track was already in the destination, nothing was written.
    UpToDate { candidates: usize },
    TracksAdded { added: usize, skipped: usize },
}

/// Copies new tracks from the source playlist into the destination playlist.
///
/// Runs are serialized through `tick_lock`; share one lock between services that
/// write to the same destination.
pub struct PlaylistSyncService<C: SpotifyApi> {
    client: C,
    config: PlaylistSyncConfig,
    tick_lock: Arc<Mutex<()>>,
}

impl<C: SpotifyApi> PlaylistSyncService<C> {
    pub fn new(client: C, config: PlaylistSyncConfig) -> Self {
        Self {
            client,
            config,
            tick_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn with_tick_lock(mut self, tick_lock: Arc<Mutex<()>>) -> Self {
        self.tick_lock = tick_lock;
        self
    }

    #[instrument(skip(self), fields(
        source = %self.config.source_playlist_name,
        destination = %self.config.destination_playlist_id,
    ))]
    pub async fn sync_playlist(&self) -> Result<SyncOutcome, SyncError> {
        let _guard = self.tick_lock.lock().await;

        let playlists = self.client.current_user_playlists().await?;

        let Some(source) = playlists
            .items
            .iter()
            .find(|playlist| playlist.name == self.config.source_playlist_name)
        else {
            tracing::info!("Source playlist not found in the user's playlists, nothing to sync");
            return Ok(SyncOutcome::SourceNotFound);
        };

        let source_id = source.id()?;
        tracing::debug!(source_id, "Found source playlist");

        let candidates = fetch_all_tracks(&self.client, source_id).await?;
        let existing =
            fetch_all_tracks(&self.client, &self.config.destination_playlist_id).await?;

        let tracks_to_add = compute_delta(&existing, &candidates);
        if tracks_to_add.is_empty() {
            tracing::info!(
                candidates = candidates.len(),
                "No tracks to add, destination playlist is up to date"
            );
            return Ok(SyncOutcome::UpToDate {
                candidates: candidates.len(),
            });
        }

        for item in &tracks_to_add {
            tracing::debug!(uri = item.uri(), name = item.name(), "Adding track");
        }

        self.client
            .add_tracks_to_playlist(
                &self.config.destination_playlist_id,
                &AddTracksRequest::from_items(&tracks_to_add),
            )
            .await?;

        let outcome = SyncOutcome::TracksAdded {
            added: tracks_to_add.len(),
            skipped: candidates.len() - tracks_to_add.len(),
        };
        tracing::info!(?outcome, "Added tracks to destination playlist");

        Ok(outcome)
    }
}
