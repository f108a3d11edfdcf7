use crate::spotify_rs::error::SpotifyApiError;
use crate::spotify_rs::types::{AddTracksRequest, PlaylistTrackPage, Playlists};

/// Port trait wrapping the Spotify API capabilities used by the playlist sync.
///
/// Implementations live in `spotify_rs::client` (production) or test mocks.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait SpotifyApi: Send + Sync {
    /// The authorized user's playlists, as a single unpaginated listing.
    async fn current_user_playlists(&self) -> Result<Playlists, SpotifyApiError>;

    /// One page of a playlist's tracks starting at `offset`.
    async fn playlist_tracks_page(
        &self,
        playlist_id: &str,
        offset: usize,
    ) -> Result<PlaylistTrackPage, SpotifyApiError>;

    /// Appends tracks to a playlist in a single request.
    async fn add_tracks_to_playlist(
        &self,
        playlist_id: &str,
        request: &AddTracksRequest,
    ) -> Result<(), SpotifyApiError>;
}
