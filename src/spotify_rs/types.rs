use serde::{Deserialize, Deserializer, Serialize};

/// Spotify OAuth token response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifyTokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: String,
}

/// Listing envelope returned by `GET me/playlists`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Playlists {
    pub items: Vec<Playlist>,
}

/// A playlist as it appears in the user's playlist listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playlist {
    pub name: String,
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid playlist URI format: {uri:?}")]
pub struct MalformedPlaylistUri {
    pub uri: String,
}

impl Playlist {
    /// Returns the short playlist id, which is the third segment of a
    /// `namespace:type:id` URI.
    ///
    /// # Errors
    /// Fails when the URI has fewer than three segments or the third one is empty.
    pub fn id(&self) -> Result<&str, MalformedPlaylistUri> {
        match self.uri.split(':').nth(2) {
            Some(id) if !id.is_empty() => Ok(id),
            _ => Err(MalformedPlaylistUri {
                uri: self.uri.clone(),
            }),
        }
    }
}

/// Spotify track from API. Identity is the `uri`, the name is display only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    pub uri: String,
    #[serde(default)]
    pub name: String,
}

/// Entry of a playlist track listing, which nests the track under `track`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub track: Track,
}

impl Item {
    pub fn uri(&self) -> &str {
        &self.track.uri
    }

    pub fn name(&self) -> &str {
        &self.track.name
    }
}

/// Spotify sends `"track": null` for entries that are no longer available.
fn skip_unavailable_tracks<'de, D>(deserializer: D) -> Result<Vec<Item>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Entry {
        track: Option<Track>,
    }

    let entries = Vec::<Entry>::deserialize(deserializer)?;
    Ok(entries
        .into_iter()
        .filter_map(|entry| entry.track.map(|track| Item { track }))
        .collect())
}

/// One page of `GET playlists/{id}/tracks?offset={n}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlaylistTrackPage {
    #[serde(deserialize_with = "skip_unavailable_tracks")]
    pub items: Vec<Item>,
    /// Number of tracks in the whole playlist, as reported by the server.
    #[serde(default)]
    pub total: usize,
    /// The offset this page was requested with. Not part of the wire format.
    #[serde(skip)]
    pub offset: usize,
}

/// Body of `POST playlists/{id}/tracks`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddTracksRequest {
    pub uris: Vec<String>,
}

impl AddTracksRequest {
    pub fn from_items(items: &[Item]) -> Self {
        Self {
            uris: items.iter().map(|item| item.uri().to_string()).collect(),
        }
    }
}

/// How long a `/login` session may wait for its callback, in seconds.
pub const OAUTH_SESSION_TTL_SECS: i64 = 10 * 60;

/// PKCE OAuth session data
#[derive(Debug, Clone)]
pub struct OAuthSession {
    pub code_verifier: String,
    pub state: String,
    /// Unix timestamp in seconds
    pub created_at: i64,
}

impl OAuthSession {
    pub fn is_expired(&self, now: i64) -> bool {
        now - self.created_at > OAUTH_SESSION_TTL_SECS
    }
}

/// Response for authentication initiation
#[derive(Debug, Clone)]
pub struct SpotifyAuthResponse {
    pub auth_url: String,
    pub state: String,
}
