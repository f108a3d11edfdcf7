use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use url::Url;

use crate::ports::spotify::SpotifyApi;
use crate::spotify_rs::error::SpotifyApiError;
use crate::spotify_rs::types::{AddTracksRequest, PlaylistTrackPage, Playlists};

pub const SPOTIFY_API_BASE_URL: &str = "https://api.spotify.com/v1/";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Spotify API client bound to a single access token.
///
/// Built fresh for every sync run; it never mutates after construction.
#[derive(Debug, Clone)]
pub struct SpotifyClient {
    base_url: Url,
    access_token: String,
    timeout: Duration,
    client: Client,
}

impl SpotifyClient {
    pub fn new(base_url: Url, access_token: impl Into<String>) -> Self {
        Self {
            base_url: with_trailing_slash(base_url),
            access_token: access_token.into(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
            client: Client::new(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn playlist_tracks_url(&self, playlist_id: &str) -> Result<Url, SpotifyApiError> {
        Ok(self.base_url.join(&format!(
            "playlists/{}/tracks",
            urlencoding::encode(playlist_id)
        ))?)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, SpotifyApiError> {
        let response = self
            .client
            .get(url.clone())
            .bearer_auth(&self.access_token)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|source| SpotifyApiError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| SpotifyApiError::Transport {
                url: url.to_string(),
                source,
            })?;

        if !status.is_success() {
            return Err(SpotifyApiError::Status {
                url: url.to_string(),
                status,
                body,
            });
        }

        serde_json::from_str(&body).map_err(|source| SpotifyApiError::Decode {
            url: url.to_string(),
            source,
        })
    }
}

/// `Url::join` drops the last path segment unless the base ends with a slash.
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

#[async_trait::async_trait]
impl SpotifyApi for SpotifyClient {
    async fn current_user_playlists(&self) -> Result<Playlists, SpotifyApiError> {
        let url = self.base_url.join("me/playlists")?;
        self.get_json(url).await
    }

    async fn playlist_tracks_page(
        &self,
        playlist_id: &str,
        offset: usize,
    ) -> Result<PlaylistTrackPage, SpotifyApiError> {
        let mut url = self.playlist_tracks_url(playlist_id)?;
        url.query_pairs_mut()
            .append_pair("offset", &offset.to_string());

        let mut page: PlaylistTrackPage = self.get_json(url).await?;
        page.offset = offset;
        Ok(page)
    }

    async fn add_tracks_to_playlist(
        &self,
        playlist_id: &str,
        request: &AddTracksRequest,
    ) -> Result<(), SpotifyApiError> {
        let url = self.playlist_tracks_url(playlist_id)?;

        let response = self
            .client
            .post(url.clone())
            .bearer_auth(&self.access_token)
            .timeout(self.timeout)
            .json(request)
            .send()
            .await
            .map_err(|source| SpotifyApiError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SpotifyApiError::RemoteRejection {
                url: url.to_string(),
                status,
                body: response
                    .text()
                    .await
                    .unwrap_or("Failed to get error text".to_string()),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Json, Router,
        extract::{Query, State},
        http::{HeaderMap, StatusCode},
        routing::get,
    };
    use serde::Deserialize;

    use super::*;
    use crate::test_utils::{spawn_test_server, unused_local_url};

    #[derive(Default)]
    struct Recorded {
        requests: Vec<String>,
        auth_headers: Vec<String>,
        bodies: Vec<AddTracksRequest>,
    }

    type Recorder = Arc<Mutex<Recorded>>;

    #[derive(Deserialize)]
    struct OffsetQuery {
        offset: usize,
    }

    async fn playlists(State(recorder): State<Recorder>) -> Json<serde_json::Value> {
        recorder.lock().unwrap().requests.push("GET me/playlists".into());
        Json(serde_json::json!({
            "items": [
                {"name": "first", "uri": "spotify:playlist:123abc"},
                {"name": "second", "uri": "spotify:playlist:123Ws"}
            ]
        }))
    }

    async fn tracks(
        State(recorder): State<Recorder>,
        headers: HeaderMap,
        Query(query): Query<OffsetQuery>,
    ) -> Json<serde_json::Value> {
        let mut recorded = recorder.lock().unwrap();
        recorded
            .requests
            .push(format!("GET tracks offset={}", query.offset));
        if let Some(auth) = headers.get("authorization") {
            recorded
                .auth_headers
                .push(auth.to_str().unwrap_or_default().to_string());
        }
        Json(serde_json::json!({
            "items": [{"track": {"uri": "t:1:2", "name": "abc"}}],
            "total": 1
        }))
    }

    async fn add_tracks(
        State(recorder): State<Recorder>,
        Json(body): Json<AddTracksRequest>,
    ) -> StatusCode {
        let mut recorded = recorder.lock().unwrap();
        recorded.requests.push("POST tracks".into());
        recorded.bodies.push(body);
        StatusCode::CREATED
    }

    async fn spotify_stub() -> (SpotifyClient, Recorder) {
        let recorder = Recorder::default();
        let router = Router::new()
            .route("/v1/me/playlists", get(playlists))
            .route("/v1/playlists/{id}/tracks", get(tracks).post(add_tracks))
            .with_state(recorder.clone());
        let base_url = spawn_test_server(router).await.join("v1").unwrap();
        (SpotifyClient::new(base_url, "test-token"), recorder)
    }

    async fn failing_stub(status: StatusCode, body: &'static str) -> SpotifyClient {
        let router = Router::new().fallback(move || async move { (status, body) });
        SpotifyClient::new(spawn_test_server(router).await, "test-token")
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let client = SpotifyClient::new(Url::parse("http://abc.se/v1").unwrap(), "t");
        assert_eq!(client.base_url().as_str(), "http://abc.se/v1/");

        let client = SpotifyClient::new(Url::parse(SPOTIFY_API_BASE_URL).unwrap(), "t");
        assert_eq!(client.base_url().as_str(), SPOTIFY_API_BASE_URL);
    }

    #[tokio::test]
    async fn test_current_user_playlists() {
        let (client, recorder) = spotify_stub().await;

        let result = client.current_user_playlists().await.unwrap();

        assert_eq!(result.items.len(), 2);
        assert_eq!(result.items[0].name, "first");
        assert_eq!(result.items[1].uri, "spotify:playlist:123Ws");
        assert_eq!(recorder.lock().unwrap().requests, vec!["GET me/playlists"]);
    }

    #[tokio::test]
    async fn test_playlist_tracks_page() {
        let (client, recorder) = spotify_stub().await;

        let page = client.playlist_tracks_page("playlistID", 100).await.unwrap();

        assert_eq!(page.items.len(), 1);
        assert_eq!(page.total, 1);
        assert_eq!(page.offset, 100);
        let recorded = recorder.lock().unwrap();
        assert_eq!(recorded.requests, vec!["GET tracks offset=100"]);
        assert_eq!(recorded.auth_headers, vec!["Bearer test-token"]);
    }

    #[tokio::test]
    async fn test_add_tracks_to_playlist() {
        let (client, recorder) = spotify_stub().await;
        let request = AddTracksRequest {
            uris: vec!["t:3:4".into(), "t:8:5".into()],
        };

        client.add_tracks_to_playlist("123", &request).await.unwrap();

        let recorded = recorder.lock().unwrap();
        assert_eq!(recorded.requests, vec!["POST tracks"]);
        assert_eq!(recorded.bodies, vec![request]);
    }

    #[tokio::test]
    async fn test_error_status_on_read() {
        let client = failing_stub(StatusCode::INTERNAL_SERVER_ERROR, "boom").await;

        let err = client.current_user_playlists().await.unwrap_err();

        match err {
            SpotifyApiError::Status { status, body, .. } => {
                assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
                assert_eq!(body, "boom");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_decode_error() {
        let client = failing_stub(StatusCode::OK, "not json").await;

        let err = client.playlist_tracks_page("abc", 0).await.unwrap_err();

        assert!(matches!(err, SpotifyApiError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_remote_rejection_on_write() {
        let client = failing_stub(StatusCode::FORBIDDEN, "Insufficient client scope").await;
        let request = AddTracksRequest {
            uris: vec!["t:1:2".into()],
        };

        let err = client
            .add_tracks_to_playlist("abc", &request)
            .await
            .unwrap_err();

        match err {
            SpotifyApiError::RemoteRejection { status, body, .. } => {
                assert_eq!(status, StatusCode::FORBIDDEN);
                assert_eq!(body, "Insufficient client scope");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_hung_response_times_out() {
        let router = Router::new().fallback(|| async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            "too late"
        });
        let client = SpotifyClient::new(spawn_test_server(router).await, "test-token")
            .with_timeout(Duration::from_millis(300));

        let started = std::time::Instant::now();
        let err = client.playlist_tracks_page("abc", 0).await.unwrap_err();

        assert!(matches!(err, SpotifyApiError::Transport { .. }));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_transport_error() {
        let client = SpotifyClient::new(unused_local_url().await, "test-token")
            .with_timeout(Duration::from_secs(2));

        let err = client.current_user_playlists().await.unwrap_err();

        assert!(matches!(err, SpotifyApiError::Transport { .. }));
    }
}
