use tracing::instrument;

use crate::ports::spotify::SpotifyApi;
use crate::spotify_rs::error::SpotifyApiError;
use crate::spotify_rs::types::Item;

/// Page size used by the playlist tracks endpoint.
pub const TRACK_PAGE_SIZE: usize = 100;

/// Fetch every track of a playlist, page by page.
///
/// Pagination strategy
/// - The first page is requested at offset 0 and its `total` is held fixed for the sweep.
/// - Offsets advance by `TRACK_PAGE_SIZE` while `fetched < total`.
/// - A failing page aborts the whole fetch, partial listings are never returned.
#[instrument(skip(api))]
pub async fn fetch_all_tracks<A>(api: &A, playlist_id: &str) -> Result<Vec<Item>, SpotifyApiError>
where
    A: SpotifyApi + ?Sized,
{
    let first_page = api.playlist_tracks_page(playlist_id, 0).await?;
    let total = first_page.total;
    let mut tracks = first_page.items;
    let mut fetched = TRACK_PAGE_SIZE;

    while fetched < total {
        let page = api.playlist_tracks_page(playlist_id, fetched).await?;
        tracks.extend(page.items);
        fetched += TRACK_PAGE_SIZE;
    }

    tracing::debug!(total, fetched = tracks.len(), "Fetched playlist tracks");

    Ok(tracks)
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;

    use super::*;
    use crate::ports::spotify::MockSpotifyApi;
    use crate::spotify_rs::types::{PlaylistTrackPage, Track};

    fn items(range: std::ops::Range<usize>) -> Vec<Item> {
        range
            .map(|i| Item {
                track: Track {
                    uri: format!("uri-{i}"),
                    name: format!("track-{i}"),
                },
            })
            .collect()
    }

    fn page(range: std::ops::Range<usize>, total: usize) -> PlaylistTrackPage {
        PlaylistTrackPage {
            offset: range.start,
            items: items(range),
            total,
        }
    }

    #[tokio::test]
    async fn test_single_page() {
        let mut api = MockSpotifyApi::new();
        api.expect_playlist_tracks_page()
            .withf(|id, offset| id == "123" && *offset == 0)
            .times(1)
            .returning(|_, _| Ok(page(0..1, 1)));

        let tracks = fetch_all_tracks(&api, "123").await.unwrap();

        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].uri(), "uri-0");
    }

    #[tokio::test]
    async fn test_empty_playlist() {
        let mut api = MockSpotifyApi::new();
        api.expect_playlist_tracks_page()
            .times(1)
            .returning(|_, _| Ok(page(0..0, 0)));

        let tracks = fetch_all_tracks(&api, "123").await.unwrap();

        assert!(tracks.is_empty());
    }

    #[tokio::test]
    async fn test_more_tracks_than_one_page() {
        let mut api = MockSpotifyApi::new();
        api.expect_playlist_tracks_page()
            .withf(|_, offset| *offset == 0)
            .times(1)
            .returning(|_, _| Ok(page(0..100, 101)));
        api.expect_playlist_tracks_page()
            .withf(|_, offset| *offset == 100)
            .times(1)
            .returning(|_, _| Ok(page(100..101, 101)));

        let tracks = fetch_all_tracks(&api, "123").await.unwrap();

        assert_eq!(tracks.len(), 101);
        assert_eq!(tracks[0].uri(), "uri-0");
        assert_eq!(tracks[100].uri(), "uri-100");
    }

    #[tokio::test]
    async fn test_total_is_fixed_by_first_page() {
        // The server grows the playlist between pages; the sweep still stops at the
        // total reported on the first page.
        let mut api = MockSpotifyApi::new();
        api.expect_playlist_tracks_page()
            .withf(|_, offset| *offset == 0)
            .times(1)
            .returning(|_, _| Ok(page(0..100, 150)));
        api.expect_playlist_tracks_page()
            .withf(|_, offset| *offset == 100)
            .times(1)
            .returning(|_, _| Ok(page(100..200, 400)));

        let tracks = fetch_all_tracks(&api, "123").await.unwrap();

        assert_eq!(tracks.len(), 200);
    }

    #[tokio::test]
    async fn test_short_page_does_not_stop_sweep() {
        let mut api = MockSpotifyApi::new();
        api.expect_playlist_tracks_page()
            .withf(|_, offset| *offset == 0)
            .times(1)
            .returning(|_, _| Ok(page(0..0, 150)));
        api.expect_playlist_tracks_page()
            .withf(|_, offset| *offset == 100)
            .times(1)
            .returning(|_, _| Ok(page(100..150, 150)));

        let tracks = fetch_all_tracks(&api, "123").await.unwrap();

        assert_eq!(tracks.len(), 50);
    }

    #[tokio::test]
    async fn test_failing_page_aborts_fetch() {
        let mut api = MockSpotifyApi::new();
        api.expect_playlist_tracks_page()
            .withf(|_, offset| *offset == 0)
            .times(1)
            .returning(|_, _| Ok(page(0..100, 250)));
        api.expect_playlist_tracks_page()
            .withf(|_, offset| *offset == 100)
            .times(1)
            .returning(|_, _| {
                Err(SpotifyApiError::Status {
                    url: "playlists/123/tracks?offset=100".into(),
                    status: StatusCode::BAD_GATEWAY,
                    body: String::new(),
                })
            });
        api.expect_playlist_tracks_page()
            .withf(|_, offset| *offset == 200)
            .never();

        let result = fetch_all_tracks(&api, "123").await;

        tokio_test::assert_err!(result);
    }
}
