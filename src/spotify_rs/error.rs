use reqwest::StatusCode;

/// Failures talking to the Spotify Web API.
#[derive(Debug, thiserror::Error)]
pub enum SpotifyApiError {
    #[error("Failed to send http request to {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Request to {url} failed with status {status}: {body}")]
    Status {
        url: String,
        status: StatusCode,
        body: String,
    },
    #[error("Failed to parse response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Spotify rejected adding tracks to {url} with status {status}: {body}")]
    RemoteRejection {
        url: String,
        status: StatusCode,
        body: String,
    },
    #[error("Invalid request url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}
