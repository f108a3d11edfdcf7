use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::{
    Form, Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
};
use tokio::net::TcpListener;
use url::Url;

/// Serves `router` on an ephemeral local port and returns its base url.
pub async fn spawn_test_server(router: Router) -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    Url::parse(&format!("http://{addr}/")).unwrap()
}

/// A local url nothing is listening on.
pub async fn unused_local_url() -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    Url::parse(&format!("http://{addr}/")).unwrap()
}

/// `Authorization` header and form body of every token request.
pub type TokenRequests = Arc<Mutex<Vec<(Option<String>, HashMap<String, String>)>>>;

async fn token_endpoint(
    State(requests): State<TokenRequests>,
    headers: HeaderMap,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    let authorization = headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let grant_type = form.get("grant_type").cloned().unwrap_or_default();
    let rejected = form.get("code").map(String::as_str) == Some("bad-code")
        || form.get("refresh_token").map(String::as_str) == Some("revoked");
    requests.lock().unwrap().push((authorization, form));

    if rejected {
        return (StatusCode::BAD_REQUEST, "invalid_grant").into_response();
    }

    // Spotify only hands out a refresh token on the initial code exchange here.
    let body = if grant_type == "refresh_token" {
        serde_json::json!({
            "access_token": "refreshed-access",
            "token_type": "Bearer",
            "expires_in": 3600,
            "scope": "user-read-private playlist-modify-public"
        })
    } else {
        serde_json::json!({
            "access_token": "access",
            "token_type": "Bearer",
            "expires_in": 3600,
            "refresh_token": "refresh",
            "scope": "user-read-private playlist-modify-public"
        })
    };

    Json(body).into_response()
}

/// Stand-in for the Spotify accounts token endpoint.
///
/// The code `bad-code` and the refresh token `revoked` are rejected with a 400.
pub async fn spawn_token_endpoint() -> (String, TokenRequests) {
    let requests = TokenRequests::default();
    let router = Router::new()
        .route("/api/token", post(token_endpoint))
        .with_state(requests.clone());
    let url = spawn_test_server(router).await.join("api/token").unwrap();

    (url.to_string(), requests)
}
