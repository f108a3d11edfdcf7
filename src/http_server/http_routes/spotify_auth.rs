use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use color_eyre::eyre::Context;
use serde::Deserialize;

use crate::http_server::{error::Report, state::AppState};

/// Redirects the browser to Spotify's consent page.
pub async fn login(State(app_state): State<Arc<AppState>>) -> impl IntoResponse {
    let (auth_response, session) = app_state.authenticator.start_authorization();
    *app_state.oauth_session.lock().await = Some(session);

    tracing::debug!("Redirecting to Spotify authorization");
    (
        StatusCode::FOUND,
        [(header::LOCATION, auth_response.auth_url)],
    )
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

/// Completes the authorization code flow and starts the sync schedule.
pub async fn callback(
    State(app_state): State<Arc<AppState>>,
    Query(params): Query<CallbackParams>,
) -> Result<Response, Report> {
    if let Some(error) = params.error {
        tracing::warn!(error = %error, "Spotify authorization was denied");
        return Ok((
            StatusCode::BAD_REQUEST,
            format!("Spotify authorization failed: {error}"),
        )
            .into_response());
    }

    let Some(code) = params.code else {
        return Ok((StatusCode::BAD_REQUEST, "Missing authorization code").into_response());
    };

    let session = {
        let mut pending = app_state.oauth_session.lock().await;
        match pending.as_ref() {
            Some(session) if params.state.as_deref() == Some(session.state.as_str()) => {
                pending.take()
            }
            _ => None,
        }
    };
    let Some(session) = session else {
        tracing::warn!("Authorization callback with an unknown state");
        return Ok((
            StatusCode::BAD_REQUEST,
            "Unknown authorization state, start again at /login",
        )
            .into_response());
    };
    if session.is_expired(chrono::Utc::now().timestamp()) {
        tracing::warn!("Authorization callback for an expired session");
        return Ok((
            StatusCode::BAD_REQUEST,
            "Authorization session expired, start again at /login",
        )
            .into_response());
    }

    app_state
        .authenticator
        .complete_authorization(&code, &session)
        .await
        .wrap_err("Failed to exchange authorization code")?;

    if app_state.ensure_sync_running().await {
        tracing::info!("Playlist sync schedule started");
    }

    Ok((StatusCode::OK, "Authorized with Spotify, playlist sync is running").into_response())
}
