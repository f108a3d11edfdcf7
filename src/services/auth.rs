use std::time::{Duration, Instant};

use tokio::sync::RwLock;

use crate::spotify_rs::auth::{
    ExchangeCodeForTokenError, RefreshTokenError, SPOTIFY_TOKEN_URL, SpotifyApiCredentials,
    exchange_code_for_token, initiate_oauth, refresh_access_token,
};
use crate::spotify_rs::types::{OAuthSession, SpotifyAuthResponse, SpotifyTokenResponse};

/// Tokens are refreshed this long before Spotify would expire them.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct TokenSet {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Instant,
}

impl TokenSet {
    pub fn from_response(response: SpotifyTokenResponse, now: Instant) -> Self {
        Self {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            expires_at: now + Duration::from_secs(response.expires_in),
        }
    }

    fn needs_refresh(&self, now: Instant) -> bool {
        now + EXPIRY_MARGIN >= self.expires_at
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Not authorized with Spotify yet, visit /login first")]
    NotAuthorized,
    #[error("Access token expired and there is no refresh token")]
    MissingRefreshToken,
    #[error(transparent)]
    Exchange(#[from] ExchangeCodeForTokenError),
    #[error(transparent)]
    Refresh(#[from] RefreshTokenError),
}

/// Holds the user's Spotify tokens and hands out valid access tokens.
pub struct Authenticator {
    credentials: SpotifyApiCredentials,
    token_url: String,
    tokens: RwLock<Option<TokenSet>>,
}

impl Authenticator {
    pub fn new(credentials: SpotifyApiCredentials) -> Self {
        Self {
            credentials,
            token_url: SPOTIFY_TOKEN_URL.to_string(),
            tokens: RwLock::new(None),
        }
    }

    pub fn with_token_url(mut self, token_url: impl Into<String>) -> Self {
        self.token_url = token_url.into();
        self
    }

    pub fn start_authorization(&self) -> (SpotifyAuthResponse, OAuthSession) {
        initiate_oauth(&self.credentials)
    }

    /// Exchanges the code from the authorization callback and stores the tokens.
    pub async fn complete_authorization(
        &self,
        code: &str,
        session: &OAuthSession,
    ) -> Result<(), AuthError> {
        let response = exchange_code_for_token(
            &self.token_url,
            &self.credentials,
            code,
            &session.code_verifier,
        )
        .await?;
        self.set_tokens(TokenSet::from_response(response, Instant::now()))
            .await;
        tracing::info!("Authorized with Spotify");
        Ok(())
    }

    pub async fn set_tokens(&self, tokens: TokenSet) {
        *self.tokens.write().await = Some(tokens);
    }

    pub async fn is_authorized(&self) -> bool {
        self.tokens.read().await.is_some()
    }

    /// Returns an access token that is valid for at least another minute,
    /// refreshing it first when needed.
    pub async fn access_token(&self) -> Result<String, AuthError> {
        let now = Instant::now();
        {
            let tokens = self.tokens.read().await;
            match tokens.as_ref() {
                None => return Err(AuthError::NotAuthorized),
                Some(tokens) if !tokens.needs_refresh(now) => {
                    return Ok(tokens.access_token.clone());
                }
                Some(_) => {}
            }
        }

        let mut tokens = self.tokens.write().await;
        let current = tokens.as_ref().ok_or(AuthError::NotAuthorized)?;
        // Another caller may have refreshed while we waited for the write lock.
        if !current.needs_refresh(now) {
            return Ok(current.access_token.clone());
        }
        let refresh_token = current
            .refresh_token
            .clone()
            .ok_or(AuthError::MissingRefreshToken)?;

        tracing::debug!("Refreshing Spotify access token");
        let response =
            refresh_access_token(&self.token_url, &self.credentials, &refresh_token).await?;
        let mut refreshed = TokenSet::from_response(response, Instant::now());
        if refreshed.refresh_token.is_none() {
            refreshed.refresh_token = Some(refresh_token);
        }
        let access_token = refreshed.access_token.clone();
        *tokens = Some(refreshed);

        Ok(access_token)
    }
}
