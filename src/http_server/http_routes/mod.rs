pub mod spotify_auth;
