pub mod auth;
pub mod background;
pub mod playlist_sync;
