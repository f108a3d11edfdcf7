use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::services::auth::Authenticator;
use crate::services::background::{SyncScheduleConfig, spawn_sync_schedule};
use crate::spotify_rs::types::OAuthSession;

pub struct AppState {
    pub authenticator: Arc<Authenticator>,
    pub schedule: SyncScheduleConfig,
    /// Session of the last `/login`, consumed by `/callback`.
    pub oauth_session: Mutex<Option<OAuthSession>>,
    pub sync_task: Mutex<Option<JoinHandle<()>>>,
}

impl AppState {
    pub fn new(authenticator: Arc<Authenticator>, schedule: SyncScheduleConfig) -> Self {
        Self {
            authenticator,
            schedule,
            oauth_session: Mutex::new(None),
            sync_task: Mutex::new(None),
        }
    }

    /// Starts the sync schedule unless it is already running.
    /// Returns whether a new schedule was started.
    pub async fn ensure_sync_running(&self) -> bool {
        let mut sync_task = self.sync_task.lock().await;
        if sync_task.as_ref().is_some_and(|task| !task.is_finished()) {
            return false;
        }
        *sync_task = Some(spawn_sync_schedule(
            self.authenticator.clone(),
            self.schedule.clone(),
        ));
        true
    }
}
