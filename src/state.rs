use crate::core::map::session::MapSession;
use crate::domain::models::{AppError, MapSettings};
use crate::infra::provider::fixtures::FixtureLocationProvider;
use chrono::Utc;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Instant;

pub struct RuntimeState {
    pub settings_path: PathBuf,
    pub settings: Mutex<MapSettings>,
    pub map_sessions: Mutex<HashMap<String, MapSession>>,
    pub provider: FixtureLocationProvider,
    started: Instant,
}

impl RuntimeState {
    pub fn new(settings_path: PathBuf, settings: MapSettings) -> Self {
        let provider = FixtureLocationProvider::demo(settings.alert_lifespan_secs, Utc::now());
        Self {
            settings_path,
            settings: Mutex::new(settings),
            map_sessions: Mutex::new(HashMap::new()),
            provider,
            started: Instant::now(),
        }
    }

    /// Monotonic animation clock in milliseconds since startup.
    pub fn now_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    pub fn current_settings(&self) -> Result<MapSettings, AppError> {
        self.settings
            .lock()
            .map(|settings| settings.clone())
            .map_err(|_| AppError::new("STATE_LOCK_ERROR", "failed to lock settings", None))
    }

    pub fn with_session<T>(
        &self,
        session_id: &str,
        action: impl FnOnce(&mut MapSession, u64) -> T,
    ) -> Result<T, AppError> {
        let mut sessions = self.map_sessions.lock().map_err(|_| {
            AppError::new("STATE_LOCK_ERROR", "failed to lock map sessions", None)
        })?;
        let session = sessions.get_mut(session_id).ok_or_else(|| {
            AppError::new(
                "SESSION_NOT_FOUND",
                format!("map session not found: {session_id}"),
                Some("mount the map before sending it commands".to_string()),
            )
        })?;
        Ok(action(session, self.now_ms()))
    }
}
