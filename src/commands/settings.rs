use crate::domain::models::{AppError, MapSettings};
use crate::infra::storage::settings_store::save_settings;
use crate::state::RuntimeState;

pub fn load_map_settings(state: &RuntimeState) -> Result<MapSettings, AppError> {
    state.current_settings()
}

/// Persists new settings. Maps mounted afterwards use them; mounted maps keep
/// the settings they started with.
pub fn save_map_settings(state: &RuntimeState, settings: MapSettings) -> Result<(), AppError> {
    validate_settings(&settings)?;
    save_settings(&state.settings_path, &settings)?;
    let mut current = state
        .settings
        .lock()
        .map_err(|_| AppError::new("STATE_LOCK_ERROR", "failed to lock settings", None))?;
    *current = settings;
    Ok(())
}

fn validate_settings(settings: &MapSettings) -> Result<(), AppError> {
    if settings.min_zoom > settings.max_zoom {
        return Err(AppError::new(
            "INVALID_SETTINGS",
            "minZoom must not exceed maxZoom",
            None,
        ));
    }
    if settings.viewport_width_px <= 0.0 || settings.viewport_height_px <= 0.0 {
        return Err(AppError::new(
            "INVALID_SETTINGS",
            "viewport size must be positive",
            None,
        ));
    }
    if settings.popup_delay_ms < settings.flight_duration_ms {
        return Err(AppError::new(
            "INVALID_SETTINGS",
            "popupDelayMs must not be shorter than flightDurationMs",
            Some("the popup opens only after the camera has arrived".to_string()),
        ));
    }
    if !settings.initial_view.center.is_valid() {
        return Err(AppError::new(
            "INVALID_SETTINGS",
            "initial view center must be a valid coordinate",
            None,
        ));
    }
    Ok(())
}
