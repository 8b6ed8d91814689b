use crate::core::view::synchronizer::CameraMove;
use crate::domain::models::{AppError, TrackedLocation};
use crate::infra::provider::LocationProvider;
use crate::state::RuntimeState;
use chrono::Utc;

/// Looks the query up with the location provider and makes the result the
/// session's tracked entity. A miss stops tracking before reporting.
pub fn track_bus_or_route(
    state: &RuntimeState,
    session_id: &str,
    query: &str,
) -> Result<Option<CameraMove>, AppError> {
    let Some(location) = state.provider.track(query, Utc::now()) else {
        set_tracked_location(state, session_id, None)?;
        return Err(AppError::new(
            "TRACK_NOT_FOUND",
            format!("no bus or route matches {query}"),
            Some("check the bus or route number".to_string()),
        ));
    };
    set_tracked_location(state, session_id, Some(location))
}

pub fn set_tracked_location(
    state: &RuntimeState,
    session_id: &str,
    location: Option<TrackedLocation>,
) -> Result<Option<CameraMove>, AppError> {
    state.with_session(session_id, |session, now_ms| {
        session.set_tracked_location(location, now_ms)
    })
}

pub fn stop_tracking(state: &RuntimeState, session_id: &str) -> Result<(), AppError> {
    set_tracked_location(state, session_id, None).map(|_| ())
}

pub fn send_driver_alert(state: &RuntimeState, bus: &str, message: &str) -> Result<(), AppError> {
    let message = message.trim();
    if message.is_empty() {
        return Err(AppError::new(
            "INVALID_ALERT",
            "alert message must not be empty",
            None,
        ));
    }
    state.provider.send_driver_alert(bus, message, Utc::now())
}
