use crate::core::geometry::markers::MarkerStyle;
use crate::core::map::session::{MapSession, RenderSnapshot};
use crate::core::view::synchronizer::CameraMove;
use crate::domain::models::{AppError, LatLng, Viewport};
use crate::state::RuntimeState;
use uuid::Uuid;

pub fn mount_map(state: &RuntimeState) -> Result<String, AppError> {
    let style = MarkerStyle::from_settings(&state.current_settings()?);
    mount_map_with_style(state, style)
}

/// Mounts a map whose markers follow `style` instead of the configured one.
pub fn mount_map_with_style(state: &RuntimeState, style: MarkerStyle) -> Result<String, AppError> {
    let settings = state.current_settings()?;
    let session_id = Uuid::new_v4().to_string();
    let mut sessions = state
        .map_sessions
        .lock()
        .map_err(|_| AppError::new("STATE_LOCK_ERROR", "failed to lock map sessions", None))?;
    sessions.insert(
        session_id.clone(),
        MapSession::new(settings).with_style(style),
    );
    tracing::info!("map session {session_id} mounted");
    Ok(session_id)
}

/// Tears the session down before dropping it so nothing it scheduled can fire.
pub fn unmount_map(state: &RuntimeState, session_id: &str) -> Result<(), AppError> {
    let mut sessions = state
        .map_sessions
        .lock()
        .map_err(|_| AppError::new("STATE_LOCK_ERROR", "failed to lock map sessions", None))?;
    let Some(mut session) = sessions.remove(session_id) else {
        return Err(AppError::new(
            "SESSION_NOT_FOUND",
            format!("map session not found: {session_id}"),
            None,
        ));
    };
    session.teardown();
    Ok(())
}

pub fn recenter(state: &RuntimeState, session_id: &str) -> Result<Option<CameraMove>, AppError> {
    state.with_session(session_id, |session, now_ms| session.recenter(now_ms))
}

pub fn zoom_in(state: &RuntimeState, session_id: &str) -> Result<Viewport, AppError> {
    state.with_session(session_id, |session, now_ms| session.zoom_in(now_ms))
}

pub fn zoom_out(state: &RuntimeState, session_id: &str) -> Result<Viewport, AppError> {
    state.with_session(session_id, |session, now_ms| session.zoom_out(now_ms))
}

pub fn pan_to(
    state: &RuntimeState,
    session_id: &str,
    center: LatLng,
) -> Result<Viewport, AppError> {
    state.with_session(session_id, |session, now_ms| session.pan_to(center, now_ms))
}

pub fn render_snapshot(
    state: &RuntimeState,
    session_id: &str,
) -> Result<RenderSnapshot, AppError> {
    state.with_session(session_id, |session, now_ms| session.snapshot(now_ms))
}

/// Delivers due frames and timers to every mounted session.
pub fn pump_sessions(state: &RuntimeState) -> Result<usize, AppError> {
    let now_ms = state.now_ms();
    let mut sessions = state
        .map_sessions
        .lock()
        .map_err(|_| AppError::new("STATE_LOCK_ERROR", "failed to lock map sessions", None))?;
    Ok(sessions
        .values_mut()
        .map(|session| session.pump(now_ms))
        .sum())
}
