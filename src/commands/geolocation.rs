use crate::core::geolocation::overlay::{
    GeolocationError, GeolocationFailure, ResolveOutcome, ToggleOutcome,
};
use crate::domain::models::{AppError, LatLng};
use crate::domain::state_machine::GeolocationState;
use crate::infra::runtime::position::PositionSource;
use crate::state::RuntimeState;
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationToggleReport {
    pub state: GeolocationState,
    pub user_location: Option<LatLng>,
    pub failure: Option<GeolocationFailure>,
}

/// "Show my location" button. Toggles the overlay off when it is active,
/// otherwise asks `source` for a fix without holding the session lock while
/// waiting.
pub async fn toggle_my_location(
    state: &RuntimeState,
    session_id: &str,
    source: &impl PositionSource,
) -> Result<LocationToggleReport, AppError> {
    let supported = source.is_supported();
    let outcome = state.with_session(session_id, |session, _| {
        session.toggle_my_location(supported)
    })?;

    let request = match outcome {
        ToggleOutcome::Request(request) => request,
        ToggleOutcome::Failed(failure) => return report(state, session_id, Some(failure)),
        ToggleOutcome::Cleared | ToggleOutcome::AlreadyPending => {
            return report(state, session_id, None)
        }
    };

    let timeout = Duration::from_millis(request.options.timeout_ms);
    let lookup = source.current_position(&request.options);
    let result = tokio::time::timeout(timeout, lookup)
        .await
        .unwrap_or(Err(GeolocationError::Timeout));

    let outcome = state.with_session(session_id, |session, now_ms| {
        session.resolve_my_location(request.token, result, now_ms)
    })?;
    match outcome {
        ResolveOutcome::Failed(failure) => report(state, session_id, Some(failure)),
        ResolveOutcome::Located(_) | ResolveOutcome::Stale => report(state, session_id, None),
    }
}

fn report(
    state: &RuntimeState,
    session_id: &str,
    failure: Option<GeolocationFailure>,
) -> Result<LocationToggleReport, AppError> {
    state.with_session(session_id, |session, now_ms| {
        let snapshot = session.snapshot(now_ms);
        LocationToggleReport {
            state: snapshot.geolocation,
            user_location: snapshot
                .markers
                .iter()
                .find(|marker| marker.id == "user-location")
                .map(|marker| marker.position),
            failure,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::toggle_my_location;
    use crate::commands::map::{mount_map, render_snapshot};
    use crate::core::geolocation::overlay::{GeolocationError, GeolocationFailureKind};
    use crate::domain::models::{LatLng, MapSettings};
    use crate::domain::state_machine::GeolocationState;
    use crate::infra::runtime::position::FixedPositionSource;
    use crate::state::RuntimeState;
    use std::path::PathBuf;
    use std::time::Duration;

    fn runtime() -> RuntimeState {
        RuntimeState::new(PathBuf::from("settings.json"), MapSettings::default())
    }

    #[tokio::test]
    async fn located_user_is_shown_and_toggles_off() {
        let state = runtime();
        let session_id = mount_map(&state).unwrap();
        let source = FixedPositionSource::located(LatLng::new(12.3, 76.6));

        let report = toggle_my_location(&state, &session_id, &source).await.unwrap();
        assert_eq!(report.state, GeolocationState::Active);
        assert_eq!(report.user_location, Some(LatLng::new(12.3, 76.6)));

        let report = toggle_my_location(&state, &session_id, &source).await.unwrap();
        assert_eq!(report.state, GeolocationState::Idle);
        assert!(report.user_location.is_none());
    }

    #[tokio::test]
    async fn permission_denied_is_reported() {
        let state = runtime();
        let session_id = mount_map(&state).unwrap();
        let source = FixedPositionSource::failing(GeolocationError::PermissionDenied);
        let report = toggle_my_location(&state, &session_id, &source).await.unwrap();
        assert_eq!(report.state, GeolocationState::Error);
        assert_eq!(
            report.failure.map(|failure| failure.kind),
            Some(GeolocationFailureKind::PermissionDenied)
        );
    }

    #[tokio::test]
    async fn unsupported_device_is_reported() {
        let state = runtime();
        let session_id = mount_map(&state).unwrap();
        let source = FixedPositionSource::unsupported();
        let report = toggle_my_location(&state, &session_id, &source).await.unwrap();
        assert_eq!(
            report.failure.map(|failure| failure.kind),
            Some(GeolocationFailureKind::Unsupported)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn slow_fix_times_out_as_generic_error() {
        let state = runtime();
        let session_id = mount_map(&state).unwrap();
        let source = FixedPositionSource::located(LatLng::new(12.3, 76.6))
            .with_delay(Duration::from_secs(30));
        let report = toggle_my_location(&state, &session_id, &source).await.unwrap();
        assert_eq!(
            report.failure.map(|failure| failure.kind),
            Some(GeolocationFailureKind::OtherError)
        );
        let snapshot = render_snapshot(&state, &session_id).unwrap();
        assert_eq!(snapshot.geolocation, GeolocationState::Error);
    }
}
