use crate::domain::models::{GeolocationOptions, LatLng};
use crate::domain::state_machine::{GeolocationMachine, GeolocationState};
use serde::{Deserialize, Serialize};

/// Raw failure reported by a position source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "snake_case")]
pub enum GeolocationError {
    #[error("location permission denied")]
    PermissionDenied,
    #[error("position unavailable")]
    PositionUnavailable,
    #[error("location request timed out")]
    Timeout,
    #[error("geolocation is not supported on this device")]
    Unsupported,
}

impl GeolocationError {
    /// Maps the W3C `GeolocationPositionError.code` values.
    pub fn from_code(code: u16) -> Self {
        match code {
            1 => Self::PermissionDenied,
            3 => Self::Timeout,
            _ => Self::PositionUnavailable,
        }
    }

    pub fn kind(&self) -> GeolocationFailureKind {
        match self {
            Self::PermissionDenied => GeolocationFailureKind::PermissionDenied,
            Self::PositionUnavailable | Self::Timeout => GeolocationFailureKind::OtherError,
            Self::Unsupported => GeolocationFailureKind::Unsupported,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeolocationFailureKind {
    PermissionDenied,
    OtherError,
    Unsupported,
}

impl GeolocationFailureKind {
    /// Translation key the notification layer turns into user-facing text.
    pub fn message_key(&self) -> &'static str {
        match self {
            Self::PermissionDenied => "locationPermissionDenied",
            Self::OtherError => "locationError",
            Self::Unsupported => "geolocationNotSupported",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeolocationFailure {
    pub kind: GeolocationFailureKind,
    pub message_key: &'static str,
    pub detail: String,
}

impl From<GeolocationError> for GeolocationFailure {
    fn from(error: GeolocationError) -> Self {
        let kind = error.kind();
        Self {
            kind,
            message_key: kind.message_key(),
            detail: error.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeolocationRequest {
    pub token: u64,
    pub options: GeolocationOptions,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ToggleOutcome {
    Request(GeolocationRequest),
    Cleared,
    AlreadyPending,
    Failed(GeolocationFailure),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResolveOutcome {
    Located(LatLng),
    Failed(GeolocationFailure),
    Stale,
}

/// "Show my location" overlay, toggled independently of tracking.
#[derive(Debug)]
pub struct GeolocationOverlay {
    machine: GeolocationMachine,
    options: GeolocationOptions,
    user_location: Option<LatLng>,
    next_token: u64,
    pending_token: Option<u64>,
}

impl GeolocationOverlay {
    pub fn new(options: GeolocationOptions) -> Self {
        Self {
            machine: GeolocationMachine::new(),
            options,
            user_location: None,
            next_token: 0,
            pending_token: None,
        }
    }

    pub fn state(&self) -> GeolocationState {
        self.machine.state()
    }

    pub fn user_location(&self) -> Option<LatLng> {
        self.user_location
    }

    pub fn toggle(&mut self, supported: bool) -> ToggleOutcome {
        match self.machine.state() {
            GeolocationState::Active => {
                self.user_location = None;
                if self.machine.clear().is_err() {
                    return ToggleOutcome::AlreadyPending;
                }
                tracing::info!("user location overlay cleared");
                ToggleOutcome::Cleared
            }
            GeolocationState::Requesting => ToggleOutcome::AlreadyPending,
            GeolocationState::Idle | GeolocationState::Error => {
                if !supported {
                    self.machine.fail();
                    tracing::warn!("geolocation unsupported");
                    return ToggleOutcome::Failed(GeolocationError::Unsupported.into());
                }
                if self.machine.request().is_err() {
                    return ToggleOutcome::AlreadyPending;
                }
                self.next_token += 1;
                self.pending_token = Some(self.next_token);
                ToggleOutcome::Request(GeolocationRequest {
                    token: self.next_token,
                    options: self.options.clone(),
                })
            }
        }
    }

    pub fn resolve(
        &mut self,
        token: u64,
        result: Result<LatLng, GeolocationError>,
    ) -> ResolveOutcome {
        if self.pending_token != Some(token) {
            return ResolveOutcome::Stale;
        }
        self.pending_token = None;

        let result = result.and_then(|position| {
            if position.is_valid() {
                Ok(position)
            } else {
                Err(GeolocationError::PositionUnavailable)
            }
        });
        match result {
            Ok(position) => {
                if self.machine.activate().is_err() {
                    return ResolveOutcome::Stale;
                }
                self.user_location = Some(position);
                tracing::info!("user located at {:.5},{:.5}", position.lat, position.lng);
                ResolveOutcome::Located(position)
            }
            Err(error) => {
                self.machine.fail();
                tracing::warn!("geolocation failed: {error}");
                ResolveOutcome::Failed(error.into())
            }
        }
    }

    pub fn teardown(&mut self) {
        self.pending_token = None;
        self.user_location = None;
        self.machine = GeolocationMachine::new();
    }
}
