use crate::domain::models::AppError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewPhase {
    None,
    Arriving,
    Settled,
    Displayed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeolocationState {
    Idle,
    Requesting,
    Active,
    Error,
}

/// Per-target view lifecycle: camera flight, settle, popup.
#[derive(Debug, Clone)]
pub struct ViewMachine {
    state: ViewPhase,
}

impl ViewMachine {
    pub fn new() -> Self {
        Self {
            state: ViewPhase::None,
        }
    }

    pub fn state(&self) -> ViewPhase {
        self.state
    }

    /// A new target restarts the machine from any phase.
    pub fn arrive(&mut self) {
        self.state = ViewPhase::Arriving;
    }

    pub fn settle(&mut self) -> Result<(), AppError> {
        if self.state != ViewPhase::Arriving {
            return Err(AppError::new(
                "INVALID_VIEW_STATE",
                "only an arriving view can settle",
                None,
            ));
        }
        self.state = ViewPhase::Settled;
        Ok(())
    }

    pub fn display(&mut self) -> Result<(), AppError> {
        if self.state != ViewPhase::Settled {
            return Err(AppError::new(
                "INVALID_VIEW_STATE",
                "popup can only open once the view has settled",
                None,
            ));
        }
        self.state = ViewPhase::Displayed;
        Ok(())
    }

    pub fn reset(&mut self) {
        self.state = ViewPhase::None;
    }
}

impl Default for ViewMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct GeolocationMachine {
    state: GeolocationState,
}

impl GeolocationMachine {
    pub fn new() -> Self {
        Self {
            state: GeolocationState::Idle,
        }
    }

    pub fn state(&self) -> GeolocationState {
        self.state
    }

    pub fn request(&mut self) -> Result<(), AppError> {
        if self.state != GeolocationState::Idle && self.state != GeolocationState::Error {
            return Err(AppError::new(
                "INVALID_GEOLOCATION_STATE",
                "location can only be requested from idle or error",
                Some("turn the location overlay off before requesting again".to_string()),
            ));
        }
        self.state = GeolocationState::Requesting;
        Ok(())
    }

    pub fn activate(&mut self) -> Result<(), AppError> {
        if self.state != GeolocationState::Requesting {
            return Err(AppError::new(
                "INVALID_GEOLOCATION_STATE",
                "only a pending request can become active",
                None,
            ));
        }
        self.state = GeolocationState::Active;
        Ok(())
    }

    /// Unsupported devices fail without ever requesting, so any state may fail.
    pub fn fail(&mut self) {
        self.state = GeolocationState::Error;
    }

    pub fn clear(&mut self) -> Result<(), AppError> {
        if self.state != GeolocationState::Active {
            return Err(AppError::new(
                "INVALID_GEOLOCATION_STATE",
                "only an active overlay can be cleared",
                None,
            ));
        }
        self.state = GeolocationState::Idle;
        Ok(())
    }
}

impl Default for GeolocationMachine {
    fn default() -> Self {
        Self::new()
    }
}
