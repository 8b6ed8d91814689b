use crate::core::geolocation::overlay::GeolocationError;
use crate::domain::models::{GeolocationOptions, LatLng};
use std::future::Future;
use std::time::Duration;

/// Device position lookup, one shot per call.
pub trait PositionSource: Send + Sync {
    fn is_supported(&self) -> bool;

    fn current_position(
        &self,
        options: &GeolocationOptions,
    ) -> impl Future<Output = Result<LatLng, GeolocationError>> + Send;
}

/// Answers every request with the same result after a fixed delay.
#[derive(Debug, Clone)]
pub struct FixedPositionSource {
    pub supported: bool,
    pub result: Result<LatLng, GeolocationError>,
    pub delay: Duration,
}

impl FixedPositionSource {
    pub fn located(position: LatLng) -> Self {
        Self {
            supported: true,
            result: Ok(position),
            delay: Duration::from_millis(50),
        }
    }

    pub fn failing(error: GeolocationError) -> Self {
        Self {
            supported: true,
            result: Err(error),
            delay: Duration::from_millis(50),
        }
    }

    pub fn unsupported() -> Self {
        Self {
            supported: false,
            result: Err(GeolocationError::Unsupported),
            delay: Duration::ZERO,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

impl PositionSource for FixedPositionSource {
    fn is_supported(&self) -> bool {
        self.supported
    }

    fn current_position(
        &self,
        _options: &GeolocationOptions,
    ) -> impl Future<Output = Result<LatLng, GeolocationError>> + Send {
        let result = self.result;
        let delay = self.delay;
        async move {
            tokio::time::sleep(delay).await;
            result
        }
    }
}
