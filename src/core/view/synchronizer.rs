use crate::core::geometry::projection::{fit_bounds, Bounds};
use crate::core::motion::easing::{blend_viewport, ease_out_cubic, linear_progress};
use crate::domain::models::{LatLng, MapSettings, TrackedLocation, Viewport};
use crate::domain::state_machine::{ViewMachine, ViewPhase};
use crate::infra::scheduler::{Scheduler, WakeupHandle};
use serde::Serialize;

/// Camera instruction handed to the render layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraMove {
    pub target: Viewport,
    pub fit_bounds: Option<Bounds>,
    pub padding_px: f64,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Copy)]
struct Flight {
    from: Viewport,
    to: Viewport,
    started_ms: u64,
    duration_ms: u64,
}

impl Flight {
    fn sample(&self, now_ms: u64) -> Viewport {
        let linear = linear_progress(now_ms.saturating_sub(self.started_ms), self.duration_ms);
        if linear >= 1.0 {
            self.to
        } else {
            blend_viewport(self.from, self.to, ease_out_cubic(linear))
        }
    }

    fn is_done(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.started_ms) >= self.duration_ms
    }
}

/// Keeps the viewport and popup disclosure in step with the tracked entity.
#[derive(Debug)]
pub struct ViewSynchronizer {
    settings: MapSettings,
    viewport: Viewport,
    flight: Option<Flight>,
    machine: ViewMachine,
    settle_timer: Option<WakeupHandle>,
    popup_timer: Option<WakeupHandle>,
    target: Option<TrackedLocation>,
}

impl ViewSynchronizer {
    pub fn new(settings: MapSettings) -> Self {
        let viewport = settings.initial_view;
        Self {
            settings,
            viewport,
            flight: None,
            machine: ViewMachine::new(),
            settle_timer: None,
            popup_timer: None,
            target: None,
        }
    }

    pub fn phase(&self) -> ViewPhase {
        self.machine.state()
    }

    pub fn popup_open(&self) -> bool {
        self.machine.state() == ViewPhase::Displayed
    }

    pub fn camera_in_flight(&self, now_ms: u64) -> bool {
        self.flight.is_some_and(|flight| !flight.is_done(now_ms))
    }

    pub fn current_viewport(&self, now_ms: u64) -> Viewport {
        match self.flight {
            Some(flight) => flight.sample(now_ms),
            None => self.viewport,
        }
    }

    /// Starts the arrival sequence for a new target. Absent or invalid
    /// targets close the popup and leave the camera where it is.
    pub fn track(
        &mut self,
        location: Option<&TrackedLocation>,
        now_ms: u64,
        scheduler: &mut impl Scheduler,
    ) -> Option<CameraMove> {
        self.cancel_timers(scheduler);
        let Some(location) = location.filter(|location| location.has_valid_position()) else {
            if location.is_some() {
                tracing::warn!("ignoring tracked location with invalid coordinates");
            }
            self.target = None;
            self.machine.reset();
            return None;
        };

        let camera = self.camera_for(location);
        self.start_flight(camera, now_ms);
        self.target = Some(location.clone());
        self.machine.arrive();
        self.settle_timer = Some(scheduler.set_timeout(now_ms, self.settings.flight_duration_ms));
        tracing::info!(
            "arriving at {} (zoom {:.0})",
            location.name,
            camera.target.zoom
        );
        Some(camera)
    }

    /// Handles a fired timer. Returns false for timers this synchronizer no
    /// longer owns.
    pub fn on_timer(
        &mut self,
        handle: WakeupHandle,
        now_ms: u64,
        scheduler: &mut impl Scheduler,
    ) -> bool {
        if self.settle_timer == Some(handle) {
            self.settle_timer = None;
            if self.machine.settle().is_err() {
                return false;
            }
            // A popup delay shorter than the flight opens the popup on arrival.
            let remaining = self
                .settings
                .popup_delay_ms
                .saturating_sub(self.settings.flight_duration_ms);
            self.popup_timer = Some(scheduler.set_timeout(now_ms, remaining));
            return true;
        }
        if self.popup_timer == Some(handle) {
            self.popup_timer = None;
            if self.machine.display().is_err() {
                return false;
            }
            tracing::debug!("popup opened");
            return true;
        }
        false
    }

    /// Repeats the fit/center move for the current target.
    pub fn recenter(&mut self, now_ms: u64) -> Option<CameraMove> {
        let location = self.target.as_ref()?;
        let camera = self.camera_for(location);
        self.start_flight(camera, now_ms);
        Some(camera)
    }

    /// Changes zoom around the current center; any camera flight stops where it is.
    pub fn zoom_by(&mut self, delta: f64, now_ms: u64) -> Viewport {
        let current = self.freeze(now_ms);
        self.viewport = Viewport {
            center: current.center,
            zoom: (current.zoom + delta).clamp(self.settings.min_zoom, self.settings.max_zoom),
        };
        self.viewport
    }

    pub fn pan_to(&mut self, center: LatLng, now_ms: u64) -> Viewport {
        let current = self.freeze(now_ms);
        if center.is_valid() {
            self.viewport = Viewport {
                center,
                zoom: current.zoom,
            };
        }
        self.viewport
    }

    /// Centers on the user's own position without touching the tracked
    /// entity's popup sequence.
    pub fn fly_to_user(&mut self, position: LatLng, now_ms: u64) -> Option<CameraMove> {
        if !position.is_valid() {
            return None;
        }
        let camera = CameraMove {
            target: Viewport {
                center: position,
                zoom: self.settings.user_location_zoom,
            },
            fit_bounds: None,
            padding_px: 0.0,
            duration_ms: self.settings.flight_duration_ms,
        };
        self.start_flight(camera, now_ms);
        Some(camera)
    }

    pub fn teardown(&mut self, scheduler: &mut impl Scheduler) {
        self.cancel_timers(scheduler);
        self.flight = None;
        self.target = None;
        self.machine.reset();
    }

    fn camera_for(&self, location: &TrackedLocation) -> CameraMove {
        let bounds = location
            .route_path()
            .and_then(|path| Bounds::from_points(path.iter().copied().map(LatLng::from)));
        match bounds {
            Some(bounds) => CameraMove {
                target: fit_bounds(
                    bounds,
                    self.settings.viewport_width_px,
                    self.settings.viewport_height_px,
                    self.settings.fit_padding_px,
                    self.settings.min_zoom,
                    self.settings.max_zoom,
                ),
                fit_bounds: Some(bounds),
                padding_px: self.settings.fit_padding_px,
                duration_ms: self.settings.flight_duration_ms,
            },
            None => CameraMove {
                target: Viewport {
                    center: location.position(),
                    zoom: self.settings.point_zoom,
                },
                fit_bounds: None,
                padding_px: 0.0,
                duration_ms: self.settings.flight_duration_ms,
            },
        }
    }

    fn start_flight(&mut self, camera: CameraMove, now_ms: u64) {
        let from = self.current_viewport(now_ms);
        self.flight = Some(Flight {
            from,
            to: camera.target,
            started_ms: now_ms,
            duration_ms: camera.duration_ms,
        });
        self.viewport = camera.target;
    }

    fn freeze(&mut self, now_ms: u64) -> Viewport {
        let current = self.current_viewport(now_ms);
        self.flight = None;
        self.viewport = current;
        current
    }

    fn cancel_timers(&mut self, scheduler: &mut impl Scheduler) {
        if let Some(handle) = self.settle_timer.take() {
            scheduler.clear_timeout(handle);
        }
        if let Some(handle) = self.popup_timer.take() {
            scheduler.clear_timeout(handle);
        }
    }
}
