use crate::core::geolocation::overlay::{
    GeolocationError, GeolocationOverlay, ResolveOutcome, ToggleOutcome,
};
use crate::core::geometry::markers::{tracked_markers, user_location_marker, MarkerStyle};
use crate::core::motion::interpolator::PositionInterpolator;
use crate::core::view::synchronizer::{CameraMove, ViewSynchronizer};
use crate::domain::models::{
    LatLng, MapSettings, MarkerSpec, RouteEmphasis, TrackedLocation, Viewport,
};
use crate::domain::state_machine::{GeolocationState, ViewPhase};
use crate::infra::scheduler::{CooperativeScheduler, WakeupKind};
use serde::Serialize;

/// Everything the render layer needs to paint one frame of the map.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderSnapshot {
    pub display_position: Option<LatLng>,
    pub viewport: Viewport,
    pub camera_in_flight: bool,
    pub popup_open: bool,
    pub view_phase: ViewPhase,
    pub route_path: Option<Vec<[f64; 2]>>,
    pub route_emphasis: Option<RouteEmphasis>,
    pub markers: Vec<MarkerSpec>,
    pub geolocation: GeolocationState,
    pub alert: Option<String>,
}

/// One mounted map view. Owns the only displayed position and the only
/// viewport; both change exclusively through the methods below or through
/// wakeups delivered by `pump`.
#[derive(Debug)]
pub struct MapSession {
    style: MarkerStyle,
    scheduler: CooperativeScheduler,
    interpolator: PositionInterpolator,
    view: ViewSynchronizer,
    geolocation: GeolocationOverlay,
    tracked: Option<TrackedLocation>,
    torn_down: bool,
}

impl MapSession {
    pub fn new(settings: MapSettings) -> Self {
        Self {
            style: MarkerStyle::from_settings(&settings),
            scheduler: CooperativeScheduler::new(),
            interpolator: PositionInterpolator::new(settings.glide_duration_ms),
            geolocation: GeolocationOverlay::new(settings.geolocation.clone()),
            view: ViewSynchronizer::new(settings),
            tracked: None,
            torn_down: false,
        }
    }

    pub fn with_style(mut self, style: MarkerStyle) -> Self {
        self.style = style;
        self
    }

    pub fn is_idle(&self) -> bool {
        self.scheduler.is_idle()
    }

    /// Replaces the tracked entity wholesale. `None` stops tracking. Every
    /// call restarts the camera move and the popup sequence, even for a value
    /// equal to the current one.
    pub fn set_tracked_location(
        &mut self,
        location: Option<TrackedLocation>,
        now_ms: u64,
    ) -> Option<CameraMove> {
        if self.torn_down {
            return None;
        }
        self.interpolator.retarget(
            location.as_ref().map(TrackedLocation::position),
            now_ms,
            &mut self.scheduler,
        );
        let camera = self.view.track(location.as_ref(), now_ms, &mut self.scheduler);
        self.tracked = location;
        camera
    }

    pub fn recenter(&mut self, now_ms: u64) -> Option<CameraMove> {
        if self.torn_down {
            return None;
        }
        self.view.recenter(now_ms)
    }

    pub fn zoom_in(&mut self, now_ms: u64) -> Viewport {
        self.zoom_by(1.0, now_ms)
    }

    pub fn zoom_out(&mut self, now_ms: u64) -> Viewport {
        self.zoom_by(-1.0, now_ms)
    }

    fn zoom_by(&mut self, delta: f64, now_ms: u64) -> Viewport {
        if self.torn_down {
            return self.view.current_viewport(now_ms);
        }
        self.view.zoom_by(delta, now_ms)
    }

    pub fn pan_to(&mut self, center: LatLng, now_ms: u64) -> Viewport {
        if self.torn_down {
            return self.view.current_viewport(now_ms);
        }
        self.view.pan_to(center, now_ms)
    }

    pub fn toggle_my_location(&mut self, supported: bool) -> ToggleOutcome {
        if self.torn_down {
            return ToggleOutcome::AlreadyPending;
        }
        self.geolocation.toggle(supported)
    }

    pub fn resolve_my_location(
        &mut self,
        token: u64,
        result: Result<LatLng, GeolocationError>,
        now_ms: u64,
    ) -> ResolveOutcome {
        if self.torn_down {
            return ResolveOutcome::Stale;
        }
        let outcome = self.geolocation.resolve(token, result);
        if let ResolveOutcome::Located(position) = outcome {
            self.view.fly_to_user(position, now_ms);
        }
        outcome
    }

    /// Delivers every frame and timer due at `now_ms`. Returns how many
    /// wakeups changed state.
    pub fn pump(&mut self, now_ms: u64) -> usize {
        if self.torn_down {
            return 0;
        }
        let mut applied = 0;
        for wakeup in self.scheduler.drain_due(now_ms) {
            let changed = match wakeup.kind {
                WakeupKind::Frame => {
                    self.interpolator
                        .on_frame(wakeup.handle, now_ms, &mut self.scheduler)
                }
                WakeupKind::Timer => self.view.on_timer(wakeup.handle, now_ms, &mut self.scheduler),
            };
            if changed {
                applied += 1;
            }
        }
        applied
    }

    pub fn snapshot(&self, now_ms: u64) -> RenderSnapshot {
        let display_position = self.interpolator.displayed();
        let mut markers = self
            .tracked
            .as_ref()
            .map(|location| tracked_markers(location, display_position, &self.style))
            .unwrap_or_default();
        if let Some(position) = self.geolocation.user_location() {
            markers.push(user_location_marker(position));
        }
        let route_path = self
            .tracked
            .as_ref()
            .and_then(|location| location.route_path())
            .map(|path| path.to_vec());
        let route_emphasis = route_path
            .as_ref()
            .zip(self.tracked.as_ref())
            .map(|(_, location)| self.style.emphasis(location));

        RenderSnapshot {
            display_position,
            viewport: self.view.current_viewport(now_ms),
            camera_in_flight: self.view.camera_in_flight(now_ms),
            popup_open: self.view.popup_open(),
            view_phase: self.view.phase(),
            route_path,
            route_emphasis,
            markers,
            geolocation: self.geolocation.state(),
            alert: self.tracked.as_ref().and_then(|location| location.alert.clone()),
        }
    }

    /// Cancels every pending frame and timer. The session ignores all
    /// further input.
    pub fn teardown(&mut self) {
        self.interpolator.cancel(&mut self.scheduler);
        self.view.teardown(&mut self.scheduler);
        self.geolocation.teardown();
        self.scheduler.clear_all();
        self.tracked = None;
        self.torn_down = true;
        tracing::info!("map session torn down");
    }
}

#[cfg(test)]
mod tests {
    use super::MapSession;
    use crate::core::geolocation::overlay::{
        GeolocationError, GeolocationFailureKind, ResolveOutcome, ToggleOutcome,
    };
    use crate::core::geometry::bearing::bearing;
    use crate::domain::models::{
        BusStatus, EntityKind, IconDescriptor, LatLng, MapSettings, RouteEmphasis,
        TrackedLocation,
    };
    use crate::domain::state_machine::{GeolocationState, ViewPhase};

    fn bus(lat: f64, lng: f64) -> TrackedLocation {
        TrackedLocation {
            lat,
            lng,
            name: "Bus 101".to_string(),
            status: BusStatus::OnTime,
            kind: EntityKind::Bus,
            stops: None,
            path: None,
            alert: None,
        }
    }

    fn route() -> TrackedLocation {
        TrackedLocation {
            lat: 12.90,
            lng: 77.48,
            name: "Route 102 - Kengeri".to_string(),
            status: BusStatus::OnTime,
            kind: EntityKind::Route,
            stops: None,
            path: Some(vec![[12.90, 77.48], [12.80, 77.40]]),
            alert: Some("Heavy traffic near Ramanagara".to_string()),
        }
    }

    #[test]
    fn bus_to_route_switches_from_centering_to_fitting() {
        let mut session = MapSession::new(MapSettings::default());
        let first = session.set_tracked_location(Some(bus(12.97, 77.59)), 0).unwrap();
        assert!(first.fit_bounds.is_none());
        assert_eq!(first.target.zoom, 15.0);

        let second = session.set_tracked_location(Some(route()), 2000).unwrap();
        assert!(second.fit_bounds.is_some());

        let snapshot = session.snapshot(2000);
        let arrows = snapshot
            .markers
            .iter()
            .filter_map(|marker| match marker.icon {
                IconDescriptor::DirectionArrow { rotation_deg, emphasis } => {
                    Some((marker.position, rotation_deg, emphasis))
                }
                _ => None,
            })
            .collect::<Vec<_>>();
        assert_eq!(arrows.len(), 1);
        let (position, rotation, emphasis) = arrows[0];
        assert!((position.lat - 12.85).abs() < 1e-12);
        assert!((position.lng - 77.44).abs() < 1e-12);
        assert_eq!(rotation, bearing(12.90, 77.48, 12.80, 77.40));
        assert_eq!(emphasis, RouteEmphasis::Highlighted);
        assert_eq!(snapshot.route_emphasis, Some(RouteEmphasis::Highlighted));
        assert_eq!(snapshot.alert.as_deref(), Some("Heavy traffic near Ramanagara"));
    }

    #[test]
    fn marker_glides_and_popup_opens_after_flight() {
        let mut session = MapSession::new(MapSettings::default());
        session.set_tracked_location(Some(bus(12.97, 77.59)), 0);
        assert_eq!(session.snapshot(0).display_position, Some(LatLng::new(12.97, 77.59)));

        session.set_tracked_location(Some(bus(12.98, 77.60)), 100);
        let mut now_ms = 100;
        while now_ms <= 1800 {
            session.pump(now_ms);
            now_ms += 16;
        }
        let snapshot = session.snapshot(now_ms);
        assert_eq!(snapshot.display_position, Some(LatLng::new(12.98, 77.60)));
        assert!(snapshot.popup_open);
        assert_eq!(snapshot.view_phase, ViewPhase::Displayed);
        assert!(session.is_idle());
    }

    #[test]
    fn stale_frames_do_not_touch_the_display() {
        let mut session = MapSession::new(MapSettings::default());
        session.set_tracked_location(Some(bus(0.0, 0.0)), 0);
        session.set_tracked_location(Some(bus(1.0, 1.0)), 0);
        session.pump(750);
        let midway = session.snapshot(750).display_position.unwrap();

        session.set_tracked_location(Some(bus(-1.0, -1.0)), 760);
        // Only the replacement glide has a frame queued; its first sample sits
        // at the point the previous glide had reached.
        session.pump(760);
        assert_eq!(session.snapshot(760).display_position, Some(midway));
    }

    #[test]
    fn repeated_query_recenters_after_a_pan() {
        let mut session = MapSession::new(MapSettings::default());
        let first = session.set_tracked_location(Some(bus(12.97, 77.59)), 0).unwrap();
        session.pump(1500);
        session.pump(1600);
        assert!(session.snapshot(1600).popup_open);

        session.pan_to(LatLng::new(20.0, 70.0), 2000);
        let second = session.set_tracked_location(Some(bus(12.97, 77.59)), 2100).unwrap();
        assert_eq!(second.target, first.target);
        let snapshot = session.snapshot(2100);
        assert!(!snapshot.popup_open);
        assert_eq!(snapshot.view_phase, ViewPhase::Arriving);
        assert_eq!(snapshot.display_position, Some(LatLng::new(12.97, 77.59)));
        assert_eq!(session.snapshot(3600).viewport, first.target);
    }

    #[test]
    fn stop_tracking_clears_everything() {
        let mut session = MapSession::new(MapSettings::default());
        session.set_tracked_location(Some(route()), 0);
        assert!(session.set_tracked_location(None, 100).is_none());
        let snapshot = session.snapshot(100);
        assert!(snapshot.display_position.is_none());
        assert!(snapshot.markers.is_empty());
        assert!(!snapshot.popup_open);
        assert!(session.is_idle());
    }

    #[test]
    fn invalid_location_is_swallowed() {
        let mut session = MapSession::new(MapSettings::default());
        let before = session.snapshot(0).viewport;
        assert!(session.set_tracked_location(Some(bus(12.97, f64::NAN)), 0).is_none());
        session.pump(5000);
        let snapshot = session.snapshot(5000);
        assert_eq!(snapshot.viewport, before);
        assert!(!snapshot.popup_open);
        assert!(snapshot.display_position.is_none());
        assert!(session.recenter(5000).is_none());
    }

    #[test]
    fn user_location_flies_to_higher_zoom() {
        let mut session = MapSession::new(MapSettings::default());
        let ToggleOutcome::Request(request) = session.toggle_my_location(true) else {
            panic!("expected a request");
        };
        let outcome = session.resolve_my_location(request.token, Ok(LatLng::new(12.3, 76.6)), 0);
        assert_eq!(outcome, ResolveOutcome::Located(LatLng::new(12.3, 76.6)));
        let snapshot = session.snapshot(2000);
        assert_eq!(snapshot.viewport.zoom, 16.0);
        assert_eq!(snapshot.geolocation, GeolocationState::Active);
        assert!(snapshot
            .markers
            .iter()
            .any(|marker| marker.icon == IconDescriptor::UserLocation));
    }

    #[test]
    fn denied_location_reports_permission_failure() {
        let mut session = MapSession::new(MapSettings::default());
        let ToggleOutcome::Request(request) = session.toggle_my_location(true) else {
            panic!("expected a request");
        };
        let outcome =
            session.resolve_my_location(request.token, Err(GeolocationError::PermissionDenied), 0);
        let ResolveOutcome::Failed(failure) = outcome else {
            panic!("expected a failure");
        };
        assert_eq!(failure.kind, GeolocationFailureKind::PermissionDenied);
        assert_eq!(session.snapshot(0).geolocation, GeolocationState::Error);
    }

    #[test]
    fn teardown_leaves_nothing_scheduled() {
        let mut session = MapSession::new(MapSettings::default());
        session.set_tracked_location(Some(bus(0.0, 0.0)), 0);
        session.set_tracked_location(Some(bus(1.0, 1.0)), 10);
        assert!(!session.is_idle());
        session.teardown();
        assert!(session.is_idle());
        assert_eq!(session.pump(10_000), 0);
        assert!(session.set_tracked_location(Some(bus(2.0, 2.0)), 10_000).is_none());
    }
}
