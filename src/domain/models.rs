use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }
}

impl From<[f64; 2]> for LatLng {
    fn from(pair: [f64; 2]) -> Self {
        Self {
            lat: pair[0],
            lng: pair[1],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stop {
    pub name: String,
    pub eta_minutes: u32,
    pub lat: f64,
    pub lng: f64,
}

impl Stop {
    pub fn position(&self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedLocation {
    pub lat: f64,
    pub lng: f64,
    pub name: String,
    pub status: BusStatus,
    #[serde(rename = "type")]
    pub kind: EntityKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stops: Option<Vec<Stop>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<[f64; 2]>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert: Option<String>,
}

impl TrackedLocation {
    pub fn position(&self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }

    pub fn has_valid_position(&self) -> bool {
        self.position().is_valid()
    }

    /// Route polyline, only when this is a route with at least one point.
    pub fn route_path(&self) -> Option<&[[f64; 2]]> {
        if self.kind != EntityKind::Route {
            return None;
        }
        self.path.as_deref().filter(|path| !path.is_empty())
    }

    pub fn route_stops(&self) -> &[Stop] {
        match (&self.kind, &self.stops) {
            (EntityKind::Route, Some(stops)) => stops,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BusStatus {
    OnTime,
    Delayed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Bus,
    Route,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteEmphasis {
    Standard,
    Highlighted,
}

/// What the render layer should draw for a marker. Resolving a descriptor to
/// an actual asset happens outside this crate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IconDescriptor {
    Bus { status: BusStatus },
    Stop,
    MajorStop { rotation_deg: f64 },
    UserLocation,
    DirectionArrow { rotation_deg: f64, emphasis: RouteEmphasis },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerSpec {
    pub id: String,
    pub position: LatLng,
    pub icon: IconDescriptor,
    pub interactive: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    pub center: LatLng,
    pub zoom: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopFacing {
    Next,
    Previous,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MajorStopRule {
    pub name: String,
    pub facing: StopFacing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeolocationOptions {
    pub enable_high_accuracy: bool,
    pub timeout_ms: u64,
    pub maximum_age_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MapSettings {
    pub glide_duration_ms: u64,
    pub flight_duration_ms: u64,
    pub popup_delay_ms: u64,
    pub point_zoom: f64,
    pub user_location_zoom: f64,
    pub fit_padding_px: f64,
    pub viewport_width_px: f64,
    pub viewport_height_px: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub initial_view: Viewport,
    pub special_route_tokens: Vec<String>,
    pub major_stops: Vec<MajorStopRule>,
    pub icon_heading_offset_deg: f64,
    pub alert_lifespan_secs: i64,
    pub geolocation: GeolocationOptions,
}

#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
#[error("{code}: {message}")]
pub struct AppError {
    pub code: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl AppError {
    pub fn new(
        code: impl Into<String>,
        message: impl Into<String>,
        suggestion: Option<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            suggestion,
        }
    }
}

impl Default for GeolocationOptions {
    fn default() -> Self {
        Self {
            enable_high_accuracy: true,
            timeout_ms: 10_000,
            maximum_age_ms: 0,
        }
    }
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            glide_duration_ms: 1500,
            flight_duration_ms: 1500,
            popup_delay_ms: 1600,
            point_zoom: 15.0,
            user_location_zoom: 16.0,
            fit_padding_px: 50.0,
            viewport_width_px: 1280.0,
            viewport_height_px: 720.0,
            min_zoom: 1.0,
            max_zoom: 18.0,
            initial_view: Viewport {
                center: LatLng::new(28.6139, 77.2090),
                zoom: 12.0,
            },
            special_route_tokens: vec!["102".to_string()],
            major_stops: vec![
                MajorStopRule {
                    name: "Ramanagara".to_string(),
                    facing: StopFacing::Next,
                },
                MajorStopRule {
                    name: "Mandya".to_string(),
                    facing: StopFacing::Previous,
                },
            ],
            // Major-stop artwork faces east, so rotations are shifted back by a quarter turn.
            icon_heading_offset_deg: 90.0,
            alert_lifespan_secs: 5 * 60,
            geolocation: GeolocationOptions::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{BusStatus, EntityKind, IconDescriptor, MapSettings, RouteEmphasis, TrackedLocation};

    #[test]
    fn tracked_location_reads_host_json() {
        let raw = r#"{
            "lat": 12.9166,
            "lng": 77.4833,
            "name": "Route 102 - Kengeri to Mysore",
            "status": "on-time",
            "type": "route",
            "stops": [{ "name": "Kengeri", "etaMinutes": 0, "lat": 12.9166, "lng": 77.4833 }],
            "path": [[12.9166, 77.4833], [12.7969, 77.3838]]
        }"#;
        let location: TrackedLocation = serde_json::from_str(raw).unwrap();
        assert_eq!(location.kind, EntityKind::Route);
        assert_eq!(location.status, BusStatus::OnTime);
        assert_eq!(location.route_stops()[0].eta_minutes, 0);
        assert_eq!(location.route_path().map(|path| path.len()), Some(2));
        assert!(location.alert.is_none());
    }

    #[test]
    fn bus_never_exposes_route_geometry() {
        let location = TrackedLocation {
            lat: 28.6139,
            lng: 77.2090,
            name: "Bus 101".to_string(),
            status: BusStatus::Delayed,
            kind: EntityKind::Bus,
            stops: None,
            path: Some(vec![[1.0, 1.0], [2.0, 2.0]]),
            alert: None,
        };
        assert!(location.route_path().is_none());
        assert!(location.route_stops().is_empty());
    }

    #[test]
    fn nan_coordinate_is_not_a_valid_position() {
        let mut location = TrackedLocation {
            lat: 12.97,
            lng: f64::NAN,
            name: "Bus 7".to_string(),
            status: BusStatus::OnTime,
            kind: EntityKind::Bus,
            stops: None,
            path: None,
            alert: None,
        };
        assert!(!location.has_valid_position());
        location.lng = 77.59;
        assert!(location.has_valid_position());
    }

    #[test]
    fn icon_descriptor_is_tagged_by_kind() {
        let icon = IconDescriptor::DirectionArrow {
            rotation_deg: 45.0,
            emphasis: RouteEmphasis::Highlighted,
        };
        let value = serde_json::to_value(icon).unwrap();
        assert_eq!(value["kind"], "direction_arrow");
        assert_eq!(value["emphasis"], "highlighted");
    }

    #[test]
    fn partial_settings_fill_in_defaults() {
        let settings: MapSettings = serde_json::from_str(r#"{ "pointZoom": 14.0 }"#).unwrap();
        assert_eq!(settings.point_zoom, 14.0);
        assert_eq!(settings.glide_duration_ms, 1500);
        assert_eq!(settings.geolocation.timeout_ms, 10_000);
        assert_eq!(settings.major_stops.len(), 2);
    }
}
