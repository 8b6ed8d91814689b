use crate::core::geometry::bearing::{bearing_between, midpoint, normalize_degrees};
use crate::domain::models::{
    IconDescriptor, LatLng, MajorStopRule, MapSettings, MarkerSpec, RouteEmphasis, Stop,
    StopFacing, TrackedLocation,
};
use std::fmt;
use std::sync::Arc;

/// Decides whether a tracked entity gets the highlighted route treatment.
#[derive(Clone)]
pub struct RoutePredicate(Arc<dyn Fn(&TrackedLocation) -> bool + Send + Sync>);

impl RoutePredicate {
    pub fn new(predicate: impl Fn(&TrackedLocation) -> bool + Send + Sync + 'static) -> Self {
        Self(Arc::new(predicate))
    }

    /// Matches when the entity name contains any of the tokens.
    pub fn name_tokens(tokens: Vec<String>) -> Self {
        Self::new(move |location| {
            tokens
                .iter()
                .filter(|token| !token.is_empty())
                .any(|token| location.name.contains(token.as_str()))
        })
    }

    pub fn matches(&self, location: &TrackedLocation) -> bool {
        (self.0)(location)
    }
}

impl fmt::Debug for RoutePredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RoutePredicate")
    }
}

#[derive(Debug, Clone)]
pub struct MarkerStyle {
    pub special_route: RoutePredicate,
    pub major_stops: Vec<MajorStopRule>,
    /// Heading the major-stop artwork already points at when unrotated. This
    /// belongs to the icon set, not to the geometry.
    pub icon_heading_offset_deg: f64,
}

impl MarkerStyle {
    pub fn from_settings(settings: &MapSettings) -> Self {
        Self {
            special_route: RoutePredicate::name_tokens(settings.special_route_tokens.clone()),
            major_stops: settings.major_stops.clone(),
            icon_heading_offset_deg: settings.icon_heading_offset_deg,
        }
    }

    pub fn with_special_route(mut self, predicate: RoutePredicate) -> Self {
        self.special_route = predicate;
        self
    }

    pub fn emphasis(&self, location: &TrackedLocation) -> RouteEmphasis {
        if self.special_route.matches(location) {
            RouteEmphasis::Highlighted
        } else {
            RouteEmphasis::Standard
        }
    }

    fn facing_for(&self, stop: &Stop) -> Option<StopFacing> {
        self.major_stops
            .iter()
            .find(|rule| rule.name == stop.name)
            .map(|rule| rule.facing)
    }
}

impl Default for MarkerStyle {
    fn default() -> Self {
        Self::from_settings(&MapSettings::default())
    }
}

/// One decorative arrow per path segment, at its midpoint, pointing along it.
pub fn direction_arrows(path: &[[f64; 2]], emphasis: RouteEmphasis) -> Vec<MarkerSpec> {
    path.windows(2)
        .enumerate()
        .filter_map(|(index, segment)| {
            let start = LatLng::from(segment[0]);
            let end = LatLng::from(segment[1]);
            if !start.is_valid() || !end.is_valid() {
                return None;
            }
            Some(MarkerSpec {
                id: format!("arrow-{index}"),
                position: midpoint(start, end),
                icon: IconDescriptor::DirectionArrow {
                    rotation_deg: bearing_between(start, end),
                    emphasis,
                },
                interactive: false,
            })
        })
        .collect()
}

/// Rotation for a major-stop icon: bearing toward the neighbor the stop
/// faces, minus the artwork offset. Zero when that neighbor does not exist.
pub fn major_stop_rotation(
    stops: &[Stop],
    index: usize,
    facing: StopFacing,
    offset_deg: f64,
) -> f64 {
    let neighbor = match facing {
        StopFacing::Next => stops.get(index + 1),
        StopFacing::Previous => index.checked_sub(1).and_then(|prev| stops.get(prev)),
    };
    let (Some(stop), Some(neighbor)) = (stops.get(index), neighbor) else {
        return 0.0;
    };
    if !stop.position().is_valid() || !neighbor.position().is_valid() {
        return 0.0;
    }
    normalize_degrees(bearing_between(stop.position(), neighbor.position()) - offset_deg)
}

pub fn stop_markers(stops: &[Stop], style: &MarkerStyle) -> Vec<MarkerSpec> {
    stops
        .iter()
        .enumerate()
        .filter(|(_, stop)| stop.position().is_valid())
        .map(|(index, stop)| {
            let icon = match style.facing_for(stop) {
                Some(facing) => IconDescriptor::MajorStop {
                    rotation_deg: major_stop_rotation(
                        stops,
                        index,
                        facing,
                        style.icon_heading_offset_deg,
                    ),
                },
                None => IconDescriptor::Stop,
            };
            MarkerSpec {
                id: format!("stop-{index}-{}", stop.name),
                position: stop.position(),
                icon,
                interactive: true,
            }
        })
        .collect()
}

/// Every marker the render layer needs for the tracked entity, excluding the
/// user-location overlay. `display` is the interpolated bus position.
pub fn tracked_markers(
    location: &TrackedLocation,
    display: Option<LatLng>,
    style: &MarkerStyle,
) -> Vec<MarkerSpec> {
    let mut markers = Vec::new();
    if let Some(path) = location.route_path() {
        markers.extend(direction_arrows(path, style.emphasis(location)));
    }
    markers.extend(stop_markers(location.route_stops(), style));
    if let Some(position) = display.filter(|_| location.has_valid_position()) {
        markers.push(MarkerSpec {
            id: "tracked".to_string(),
            position,
            icon: IconDescriptor::Bus {
                status: location.status,
            },
            interactive: true,
        });
    }
    markers
}

pub fn user_location_marker(position: LatLng) -> MarkerSpec {
    MarkerSpec {
        id: "user-location".to_string(),
        position,
        icon: IconDescriptor::UserLocation,
        interactive: true,
    }
}
