use crate::domain::models::{LatLng, Viewport};
use serde::{Deserialize, Serialize};

const TILE_SIZE_PX: f64 = 256.0;
const MAX_MERCATOR_LAT: f64 = 85.051_128_78;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bounds {
    pub south_west: LatLng,
    pub north_east: LatLng,
}

impl Bounds {
    /// Smallest box containing every valid point; `None` if there are none.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = LatLng>,
    {
        let mut bounds: Option<Bounds> = None;
        for point in points.into_iter().filter(LatLng::is_valid) {
            bounds = Some(match bounds {
                None => Bounds {
                    south_west: point,
                    north_east: point,
                },
                Some(current) => current.extend(point),
            });
        }
        bounds
    }

    pub fn extend(self, point: LatLng) -> Self {
        Bounds {
            south_west: LatLng::new(
                self.south_west.lat.min(point.lat),
                self.south_west.lng.min(point.lng),
            ),
            north_east: LatLng::new(
                self.north_east.lat.max(point.lat),
                self.north_east.lng.max(point.lng),
            ),
        }
    }

    pub fn contains(&self, point: LatLng) -> bool {
        point.lat >= self.south_west.lat
            && point.lat <= self.north_east.lat
            && point.lng >= self.south_west.lng
            && point.lng <= self.north_east.lng
    }
}

/// Web-Mercator position of a coordinate in world units (0..1 on both axes).
// https://wiki.openstreetmap.org/wiki/Slippy_map_tilenames
pub fn project(point: LatLng) -> (f64, f64) {
    let lat = point.lat.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT);
    let lat_rad = lat.to_radians();
    let x = (point.lng + 180.0) / 360.0;
    let y = (1.0 - ((lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / std::f64::consts::PI)) / 2.0;
    (x, y)
}

pub fn unproject(x: f64, y: f64) -> LatLng {
    let lng = x * 360.0 - 180.0;
    let lat = (std::f64::consts::PI * (1.0 - 2.0 * y)).sinh().atan().to_degrees();
    LatLng::new(lat, lng)
}

/// Viewport showing `bounds` with `padding_px` on every side of a
/// `width_px` x `height_px` map, at the largest whole zoom that fits.
pub fn fit_bounds(
    bounds: Bounds,
    width_px: f64,
    height_px: f64,
    padding_px: f64,
    min_zoom: f64,
    max_zoom: f64,
) -> Viewport {
    let (x1, y1) = project(bounds.south_west);
    let (x2, y2) = project(bounds.north_east);
    let center = unproject((x1 + x2) / 2.0, (y1 + y2) / 2.0);

    let span_x = (x2 - x1).abs() * TILE_SIZE_PX;
    let span_y = (y2 - y1).abs() * TILE_SIZE_PX;
    let usable_w = (width_px - 2.0 * padding_px).max(1.0);
    let usable_h = (height_px - 2.0 * padding_px).max(1.0);

    let scale = match (span_x > 0.0, span_y > 0.0) {
        (false, false) => f64::INFINITY,
        (true, false) => usable_w / span_x,
        (false, true) => usable_h / span_y,
        (true, true) => (usable_w / span_x).min(usable_h / span_y),
    };
    let zoom = if scale.is_finite() {
        scale.log2().floor()
    } else {
        max_zoom
    };

    Viewport {
        center,
        zoom: zoom.clamp(min_zoom, max_zoom),
    }
}
