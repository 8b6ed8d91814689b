use crate::domain::models::LatLng;

fn to_radians(degrees: f64) -> f64 {
    degrees * std::f64::consts::PI / 180.0
}

fn to_degrees(radians: f64) -> f64 {
    radians * 180.0 / std::f64::consts::PI
}

pub fn normalize_degrees(degrees: f64) -> f64 {
    let normalized = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs.
    if normalized >= 360.0 {
        0.0
    } else {
        normalized
    }
}

/// Initial great-circle bearing from the first point toward the second, in
/// degrees clockwise from north within [0, 360).
pub fn bearing(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let lat1_rad = to_radians(lat1);
    let lat2_rad = to_radians(lat2);
    let delta_lng_rad = to_radians(lng2 - lng1);

    let y = delta_lng_rad.sin() * lat2_rad.cos();
    let x = lat1_rad.cos() * lat2_rad.sin() - lat1_rad.sin() * lat2_rad.cos() * delta_lng_rad.cos();

    normalize_degrees(to_degrees(y.atan2(x)))
}

pub fn bearing_between(from: LatLng, to: LatLng) -> f64 {
    bearing(from.lat, from.lng, to.lat, to.lng)
}

pub fn midpoint(from: LatLng, to: LatLng) -> LatLng {
    LatLng {
        lat: (from.lat + to.lat) / 2.0,
        lng: (from.lng + to.lng) / 2.0,
    }
}

#[cfg(test)]
mod tests {
    use super::{bearing, midpoint, normalize_degrees};
    use crate::domain::models::LatLng;

    fn angular_gap(a: f64, b: f64) -> f64 {
        let diff = (a - b).rem_euclid(360.0);
        diff.min(360.0 - diff)
    }

    #[test]
    fn cardinal_directions() {
        assert!(bearing(0.0, 0.0, 1.0, 0.0).abs() < 1e-9);
        assert!((bearing(0.0, 0.0, 0.0, 1.0) - 90.0).abs() < 1e-9);
        assert!((bearing(1.0, 0.0, 0.0, 0.0) - 180.0).abs() < 1e-9);
        assert!((bearing(0.0, 1.0, 0.0, 0.0) - 270.0).abs() < 1e-9);
    }

    #[test]
    fn identical_points_have_a_defined_bearing() {
        for (lat, lng) in [(0.0, 0.0), (12.97, 77.59), (-45.0, 170.0), (89.9, -120.0)] {
            let value = bearing(lat, lng, lat, lng);
            assert!(value.is_finite());
            assert!((0.0..360.0).contains(&value));
        }
    }

    #[test]
    fn reverse_bearing_on_the_equator_is_opposite() {
        let forward = bearing(0.0, 10.0, 0.0, 20.0);
        let back = bearing(0.0, 20.0, 0.0, 10.0);
        assert!((angular_gap(forward, back) - 180.0).abs() < 1e-9);
    }

    #[test]
    fn reverse_bearing_along_a_meridian_is_opposite() {
        let forward = bearing(12.90, 77.48, 12.80, 77.48);
        let back = bearing(12.80, 77.48, 12.90, 77.48);
        assert!((angular_gap(forward, back) - 180.0).abs() < 1e-9);
    }

    #[test]
    fn short_segment_reverse_bearing_is_opposite() {
        // Great-circle convergence is negligible over a few kilometres.
        let forward = bearing(12.90, 77.48, 12.80, 77.40);
        let back = bearing(12.80, 77.40, 12.90, 77.48);
        assert!((angular_gap(forward, back) - 180.0).abs() < 0.05);
        assert!(forward > 180.0 && forward < 270.0);
    }

    #[test]
    fn normalization_stays_in_range() {
        assert_eq!(normalize_degrees(-90.0), 270.0);
        assert_eq!(normalize_degrees(360.0), 0.0);
        assert_eq!(normalize_degrees(725.0), 5.0);
        assert!(normalize_degrees(-1e-15) < 360.0);
    }

    #[test]
    fn midpoint_is_the_arithmetic_mean() {
        let mid = midpoint(LatLng::new(12.90, 77.48), LatLng::new(12.80, 77.40));
        assert!((mid.lat - 12.85).abs() < 1e-12);
        assert!((mid.lng - 77.44).abs() < 1e-12);
    }
}
