use crate::domain::models::{LatLng, Viewport};

pub fn linear_progress(elapsed_ms: u64, duration_ms: u64) -> f64 {
    if duration_ms == 0 {
        return 1.0;
    }
    (elapsed_ms as f64 / duration_ms as f64).min(1.0)
}

pub fn ease_out_cubic(linear: f64) -> f64 {
    let t = linear.clamp(0.0, 1.0);
    1.0 - (1.0 - t).powi(3)
}

pub fn blend(start: LatLng, end: LatLng, eased: f64) -> LatLng {
    LatLng {
        lat: start.lat + (end.lat - start.lat) * eased,
        lng: start.lng + (end.lng - start.lng) * eased,
    }
}

pub fn blend_viewport(start: Viewport, end: Viewport, eased: f64) -> Viewport {
    Viewport {
        center: blend(start.center, end.center, eased),
        zoom: start.zoom + (end.zoom - start.zoom) * eased,
    }
}
