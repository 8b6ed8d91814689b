use crate::domain::models::{AppError, BusStatus, EntityKind, Stop, TrackedLocation};
use crate::infra::provider::LocationProvider;
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use std::collections::HashMap;
use std::sync::Mutex;

/// Full width of the random offset applied to each axis per query, in degrees.
pub const LIVE_JITTER_DEG: f64 = 0.001;

#[derive(Debug, Clone)]
pub struct DriverAlert {
    pub bus: String,
    pub message: String,
    pub issued_at: DateTime<Utc>,
}

/// In-memory demo network. Alerts sent by drivers are attached to tracking
/// results for the same bus until they are older than the lifespan.
#[derive(Debug)]
pub struct FixtureLocationProvider {
    locations: HashMap<String, TrackedLocation>,
    latest_alert: Mutex<Option<DriverAlert>>,
    alert_lifespan: Duration,
}

impl FixtureLocationProvider {
    pub fn new(alert_lifespan_secs: i64) -> Self {
        Self {
            locations: HashMap::new(),
            latest_alert: Mutex::new(None),
            alert_lifespan: Duration::seconds(alert_lifespan_secs),
        }
    }

    pub fn demo(alert_lifespan_secs: i64, now: DateTime<Utc>) -> Self {
        let mut provider = Self::new(alert_lifespan_secs);
        for (key, location) in demo_locations() {
            provider.insert(key, location);
        }
        provider.latest_alert = Mutex::new(Some(DriverAlert {
            bus: "102".to_string(),
            message: alert_text("102", "Heavy traffic near Ramanagara, expect a 15-minute delay."),
            issued_at: now,
        }));
        provider
    }

    pub fn insert(&mut self, key: &str, location: TrackedLocation) {
        self.locations.insert(key.to_uppercase(), location);
    }

    pub fn send_driver_alert(
        &self,
        bus: &str,
        message: &str,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let mut latest = self.latest_alert.lock().map_err(|_| {
            AppError::new("STATE_LOCK_ERROR", "failed to lock driver alerts", None)
        })?;
        tracing::info!("driver alert for bus {bus}: {message}");
        *latest = Some(DriverAlert {
            bus: bus.to_string(),
            message: alert_text(bus, message),
            issued_at: now,
        });
        Ok(())
    }

    fn active_alert(&self, key: &str, now: DateTime<Utc>) -> Option<String> {
        let latest = self.latest_alert.lock().ok()?;
        latest
            .as_ref()
            .filter(|alert| alert.bus.to_uppercase() == key)
            .filter(|alert| now - alert.issued_at < self.alert_lifespan)
            .map(|alert| alert.message.clone())
    }
}

impl LocationProvider for FixtureLocationProvider {
    fn track(&self, query: &str, now: DateTime<Utc>) -> Option<TrackedLocation> {
        let key = query.trim().to_uppercase();
        let mut location = self.locations.get(&key)?.clone();
        // Every query reports a slightly shifted fix so the marker keeps moving.
        let half = LIVE_JITTER_DEG / 2.0;
        let mut rng = rand::thread_rng();
        location.lat += rng.gen_range(-half..half);
        location.lng += rng.gen_range(-half..half);
        location.alert = self.active_alert(&key, now);
        tracing::debug!("tracked {key}: {}", location.name);
        Some(location)
    }
}

fn alert_text(bus: &str, message: &str) -> String {
    format!("Driver Alert for {bus}: {message}")
}

fn bus(lat: f64, lng: f64, name: &str, status: BusStatus) -> TrackedLocation {
    TrackedLocation {
        lat,
        lng,
        name: name.to_string(),
        status,
        kind: EntityKind::Bus,
        stops: None,
        path: None,
        alert: None,
    }
}

fn route(name: &str, stops: &[(&str, u32, f64, f64)]) -> TrackedLocation {
    let stops = stops
        .iter()
        .map(|(name, eta_minutes, lat, lng)| Stop {
            name: name.to_string(),
            eta_minutes: *eta_minutes,
            lat: *lat,
            lng: *lng,
        })
        .collect::<Vec<_>>();
    let path = stops.iter().map(|stop| [stop.lat, stop.lng]).collect();
    let (lat, lng) = stops
        .first()
        .map(|stop| (stop.lat, stop.lng))
        .unwrap_or((f64::NAN, f64::NAN));
    TrackedLocation {
        lat,
        lng,
        name: name.to_string(),
        status: BusStatus::OnTime,
        kind: EntityKind::Route,
        stops: Some(stops),
        path: Some(path),
        alert: None,
    }
}

fn demo_locations() -> Vec<(&'static str, TrackedLocation)> {
    vec![
        (
            "101",
            bus(28.6139, 77.2090, "Bus 101 - India Gate, Delhi", BusStatus::OnTime),
        ),
        (
            "45A",
            bus(28.6562, 77.2410, "Bus 45A - Red Fort, Delhi", BusStatus::Delayed),
        ),
        (
            "307",
            bus(12.4237, 76.6829, "Bus 307 - Srirangapatna", BusStatus::OnTime),
        ),
        (
            "102",
            route(
                "Route 102 - Kengeri to Mysore",
                &[
                    ("Kengeri", 0, 12.9166, 77.4833),
                    ("Bidadi", 30, 12.7969, 77.3838),
                    ("Ramanagara", 60, 12.7209, 77.2799),
                    ("Channapatna", 90, 12.6518, 77.2086),
                    ("Mandya", 135, 12.5218, 76.8951),
                    ("Srirangapatna", 165, 12.4237, 76.6829),
                    ("Mysore Bus Stand", 190, 12.3148, 76.6483),
                ],
            ),
        ),
        (
            "375",
            route(
                "Route 375 - Kengeri to Banashankari",
                &[
                    ("Kengeri Bus Terminal", 0, 12.9166, 77.4833),
                    ("BGS Hospital", 5, 12.9095, 77.4855),
                    ("JSS Academy of Technical Education", 20, 12.9083, 77.5135),
                    ("Channasandra", 25, 12.9095, 77.5300),
                    ("Uttarahalli", 30, 12.9088, 77.5414),
                    ("Banashankari", 45, 12.9252, 77.5732),
                ],
            ),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::FixtureLocationProvider;
    use crate::domain::models::EntityKind;
    use crate::infra::provider::LocationProvider;
    use chrono::{Duration, Utc};

    #[test]
    fn queries_are_case_insensitive() {
        let now = Utc::now();
        let provider = FixtureLocationProvider::demo(300, now);
        let location = provider.track(" 45a ", now).unwrap();
        assert_eq!(location.name, "Bus 45A - Red Fort, Delhi");
        assert!(provider.track("999", now).is_none());
    }

    #[test]
    fn routes_carry_stops_and_path_in_itinerary_order() {
        let now = Utc::now();
        let provider = FixtureLocationProvider::demo(300, now);
        let location = provider.track("375", now).unwrap();
        assert_eq!(location.kind, EntityKind::Route);
        let stops = location.route_stops();
        assert_eq!(stops.first().unwrap().name, "Kengeri Bus Terminal");
        assert_eq!(stops.last().unwrap().name, "Banashankari");
        assert_eq!(location.route_path().unwrap().len(), stops.len());
    }

    #[test]
    fn driver_alert_expires_after_lifespan() {
        let now = Utc::now();
        let provider = FixtureLocationProvider::demo(300, now);
        assert!(provider.track("102", now).unwrap().alert.is_some());
        assert!(provider.track("375", now).unwrap().alert.is_none());
        let later = now + Duration::seconds(301);
        assert!(provider.track("102", later).unwrap().alert.is_none());
    }

    #[test]
    fn newest_alert_replaces_the_previous_one() {
        let now = Utc::now();
        let provider = FixtureLocationProvider::demo(300, now);
        provider
            .send_driver_alert("101", "Flat tyre, replacement bus on the way", now)
            .unwrap();
        assert!(provider.track("102", now).unwrap().alert.is_none());
        assert_eq!(
            provider.track("101", now).unwrap().alert.as_deref(),
            Some("Driver Alert for 101: Flat tyre, replacement bus on the way")
        );
    }

    #[test]
    fn every_query_shifts_the_fix_slightly() {
        let now = Utc::now();
        let provider = FixtureLocationProvider::demo(300, now);
        let first = provider.track("101", now).unwrap();
        let second = provider.track("101", now).unwrap();
        assert_ne!(first.position(), second.position());
        for location in [first, second] {
            assert!((location.lat - 28.6139).abs() <= 0.0005);
            assert!((location.lng - 77.2090).abs() <= 0.0005);
        }
    }
}
