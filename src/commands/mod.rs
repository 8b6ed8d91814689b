pub mod geolocation;
pub mod map;
pub mod settings;
pub mod tracking;
