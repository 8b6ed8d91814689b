pub mod geolocation;
pub mod geometry;
pub mod map;
pub mod motion;
pub mod view;
