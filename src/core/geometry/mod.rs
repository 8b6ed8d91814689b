pub mod bearing;
pub mod markers;
pub mod projection;
