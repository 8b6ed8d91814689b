pub mod easing;
pub mod interpolator;
