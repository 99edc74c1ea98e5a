// Domain layer - Pure types and chart-shaping logic
pub mod chart;
pub mod downsample;
pub mod overlay;
pub mod project;
pub mod reading;
pub mod session;
pub mod thresholds;
pub mod timestamp;
