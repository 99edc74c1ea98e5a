// Application layer - Use cases and the ports they depend on
pub mod auth_service;
pub mod error;
pub mod monitor_repository;
pub mod project_service;
pub mod proxy_service;
pub mod sensor_gateway;
pub mod streaming_service;
pub mod vibration_service;

#[cfg(test)]
pub mod fakes;
