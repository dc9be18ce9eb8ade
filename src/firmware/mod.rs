pub mod at;
pub mod config;
pub mod ncp_update;
pub mod net;
#[cfg(feature = "esp32")]
pub mod platform;
pub mod system;
pub mod telemetry;
#[cfg(test)]
pub(crate) mod testing;
pub mod types;
