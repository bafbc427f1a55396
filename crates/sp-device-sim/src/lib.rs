//! SmartProduct device simulator, library crate.
//!
//! Exposes the device, reconciler and loops so `sp-e2e-tests` can drive a
//! simulated device against an in-memory twin.

pub mod config;
pub mod error;
pub mod mqtt_loop;
pub mod paths;
pub mod reconciler;
pub mod shadow_sync;
pub mod simulation;
pub mod state;
pub mod telemetry;

pub use config::{DeviceConfig, SimulationConfig};
pub use error::{DeviceError, DeviceResult};
pub use reconciler::{Device, SharedDevice};
