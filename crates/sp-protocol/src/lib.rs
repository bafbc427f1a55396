pub mod commands;
pub mod device;
pub mod shadows;
pub mod telemetry;
pub mod topics;

pub use commands::*;
pub use device::*;
pub use shadows::*;
pub use telemetry::*;
