//! SmartProduct Cloud API: library crate for the remote command server.
//!
//! Re-exports all modules so the binary (`main.rs`) and external crates
//! (e.g. `sp-e2e-tests`) can reach `CommandService`, the store and twin
//! seams, and `build_router`.

pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod mqtt_bridge;
pub mod routes;
pub mod service;
pub mod state;
pub mod store;
pub mod twin;

pub use error::{ApiError, CommandError, CommandResult};
pub use service::CommandService;
pub use state::AppState;
