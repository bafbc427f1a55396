//! Shared application state for the Axum server.

use std::sync::Arc;

use tokio::sync::broadcast;

use sp_commands::{CommandCatalog, SchemaError};
use sp_protocol::DeviceRegistration;

use crate::events::WsEvent;
use crate::service::CommandService;
use crate::store::MemoryStore;
use crate::twin::MemoryTwin;

/// Shared application state, cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub commands: Arc<CommandService>,
    /// Broadcast channel for real-time WebSocket events.
    pub event_tx: broadcast::Sender<WsEvent>,
}

impl AppState {
    pub fn new(service: CommandService) -> Self {
        let event_tx = service.event_sender().clone();
        Self {
            commands: Arc::new(service),
            event_tx,
        }
    }

    /// Fully in-memory state over the given store and twin.
    pub fn in_memory(store: Arc<MemoryStore>, twin: Arc<MemoryTwin>) -> Result<Self, SchemaError> {
        let service = CommandService::new(
            store.clone(),
            store,
            twin.clone(),
            twin,
            CommandCatalog::builtin()?,
        );
        Ok(Self::new(service))
    }

    /// In-memory state with sample registrations for development / tests.
    pub fn with_sample_data() -> Result<Self, SchemaError> {
        let store = Arc::new(MemoryStore::with_registrations(sample_registrations()));
        Self::in_memory(store, Arc::new(MemoryTwin::new()))
    }
}

/// One device per model, owned by `demo-user`.
pub fn sample_registrations() -> Vec<DeviceRegistration> {
    vec![
        DeviceRegistration::new("demo-user", "hvac-001", "test-model"),
        DeviceRegistration::new("demo-user", "controller-001", "sim-controller"),
        DeviceRegistration::new("demo-user", "fan-001", "sim-fan"),
    ]
}
