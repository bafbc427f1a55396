//! In-process twin registry.
//!
//! Keeps one `ShadowState` per device and records every notification, so
//! the full command round trip can run without AWS.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use sp_protocol::{CommandNotification, ShadowDelta, ShadowState, ShadowUpdate, topics};

use super::{Notifier, TwinError, TwinResult, TwinService};

#[derive(Default)]
pub struct MemoryTwin {
    shadows: RwLock<HashMap<String, ShadowState>>,
    notifications: RwLock<Vec<CommandNotification>>,
    fail_patch: AtomicBool,
    fail_notify: AtomicBool,
}

impl MemoryTwin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_patch(&self, fail: bool) {
        self.fail_patch.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_notify(&self, fail: bool) {
        self.fail_notify.store(fail, Ordering::SeqCst);
    }

    pub async fn shadow(&self, device_id: &str) -> Option<ShadowState> {
        self.shadows.read().await.get(device_id).cloned()
    }

    /// Pending delta for `device_id`, as the device would receive it.
    pub async fn delta_message(&self, device_id: &str) -> Option<ShadowDelta> {
        self.shadows
            .read()
            .await
            .get(device_id)
            .and_then(ShadowState::delta_message)
    }

    /// Apply a device report, returning the remaining delta.
    pub async fn report(&self, device_id: &str, update: &ShadowUpdate) -> Value {
        self.shadows
            .write()
            .await
            .entry(device_id.to_string())
            .or_default()
            .apply(update)
    }

    pub async fn notifications(&self) -> Vec<CommandNotification> {
        self.notifications.read().await.clone()
    }
}

#[async_trait]
impl TwinService for MemoryTwin {
    async fn patch_desired(&self, device_id: &str, patch: &Value) -> TwinResult<()> {
        if self.fail_patch.load(Ordering::SeqCst) {
            return Err(TwinError::Update {
                thing: device_id.to_string(),
                reason: "simulated failure".into(),
            });
        }
        let delta = self
            .shadows
            .write()
            .await
            .entry(device_id.to_string())
            .or_default()
            .apply(&ShadowUpdate::desired(patch.clone()));
        tracing::debug!(device_id = %device_id, delta = %delta, "desired state patched");
        Ok(())
    }
}

#[async_trait]
impl Notifier for MemoryTwin {
    async fn notify(&self, notification: &CommandNotification) -> TwinResult<()> {
        if self.fail_notify.load(Ordering::SeqCst) {
            return Err(TwinError::Publish {
                topic: topics::commands(topics::DEFAULT_NAMESPACE, &notification.device_id),
                reason: "simulated failure".into(),
            });
        }
        self.notifications.write().await.push(notification.clone());
        Ok(())
    }
}
