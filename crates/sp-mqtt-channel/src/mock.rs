//! Mock MQTT channel for testing without a real broker.
//!
//! Records all published messages and subscription filters for
//! assertion in tests, and can be told to fail publishes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use rumqttc::QoS;

use crate::channel::Channel;
use crate::error::{MqttError, MqttResult};

/// A recorded publish call.
#[derive(Debug, Clone)]
pub struct PublishedMessage {
    pub topic: String,
    pub payload: Vec<u8>,
    pub qos: QoS,
}

impl PublishedMessage {
    /// Payload parsed as JSON (`Null` if it isn't JSON).
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.payload).unwrap_or(serde_json::Value::Null)
    }
}

/// Mock implementation of the `Channel` trait.
///
/// Thread-safe via `Mutex` so one instance can be shared between the cloud
/// and device halves of a test.
pub struct MockChannel {
    published: Mutex<Vec<PublishedMessage>>,
    subscriptions: Mutex<Vec<(String, QoS)>>,
    fail_publish: AtomicBool,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockChannel {
    pub fn new() -> Self {
        Self {
            published: Mutex::new(Vec::new()),
            subscriptions: Mutex::new(Vec::new()),
            fail_publish: AtomicBool::new(false),
        }
    }

    /// Make subsequent publishes fail (or succeed again).
    pub fn set_fail_publish(&self, fail: bool) {
        self.fail_publish.store(fail, Ordering::SeqCst);
    }

    /// Get all published messages.
    pub fn published(&self) -> Vec<PublishedMessage> {
        lock(&self.published).clone()
    }

    /// Get all subscription filters.
    pub fn subscriptions(&self) -> Vec<(String, QoS)> {
        lock(&self.subscriptions).clone()
    }

    /// Get the last published message.
    pub fn last_published(&self) -> Option<PublishedMessage> {
        lock(&self.published).last().cloned()
    }

    /// Get published messages for a specific topic.
    pub fn published_to(&self, topic: &str) -> Vec<PublishedMessage> {
        lock(&self.published)
            .iter()
            .filter(|m| m.topic == topic)
            .cloned()
            .collect()
    }

    /// Remove and return everything published so far.
    pub fn drain(&self) -> Vec<PublishedMessage> {
        std::mem::take(&mut *lock(&self.published))
    }

    /// Check whether a subscription was made to the given filter.
    pub fn is_subscribed_to(&self, filter: &str) -> bool {
        lock(&self.subscriptions).iter().any(|(f, _)| f == filter)
    }

    /// Clear all recorded state.
    pub fn reset(&self) {
        lock(&self.published).clear();
        lock(&self.subscriptions).clear();
        self.set_fail_publish(false);
    }
}

impl Default for MockChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Channel for MockChannel {
    async fn publish(&self, topic: &str, payload: &[u8], qos: QoS) -> MqttResult<()> {
        if self.fail_publish.load(Ordering::SeqCst) {
            return Err(MqttError::Publish(format!("mock publish to '{topic}' failed")));
        }
        lock(&self.published).push(PublishedMessage {
            topic: topic.to_string(),
            payload: payload.to_vec(),
            qos,
        });
        Ok(())
    }

    async fn subscribe(&self, filter: &str, qos: QoS) -> MqttResult<()> {
        lock(&self.subscriptions).push((filter.to_string(), qos));
        Ok(())
    }
}
