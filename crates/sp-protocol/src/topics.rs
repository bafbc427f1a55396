//! MQTT topic builders and parsers.
//!
//! Topic structure:
//! ```text
//! {namespace}/commands/{device_id}
//! {namespace}/telemetry/{device_id}
//! {namespace}/event/{device_id}
//! $aws/things/{thing}/shadow/update
//! $aws/things/{thing}/shadow/update/delta
//! ```

/// Namespace used when none is configured.
pub const DEFAULT_NAMESPACE: &str = "smartproduct";

const SHADOW_PREFIX: &str = "$aws/things";

// ─── Namespaced device topics ───

pub fn commands(namespace: &str, device_id: &str) -> String {
    format!("{namespace}/commands/{device_id}")
}

pub fn telemetry(namespace: &str, device_id: &str) -> String {
    format!("{namespace}/telemetry/{device_id}")
}

pub fn event(namespace: &str, device_id: &str) -> String {
    format!("{namespace}/event/{device_id}")
}

// ─── Shadow topics ───

pub fn shadow_update(thing: &str) -> String {
    format!("{SHADOW_PREFIX}/{thing}/shadow/update")
}

pub fn shadow_delta(thing: &str) -> String {
    format!("{SHADOW_PREFIX}/{thing}/shadow/update/delta")
}

// ─── Subscription patterns (with MQTT wildcards) ───

/// Subscribe to every device's command channel (for the cloud bridge).
pub fn all_commands(namespace: &str) -> String {
    format!("{namespace}/commands/+")
}

/// Subscribe to every device's event channel.
pub fn all_events(namespace: &str) -> String {
    format!("{namespace}/event/+")
}

// ─── Topic parsing ───

/// Which channel a topic belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicKind {
    Commands,
    Telemetry,
    Event,
    ShadowUpdate,
    ShadowDelta,
}

/// Parsed MQTT topic components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTopic {
    /// Namespace for device topics, `None` for shadow topics.
    pub namespace: Option<String>,
    pub device_id: String,
    pub kind: TopicKind,
}

/// Parse a topic string into its components.
/// Returns `None` if the topic doesn't match a known format.
pub fn parse_topic(topic: &str) -> Option<ParsedTopic> {
    let parts: Vec<&str> = topic.split('/').collect();

    // $aws/things/{thing}/shadow/update[/delta]
    if parts.first() == Some(&"$aws") {
        let kind = match parts.as_slice() {
            ["$aws", "things", _, "shadow", "update"] => TopicKind::ShadowUpdate,
            ["$aws", "things", _, "shadow", "update", "delta"] => TopicKind::ShadowDelta,
            _ => return None,
        };
        if parts[2].is_empty() {
            return None;
        }
        return Some(ParsedTopic {
            namespace: None,
            device_id: parts[2].to_string(),
            kind,
        });
    }

    // {namespace}/{category}/{device_id}
    let [namespace, category, device_id] = parts.as_slice() else {
        return None;
    };
    if namespace.is_empty() || device_id.is_empty() {
        return None;
    }
    let kind = match *category {
        "commands" => TopicKind::Commands,
        "telemetry" => TopicKind::Telemetry,
        "event" => TopicKind::Event,
        _ => return None,
    };

    Some(ParsedTopic {
        namespace: Some(namespace.to_string()),
        device_id: device_id.to_string(),
        kind,
    })
}
