use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Closed set of interaction categories the ingestion endpoint accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    ScreenView,
    ContentView,
    ItemClick,
    BannerImpression,
    BannerClick,
    PartnerClick,
    PhoneClick,
    LinkClick,
    NotificationOpen,
}

impl EventType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ScreenView => "screen_view",
            Self::ContentView => "content_view",
            Self::ItemClick => "item_click",
            Self::BannerImpression => "banner_impression",
            Self::BannerClick => "banner_click",
            Self::PartnerClick => "partner_click",
            Self::PhoneClick => "phone_click",
            Self::LinkClick => "link_click",
            Self::NotificationOpen => "notification_open",
        }
    }

    pub const fn all() -> &'static [EventType] {
        &[
            EventType::ScreenView,
            EventType::ContentView,
            EventType::ItemClick,
            EventType::BannerImpression,
            EventType::BannerClick,
            EventType::PartnerClick,
            EventType::PhoneClick,
            EventType::LinkClick,
            EventType::NotificationOpen,
        ]
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EventType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::all()
            .iter()
            .copied()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| format!("unsupported event type: {value}"))
    }
}

/// What a UI interaction hands to the sender before identity is resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct EventDescriptor {
    pub event_type: EventType,
    pub entity_type: Option<String>,
    pub entity_id: Option<String>,
    pub entity_name: Option<String>,
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
}

impl EventDescriptor {
    pub fn new(event_type: EventType) -> Self {
        Self {
            event_type,
            entity_type: None,
            entity_id: None,
            entity_name: None,
            metadata: None,
        }
    }

    pub fn entity(
        mut self,
        entity_type: impl Into<String>,
        entity_id: impl Into<String>,
    ) -> Self {
        self.entity_type = Some(entity_type.into());
        self.entity_id = Some(entity_id.into());
        self
    }

    pub fn entity_name(mut self, name: impl Into<String>) -> Self {
        self.entity_name = Some(name.into());
        self
    }

    pub fn metadata(mut self, metadata: serde_json::Map<String, serde_json::Value>) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Fully resolved event as transmitted to the ingestion endpoint.
///
/// `metadata` and `user_id` always serialize, as `null` when absent: a
/// missing metadata map and an empty one are distinct on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryEvent {
    pub event_type: EventType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_name: Option<String>,
    #[serde(default)]
    pub metadata: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    pub session_id: String,
    pub source: String,
}

impl TelemetryEvent {
    pub fn resolve(
        descriptor: EventDescriptor,
        session_id: String,
        user_id: Option<String>,
        source: &str,
    ) -> Self {
        let metadata = descriptor
            .metadata
            .map(|map| serde_json::Value::Object(map).to_string());
        Self {
            event_type: descriptor.event_type,
            entity_type: descriptor.entity_type,
            entity_id: descriptor.entity_id,
            entity_name: descriptor.entity_name,
            metadata,
            user_id,
            session_id,
            source: source.to_string(),
        }
    }
}

/// Durable-queue entry. Bookkeeping fields never reach the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedEvent {
    pub queue_id: String,
    pub queued_at: String,
    #[serde(flatten)]
    pub event: TelemetryEvent,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn resolved(metadata: Option<serde_json::Map<String, serde_json::Value>>) -> TelemetryEvent {
        let mut descriptor = EventDescriptor::new(EventType::BannerClick).entity("banner", "42");
        descriptor.metadata = metadata;
        TelemetryEvent::resolve(descriptor, "sess-1".to_string(), None, "mobile")
    }

    #[test]
    fn wire_shape_uses_camel_case_and_nulls() {
        let value = serde_json::to_value(resolved(None)).unwrap();
        assert_eq!(
            value,
            json!({
                "eventType": "banner_click",
                "entityType": "banner",
                "entityId": "42",
                "metadata": null,
                "userId": null,
                "sessionId": "sess-1",
                "source": "mobile"
            })
        );
    }

    #[test]
    fn empty_metadata_is_distinct_from_absent() {
        let empty = resolved(Some(serde_json::Map::new()));
        assert_eq!(empty.metadata.as_deref(), Some("{}"));
        assert_eq!(resolved(None).metadata, None);
    }

    #[test]
    fn metadata_is_serialized_to_a_string() {
        let mut map = serde_json::Map::new();
        map.insert("screen".to_string(), json!("home"));
        let event = resolved(Some(map));
        let wire = serde_json::to_value(&event).unwrap();
        assert_eq!(wire["metadata"], json!("{\"screen\":\"home\"}"));
    }

    #[test]
    fn queued_event_flattens_the_wire_fields() {
        let queued = QueuedEvent {
            queue_id: "q1".to_string(),
            queued_at: "2026-01-01T00:00:00Z".to_string(),
            event: resolved(None),
        };
        let value = serde_json::to_value(&queued).unwrap();
        assert_eq!(value["queuedAt"], json!("2026-01-01T00:00:00Z"));
        assert_eq!(value["eventType"], json!("banner_click"));

        let back: QueuedEvent = serde_json::from_value(value).unwrap();
        assert_eq!(back, queued);
    }

    #[test]
    fn event_type_parses_case_insensitively() {
        assert_eq!(
            "Screen_View".parse::<EventType>().unwrap(),
            EventType::ScreenView
        );
        assert!("swipe".parse::<EventType>().is_err());
    }
}
