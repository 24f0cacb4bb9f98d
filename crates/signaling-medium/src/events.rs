//! Audit events published after each committed transition.

use crate::types::{NameHash, ParticipantId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventPayload {
    /// A new name hash was claimed.
    ParticipantRegistered {
        id: ParticipantId,
        name_hash: NameHash,
    },

    /// An owner re-registered its name with a new key.
    EncryptionKeyUpdated {
        id: ParticipantId,
        name_hash: NameHash,
    },

    /// A participant moved from `previous` to `name_hash`.
    ParticipantRenamed {
        id: ParticipantId,
        previous: NameHash,
        name_hash: NameHash,
    },

    /// An offer was left for `recipient`.
    ConnectionInitiated {
        recipient: NameHash,
        initiator: NameHash,
    },

    /// An answer was left for `initiator`.
    ConnectionAccepted {
        initiator: NameHash,
        accepter: NameHash,
    },
}

impl EventPayload {
    /// Stable event name, used as the SSE event type.
    pub fn name(&self) -> &'static str {
        match self {
            EventPayload::ParticipantRegistered { .. } => "participant_registered",
            EventPayload::EncryptionKeyUpdated { .. } => "encryption_key_updated",
            EventPayload::ParticipantRenamed { .. } => "participant_renamed",
            EventPayload::ConnectionInitiated { .. } => "connection_initiated",
            EventPayload::ConnectionAccepted { .. } => "connection_accepted",
        }
    }
}

/// A timestamped audit record.
///
/// Token and key contents are never part of an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub at: DateTime<Utc>,

    #[serde(flatten)]
    pub payload: EventPayload,
}

impl Event {
    pub fn now(payload: EventPayload) -> Self {
        Self {
            at: Utc::now(),
            payload,
        }
    }

    pub fn name(&self) -> &'static str {
        self.payload.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::hash_name;

    #[test]
    fn test_event_serialization() {
        let event = Event::now(EventPayload::ConnectionInitiated {
            recipient: hash_name("juice"),
            initiator: hash_name("risenow"),
        });

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "CONNECTION_INITIATED");
        assert_eq!(json["recipient"], hash_name("juice").to_string());
        assert_eq!(json["initiator"], hash_name("risenow").to_string());
        assert!(json["at"].is_string());

        let restored: Event = serde_json::from_value(json).unwrap();
        assert_eq!(restored, event);
    }

    #[test]
    fn test_event_names() {
        let event = Event::now(EventPayload::ParticipantRegistered {
            id: "alice".into(),
            name_hash: hash_name("risenow"),
        });
        assert_eq!(event.name(), "participant_registered");
    }
}
