// ================
// common/src/lib.rs
// ================
//! Common types shared between the chat room engine and its HTTP surface.
//! Defines the participant/message wire shapes and the visibility predicate
//! that decides which messages a given reader may see.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The literal `to` target that addresses the whole room.
pub const BROADCAST_TARGET: &str = "Todos";

/// Message kind, a closed set.
///
/// `Status` is reserved for system-generated join/leave events; client
/// request bodies deserialize into [`ClientMessageKind`], which has no
/// status variant, so clients cannot forge one.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    #[serde(rename = "broadcast_message")]
    Broadcast,
    #[serde(rename = "private_message")]
    Private,
    #[serde(rename = "status")]
    Status,
}

/// Message kinds a client is allowed to send.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientMessageKind {
    #[serde(rename = "broadcast_message")]
    Broadcast,
    #[serde(rename = "private_message")]
    Private,
}

impl From<ClientMessageKind> for MessageKind {
    fn from(kind: ClientMessageKind) -> Self {
        match kind {
            ClientMessageKind::Broadcast => MessageKind::Broadcast,
            ClientMessageKind::Private => MessageKind::Private,
        }
    }
}

/// A single chat event, immutable once appended to the store.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Message {
    /// Store-assigned identifier
    pub id: Uuid,
    /// Author, or the joining/leaving participant for status events
    pub from: String,
    /// Recipient name, or [`BROADCAST_TARGET`]
    pub to: String,
    /// Message body
    pub text: String,
    /// Message kind
    #[serde(rename = "type")]
    pub kind: MessageKind,
    /// Creation time, displayed with second precision
    #[serde(with = "clock_time")]
    pub time: DateTime<Utc>,
}

impl Message {
    /// Create a message stamped with a fresh id and the current time.
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        text: impl Into<String>,
        kind: MessageKind,
    ) -> Self {
        Message {
            id: Uuid::new_v4(),
            from: from.into(),
            to: to.into(),
            text: text.into(),
            kind,
            time: Utc::now(),
        }
    }

    /// Create a system-generated status broadcast ("joined" / "left").
    pub fn status(participant: impl Into<String>, text: impl Into<String>) -> Self {
        Message::new(participant, BROADCAST_TARGET, text, MessageKind::Status)
    }

    /// Whether `reader` may see this message.
    ///
    /// Broadcasts and status events are visible to everyone; a private
    /// message only to its author and its named recipient. Evaluated per
    /// message at read time, never cached.
    pub fn visible_to(&self, reader: &str) -> bool {
        match self.kind {
            MessageKind::Broadcast | MessageKind::Status => true,
            MessageKind::Private => self.to == reader || self.from == reader,
        }
    }
}

/// A named entity currently present in the room.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub name: String,
    /// Refreshed on every heartbeat; drives eviction
    #[serde(rename = "lastStatus", with = "chrono::serde::ts_milliseconds")]
    pub last_heartbeat: DateTime<Utc>,
}

/// Body of a join request.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct NewParticipant {
    pub name: String,
}

/// Body of a send-message request. The author comes from the `User` header.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct NewMessage {
    pub to: String,
    pub text: String,
    #[serde(rename = "type")]
    pub kind: ClientMessageKind,
}

/// Serialize timestamps as wall-clock `HH:MM:SS` strings.
mod clock_time {
    use chrono::{DateTime, NaiveTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M:%S";

    pub fn serialize<S>(time: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        let parsed = NaiveTime::parse_from_str(&raw, FORMAT).map_err(serde::de::Error::custom)?;
        // the wire format carries no date; pin to today
        Ok(Utc::now().date_naive().and_time(parsed).and_utc())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn broadcast(from: &str, text: &str) -> Message {
        Message::new(from, BROADCAST_TARGET, text, MessageKind::Broadcast)
    }

    fn private(from: &str, to: &str, text: &str) -> Message {
        Message::new(from, to, text, MessageKind::Private)
    }

    #[test]
    fn broadcasts_are_visible_to_everyone() {
        let msg = broadcast("Alice", "hi all");
        for reader in ["Alice", "Bob", "Carol", "someone-else"] {
            assert!(msg.visible_to(reader));
        }
    }

    #[test]
    fn status_events_are_visible_to_everyone() {
        let msg = Message::status("Alice", "joined");
        assert!(msg.visible_to("Bob"));
        assert!(msg.visible_to("Alice"));
    }

    #[test]
    fn private_messages_are_visible_to_author_and_recipient_only() {
        let msg = private("Alice", "Bob", "secret");
        assert!(msg.visible_to("Alice"));
        assert!(msg.visible_to("Bob"));
        assert!(!msg.visible_to("Carol"));
        assert!(!msg.visible_to(""));
    }

    #[test]
    fn visibility_is_case_sensitive() {
        let msg = private("Alice", "Bob", "secret");
        assert!(!msg.visible_to("alice"));
        assert!(!msg.visible_to("BOB"));
    }

    #[test]
    fn message_time_serializes_with_second_precision() {
        let msg = broadcast("Alice", "hi");
        let json = serde_json::to_value(&msg).unwrap();
        let time = json["time"].as_str().unwrap();
        assert_eq!(time.len(), 8, "expected HH:MM:SS, got {time}");
        assert_eq!(time.as_bytes()[2], b':');
        assert_eq!(time.as_bytes()[5], b':');
    }

    #[test]
    fn message_kind_uses_wire_names() {
        let json = serde_json::to_value(&broadcast("Alice", "hi")).unwrap();
        assert_eq!(json["type"], "broadcast_message");
        let json = serde_json::to_value(&private("Alice", "Bob", "x")).unwrap();
        assert_eq!(json["type"], "private_message");
        let json = serde_json::to_value(&Message::status("Alice", "joined")).unwrap();
        assert_eq!(json["type"], "status");
    }

    #[test]
    fn client_kind_rejects_status() {
        let err = serde_json::from_str::<ClientMessageKind>("\"status\"");
        assert!(err.is_err());
    }
}
