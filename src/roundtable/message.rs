//! Message data model for roundtable conversations.
//!
//! A [`ChatMessage`] is the immutable unit flowing through the engine: agents
//! produce them, the history store records them, and the dispatcher hands them
//! to the host one at a time. Messages are never mutated after creation;
//! corrections are modeled as remove + reinsert on the history store.
//!
//! The [`SerializedMessage`]/[`SerializedHistory`] pair is the durable
//! projection used by [`Orchestrator::export_history`](crate::Orchestrator::export_history)
//! and [`import_history`](crate::Orchestrator::import_history). It intentionally
//! loses the concrete message kind: everything comes back as a canonical
//! [`Text`](ChatMessage::Text) message on import.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Literal tag marking control messages that are purged from history before a
/// new task starts.
pub const CONTROL_TAG: &str = "[SYSTEM]";

/// Represents the possible roles for a message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Role {
    System,
    // a message sent by a human user (or app user)
    User,
    // content generated by an agent in response to prior history
    Assistant,
}

impl Role {
    /// Canonical name used in the serialized projection.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "System",
            Role::User => "User",
            Role::Assistant => "Assistant",
        }
    }

    /// Parse a canonical role name. Anything outside the canonical set
    /// collapses to [`Role::Assistant`]; role fidelity beyond that set is
    /// not guaranteed to round-trip.
    pub fn from_name(name: &str) -> Role {
        match name {
            "System" => Role::System,
            "User" => Role::User,
            _ => Role::Assistant,
        }
    }
}

/// A content-bearing conversational message.
#[derive(Clone, Debug)]
pub struct TextMessage {
    /// Conversation role of the author.
    pub role: Role,
    /// Roster name of the producing agent, or the director for task injections.
    pub from: String,
    /// The message body, including any `[N:<name>]` addressing markers.
    pub content: String,
    /// UTC timestamp recorded when the message was created.
    pub timestamp: DateTime<Utc>,
}

/// A non-content message kind: a reference to media produced by a backend
/// (audio clip, rendered image). Carries no addressable text, so routing
/// predicates never match it.
#[derive(Clone, Debug)]
pub struct MediaMessage {
    /// Roster name of the producing agent.
    pub from: String,
    /// Location of the media payload.
    pub uri: String,
    /// UTC timestamp recorded when the message was created.
    pub timestamp: DateTime<Utc>,
}

/// A message produced by an agent or injected by the caller.
///
/// The addressing-marker check used by the routing graph is only defined for
/// the [`Text`](ChatMessage::Text) variant; every other kind evaluates as
/// not traversable.
///
/// # Examples
///
/// ```
/// use roundtable::{ChatMessage, Role};
///
/// let msg = ChatMessage::text(Role::Assistant, "Alice", "Over to you [N:Bob]");
/// assert_eq!(msg.from(), "Alice");
/// assert!(msg.text_content().unwrap().contains("[N:Bob]"));
/// ```
#[derive(Clone, Debug)]
pub enum ChatMessage {
    Text(TextMessage),
    Media(MediaMessage),
}

impl ChatMessage {
    /// Create a content-bearing message stamped with the current time.
    pub fn text(role: Role, from: impl Into<String>, content: impl Into<String>) -> Self {
        ChatMessage::Text(TextMessage {
            role,
            from: from.into(),
            content: content.into(),
            timestamp: Utc::now(),
        })
    }

    /// Create a media reference message stamped with the current time.
    pub fn media(from: impl Into<String>, uri: impl Into<String>) -> Self {
        ChatMessage::Media(MediaMessage {
            from: from.into(),
            uri: uri.into(),
            timestamp: Utc::now(),
        })
    }

    /// Roster name of the producer.
    pub fn from(&self) -> &str {
        match self {
            ChatMessage::Text(m) => &m.from,
            ChatMessage::Media(m) => &m.from,
        }
    }

    /// Creation timestamp.
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            ChatMessage::Text(m) => m.timestamp,
            ChatMessage::Media(m) => m.timestamp,
        }
    }

    /// The text body, or `None` for non-content kinds.
    pub fn text_content(&self) -> Option<&str> {
        match self {
            ChatMessage::Text(m) => Some(&m.content),
            ChatMessage::Media(_) => None,
        }
    }

    /// Whether this entry is a control message subject to the pre-task purge.
    pub fn is_control_tagged(&self) -> bool {
        self.text_content()
            .map(|c| c.contains(CONTROL_TAG))
            .unwrap_or(false)
    }
}

/// Durable projection of one message.
///
/// The concrete message kind is not preserved: a [`MediaMessage`] exports its
/// URI as content under the `"Media"` role name, and every entry is
/// reconstructed as a canonical [`Text`](ChatMessage::Text) message on import.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SerializedMessage {
    pub content: String,
    pub from: String,
    pub role: String,
    pub timestamp: DateTime<Utc>,
}

impl SerializedMessage {
    pub fn from_message(message: &ChatMessage) -> Self {
        match message {
            ChatMessage::Text(m) => SerializedMessage {
                content: m.content.clone(),
                from: m.from.clone(),
                role: m.role.as_str().to_string(),
                timestamp: m.timestamp,
            },
            ChatMessage::Media(m) => SerializedMessage {
                content: m.uri.clone(),
                from: m.from.clone(),
                role: "Media".to_string(),
                timestamp: m.timestamp,
            },
        }
    }

    /// Reconstruct the canonical in-memory representation.
    pub fn into_message(self) -> ChatMessage {
        ChatMessage::Text(TextMessage {
            role: Role::from_name(&self.role),
            from: self.from,
            content: self.content,
            timestamp: self.timestamp,
        })
    }
}

/// Durable projection of an entire message log.
///
/// # Examples
///
/// ```
/// use roundtable::{ChatMessage, Role, SerializedHistory};
///
/// let history = SerializedHistory::from_messages(&[
///     ChatMessage::text(Role::Assistant, "Alice", "hello"),
/// ]);
/// let json = serde_json::to_string(&history).unwrap();
/// let restored: SerializedHistory = serde_json::from_str(&json).unwrap();
/// assert_eq!(restored.messages.len(), 1);
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SerializedHistory {
    pub messages: Vec<SerializedMessage>,
    pub created_at: DateTime<Utc>,
}

impl SerializedHistory {
    pub fn from_messages(messages: &[ChatMessage]) -> Self {
        SerializedHistory {
            messages: messages.iter().map(SerializedMessage::from_message).collect(),
            created_at: Utc::now(),
        }
    }

    /// Reconstruct the ordered message log.
    pub fn into_messages(self) -> Vec<ChatMessage> {
        self.messages
            .into_iter()
            .map(SerializedMessage::into_message)
            .collect()
    }
}
