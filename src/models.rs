// src/models.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An event sent from a client to the server.
/// Deserialized from incoming JSON text frames shaped as `{"event": ..., "data": ...}`.
///
/// Every field a client may leave out is optional here; `event::Inbound::try_from`
/// decides which of them are actually required.
#[derive(Deserialize, Debug, Clone)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    SetUsername {
        name: String,
    },
    SendMessage {
        #[serde(default)]
        sender: Option<String>,
        #[serde(default)]
        text: Option<String>,
        #[serde(default)]
        private: bool,
        #[serde(default)]
        receiver: Option<String>,
        #[serde(default)]
        room: Option<String>,
        #[serde(default)]
        content: Option<String>,
        #[serde(default, rename = "fileName")]
        file_name: Option<String>,
    },
    GetHistory {
        target: String,
        #[serde(default)]
        offset: i64,
    },
    Typing {
        #[serde(default)]
        message: Option<String>,
        #[serde(default)]
        receiver: Option<String>,
        #[serde(default)]
        room: Option<String>,
    },
    JoinRoom {
        room: String,
    },
    LeaveRoom {
        room: String,
    },
    SendFile {
        #[serde(default)]
        sender: Option<String>,
        #[serde(default)]
        receiver: Option<String>,
        #[serde(default)]
        room: Option<String>,
        #[serde(default)]
        content: Option<String>,
        #[serde(default, rename = "fileName")]
        file_name: Option<String>,
    },
    SendReaction {
        #[serde(default)]
        sender: Option<String>,
        #[serde(default)]
        receiver: Option<String>,
        #[serde(default)]
        room: Option<String>,
        #[serde(default)]
        reaction: Option<String>,
    },
}

/// The semantic payload of a stored message. Exactly one per message.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(untagged)]
pub enum Payload {
    Text {
        text: String,
    },
    Reaction {
        reaction: String,
    },
    /// Opaque file body (usually a data URL) plus its original name.
    File {
        content: String,
        #[serde(rename = "fileName")]
        file_name: String,
    },
}

/// A message as delivered to clients and kept in history.
/// `id` and `timestamp` are stamped once by the relay and never change.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Message {
    pub id: Uuid,
    pub sender: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
    #[serde(flatten)]
    pub payload: Payload,
    pub timestamp: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PresenceStatus {
    Online,
    Offline,
}

/// An event sent from the server to a client.
/// Serialized into JSON text for sending.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    UserList(Vec<String>),
    Notification {
        text: String,
    },
    UserStatus {
        username: String,
        status: PresenceStatus,
    },
    ReceiveMessage(Message),
    NewMessageNotification {
        from: String,
    },
    DeliveryAck {
        id: Uuid,
    },
    ChatHistory(Vec<Message>),
    Typing {
        text: String,
    },
    ReceiveFile(Message),
    ReceiveReaction(Message),
}
