// src/event.rs

use crate::{error::EventError, models::{ClientEvent, Payload}};

/// Where an event is headed. Private beats room, room beats broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    Private(String),
    Room(String),
    Global,
}

impl Destination {
    fn resolve(receiver: Option<String>, room: Option<String>) -> Self {
        match (present(receiver), present(room)) {
            (Some(receiver), _) => Destination::Private(receiver),
            (None, Some(room)) => Destination::Room(room),
            (None, None) => Destination::Global,
        }
    }
}

/// A client event that passed validation. The relay only ever dispatches these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    SetUsername {
        name: String,
    },
    SendMessage {
        sender: Option<String>,
        destination: Destination,
        payload: Payload,
    },
    GetHistory {
        target: String,
        offset: usize,
    },
    Typing {
        text: String,
        destination: Destination,
    },
    JoinRoom {
        room: String,
    },
    LeaveRoom {
        room: String,
    },
    /// Files and reactions never fall back to broadcast.
    SendFile {
        sender: Option<String>,
        destination: Destination,
        payload: Payload,
    },
    SendReaction {
        sender: Option<String>,
        destination: Destination,
        payload: Payload,
    },
}

impl Inbound {
    /// Decodes and validates one text frame.
    pub fn parse(raw: &str) -> Result<Self, EventError> {
        serde_json::from_str::<ClientEvent>(raw)?.try_into()
    }

    pub fn name(&self) -> &'static str {
        match self {
            Inbound::SetUsername { .. } => "set_username",
            Inbound::SendMessage { .. } => "send_message",
            Inbound::GetHistory { .. } => "get_history",
            Inbound::Typing { .. } => "typing",
            Inbound::JoinRoom { .. } => "join_room",
            Inbound::LeaveRoom { .. } => "leave_room",
            Inbound::SendFile { .. } => "send_file",
            Inbound::SendReaction { .. } => "send_reaction",
        }
    }
}

impl TryFrom<ClientEvent> for Inbound {
    type Error = EventError;

    fn try_from(event: ClientEvent) -> Result<Self, Self::Error> {
        let inbound = match event {
            ClientEvent::SetUsername { name } => Inbound::SetUsername {
                name: required(Some(name), "set_username", "name")?,
            },
            ClientEvent::SendMessage {
                sender,
                text,
                private,
                receiver,
                room,
                content,
                file_name,
            } => {
                let receiver = present(receiver);
                if private && receiver.is_none() {
                    return Err(EventError::MissingField {
                        event: "send_message",
                        field: "receiver",
                    });
                }
                let payload = match (present(text), present(content)) {
                    (Some(_), Some(_)) => return Err(EventError::AmbiguousPayload("send_message")),
                    (Some(text), None) => Payload::Text { text },
                    (None, Some(content)) => Payload::File {
                        content,
                        file_name: required(file_name, "send_message", "fileName")?,
                    },
                    (None, None) => {
                        return Err(EventError::MissingField {
                            event: "send_message",
                            field: "text",
                        });
                    }
                };
                Inbound::SendMessage {
                    sender: present(sender),
                    destination: Destination::resolve(receiver, room),
                    payload,
                }
            }
            ClientEvent::GetHistory { target, offset } => Inbound::GetHistory {
                target: required(Some(target), "get_history", "target")?,
                // Negative offsets are treated as "from the newest".
                offset: usize::try_from(offset).unwrap_or(0),
            },
            ClientEvent::Typing {
                message,
                receiver,
                room,
            } => Inbound::Typing {
                text: required(message, "typing", "message")?,
                destination: Destination::resolve(receiver, room),
            },
            ClientEvent::JoinRoom { room } => Inbound::JoinRoom {
                room: required(Some(room), "join_room", "room")?,
            },
            ClientEvent::LeaveRoom { room } => Inbound::LeaveRoom {
                room: required(Some(room), "leave_room", "room")?,
            },
            ClientEvent::SendFile {
                sender,
                receiver,
                room,
                content,
                file_name,
            } => Inbound::SendFile {
                sender: present(sender),
                destination: addressed(receiver, room, "send_file")?,
                payload: Payload::File {
                    content: required(content, "send_file", "content")?,
                    file_name: required(file_name, "send_file", "fileName")?,
                },
            },
            ClientEvent::SendReaction {
                sender,
                receiver,
                room,
                reaction,
            } => Inbound::SendReaction {
                sender: present(sender),
                destination: addressed(receiver, room, "send_reaction")?,
                payload: Payload::Reaction {
                    reaction: required(reaction, "send_reaction", "reaction")?,
                },
            },
        };
        Ok(inbound)
    }
}

/// Clients send `""` for fields they have no value for.
fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn required(
    value: Option<String>,
    event: &'static str,
    field: &'static str,
) -> Result<String, EventError> {
    present(value).ok_or(EventError::MissingField { event, field })
}

fn addressed(
    receiver: Option<String>,
    room: Option<String>,
    event: &'static str,
) -> Result<Destination, EventError> {
    match Destination::resolve(receiver, room) {
        Destination::Global => Err(EventError::NoDestination(event)),
        destination => Ok(destination),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn receiver_wins_over_room() {
        let inbound = Inbound::parse(
            r#"{"event":"send_message","data":{"sender":"a","text":"hi","private":true,"receiver":"b","room":"R"}}"#,
        )
        .expect("valid");
        assert_eq!(
            inbound,
            Inbound::SendMessage {
                sender: Some("a".into()),
                destination: Destination::Private("b".into()),
                payload: Payload::Text { text: "hi".into() },
            }
        );
    }

    #[test]
    fn blank_fields_fall_back_to_global() {
        let inbound = Inbound::parse(
            r#"{"event":"send_message","data":{"sender":"a","text":"hi","receiver":"","room":" "}}"#,
        )
        .expect("valid");
        assert!(matches!(
            inbound,
            Inbound::SendMessage { destination: Destination::Global, .. }
        ));
    }

    #[test]
    fn send_message_needs_exactly_one_payload() {
        let empty = Inbound::parse(r#"{"event":"send_message","data":{"sender":"a"}}"#);
        assert!(matches!(empty, Err(EventError::MissingField { field: "text", .. })));

        let both = Inbound::parse(
            r#"{"event":"send_message","data":{"text":"hi","content":"data:,x","fileName":"x.txt"}}"#,
        );
        assert!(matches!(both, Err(EventError::AmbiguousPayload("send_message"))));

        let file = Inbound::parse(
            r#"{"event":"send_message","data":{"content":"data:,x","fileName":"x.txt","room":"R"}}"#,
        )
        .expect("file message");
        assert!(matches!(
            file,
            Inbound::SendMessage { payload: Payload::File { .. }, destination: Destination::Room(_), .. }
        ));
    }

    #[test]
    fn private_flag_without_receiver_is_rejected() {
        let result = Inbound::parse(
            r#"{"event":"send_message","data":{"text":"hi","private":true,"receiver":""}}"#,
        );
        assert!(matches!(result, Err(EventError::MissingField { field: "receiver", .. })));
    }

    #[test]
    fn files_and_reactions_need_an_address() {
        let file = Inbound::parse(
            r#"{"event":"send_file","data":{"sender":"a","content":"data:,x","fileName":"x"}}"#,
        );
        assert!(matches!(file, Err(EventError::NoDestination("send_file"))));

        let reaction = Inbound::parse(
            r#"{"event":"send_reaction","data":{"sender":"a","room":"R","reaction":"👍"}}"#,
        )
        .expect("reaction");
        assert_eq!(reaction.name(), "send_reaction");
    }

    #[test]
    fn negative_offset_clamps_to_zero() {
        let inbound =
            Inbound::parse(r#"{"event":"get_history","data":{"target":"global","offset":-4}}"#)
                .expect("valid");
        assert_eq!(
            inbound,
            Inbound::GetHistory { target: "global".into(), offset: 0 }
        );
    }

    #[test]
    fn garbage_is_a_decode_error() {
        assert!(matches!(Inbound::parse("not json"), Err(EventError::Decode(_))));
        assert!(matches!(
            Inbound::parse(r#"{"event":"shout","data":{}}"#),
            Err(EventError::Decode(_))
        ));
        assert!(matches!(
            Inbound::parse(r#"{"event":"set_username","data":{"name":""}}"#),
            Err(EventError::MissingField { event: "set_username", .. })
        ));
    }
}
