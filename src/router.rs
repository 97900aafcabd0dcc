// src/router.rs

use std::collections::BTreeSet;

use chrono::Utc;
use uuid::Uuid;

use crate::{
    config::{HistorySettings, PrivateKeyMode},
    error::EventError,
    event::{Destination, Inbound},
    history::{HistoryStore, MemoryHistory, GLOBAL_TARGET},
    models::{Message, Payload, PresenceStatus, ServerEvent},
    registry::IdentityRegistry,
    rooms::RoomTable,
    transport::{ConnectionId, Hub},
};

/// All relay state in one place: who is connected, who they are, which rooms
/// they are in, and what has been said.
///
/// Every method runs to completion without awaiting, so holding the relay behind a
/// single lock gives a total order over routing decisions.
pub struct Relay {
    pub(crate) hub: Hub,
    pub(crate) registry: IdentityRegistry,
    pub(crate) rooms: RoomTable,
    history: Box<dyn HistoryStore>,
    page_size: usize,
    private_key: PrivateKeyMode,
}

impl Relay {
    pub fn new(history: Box<dyn HistoryStore>, page_size: usize, private_key: PrivateKeyMode) -> Self {
        Self {
            hub: Hub::new(),
            registry: IdentityRegistry::new(),
            rooms: RoomTable::new(),
            history,
            page_size,
            private_key,
        }
    }

    /// An in-memory relay configured from `[history]` settings.
    pub fn from_settings(settings: &HistorySettings) -> Self {
        let history = MemoryHistory::new(settings.capacity)
            .with_binary_payloads(settings.persist_attachments);
        Self::new(Box::new(history), settings.page_size, settings.private_key)
    }

    pub fn online(&self) -> Vec<String> {
        self.registry.list_online()
    }

    pub fn room_members(&self, room: &str) -> BTreeSet<String> {
        self.rooms.members(room)
    }

    pub fn history_page(&self, target: &str, offset: usize) -> Vec<Message> {
        self.history.page(target, offset, self.page_size)
    }

    /// Routes one validated event from `conn`.
    ///
    /// An `Err` means the event was dropped without any emission; the relay state is untouched.
    pub fn dispatch(&mut self, conn: ConnectionId, event: Inbound) -> Result<(), EventError> {
        match event {
            Inbound::SetUsername { name } => self.set_username(conn, name),
            Inbound::SendMessage {
                sender,
                destination,
                payload,
            } => {
                let sender = self.sender_name(conn, sender, "send_message")?;
                self.send_message(conn, sender, destination, payload);
            }
            Inbound::GetHistory { target, offset } => {
                let page = self.history_page(&target, offset);
                tracing::debug!(conn = %conn, %target, offset, returned = page.len(), "history page");
                self.hub.send_to(conn, ServerEvent::ChatHistory(page));
            }
            Inbound::Typing { text, destination } => self.typing(conn, text, destination),
            Inbound::JoinRoom { room } => self.join_room(conn, room)?,
            Inbound::LeaveRoom { room } => self.leave_room(conn, room)?,
            Inbound::SendFile {
                sender,
                destination,
                payload,
            } => {
                let sender = self.sender_name(conn, sender, "send_file")?;
                let message = self.stamp(sender, &destination, payload);
                self.send_attachment(conn, destination, message, ServerEvent::ReceiveFile)?;
            }
            Inbound::SendReaction {
                sender,
                destination,
                payload,
            } => {
                let sender = self.sender_name(conn, sender, "send_reaction")?;
                let message = self.stamp(sender, &destination, payload);
                self.send_attachment(conn, destination, message, ServerEvent::ReceiveReaction)?;
            }
        }
        Ok(())
    }

    fn set_username(&mut self, conn: ConnectionId, name: String) {
        let previous = self.registry.register(conn, &name);
        tracing::info!(conn = %conn, user = %name, previous = ?previous, "username set");

        // A rename carries this connection's rooms over to the new name.
        if let Some(previous) = &previous {
            for room in self.hub.groups_of(conn) {
                self.rooms.join(&room, &name);
                if !self.name_still_in_group(&room, previous, conn) {
                    self.rooms.leave(&room, previous);
                }
            }
        }

        self.hub.broadcast(&ServerEvent::UserList(self.online()), None);
        self.hub.broadcast(
            &ServerEvent::Notification {
                text: format!("{name} joined the chat."),
            },
            Some(conn),
        );
        self.hub.broadcast(
            &ServerEvent::UserStatus {
                username: name,
                status: PresenceStatus::Online,
            },
            None,
        );

        if let Some(previous) = previous.filter(|p| !self.registry.is_online(p)) {
            self.hub.broadcast(
                &ServerEvent::UserStatus {
                    username: previous,
                    status: PresenceStatus::Offline,
                },
                None,
            );
        }
    }

    fn send_message(
        &mut self,
        conn: ConnectionId,
        sender: String,
        destination: Destination,
        payload: Payload,
    ) {
        let message = self.stamp(sender, &destination, payload);
        let target = self.target_key(&message.sender, &destination);
        let id = message.id;
        self.history.append(&target, message.clone());
        tracing::debug!(conn = %conn, %target, %id, "message accepted");

        let from = message.sender.clone();
        let delivery = ServerEvent::ReceiveMessage(message);
        match &destination {
            Destination::Private(receiver) => {
                // An offline receiver is fine, they can pull it from history later.
                if let Some(to) = self.registry.resolve(receiver).filter(|to| *to != conn) {
                    self.hub.send_to(to, delivery.clone());
                    self.hub
                        .send_to(to, ServerEvent::NewMessageNotification { from });
                }
                self.hub.send_to(conn, delivery);
            }
            Destination::Room(room) => {
                self.hub.send_to_group(room, &delivery, None);
                self.hub.send_to_group(
                    room,
                    &ServerEvent::NewMessageNotification { from },
                    Some(conn),
                );
            }
            Destination::Global => self.hub.broadcast(&delivery, None),
        }
        self.hub.send_to(conn, ServerEvent::DeliveryAck { id });
    }

    fn typing(&self, conn: ConnectionId, text: String, destination: Destination) {
        let event = ServerEvent::Typing { text };
        match destination {
            Destination::Private(receiver) => {
                if let Some(to) = self.registry.resolve(&receiver).filter(|to| *to != conn) {
                    self.hub.send_to(to, event);
                }
            }
            Destination::Room(room) => self.hub.send_to_group(&room, &event, Some(conn)),
            Destination::Global => self.hub.broadcast(&event, Some(conn)),
        }
    }

    fn join_room(&mut self, conn: ConnectionId, room: String) -> Result<(), EventError> {
        let name = self
            .registry
            .name_of(conn)
            .ok_or(EventError::Anonymous("join_room"))?
            .to_string();
        self.hub.join_group(&room, conn);
        if !self.rooms.join(&room, &name) {
            tracing::debug!(user = %name, %room, "already a member");
        }
        tracing::info!(conn = %conn, user = %name, %room, "joined room");

        self.hub.send_to_group(
            &room,
            &ServerEvent::Notification {
                text: format!("{name} joined room {room}"),
            },
            None,
        );
        Ok(())
    }

    fn leave_room(&mut self, conn: ConnectionId, room: String) -> Result<(), EventError> {
        let name = self
            .registry
            .name_of(conn)
            .ok_or(EventError::Anonymous("leave_room"))?
            .to_string();
        let was_in_group = self.hub.leave_group(&room, conn);
        // Another connection under the same name keeps the name in the room.
        let was_member =
            !self.name_still_in_group(&room, &name, conn) && self.rooms.leave(&room, &name);
        if !(was_in_group || was_member) {
            return Ok(());
        }
        tracing::info!(conn = %conn, user = %name, %room, "left room");

        self.hub.send_to_group(
            &room,
            &ServerEvent::Notification {
                text: format!("{name} left room {room}"),
            },
            None,
        );
        Ok(())
    }

    fn send_attachment(
        &mut self,
        conn: ConnectionId,
        destination: Destination,
        message: Message,
        wrap: fn(Message) -> ServerEvent,
    ) -> Result<(), EventError> {
        if destination == Destination::Global {
            return Err(EventError::NoDestination(match message.payload {
                Payload::Reaction { .. } => "send_reaction",
                _ => "send_file",
            }));
        }
        if self.history.supports_binary_payload() {
            let target = self.target_key(&message.sender, &destination);
            self.history.append(&target, message.clone());
        }

        match destination {
            Destination::Private(receiver) => {
                if let Some(to) = self.registry.resolve(&receiver).filter(|to| *to != conn) {
                    self.hub.send_to(to, wrap(message));
                }
            }
            Destination::Room(room) => self.hub.send_to_group(&room, &wrap(message), None),
            Destination::Global => {}
        }
        Ok(())
    }

    /// Whether a connection other than `conn` that goes by `name` is still in the room's group.
    fn name_still_in_group(&self, room: &str, name: &str, conn: ConnectionId) -> bool {
        self.hub
            .group_members(room)
            .any(|other| other != conn && self.registry.name_of(other) == Some(name))
    }

    fn sender_name(
        &self,
        conn: ConnectionId,
        claimed: Option<String>,
        event: &'static str,
    ) -> Result<String, EventError> {
        claimed
            .or_else(|| self.registry.name_of(conn).map(str::to_string))
            .ok_or(EventError::Anonymous(event))
    }

    fn stamp(&self, sender: String, destination: &Destination, payload: Payload) -> Message {
        let (receiver, room) = match destination {
            Destination::Private(receiver) => (Some(receiver.clone()), None),
            Destination::Room(room) => (None, Some(room.clone())),
            Destination::Global => (None, None),
        };
        Message {
            id: Uuid::new_v4(),
            sender,
            receiver,
            room,
            payload,
            timestamp: Utc::now(),
        }
    }

    fn target_key(&self, sender: &str, destination: &Destination) -> String {
        match destination {
            Destination::Private(receiver) => self.private_key.key(sender, receiver),
            Destination::Room(room) => room.clone(),
            Destination::Global => GLOBAL_TARGET.to_string(),
        }
    }
}
