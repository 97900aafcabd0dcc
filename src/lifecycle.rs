// src/lifecycle.rs

use uuid::Uuid;

use crate::{
    models::{PresenceStatus, ServerEvent},
    router::Relay,
    transport::{ConnectionId, ConnectionSender},
};

impl Relay {
    /// Attaches a freshly accepted connection. It stays anonymous until `set_username`.
    pub fn connect(&mut self, sender: ConnectionSender) -> ConnectionId {
        let conn = Uuid::new_v4();
        self.hub.attach(conn, sender);
        tracing::info!(conn = %conn, connections = self.hub.connection_count(), "client connected");
        conn
    }

    /// Drops the connection and, if it had a name no other connection still holds,
    /// tells everyone it went offline.
    ///
    /// Room membership is kept by name; only the transport groups forget the connection.
    pub fn disconnect(&mut self, conn: ConnectionId) {
        self.hub.detach(conn);
        let Some(name) = self.registry.unregister(conn) else {
            tracing::info!(conn = %conn, "anonymous client disconnected");
            return;
        };
        tracing::info!(conn = %conn, user = %name, rooms = ?self.rooms.rooms_of(&name), "client disconnected");

        self.hub.broadcast(&ServerEvent::UserList(self.online()), None);
        // Another connection still goes by this name, so the name is not offline.
        if self.registry.is_online(&name) {
            return;
        }
        self.hub.broadcast(
            &ServerEvent::Notification {
                text: format!("{name} left the chat."),
            },
            None,
        );
        self.hub.broadcast(
            &ServerEvent::UserStatus {
                username: name,
                status: PresenceStatus::Offline,
            },
            None,
        );
    }
}
