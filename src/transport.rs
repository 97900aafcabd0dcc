// src/transport.rs

use std::collections::{HashMap, HashSet};

use tokio::sync::mpsc;
use uuid::Uuid;

use crate::models::ServerEvent;

pub type ConnectionId = Uuid;

/// Sender half of a connection's outbound queue. The socket's writer task owns the receiver.
pub type ConnectionSender = mpsc::UnboundedSender<ServerEvent>;

/// Live connections and the named groups they belong to.
///
/// Sending never blocks: events are queued on the connection's channel and the
/// writer task drains them onto the socket. Queues are unbounded, so a client that
/// stops reading keeps accumulating events until its socket closes.
#[derive(Default)]
pub struct Hub {
    connections: HashMap<ConnectionId, ConnectionSender>,
    groups: HashMap<String, HashSet<ConnectionId>>,
}

impl Hub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&mut self, conn: ConnectionId, sender: ConnectionSender) {
        self.connections.insert(conn, sender);
    }

    /// Removes the connection and pulls it out of every group.
    pub fn detach(&mut self, conn: ConnectionId) {
        self.connections.remove(&conn);
        self.groups.retain(|_, members| {
            members.remove(&conn);
            !members.is_empty()
        });
    }

    pub fn is_attached(&self, conn: ConnectionId) -> bool {
        self.connections.contains_key(&conn)
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn join_group(&mut self, group: &str, conn: ConnectionId) -> bool {
        self.groups.entry(group.to_string()).or_default().insert(conn)
    }

    pub fn leave_group(&mut self, group: &str, conn: ConnectionId) -> bool {
        let Some(members) = self.groups.get_mut(group) else {
            return false;
        };
        let removed = members.remove(&conn);
        if members.is_empty() {
            self.groups.remove(group);
        }
        removed
    }

    pub fn group_members(&self, group: &str) -> impl Iterator<Item = ConnectionId> + '_ {
        self.groups.get(group).into_iter().flatten().copied()
    }

    pub fn groups_of(&self, conn: ConnectionId) -> Vec<String> {
        let mut groups: Vec<String> = self
            .groups
            .iter()
            .filter(|(_, members)| members.contains(&conn))
            .map(|(group, _)| group.clone())
            .collect();
        groups.sort();
        groups
    }

    pub fn in_group(&self, group: &str, conn: ConnectionId) -> bool {
        self.groups.get(group).is_some_and(|m| m.contains(&conn))
    }

    pub fn send_to(&self, conn: ConnectionId, event: ServerEvent) {
        if let Some(sender) = self.connections.get(&conn) {
            if sender.send(event).is_err() {
                tracing::debug!(conn = %conn, "outbound queue closed, dropping event");
            }
        }
    }

    pub fn send_to_group(&self, group: &str, event: &ServerEvent, except: Option<ConnectionId>) {
        let Some(members) = self.groups.get(group) else {
            return;
        };
        for conn in members {
            if Some(*conn) != except {
                self.send_to(*conn, event.clone());
            }
        }
    }

    pub fn broadcast(&self, event: &ServerEvent, except: Option<ConnectionId>) {
        for conn in self.connections.keys() {
            if Some(*conn) != except {
                self.send_to(*conn, event.clone());
            }
        }
    }
}
