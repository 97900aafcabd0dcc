// src/rooms.rs

use std::collections::{BTreeSet, HashMap};

/// Room name -> member names. Rooms appear on first join and vanish when the last member leaves.
#[derive(Default)]
pub struct RoomTable {
    rooms: HashMap<String, BTreeSet<String>>,
}

impl RoomTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` if `name` was already a member.
    pub fn join(&mut self, room: &str, name: &str) -> bool {
        self.rooms
            .entry(room.to_string())
            .or_default()
            .insert(name.to_string())
    }

    pub fn leave(&mut self, room: &str, name: &str) -> bool {
        let Some(members) = self.rooms.get_mut(room) else {
            return false;
        };
        let removed = members.remove(name);
        if members.is_empty() {
            self.rooms.remove(room);
        }
        removed
    }

    pub fn members(&self, room: &str) -> BTreeSet<String> {
        self.rooms.get(room).cloned().unwrap_or_default()
    }

    pub fn is_member(&self, room: &str, name: &str) -> bool {
        self.rooms.get(room).is_some_and(|m| m.contains(name))
    }

    pub fn rooms_of(&self, name: &str) -> Vec<String> {
        let mut rooms: Vec<String> = self
            .rooms
            .iter()
            .filter(|(_, members)| members.contains(name))
            .map(|(room, _)| room.clone())
            .collect();
        rooms.sort();
        rooms
    }
}
