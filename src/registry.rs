// src/registry.rs

use std::collections::HashMap;

use crate::transport::ConnectionId;

/// Who is online: connection <-> display name, both directions.
///
/// Names are not reserved. If two connections claim the same name, `resolve`
/// returns whichever registered last.
#[derive(Default)]
pub struct IdentityRegistry {
    names: HashMap<ConnectionId, String>,
    connections: HashMap<String, ConnectionId>,
    // Registration order, for `list_online`.
    order: Vec<ConnectionId>,
}

impl IdentityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `conn` to `name`, replacing whatever `conn` was bound to before.
    /// Returns the name `conn` held previously, if it held a different one.
    pub fn register(&mut self, conn: ConnectionId, name: &str) -> Option<String> {
        let previous = self.names.insert(conn, name.to_string());
        if let Some(previous) = &previous {
            self.release_name(previous, conn);
            self.order.retain(|c| *c != conn);
        }
        self.connections.insert(name.to_string(), conn);
        self.order.push(conn);
        previous.filter(|previous| previous != name)
    }

    /// Drops both directions of the binding and hands back the freed name.
    pub fn unregister(&mut self, conn: ConnectionId) -> Option<String> {
        let name = self.names.remove(&conn)?;
        self.release_name(&name, conn);
        self.order.retain(|c| *c != conn);
        Some(name)
    }

    pub fn resolve(&self, name: &str) -> Option<ConnectionId> {
        self.connections.get(name).copied()
    }

    pub fn name_of(&self, conn: ConnectionId) -> Option<&str> {
        self.names.get(&conn).map(String::as_str)
    }

    pub fn is_online(&self, name: &str) -> bool {
        self.connections.contains_key(name)
    }

    pub fn list_online(&self) -> Vec<String> {
        self.order
            .iter()
            .filter_map(|conn| self.names.get(conn).cloned())
            .collect()
    }

    // Only forget name -> conn if nobody else has claimed the name since.
    fn release_name(&mut self, name: &str, conn: ConnectionId) {
        if self.connections.get(name) == Some(&conn) {
            self.connections.remove(name);
        }
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    #[test]
    fn register_then_unregister() {
        let mut registry = IdentityRegistry::new();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        registry.register(a, "alice");
        registry.register(b, "bob");
        assert_eq!(registry.list_online(), vec!["alice", "bob"]);
        assert_eq!(registry.resolve("bob"), Some(b));

        assert_eq!(registry.unregister(a).as_deref(), Some("alice"));
        assert_eq!(registry.list_online(), vec!["bob"]);
        assert!(!registry.is_online("alice"));
        assert_eq!(registry.unregister(a), None);
    }

    #[test]
    fn renaming_a_connection_frees_the_old_name() {
        let mut registry = IdentityRegistry::new();
        let a = Uuid::new_v4();
        assert_eq!(registry.register(a, "alice"), None);
        assert_eq!(registry.register(a, "alicia").as_deref(), Some("alice"));
        assert_eq!(registry.register(a, "alicia"), None);
        assert_eq!(registry.resolve("alice"), None);
        assert_eq!(registry.resolve("alicia"), Some(a));
        assert_eq!(registry.list_online(), vec!["alicia"]);
    }

    #[test]
    fn duplicate_name_resolves_to_latest_and_survives_first_leaving() {
        let mut registry = IdentityRegistry::new();
        let (first, second) = (Uuid::new_v4(), Uuid::new_v4());
        registry.register(first, "sam");
        registry.register(second, "sam");
        assert_eq!(registry.resolve("sam"), Some(second));
        assert_eq!(registry.list_online(), vec!["sam", "sam"]);

        registry.unregister(first);
        assert_eq!(registry.resolve("sam"), Some(second));
        assert_eq!(registry.name_of(second), Some("sam"));
    }
}
