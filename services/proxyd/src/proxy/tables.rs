//! Alias and mapping tables.
//!
//! Plain maps with snapshot-style list accessors. Locking lives in the
//! engine: both tables sit inside the shared proxy state and are only
//! touched under its lock, so nothing here needs interior mutability.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A forwarding rule binding one listen address to one forward address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mapping {
    /// Address the proxy accepts connections on ("host:port").
    pub listen_addr: String,
    /// Destination address ("host:port"; the host may be an alias name).
    pub forward_addr: String,
}

/// A named indirection from a host token to an IP literal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alias {
    /// Alias name (bare hostname, no port).
    pub name: String,
    /// IP literal the name stands for.
    pub ip: String,
}

/// Table of host aliases.
#[derive(Debug, Default)]
pub struct AliasTable {
    entries: HashMap<String, String>,
}

impl AliasTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Insert or overwrite an alias. Returns true when an existing entry
    /// was replaced.
    pub fn upsert(&mut self, name: &str, ip: &str) -> bool {
        self.entries
            .insert(name.to_string(), ip.to_string())
            .is_some()
    }

    /// Remove an alias, returning its IP if it existed.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.entries.remove(name)
    }

    /// Look up the IP for an alias name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    /// Snapshot of all aliases, sorted by name for stable output.
    pub fn list(&self) -> Vec<Alias> {
        let mut items: Vec<Alias> = self
            .entries
            .iter()
            .map(|(name, ip)| Alias {
                name: name.clone(),
                ip: ip.clone(),
            })
            .collect();
        items.sort_by(|a, b| a.name.cmp(&b.name));
        items
    }

    /// Number of aliases.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Table of forwarding rules keyed by listen address.
#[derive(Debug, Default)]
pub struct MappingStore {
    entries: HashMap<String, Mapping>,
}

impl MappingStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Check whether a mapping exists for the listen address.
    pub fn contains(&self, listen_addr: &str) -> bool {
        self.entries.contains_key(listen_addr)
    }

    /// Insert a mapping. The caller checks `contains` first; inserting over
    /// an existing entry would orphan its listener.
    pub fn insert(&mut self, mapping: Mapping) {
        self.entries.insert(mapping.listen_addr.clone(), mapping);
    }

    /// Replace the forward address of an existing mapping. Returns false
    /// when no mapping exists for the listen address. The listener is not
    /// touched; new connections pick up the address on their next accept.
    pub fn update_forward(&mut self, listen_addr: &str, forward_addr: &str) -> bool {
        match self.entries.get_mut(listen_addr) {
            Some(mapping) => {
                mapping.forward_addr = forward_addr.to_string();
                true
            }
            None => false,
        }
    }

    /// Remove a mapping, returning it if it existed.
    pub fn remove(&mut self, listen_addr: &str) -> Option<Mapping> {
        self.entries.remove(listen_addr)
    }

    /// Current forward address for a listen address, cloned so the caller
    /// can drop the lock before resolving it.
    pub fn forward_addr(&self, listen_addr: &str) -> Option<String> {
        self.entries
            .get(listen_addr)
            .map(|m| m.forward_addr.clone())
    }

    /// Snapshot of all mappings, sorted by listen address for stable output.
    pub fn list(&self) -> Vec<Mapping> {
        let mut items: Vec<Mapping> = self.entries.values().cloned().collect();
        items.sort_by(|a, b| a.listen_addr.cmp(&b.listen_addr));
        items
    }

    /// Remove every mapping.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of mappings.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_mapping(listen: &str, forward: &str) -> Mapping {
        Mapping {
            listen_addr: listen.to_string(),
            forward_addr: forward.to_string(),
        }
    }

    #[test]
    fn test_alias_upsert_overwrites() {
        let mut table = AliasTable::new();

        assert!(!table.upsert("backend", "10.0.0.1"));
        assert_eq!(table.get("backend"), Some("10.0.0.1"));

        // Second upsert replaces the IP
        assert!(table.upsert("backend", "10.0.0.2"));
        assert_eq!(table.get("backend"), Some("10.0.0.2"));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_alias_remove() {
        let mut table = AliasTable::new();
        table.upsert("backend", "10.0.0.1");

        assert_eq!(table.remove("backend"), Some("10.0.0.1".to_string()));
        assert_eq!(table.remove("backend"), None);
        assert!(table.is_empty());
    }

    #[test]
    fn test_alias_list_sorted() {
        let mut table = AliasTable::new();
        table.upsert("zeta", "10.0.0.2");
        table.upsert("alpha", "10.0.0.1");

        let items = table.list();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].name, "alpha");
        assert_eq!(items[1].name, "zeta");
    }

    #[test]
    fn test_mapping_insert_and_contains() {
        let mut store = MappingStore::new();
        assert!(!store.contains("127.0.0.1:9000"));

        store.insert(make_mapping("127.0.0.1:9000", "127.0.0.1:9001"));
        assert!(store.contains("127.0.0.1:9000"));
        assert_eq!(
            store.forward_addr("127.0.0.1:9000"),
            Some("127.0.0.1:9001".to_string())
        );
    }

    #[test]
    fn test_mapping_update_forward() {
        let mut store = MappingStore::new();
        store.insert(make_mapping("127.0.0.1:9000", "127.0.0.1:9001"));

        assert!(store.update_forward("127.0.0.1:9000", "127.0.0.1:9002"));
        assert_eq!(
            store.forward_addr("127.0.0.1:9000"),
            Some("127.0.0.1:9002".to_string())
        );

        assert!(!store.update_forward("127.0.0.1:9999", "127.0.0.1:9002"));
    }

    #[test]
    fn test_mapping_remove() {
        let mut store = MappingStore::new();
        store.insert(make_mapping("127.0.0.1:9000", "127.0.0.1:9001"));

        let removed = store.remove("127.0.0.1:9000").unwrap();
        assert_eq!(removed.forward_addr, "127.0.0.1:9001");
        assert!(store.remove("127.0.0.1:9000").is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_mapping_list_sorted() {
        let mut store = MappingStore::new();
        store.insert(make_mapping("127.0.0.1:9002", "b:1"));
        store.insert(make_mapping("127.0.0.1:9001", "a:1"));

        let items = store.list();
        assert_eq!(items[0].listen_addr, "127.0.0.1:9001");
        assert_eq!(items[1].listen_addr, "127.0.0.1:9002");
    }
}
