//! Node registry - the page-owned table of live nodes.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::node::{Node, NodeId};

/// Table mapping node identity to the node it names.
///
/// Every entry was created by the [`ElementFactory`](crate::ElementFactory) and
/// has not been removed since. The registry is owned by a single page and only
/// mutated from that page's view context.
#[derive(Debug, Default)]
pub struct NodeRegistry {
    nodes: HashMap<NodeId, Node>,
}

impl NodeRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node under `id`.
    ///
    /// A live entry under the same identity is replaced and returned.
    pub fn register(&mut self, id: NodeId, node: Node) -> Option<Node> {
        let previous = self.nodes.insert(id, node);
        if let Some(old) = &previous {
            tracing::warn!(id = %id, tag = %old.tag, "Replacing live node");
        }
        previous
    }

    /// Insert a node and return it together with any replaced entry.
    pub fn insert(&mut self, node: Node) -> (&Node, Option<Node>) {
        let id = node.id;
        match self.nodes.entry(id) {
            Entry::Occupied(mut entry) => {
                let old = entry.insert(node);
                tracing::warn!(id = %id, tag = %old.tag, "Replacing live node");
                (&*entry.into_mut(), Some(old))
            }
            Entry::Vacant(entry) => (&*entry.insert(node), None),
        }
    }

    /// Get a node by identity.
    ///
    /// `None` means the node was not created yet or was already removed.
    #[must_use]
    pub fn lookup(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Get a mutable reference to a node by identity.
    pub fn lookup_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    /// Remove a node and return it.
    pub fn take(&mut self, id: NodeId) -> Option<Node> {
        let node = self.nodes.remove(&id);
        tracing::debug!(id = %id, size = self.nodes.len(), "Remove");
        node
    }

    /// Remove a node, returning whether an entry existed.
    pub fn remove(&mut self, id: NodeId) -> bool {
        self.take(id).is_some()
    }

    /// Check whether `id` is registered.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Get the number of registered nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Registered identities in ascending order.
    #[must_use]
    pub fn ids(&self) -> Vec<NodeId> {
        let mut ids: Vec<_> = self.nodes.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Drain every node, leaving the registry empty.
    pub fn drain(&mut self) -> impl Iterator<Item = Node> + '_ {
        self.nodes.drain().map(|(_, node)| node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::NativeHandle;
    use crate::node::{Attributes, NodeKind};

    fn node(id: u32, tag: &str) -> Node {
        Node {
            id: NodeId::new(id),
            tag: tag.to_string(),
            parent: Some(NodeId::ROOT),
            handle: NativeHandle::from_raw(u64::from(id)),
            kind: NodeKind::Element,
            attributes: Attributes::new(),
        }
    }

    #[test]
    fn test_register_lookup_remove() {
        let mut registry = NodeRegistry::new();
        assert!(registry.is_empty());

        assert!(registry.register(NodeId::new(1), node(1, "div")).is_none());
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.lookup(NodeId::new(1)).map(|n| n.tag.as_str()),
            Some("div")
        );

        assert!(registry.remove(NodeId::new(1)));
        assert!(registry.lookup(NodeId::new(1)).is_none());
    }

    #[test]
    fn test_remove_twice() {
        let mut registry = NodeRegistry::new();
        registry.register(NodeId::new(1), node(1, "div"));
        registry.register(NodeId::new(2), node(2, "div"));

        assert!(registry.remove(NodeId::new(2)));
        assert!(!registry.remove(NodeId::new(2)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_register_replaces_live_entry() {
        let mut registry = NodeRegistry::new();
        registry.register(NodeId::new(5), node(5, "div"));
        let previous = registry.register(NodeId::new(5), node(5, "span"));

        assert_eq!(previous.map(|n| n.tag), Some("div".to_string()));
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.lookup(NodeId::new(5)).map(|n| n.tag.as_str()),
            Some("span")
        );
    }

    #[test]
    fn test_lookup_missing_is_none() {
        let registry = NodeRegistry::new();
        assert!(registry.lookup(NodeId::new(99)).is_none());
    }

    #[test]
    fn test_ids_sorted() {
        let mut registry = NodeRegistry::new();
        for id in [3, 1, 2] {
            registry.register(NodeId::new(id), node(id, "div"));
        }
        assert_eq!(
            registry.ids(),
            vec![NodeId::new(1), NodeId::new(2), NodeId::new(3)]
        );
    }
}
