//! Nodes - the renderable units mirrored from the logic context.

use serde::{Deserialize, Serialize};

use crate::native::NativeHandle;
use crate::widget::Widget;

/// Initial attributes captured when a node is created.
pub type Attributes = serde_json::Map<String, serde_json::Value>;

/// Stable identifier for a node, assigned by the logic context.
///
/// Identity `0` is reserved for the page's root container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(u32);

impl NodeId {
    /// The page root container.
    pub const ROOT: Self = Self(0);

    /// Create a node ID from its raw value.
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Raw numeric value.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Whether this is the root container identity.
    #[must_use]
    pub const fn is_root(self) -> bool {
        self.0 == 0
    }

    /// Decode a parent identity as sent on the wire, where any negative value
    /// (conventionally `-1`) means "no parent".
    #[must_use]
    pub fn parent_from_wire(raw: i64) -> Option<Self> {
        u32::try_from(raw).ok().map(Self)
    }

    /// Encode an optional parent identity for the wire.
    #[must_use]
    pub fn parent_to_wire(parent: Option<Self>) -> i64 {
        parent.map_or(-1, |p| i64::from(p.0))
    }
}

impl From<u32> for NodeId {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Serde adapter for `Option<NodeId>` encoded as `-1` when absent.
pub mod wire_parent {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::NodeId;

    /// Serialize `None` as `-1`.
    ///
    /// # Errors
    ///
    /// Propagates serializer errors.
    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(parent: &Option<NodeId>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_i64(NodeId::parent_to_wire(*parent))
    }

    /// Deserialize a signed identity, mapping negatives to `None`.
    ///
    /// # Errors
    ///
    /// Fails if the value is not an integer.
    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NodeId>, D::Error> {
        i64::deserialize(d).map(NodeId::parent_from_wire)
    }
}

/// What a node is.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// The page root container, bound to the surface's root handle.
    Root,
    /// A generic pass-through element for any tag without a built-in widget.
    Element,
    /// A built-in widget.
    Widget(Widget),
}

/// A renderable node owned by a [`NodeRegistry`](crate::NodeRegistry).
#[derive(Debug, Clone)]
pub struct Node {
    /// Unique identity within the page.
    pub id: NodeId,
    /// Tag naming the kind of element.
    pub tag: String,
    /// Parent identity. A relation only; the parent does not own this node.
    pub parent: Option<NodeId>,
    /// Native renderable handle this node wraps.
    pub handle: NativeHandle,
    /// Node variant.
    pub kind: NodeKind,
    /// Attributes captured at creation.
    pub attributes: Attributes,
}

impl Node {
    /// Check whether this node is the page root.
    #[must_use]
    pub fn is_root(&self) -> bool {
        matches!(self.kind, NodeKind::Root)
    }

    /// Get the widget, if this node is a built-in widget.
    #[must_use]
    pub fn widget(&self) -> Option<&Widget> {
        match &self.kind {
            NodeKind::Widget(widget) => Some(widget),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parent_wire_mapping() {
        assert_eq!(NodeId::parent_from_wire(-1), None);
        assert_eq!(NodeId::parent_from_wire(7), Some(NodeId::new(7)));
        assert_eq!(NodeId::parent_to_wire(None), -1);
        assert_eq!(NodeId::parent_to_wire(Some(NodeId::ROOT)), 0);
    }

    #[test]
    fn test_node_id_serializes_as_number() {
        let json = serde_json::to_string(&NodeId::new(42)).expect("should serialize");
        assert_eq!(json, "42");
    }
}
