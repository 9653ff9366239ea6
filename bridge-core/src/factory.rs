//! Element factory - builds the right node variant and registers it.

use crate::error::BridgeResult;
use crate::native::{NativeHandle, NativeSurface};
use crate::node::{Attributes, Node, NodeId, NodeKind};
use crate::registry::NodeRegistry;
use crate::widget::WidgetTable;

/// Builds nodes from `createNode` commands.
#[derive(Debug, Clone, Default)]
pub struct ElementFactory {
    widgets: WidgetTable,
}

impl ElementFactory {
    /// Create a factory over a widget table.
    #[must_use]
    pub fn new(widgets: WidgetTable) -> Self {
        Self { widgets }
    }

    /// The widget table consulted for specialized tags.
    #[must_use]
    pub fn widgets(&self) -> &WidgetTable {
        &self.widgets
    }

    /// Create a node and register it under `id`.
    ///
    /// - `id == 0` binds the root container to the surface's root handle;
    ///   `parent` is ignored and `tag` is only kept for bookkeeping.
    /// - Tags with a registered widget constructor become widgets.
    /// - Any other tag becomes a generic element over a fresh native handle.
    ///
    /// If a live node already holds `id` it is replaced and its native handle
    /// released.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Construction`](crate::BridgeError::Construction)
    /// if a widget constructor rejects `attributes`. Nothing is registered in
    /// that case.
    pub fn create<'r, S>(
        &self,
        registry: &'r mut NodeRegistry,
        surface: &mut S,
        id: NodeId,
        tag: &str,
        parent: Option<NodeId>,
        attributes: Attributes,
    ) -> BridgeResult<&'r Node>
    where
        S: NativeSurface + ?Sized,
    {
        let node = if id.is_root() {
            Node {
                id,
                tag: tag.to_string(),
                parent: None,
                handle: surface.root_handle(),
                kind: NodeKind::Root,
                attributes,
            }
        } else if let Some(constructor) = self.widgets.get(tag) {
            let widget = constructor(id, parent, &attributes)?;
            let handle = surface.create_element(widget.native_tag());
            apply_attributes(surface, handle, &attributes);
            Node {
                id,
                tag: tag.to_string(),
                parent,
                handle,
                kind: NodeKind::Widget(widget),
                attributes,
            }
        } else {
            let handle = surface.create_element(tag);
            apply_attributes(surface, handle, &attributes);
            Node {
                id,
                tag: tag.to_string(),
                parent,
                handle,
                kind: NodeKind::Element,
                attributes,
            }
        };

        tracing::debug!(id = %id, tag = %tag, kind = ?node.kind, "Create");

        let handle = node.handle;
        let (node, previous) = registry.insert(node);
        if let Some(old) = previous {
            if old.handle != handle {
                surface.release(old.handle);
            }
        }
        Ok(node)
    }
}

fn apply_attributes<S>(surface: &mut S, handle: NativeHandle, attributes: &Attributes)
where
    S: NativeSurface + ?Sized,
{
    for (name, value) in attributes {
        surface.set_attribute(handle, name, value);
    }
}
