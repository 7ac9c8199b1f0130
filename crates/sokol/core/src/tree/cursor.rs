use std::any::Any;
use std::fmt;
use std::sync::Arc;

use super::{NodePath, TreeNode};
use crate::component::Component;
use crate::stat::StatMap;
use crate::system::SystemInstance;

/// Read-only cursor over a node and the chain of ancestors it was reached
/// through.
///
/// Nodes own their children and hold no pointer to their parent; a cursor is
/// how a node knows where it sits. Ancestry is relative to the node the cursor
/// was created from, so a detached subtree sees itself as the root.
#[derive(Clone)]
pub struct NodeRef<'a> {
    node: &'a TreeNode,
    /// Each ancestor with the slot key taken out of it, root first.
    lineage: Vec<(&'a TreeNode, &'a str)>,
}

impl<'a> NodeRef<'a> {
    pub(super) fn root_of(node: &'a TreeNode) -> Self {
        Self {
            node,
            lineage: Vec::new(),
        }
    }

    pub fn node(&self) -> &'a TreeNode {
        self.node
    }

    pub fn value(&self) -> &'a Arc<Component> {
        &self.node.value
    }

    pub fn stats(&self) -> &'a StatMap {
        &self.node.stats
    }

    pub fn is_root(&self) -> bool {
        self.lineage.is_empty()
    }

    /// Slot key this node occupies in its parent.
    pub fn key(&self) -> Option<&'a str> {
        self.lineage.last().map(|(_, key)| *key)
    }

    pub fn parent(&self) -> Option<NodeRef<'a>> {
        let (&(node, _), rest) = self.lineage.split_last()?;
        Some(Self {
            node,
            lineage: rest.to_vec(),
        })
    }

    pub fn root(&self) -> NodeRef<'a> {
        let node = self.lineage.first().map_or(self.node, |(node, _)| *node);
        Self::root_of(node)
    }

    /// Path from the root to this node.
    pub fn path(&self) -> NodePath {
        self.lineage.iter().map(|(_, key)| *key).collect()
    }

    pub fn child(&self, key: &str) -> Option<NodeRef<'a>> {
        let (key, child) = self.node.children.get_key_value(key)?;
        let mut lineage = self.lineage.clone();
        lineage.push((self.node, key.as_str()));
        Some(Self {
            node: child,
            lineage,
        })
    }

    /// Descendant at `path`, relative to this node.
    pub fn node_at(&self, path: &NodePath) -> Option<NodeRef<'a>> {
        path.iter()
            .try_fold(self.clone(), |cursor, key| cursor.child(key))
    }

    /// Filled children, in slot declaration order.
    pub fn children(&self) -> impl Iterator<Item = NodeRef<'a>> + '_ {
        self.node
            .value
            .slots()
            .iter()
            .filter_map(|slot| self.child(slot.key()))
    }

    /// This node's instance of system type `T`.
    pub fn system<T: SystemInstance>(&self) -> Option<&'a T> {
        self.node.system::<T>()
    }

    /// Dispatches `event` to this node's listeners.
    pub fn call<E: Any>(&self, event: &mut E) {
        self.node.events.call(self, event);
    }

    /// Visits this node and every descendant, pre-order, children in slot
    /// declaration order.
    pub fn visit(&self, f: &mut impl FnMut(&NodeRef<'a>)) {
        f(self);
        for child in self.children() {
            child.visit(f);
        }
    }
}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("path", &self.path().to_string())
            .field("component", &self.node.value.id())
            .finish()
    }
}
