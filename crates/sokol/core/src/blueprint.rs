//! Persisted tree templates.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::component::Component;
use crate::registry::{Keyed, Registry};
use crate::tree::{NodeData, TreeError, TreeNode};

/// A named snapshot that expands into a built tree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Blueprint {
    pub id: String,
    pub tree: NodeData,
}

impl Blueprint {
    pub fn new(id: impl Into<String>, tree: NodeData) -> Self {
        Self {
            id: id.into(),
            tree,
        }
    }

    /// Expands the snapshot against `components` and builds the result.
    pub fn build(&self, components: &Registry<Component>) -> Result<TreeNode, TreeError> {
        let mut root = TreeNode::from_data(&self.tree, components)?;
        root.build();
        debug!(target: "sokol::blueprint", id = self.id.as_str(), "built blueprint");
        Ok(root)
    }
}

impl Keyed for Blueprint {
    fn id(&self) -> &str {
        &self.id
    }
}
