//! Runtime component trees.
//!
//! A [`TreeNode`] owns its children by slot key. Navigation upwards goes
//! through a [`NodeRef`] cursor, which borrows the ancestors it was reached
//! through. Every structural change is issued on a node and addressed by a
//! [`NodePath`] relative to it.

mod cursor;
mod node;
mod path;

pub use cursor::NodeRef;
pub use node::TreeNode;
pub use path::NodePath;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{ErrorSeverity, SokolError};

/// Errors raised by structural operations on trees.
#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    #[error("component `{component}` has no slot `{slot}`")]
    NoSlot { component: String, slot: String },

    #[error("no node at path `{0}`")]
    NoNode(NodePath),

    #[error("slot `{slot}` of `{component}` does not accept `{candidate}`")]
    Incompatible {
        component: String,
        slot: String,
        candidate: String,
    },

    #[error("system `{system}` of `{component}` requires system `{dependency}`")]
    MissingDependency {
        component: String,
        system: String,
        dependency: String,
    },

    #[error("unknown component `{0}`")]
    UnknownComponent(String),

    #[error("unknown blueprint `{0}`")]
    UnknownBlueprint(String),

    #[error("component `{component}` has no system `{system}` for saved state")]
    UnknownSystem { component: String, system: String },

    #[error("failed to load state of system `{system}`")]
    SystemLoad {
        system: String,
        #[source]
        source: serde_json::Error,
    },
}

impl SokolError for TreeError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Incompatible { .. } => ErrorSeverity::Recoverable,
            Self::MissingDependency { .. } => ErrorSeverity::Fatal,
            Self::NoSlot { .. }
            | Self::NoNode(_)
            | Self::UnknownComponent(_)
            | Self::UnknownBlueprint(_)
            | Self::UnknownSystem { .. }
            | Self::SystemLoad { .. } => ErrorSeverity::Validation,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::NoSlot { .. } => "TREE_NO_SLOT",
            Self::NoNode(_) => "TREE_NO_NODE",
            Self::Incompatible { .. } => "TREE_INCOMPATIBLE",
            Self::MissingDependency { .. } => "TREE_MISSING_DEPENDENCY",
            Self::UnknownComponent(_) => "TREE_UNKNOWN_COMPONENT",
            Self::UnknownBlueprint(_) => "TREE_UNKNOWN_BLUEPRINT",
            Self::UnknownSystem { .. } => "TREE_UNKNOWN_SYSTEM",
            Self::SystemLoad { .. } => "TREE_SYSTEM_LOAD",
        }
    }
}

/// A refused attach, handing the candidate back to the caller.
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct Rejected {
    pub error: TreeError,
    pub candidate: TreeNode,
}

impl SokolError for Rejected {
    fn severity(&self) -> ErrorSeverity {
        self.error.severity()
    }

    fn error_code(&self) -> &'static str {
        self.error.error_code()
    }
}

/// Serialisable snapshot of a node and its subtree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeData {
    /// Component id.
    pub value: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub slots: BTreeMap<String, NodeData>,
    /// Save payloads by system id.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub systems: BTreeMap<String, serde_json::Value>,
}

impl NodeData {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            slots: BTreeMap::new(),
            systems: BTreeMap::new(),
        }
    }

    pub fn with_slot(mut self, key: impl Into<String>, child: NodeData) -> Self {
        self.slots.insert(key.into(), child);
        self
    }

    pub fn with_system(mut self, id: impl Into<String>, payload: serde_json::Value) -> Self {
        self.systems.insert(id.into(), payload);
        self
    }
}
