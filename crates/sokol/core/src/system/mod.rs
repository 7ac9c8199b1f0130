//! Behaviours attached to components.
//!
//! A [`System`] is a shared, immutable template stored on a
//! [`Component`](crate::component::Component). Every node instantiating the
//! component gets its own [`SystemInstance`], which can:
//!
//! - register listeners on the node's [`EventDispatcher`]
//! - contribute extra stat layers during a build pass
//! - look up sibling instances through the node
//! - persist a payload into the node's snapshot
//!
//! Instances are never handed a stored back-reference to their node; every
//! callback receives a [`NodeRef`] for the duration of the call.

pub mod item;
pub mod slots_lore;
pub mod stats_lore;

pub use item::{CreateItem, ItemConfig, ItemError, ItemFactory, ItemInstance, ItemModel, ItemStack, ItemSystem};
pub use slots_lore::{SlotInfo, SlotsLoreConfig, SlotsLoreSystem};
pub use stats_lore::{StatsLoreConfig, StatsLoreSystem};

use std::any::Any;
use std::fmt;

use crate::event::EventDispatcher;
use crate::stat::StatLayer;
use crate::tree::NodeRef;

/// Template of a behaviour, shared by every node of a component.
pub trait System: fmt::Debug + Send + Sync {
    fn id(&self) -> &str;

    /// Ids of sibling systems this system cannot work without.
    ///
    /// A node whose component lacks one of them fails to instantiate.
    fn dependencies(&self) -> &[&str] {
        &[]
    }

    /// Creates a fresh instance for a new node.
    fn instantiate(&self) -> Box<dyn SystemInstance>;

    /// Restores an instance from the payload its [`SystemInstance::save`]
    /// produced. Systems without state ignore the payload.
    fn load(&self, payload: &serde_json::Value) -> Result<Box<dyn SystemInstance>, serde_json::Error> {
        let _ = payload;
        Ok(self.instantiate())
    }
}

/// Per-node state of a [`System`].
pub trait SystemInstance: fmt::Debug + Send + Sync + Any {
    fn system_id(&self) -> &str;

    /// Registers this instance's listeners on its node's dispatcher.
    fn register(&self, events: &mut EventDispatcher) {
        let _ = events;
    }

    /// Extra stat layers contributed during a build pass.
    ///
    /// Layers are gated and ordered exactly like the component's own layers.
    fn build_stats(&self, node: &NodeRef<'_>) -> Vec<StatLayer> {
        let _ = node;
        Vec::new()
    }

    /// Payload stored in the node snapshot; `None` keeps nothing.
    fn save(&self) -> Option<serde_json::Value> {
        None
    }

    /// Independent instance with the same state, for a copied node.
    fn copy(&self) -> Box<dyn SystemInstance>;

    fn as_any(&self) -> &dyn Any;
}
