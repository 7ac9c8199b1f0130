//! Composable item trees: components, slot rules and stat resolution.
//!
//! `sokol-core` models an item as a tree of [`TreeNode`]s, each instantiating
//! an immutable [`Component`]. Slots decide through [`Rule`]s which children
//! they accept, and a build pass merges every node's [`StatLayer`]s into a
//! resolved [`StatMap`]. Systems attach behaviour to components and talk to
//! each other through per-node events. The host supplies content and
//! localisation through [`SokolPlatform`].
pub mod blueprint;
pub mod component;
pub mod error;
pub mod event;
pub mod platform;
pub mod registry;
pub mod rule;
pub mod stat;
pub mod system;
pub mod text;
pub mod tree;
pub use blueprint::Blueprint;
pub use component::{Component, ComponentBuilder, ComponentError, Slot, SlotFlags, SlotTag};
pub use error::{ErrorSeverity, SokolError};
pub use event::{Built, Cancellable, EventDispatcher, TreeChanged};
pub use platform::SokolPlatform;
pub use registry::{Keyed, Registry, RegistryError, is_valid_id};
pub use rule::{Rule, RuleContext, RuleTerm};
pub use stat::{
    Priority, StatError, StatKind, StatLayer, StatLists, StatMap, StatNode, StatOp, StatValue,
    resolve,
};
pub use system::{
    CreateItem, ItemConfig, ItemError, ItemFactory, ItemInstance, ItemModel, ItemStack,
    ItemSystem, SlotInfo, SlotsLoreConfig, SlotsLoreSystem, StatsLoreConfig, StatsLoreSystem,
    System, SystemInstance,
};
pub use text::{Locale, NumberFormat, NumberFormats, Text};
pub use tree::{NodeData, NodePath, NodeRef, Rejected, TreeError, TreeNode};
