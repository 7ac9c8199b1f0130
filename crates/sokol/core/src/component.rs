//! Immutable component templates and their slots.
//!
//! A [`Component`] is created once at load time and shared by `Arc` across
//! every [`TreeNode`](crate::tree::TreeNode) that instantiates it. Nothing on
//! it can change after [`ComponentBuilder::build`].

use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;
use std::sync::Arc;

use crate::error::{ErrorSeverity, SokolError};
use crate::registry::{Keyed, is_valid_id};
use crate::rule::{Rule, RuleContext};
use crate::stat::{StatLayer, StatLists};
use crate::system::System;
use crate::tree::{NodeRef, TreeNode};

bitflags::bitflags! {
    /// Behavioural flags derived from a slot's tags.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct SlotFlags: u8 {
        /// The tree is incomplete while this slot is empty.
        const REQUIRED = 1 << 0;
        /// Hidden from displays unless every non-internal sibling is empty.
        const INTERNAL = 1 << 1;
        /// Players may change the slot's content in the field.
        const MODIFIABLE = 1 << 2;
    }
}

/// Tags with built-in meaning on a slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::EnumString, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum SlotTag {
    Required,
    Internal,
    Modifiable,
}

impl SlotTag {
    pub const fn flag(self) -> SlotFlags {
        match self {
            Self::Required => SlotFlags::REQUIRED,
            Self::Internal => SlotFlags::INTERNAL,
            Self::Modifiable => SlotFlags::MODIFIABLE,
        }
    }
}

/// Errors raised while constructing a component.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ComponentError {
    #[error("invalid component id `{0}`")]
    InvalidId(String),

    #[error("invalid slot key `{key}`")]
    InvalidSlotKey { key: String },

    #[error("component `{component}` declares slot `{key}` twice")]
    DuplicateSlot { component: String, key: String },

    #[error("invalid system id `{id}` on component `{component}`")]
    InvalidSystemId { component: String, id: String },

    #[error("component `{component}` declares system `{id}` twice")]
    DuplicateSystem { component: String, id: String },
}

impl SokolError for ComponentError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidId(_) => "COMPONENT_INVALID_ID",
            Self::InvalidSlotKey { .. } => "COMPONENT_INVALID_SLOT_KEY",
            Self::DuplicateSlot { .. } => "COMPONENT_DUPLICATE_SLOT",
            Self::InvalidSystemId { .. } => "COMPONENT_INVALID_SYSTEM_ID",
            Self::DuplicateSystem { .. } => "COMPONENT_DUPLICATE_SYSTEM",
        }
    }
}

/// A named attachment point on a component.
#[derive(Clone, Debug)]
pub struct Slot {
    key: String,
    tags: BTreeSet<String>,
    flags: SlotFlags,
    rule: Rule,
}

impl Slot {
    /// Creates an untagged slot that accepts any child.
    pub fn new(key: impl Into<String>) -> Result<Self, ComponentError> {
        let key = key.into();
        if !is_valid_id(&key) {
            return Err(ComponentError::InvalidSlotKey { key });
        }
        Ok(Self {
            key,
            tags: BTreeSet::new(),
            flags: SlotFlags::empty(),
            rule: Rule::always(),
        })
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        let tag = tag.into();
        if let Ok(known) = SlotTag::from_str(&tag) {
            self.flags |= known.flag();
        }
        self.tags.insert(tag);
        self
    }

    pub fn with_tags<S: Into<String>>(self, tags: impl IntoIterator<Item = S>) -> Self {
        tags.into_iter().fold(self, Slot::with_tag)
    }

    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rule = rule;
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    pub fn flags(&self) -> SlotFlags {
        self.flags
    }

    pub fn rule(&self) -> &Rule {
        &self.rule
    }

    pub fn required(&self) -> bool {
        self.flags.contains(SlotFlags::REQUIRED)
    }

    pub fn internal(&self) -> bool {
        self.flags.contains(SlotFlags::INTERNAL)
    }

    pub fn modifiable(&self) -> bool {
        self.flags.contains(SlotFlags::MODIFIABLE)
    }

    /// Returns true if `child` may occupy this slot of `parent`.
    ///
    /// An empty slot is always valid. Otherwise the slot rule is evaluated on
    /// the candidate with `parent` as the evaluation's parent context.
    pub fn compatible(&self, parent: &NodeRef<'_>, child: Option<&TreeNode>) -> bool {
        match child {
            None => true,
            Some(child) => self
                .rule
                .applies(&child.cursor(), &RuleContext::with_parent(parent.clone())),
        }
    }
}

/// Immutable template for a class of tree nodes.
#[derive(Debug)]
pub struct Component {
    id: String,
    slots: Vec<Slot>,
    systems: BTreeMap<String, Arc<dyn System>>,
    tags: BTreeSet<String>,
    stats: StatLists,
}

impl Component {
    pub fn builder(id: impl Into<String>) -> ComponentBuilder {
        ComponentBuilder {
            id: id.into(),
            slots: Vec::new(),
            systems: Vec::new(),
            tags: BTreeSet::new(),
            layers: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Slots in declaration order.
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn slot(&self, key: &str) -> Option<&Slot> {
        self.slots.iter().find(|s| s.key == key)
    }

    pub fn systems(&self) -> impl Iterator<Item = &Arc<dyn System>> + '_ {
        self.systems.values()
    }

    pub fn system(&self, id: &str) -> Option<&Arc<dyn System>> {
        self.systems.get(id)
    }

    pub fn has_system(&self, id: &str) -> bool {
        self.systems.contains_key(id)
    }

    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    pub fn stats(&self) -> &StatLists {
        &self.stats
    }
}

impl Keyed for Component {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Builder validating a [`Component`] before it becomes immutable.
#[derive(Debug)]
pub struct ComponentBuilder {
    id: String,
    slots: Vec<Slot>,
    systems: Vec<Arc<dyn System>>,
    tags: BTreeSet<String>,
    layers: Vec<StatLayer>,
}

impl ComponentBuilder {
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    pub fn tags<S: Into<String>>(mut self, tags: impl IntoIterator<Item = S>) -> Self {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn slot(mut self, slot: Slot) -> Self {
        self.slots.push(slot);
        self
    }

    pub fn system(mut self, system: Arc<dyn System>) -> Self {
        self.systems.push(system);
        self
    }

    pub fn stats(mut self, layer: StatLayer) -> Self {
        self.layers.push(layer);
        self
    }

    pub fn build(self) -> Result<Component, ComponentError> {
        if !is_valid_id(&self.id) {
            return Err(ComponentError::InvalidId(self.id));
        }

        let mut seen = BTreeSet::new();
        for slot in &self.slots {
            if !seen.insert(slot.key.as_str()) {
                return Err(ComponentError::DuplicateSlot {
                    component: self.id.clone(),
                    key: slot.key.clone(),
                });
            }
        }

        let mut systems = BTreeMap::new();
        for system in self.systems {
            let id = system.id().to_owned();
            if !is_valid_id(&id) {
                return Err(ComponentError::InvalidSystemId {
                    component: self.id,
                    id,
                });
            }
            if systems.contains_key(&id) {
                return Err(ComponentError::DuplicateSystem {
                    component: self.id,
                    id,
                });
            }
            systems.insert(id, system);
        }

        Ok(Component {
            id: self.id,
            slots: self.slots,
            systems,
            tags: self.tags,
            stats: StatLists::new(self.layers),
        })
    }
}
