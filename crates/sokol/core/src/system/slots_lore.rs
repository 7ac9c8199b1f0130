//! Item lore listing what fills each slot.

use std::any::Any;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::item::{CreateItem, ItemSystem};
use super::{System, SystemInstance};
use crate::event::EventDispatcher;
use crate::text::Text;
use crate::tree::NodeRef;

/// Fired once per listed slot while slot lore is being written.
///
/// Called on the child filling the slot, or on the slot's owner if the slot
/// is empty. Listeners may rewrite or extend `lines`.
#[derive(Clone, Debug, PartialEq)]
pub struct SlotInfo {
    pub slot: String,
    pub filled: bool,
    pub lines: Vec<Text>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotsLoreConfig {
    /// List empty slots as `slot_info.empty`.
    pub show_empty: bool,
    pub priority: i32,
}

impl Default for SlotsLoreConfig {
    fn default() -> Self {
        Self {
            show_empty: true,
            priority: 0,
        }
    }
}

#[derive(Debug)]
pub struct SlotsLoreSystem {
    config: Arc<SlotsLoreConfig>,
}

impl SlotsLoreSystem {
    pub const ID: &'static str = "slots_lore";

    pub fn new(config: SlotsLoreConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

impl System for SlotsLoreSystem {
    fn id(&self) -> &str {
        Self::ID
    }

    fn dependencies(&self) -> &[&str] {
        &[ItemSystem::ID]
    }

    fn instantiate(&self) -> Box<dyn SystemInstance> {
        Box::new(SlotsLoreInstance {
            config: Arc::clone(&self.config),
        })
    }
}

#[derive(Clone, Debug)]
pub struct SlotsLoreInstance {
    config: Arc<SlotsLoreConfig>,
}

impl SystemInstance for SlotsLoreInstance {
    fn system_id(&self) -> &str {
        SlotsLoreSystem::ID
    }

    fn register(&self, events: &mut EventDispatcher) {
        let config = Arc::clone(&self.config);
        events.listen::<CreateItem, _>(self.config.priority, move |node, event| {
            event.lore.extend(slot_lines(node, &config));
        });
    }

    fn copy(&self) -> Box<dyn SystemInstance> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// One line per slot in declaration order.
///
/// Internal slots are listed only while every other slot is empty.
fn slot_lines(node: &NodeRef<'_>, config: &SlotsLoreConfig) -> Vec<Text> {
    let slots = node.value().slots();
    let show_internal = slots
        .iter()
        .filter(|slot| !slot.internal())
        .all(|slot| node.child(slot.key()).is_none());

    let mut lines = Vec::new();
    for slot in slots {
        if slot.internal() && !show_internal {
            continue;
        }

        let child = node.child(slot.key());
        let component = match &child {
            Some(child) => Text::translatable(format!("component.{}", child.value().id())),
            None if config.show_empty => Text::translatable("slot_info.empty"),
            None => continue,
        };

        let line = Text::translatable("slot_info.line")
            .with_arg("slot", Text::translatable(format!("slot.{}", slot.key())))
            .with_arg("component", component);
        let mut info = SlotInfo {
            slot: slot.key().to_owned(),
            filled: child.is_some(),
            lines: vec![line],
        };
        match &child {
            Some(child) => child.call(&mut info),
            None => node.call(&mut info),
        }
        lines.extend(info.lines);
    }
    lines
}
