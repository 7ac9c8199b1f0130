//! Turning a complete tree into a host item.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{System, SystemInstance};
use crate::error::{ErrorSeverity, SokolError};
use crate::event::Cancellable;
use crate::platform::SokolPlatform;
use crate::text::{Locale, Text};
use crate::tree::{NodeData, NodeRef};

/// Errors raised while creating an item from a tree.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ItemError {
    #[error("tree rooted at `{0}` is incomplete")]
    Incomplete(String),

    #[error("component `{0}` has no item system")]
    MissingSystem(String),
}

impl SokolError for ItemError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Incomplete(_) => ErrorSeverity::Recoverable,
            Self::MissingSystem(_) => ErrorSeverity::Internal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Incomplete(_) => "ITEM_INCOMPLETE",
            Self::MissingSystem(_) => "ITEM_MISSING_SYSTEM",
        }
    }
}

fn default_amount() -> u32 {
    1
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ItemConfig {
    pub material: String,
    #[serde(default)]
    pub model_data: Option<u32>,
    #[serde(default = "default_amount")]
    pub amount: u32,
}

/// What the host should create before the tree decorates it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ItemModel {
    pub material: String,
    pub model_data: Option<u32>,
}

pub trait ItemFactory {
    fn create(&self, model: &ItemModel) -> Box<dyn ItemStack>;
}

/// Narrow view of a host item.
pub trait ItemStack: fmt::Debug {
    fn set_amount(&mut self, amount: u32);

    fn set_name(&mut self, name: String);

    fn add_lore(&mut self, lines: &[String]);

    /// Remaining durability as a ratio in `0.0..=1.0`.
    fn set_durability(&mut self, ratio: f64);

    /// Stores the tree the item was created from.
    fn save(&mut self, data: &NodeData);
}

/// Fired on the root before an item is created.
///
/// Listeners may rename the item, add lore lines, or cancel the creation.
#[derive(Clone, Debug, PartialEq)]
pub struct CreateItem {
    pub locale: Locale,
    pub name: Text,
    pub lore: Vec<Text>,
    cancelled: bool,
}

impl CreateItem {
    pub fn new(locale: Locale, name: Text) -> Self {
        Self {
            locale,
            name,
            lore: Vec::new(),
            cancelled: false,
        }
    }
}

impl Cancellable for CreateItem {
    fn cancelled(&self) -> bool {
        self.cancelled
    }

    fn cancel(&mut self) {
        self.cancelled = true;
    }
}

/// Makes a node's tree creatable as an item.
#[derive(Debug)]
pub struct ItemSystem {
    config: Arc<ItemConfig>,
}

impl ItemSystem {
    pub const ID: &'static str = "item";

    pub fn new(config: ItemConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &ItemConfig {
        &self.config
    }

    /// Creates a host item from the tree at `node`.
    ///
    /// Returns `Ok(None)` if a [`CreateItem`] listener cancelled the creation.
    pub fn create_item(
        node: &NodeRef<'_>,
        platform: &dyn SokolPlatform,
        factory: &dyn ItemFactory,
        locale: &Locale,
    ) -> Result<Option<Box<dyn ItemStack>>, ItemError> {
        let id = node.value().id();
        let instance = node
            .system::<ItemInstance>()
            .ok_or_else(|| ItemError::MissingSystem(id.to_owned()))?;
        if !node.node().complete() {
            return Err(ItemError::Incomplete(id.to_owned()));
        }

        let mut event = CreateItem::new(locale.clone(), Text::translatable(format!("component.{id}")));
        node.call(&mut event);
        if event.cancelled() {
            warn!(target: "sokol::item", component = id, "item creation cancelled");
            return Ok(None);
        }

        let mut item = factory.create(&instance.model());
        item.set_amount(instance.config.amount);
        item.set_name(event.name.render(platform, locale));

        let lore: Vec<String> = event
            .lore
            .iter()
            .map(|line| line.render(platform, locale))
            .collect();
        if !lore.is_empty() {
            item.add_lore(&lore);
        }

        let stats = node.stats();
        if let (Some(durability), Some(max)) = (stats.number("durability"), stats.number("max_durability")) {
            if max > 0.0 {
                item.set_durability((durability / max).clamp(0.0, 1.0));
            }
        }

        item.save(&node.node().to_data());
        debug!(
            target: "sokol::item",
            component = id,
            locale = locale.as_str(),
            lore = lore.len(),
            "created item"
        );
        Ok(Some(item))
    }
}

impl System for ItemSystem {
    fn id(&self) -> &str {
        Self::ID
    }

    fn instantiate(&self) -> Box<dyn SystemInstance> {
        Box::new(ItemInstance {
            config: Arc::clone(&self.config),
        })
    }
}

#[derive(Clone, Debug)]
pub struct ItemInstance {
    config: Arc<ItemConfig>,
}

impl ItemInstance {
    pub fn config(&self) -> &ItemConfig {
        &self.config
    }

    pub fn model(&self) -> ItemModel {
        ItemModel {
            material: self.config.material.clone(),
            model_data: self.config.model_data,
        }
    }
}

impl SystemInstance for ItemInstance {
    fn system_id(&self) -> &str {
        ItemSystem::ID
    }

    fn copy(&self) -> Box<dyn SystemInstance> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
