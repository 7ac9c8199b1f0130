//! Table of system types that data files can attach to components.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use sokol_core::{
    ItemConfig, ItemSystem, NumberFormats, SlotsLoreConfig, SlotsLoreSystem, StatsLoreConfig,
    StatsLoreSystem, System, is_valid_id,
};
use tracing::debug;

use crate::loaders::LoadResult;

/// Shared state handed to every system constructor.
#[derive(Clone, Debug, Default)]
pub struct FactoryContext {
    pub formats: Arc<NumberFormats>,
}

type Constructor = Box<dyn Fn(ron::Value, &FactoryContext) -> LoadResult<Arc<dyn System>> + Send + Sync>;

/// Maps a system id to the constructor that builds it from its RON config.
pub struct SystemTypes {
    constructors: HashMap<String, Constructor>,
}

impl SystemTypes {
    /// Table without any system type.
    pub fn empty() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    /// Table with the built-in `item`, `slots_lore` and `stats_lore` systems.
    pub fn with_builtins() -> Self {
        let mut types = Self::empty();
        types.insert_config(ItemSystem::ID, |config: ItemConfig, _| {
            Arc::new(ItemSystem::new(config))
        });
        types.insert_config(SlotsLoreSystem::ID, |config: SlotsLoreConfig, _| {
            Arc::new(SlotsLoreSystem::new(config))
        });
        types.insert_config(StatsLoreSystem::ID, |config: StatsLoreConfig, ctx| {
            Arc::new(StatsLoreSystem::new(config, Arc::clone(&ctx.formats)))
        });
        types
    }

    /// Registers a constructor receiving the raw config value.
    pub fn register<F>(&mut self, id: &str, constructor: F) -> LoadResult<()>
    where
        F: Fn(ron::Value, &FactoryContext) -> LoadResult<Arc<dyn System>> + Send + Sync + 'static,
    {
        if !is_valid_id(id) {
            anyhow::bail!("Invalid system type id `{}`", id);
        }
        if self.constructors.contains_key(id) {
            anyhow::bail!("System type `{}` is already registered", id);
        }
        self.constructors.insert(id.to_owned(), Box::new(constructor));
        debug!(target: "sokol::content", id, "registered system type");
        Ok(())
    }

    /// Registers a constructor whose config deserializes into `C`.
    pub fn register_config<C, F>(&mut self, id: &str, constructor: F) -> LoadResult<()>
    where
        C: DeserializeOwned,
        F: Fn(C, &FactoryContext) -> Arc<dyn System> + Send + Sync + 'static,
    {
        self.register(id, config_constructor(id, constructor))
    }

    /// Built-ins skip validation: their ids are well formed and distinct.
    fn insert_config<C, F>(&mut self, id: &str, constructor: F)
    where
        C: DeserializeOwned,
        F: Fn(C, &FactoryContext) -> Arc<dyn System> + Send + Sync + 'static,
    {
        self.constructors
            .insert(id.to_owned(), config_constructor(id, constructor));
    }

    pub fn contains(&self, id: &str) -> bool {
        self.constructors.contains_key(id)
    }

    /// Builds system `id` from its config.
    pub fn create(&self, id: &str, config: ron::Value, ctx: &FactoryContext) -> LoadResult<Arc<dyn System>> {
        let constructor = self
            .constructors
            .get(id)
            .ok_or_else(|| anyhow::anyhow!("Unknown system type `{}`", id))?;
        let system = constructor(config, ctx)?;
        if system.id() != id {
            anyhow::bail!(
                "System type `{}` built a system with id `{}`",
                id,
                system.id()
            );
        }
        Ok(system)
    }
}

fn config_constructor<C, F>(id: &str, constructor: F) -> Constructor
where
    C: DeserializeOwned,
    F: Fn(C, &FactoryContext) -> Arc<dyn System> + Send + Sync + 'static,
{
    let owner = id.to_owned();
    Box::new(move |value, ctx| {
        let config: C = value
            .into_rust()
            .map_err(|e| anyhow::anyhow!("Invalid config for system `{}`: {}", owner, e))?;
        Ok(constructor(config, ctx))
    })
}

impl Default for SystemTypes {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl fmt::Debug for SystemTypes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<_> = self.constructors.keys().collect();
        ids.sort();
        f.debug_struct("SystemTypes").field("ids", &ids).finish()
    }
}
