//! Component catalog loader.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use sokol_core::{Component, Rule, Slot, StatLayer};
use tracing::info;

use crate::loaders::{FactoryContext, LoadResult, SystemTypes, files_with_extension, read_file};

/// A slot as written in a component file.
#[derive(Debug, Clone, Deserialize)]
pub struct SlotDef {
    pub key: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub rule: Rule,
}

/// A component as written in a component file.
///
/// ```ron
/// (
///     id: "barrel",
///     tags: ["rail"],
///     slots: [
///         (key: "grip", tags: ["required"], rule: HasTags(["handle"])),
///     ],
///     systems: {
///         "item": (material: "iron_hoe"),
///     },
///     stats: [
///         (stats: {"damage": Set(10.0)}),
///         (priority: (reverse: true), stats: {"damage": Mul(1.1)}),
///     ],
/// )
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ComponentDef {
    pub id: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub slots: Vec<SlotDef>,
    /// System configs by system type id.
    #[serde(default)]
    pub systems: BTreeMap<String, ron::Value>,
    #[serde(default)]
    pub stats: Vec<StatLayer>,
}

impl ComponentDef {
    /// Builds the component, creating its systems through `types`.
    pub fn build(self, types: &SystemTypes, ctx: &FactoryContext) -> LoadResult<Component> {
        let mut builder = Component::builder(self.id.as_str()).tags(self.tags);

        for def in self.slots {
            let slot = Slot::new(def.key)
                .map_err(|e| anyhow::anyhow!("Invalid slot in component `{}`: {}", self.id, e))?
                .with_tags(def.tags)
                .with_rule(def.rule);
            builder = builder.slot(slot);
        }

        for (id, config) in self.systems {
            let system = types
                .create(&id, config, ctx)
                .map_err(|e| anyhow::anyhow!("Failed to create system for component `{}`: {}", self.id, e))?;
            builder = builder.system(system);
        }

        for layer in self.stats {
            builder = builder.stats(layer);
        }

        builder
            .build()
            .map_err(|e| anyhow::anyhow!("Invalid component `{}`: {}", self.id, e))
    }
}

/// Component catalog structure for RON files.
#[derive(Debug, Clone, Deserialize)]
pub struct ComponentCatalog {
    pub components: Vec<ComponentDef>,
}

/// Loader for component catalogs from RON files.
pub struct ComponentLoader;

impl ComponentLoader {
    /// Load component definitions from a RON file containing a ComponentCatalog.
    pub fn load(path: &Path) -> LoadResult<Vec<ComponentDef>> {
        let content = read_file(path)?;
        Self::parse(&content).map_err(|e| anyhow::anyhow!("{} ({})", e, path.display()))
    }

    /// Load every `*.ron` catalog in `dir`, in file name order.
    pub fn load_dir(dir: &Path) -> LoadResult<Vec<ComponentDef>> {
        let mut defs = Vec::new();
        for path in files_with_extension(dir, "ron")? {
            defs.extend(Self::load(&path)?);
        }
        info!(
            target: "sokol::content",
            dir = %dir.display(),
            count = defs.len(),
            "loaded component definitions"
        );
        Ok(defs)
    }

    pub fn parse(content: &str) -> LoadResult<Vec<ComponentDef>> {
        let catalog: ComponentCatalog = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse component catalog RON: {}", e))?;
        Ok(catalog.components)
    }
}
