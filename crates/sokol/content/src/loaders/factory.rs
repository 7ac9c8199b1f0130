//! Content factory for building a platform from data files.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use sokol_core::{Blueprint, Component, Locale, Registry, SokolPlatform};
use tracing::{debug, info};

use crate::loaders::{
    BlueprintLoader, ComponentDef, ComponentLoader, ConfigLoader, FactoryContext, LangLoader,
    LoadResult, SokolConfig, SystemTypes,
};
use crate::platform::{ContentPlatform, LangTable};

/// Content factory that loads all content from a data directory.
///
/// # Directory Structure
///
/// ```text
/// data_dir/
/// ├── config.toml      (optional)
/// ├── blueprints.ron   (optional)
/// ├── components/      (or a single components.ron)
/// │   ├── weapons.ron
/// │   └── attachments.ron
/// └── lang/
///     ├── en-US.toml
///     └── de-DE.toml
/// ```
pub struct ContentFactory {
    data_dir: PathBuf,
}

impl ContentFactory {
    /// Creates a new content factory pointing to a data directory.
    ///
    /// # Arguments
    ///
    /// * `data_dir` - Path to the directory containing data files
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Load engine configuration from `config.toml`, or defaults if absent.
    pub fn load_config(&self) -> LoadResult<SokolConfig> {
        let path = self.data_dir.join("config.toml");
        if !path.exists() {
            debug!(target: "sokol::content", "no config.toml, using defaults");
            return Ok(SokolConfig::default());
        }
        ConfigLoader::load(&path)
    }

    /// Load component definitions from `components/`, falling back to
    /// `components.ron`.
    pub fn load_component_defs(&self) -> LoadResult<Vec<ComponentDef>> {
        let dir = self.data_dir.join("components");
        if dir.is_dir() {
            return ComponentLoader::load_dir(&dir);
        }
        ComponentLoader::load(&self.data_dir.join("components.ron"))
    }

    /// Load and build every component into a registry.
    ///
    /// # Arguments
    ///
    /// * `types` - System types the component files may reference
    /// * `ctx` - Shared state for system constructors
    pub fn load_components(
        &self,
        types: &SystemTypes,
        ctx: &FactoryContext,
    ) -> LoadResult<Registry<Component>> {
        let mut registry = Registry::new();
        for def in self.load_component_defs()? {
            let component = def.build(types, ctx)?;
            registry
                .register(component)
                .map_err(|e| anyhow::anyhow!("Failed to register component: {}", e))?;
        }
        Ok(registry)
    }

    /// Load blueprints from `blueprints.ron`, or none if absent.
    pub fn load_blueprints(&self) -> LoadResult<Registry<Blueprint>> {
        let mut registry = Registry::new();
        let path = self.data_dir.join("blueprints.ron");
        if !path.exists() {
            return Ok(registry);
        }
        for blueprint in BlueprintLoader::load(&path)? {
            registry
                .register(blueprint)
                .map_err(|e| anyhow::anyhow!("Failed to register blueprint: {}", e))?;
        }
        Ok(registry)
    }

    /// Load language tables from `lang/`, or none if absent.
    pub fn load_lang(&self) -> LoadResult<HashMap<Locale, LangTable>> {
        let dir = self.data_dir.join("lang");
        if !dir.is_dir() {
            return Ok(HashMap::new());
        }
        LangLoader::load_dir(&dir)
    }

    /// Load everything into a platform, using `types` for component systems.
    ///
    /// Every blueprint is built once so broken trees fail here rather than
    /// on first use.
    pub fn build_platform(&self, types: &SystemTypes) -> LoadResult<ContentPlatform> {
        let config = self.load_config()?;
        let ctx = FactoryContext {
            formats: Arc::new(config.formats()),
        };

        let components = self.load_components(types, &ctx)?;
        let blueprints = self.load_blueprints()?;
        let lang = self.load_lang()?;

        if !lang.is_empty() && !lang.contains_key(&config.default_locale) {
            anyhow::bail!(
                "No language table for default locale `{}`",
                config.default_locale
            );
        }

        let platform = ContentPlatform::new(
            components,
            blueprints,
            config.default_locale,
            lang,
            ctx.formats,
        );

        for id in platform.blueprints().ids() {
            platform
                .build_blueprint(id)
                .map_err(|e| anyhow::anyhow!("Invalid blueprint `{}`: {}", id, e))?;
        }

        info!(
            target: "sokol::content",
            dir = %self.data_dir.display(),
            components = platform.components().len(),
            blueprints = platform.blueprints().len(),
            locales = platform.locales().count(),
            "content platform loaded"
        );
        Ok(platform)
    }

    /// Load everything into a platform with the built-in system types.
    pub fn load_platform(&self) -> LoadResult<ContentPlatform> {
        self.build_platform(&SystemTypes::default())
    }

    /// Returns the data directory path.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_paths() {
        let factory = ContentFactory::new("/tmp/data");
        assert_eq!(factory.data_dir(), Path::new("/tmp/data"));
    }

    #[test]
    fn test_missing_optional_files() {
        let dir = tempfile::tempdir().unwrap();
        let factory = ContentFactory::new(dir.path());

        assert_eq!(factory.load_config().unwrap(), SokolConfig::default());
        assert!(factory.load_blueprints().unwrap().is_empty());
        assert!(factory.load_lang().unwrap().is_empty());
        // Components are required.
        assert!(factory.load_platform().is_err());
    }
}
