//! Content loaders for reading Sokol data from files.
//!
//! Components and blueprints are written in RON, language tables and engine
//! configuration in TOML. [`ContentFactory`] ties them together into a
//! [`ContentPlatform`](crate::ContentPlatform).

pub mod blueprints;
pub mod components;
pub mod config;
pub mod factory;
pub mod lang;
pub mod systems;

pub use blueprints::BlueprintLoader;
pub use components::{ComponentDef, ComponentLoader, SlotDef};
pub use config::{ConfigLoader, SokolConfig};
pub use factory::ContentFactory;
pub use lang::LangLoader;
pub use systems::{FactoryContext, SystemTypes};

use std::path::{Path, PathBuf};

/// Common result type for loaders.
pub type LoadResult<T> = anyhow::Result<T>;

/// Helper function to read file contents.
pub(crate) fn read_file(path: &Path) -> LoadResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read file {}: {}", path.display(), e))
}

/// Files in `dir` with the given extension, sorted by name.
pub(crate) fn files_with_extension(dir: &Path, extension: &str) -> LoadResult<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| anyhow::anyhow!("Failed to read directory {}: {}", dir.display(), e))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|e| anyhow::anyhow!("Failed to read entry in {}: {}", dir.display(), e))?
            .path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == extension) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
