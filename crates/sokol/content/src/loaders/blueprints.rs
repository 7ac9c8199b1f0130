//! Blueprint catalog loader.

use std::path::Path;

use serde::Deserialize;
use sokol_core::Blueprint;

use crate::loaders::{LoadResult, read_file};

/// Blueprint catalog structure for RON files.
#[derive(Debug, Clone, Deserialize)]
pub struct BlueprintCatalog {
    pub blueprints: Vec<Blueprint>,
}

/// Loader for blueprints from RON files.
pub struct BlueprintLoader;

impl BlueprintLoader {
    /// Load blueprints from a RON file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the RON file containing a BlueprintCatalog
    pub fn load(path: &Path) -> LoadResult<Vec<Blueprint>> {
        let content = read_file(path)?;
        Self::parse(&content).map_err(|e| anyhow::anyhow!("{} ({})", e, path.display()))
    }

    pub fn parse(content: &str) -> LoadResult<Vec<Blueprint>> {
        let catalog: BlueprintCatalog = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse blueprint catalog RON: {}", e))?;
        Ok(catalog.blueprints)
    }
}
