//! Language table loader.

use std::collections::HashMap;
use std::path::Path;

use sokol_core::Locale;
use tracing::info;

use crate::loaders::{LoadResult, files_with_extension, read_file};
use crate::platform::LangTable;

/// Loader for language tables from TOML files.
///
/// Nested tables flatten into dotted keys, so both forms below define
/// `component.barrel`:
///
/// ```toml
/// component.barrel = "Barrel"
///
/// [component]
/// barrel = "Barrel"
/// ```
pub struct LangLoader;

impl LangLoader {
    pub fn load(path: &Path) -> LoadResult<LangTable> {
        let content = read_file(path)?;
        Self::parse(&content).map_err(|e| anyhow::anyhow!("{} ({})", e, path.display()))
    }

    pub fn parse(content: &str) -> LoadResult<LangTable> {
        let table: toml::Table = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse language TOML: {}", e))?;

        let mut lang = LangTable::new();
        flatten("", &table, &mut lang)?;
        Ok(lang)
    }

    /// Load `<locale>.toml` files from `dir`, keyed by file stem.
    pub fn load_dir(dir: &Path) -> LoadResult<HashMap<Locale, LangTable>> {
        let mut tables = HashMap::new();
        for path in files_with_extension(dir, "toml")? {
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let table = Self::load(&path)?;
            info!(
                target: "sokol::content",
                locale = stem,
                entries = table.len(),
                "loaded language table"
            );
            tables.insert(Locale::new(stem), table);
        }
        Ok(tables)
    }
}

fn flatten(prefix: &str, table: &toml::Table, out: &mut LangTable) -> LoadResult<()> {
    for (key, value) in table {
        let key = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            toml::Value::String(template) => out.insert(key, template.clone()),
            toml::Value::Table(nested) => flatten(&key, nested, out)?,
            other => anyhow::bail!("Language entry `{}` must be a string, found {}", key, other.type_str()),
        }
    }
    Ok(())
}
