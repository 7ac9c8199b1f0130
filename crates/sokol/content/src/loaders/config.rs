//! Engine configuration loader.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use sokol_core::{Locale, NumberFormat, NumberFormats};

use crate::loaders::{LoadResult, read_file};

/// Engine configuration, read from `config.toml`.
///
/// ```toml
/// default_locale = "en-US"
///
/// [number_format]
/// decimals = 2
///
/// [number_formats.de-DE]
/// decimal_separator = ","
/// grouping = "."
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SokolConfig {
    pub default_locale: Locale,
    /// Fallback for locales without an entry in `number_formats`.
    pub number_format: NumberFormat,
    pub number_formats: HashMap<Locale, NumberFormat>,
}

impl SokolConfig {
    pub fn formats(&self) -> NumberFormats {
        let mut formats = NumberFormats::new(self.number_format.clone());
        for (locale, format) in &self.number_formats {
            formats.insert(locale.clone(), format.clone());
        }
        formats
    }
}

/// Loader for engine configuration from TOML files.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load config data from a TOML file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the TOML file containing SokolConfig
    pub fn load(path: &Path) -> LoadResult<SokolConfig> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<SokolConfig> {
        let config: SokolConfig = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config TOML: {}", e))?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let config = ConfigLoader::parse(
            r#"
            default_locale = "de-DE"

            [number_format]
            decimals = 1

            [number_formats.de-DE]
            decimal_separator = ","
            grouping = "."
            "#,
        )
        .unwrap();

        assert_eq!(config.default_locale, Locale::from("de-DE"));
        let formats = config.formats();
        assert_eq!(formats.format(&Locale::from("de-DE"), 1234.5), "1.234,5");
        assert_eq!(formats.format(&Locale::from("en-US"), 0.26), "0.3");
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = ConfigLoader::parse("").unwrap();
        assert_eq!(config, SokolConfig::default());
        assert_eq!(config.default_locale, Locale::from("en-US"));
    }
}
