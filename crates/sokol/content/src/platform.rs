//! File-backed [`SokolPlatform`].

use std::collections::HashMap;
use std::sync::Arc;

use sokol_core::{Blueprint, Component, Locale, NumberFormats, Registry, SokolPlatform};

/// Message templates of one locale, keyed by dotted translation key.
///
/// Templates reference arguments as `{name}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LangTable {
    entries: HashMap<String, String>,
}

impl LangTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, template: impl Into<String>) {
        self.entries.insert(key.into(), template.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fills `{name}` placeholders of the template under `key`.
    /// Placeholders without a matching argument are left as written.
    pub fn format(&self, key: &str, args: &[(&str, String)]) -> Option<String> {
        let mut text = self.get(key)?.to_owned();
        for (name, value) in args {
            text = text.replace(&format!("{{{name}}}"), value);
        }
        Some(text)
    }
}

/// Platform serving content loaded from disk.
#[derive(Debug)]
pub struct ContentPlatform {
    components: Registry<Component>,
    blueprints: Registry<Blueprint>,
    default_locale: Locale,
    lang: HashMap<Locale, LangTable>,
    formats: Arc<NumberFormats>,
}

impl ContentPlatform {
    pub fn new(
        components: Registry<Component>,
        blueprints: Registry<Blueprint>,
        default_locale: Locale,
        lang: HashMap<Locale, LangTable>,
        formats: Arc<NumberFormats>,
    ) -> Self {
        Self {
            components,
            blueprints,
            default_locale,
            lang,
            formats,
        }
    }

    pub fn lang(&self, locale: &Locale) -> Option<&LangTable> {
        self.lang.get(locale)
    }

    pub fn locales(&self) -> impl Iterator<Item = &Locale> + '_ {
        self.lang.keys()
    }

    /// Number formats shared with the systems built for this platform.
    pub fn formats(&self) -> &Arc<NumberFormats> {
        &self.formats
    }
}

impl SokolPlatform for ContentPlatform {
    fn components(&self) -> &Registry<Component> {
        &self.components
    }

    fn blueprints(&self) -> &Registry<Blueprint> {
        &self.blueprints
    }

    fn default_locale(&self) -> &Locale {
        &self.default_locale
    }

    /// Looks `key` up in `locale`, then in the default locale.
    fn localize(&self, locale: &Locale, key: &str, args: &[(&str, String)]) -> Option<String> {
        self.lang
            .get(locale)
            .and_then(|table| table.format(key, args))
            .or_else(|| {
                self.lang
                    .get(&self.default_locale)
                    .and_then(|table| table.format(key, args))
            })
    }
}
