//! Displayable text and number formatting.
//!
//! The core never renders text by itself; it builds [`Text`] values and asks
//! the platform to localise them. Number formatting is an explicit context
//! owned by the caller.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::platform::SokolPlatform;

/// Locale tag such as `en-US`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Locale(String);

impl Locale {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self::new("en-US")
    }
}

impl From<&str> for Locale {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Text that is either fixed or looked up by key at render time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Text {
    Literal(String),
    Translatable {
        key: String,
        #[serde(default)]
        args: Vec<(String, Text)>,
    },
}

impl Text {
    pub fn literal(text: impl Into<String>) -> Self {
        Self::Literal(text.into())
    }

    pub fn translatable(key: impl Into<String>) -> Self {
        Self::Translatable {
            key: key.into(),
            args: Vec::new(),
        }
    }

    /// Adds a named argument; no effect on a literal.
    pub fn with_arg(mut self, name: impl Into<String>, value: impl Into<Text>) -> Self {
        if let Self::Translatable { args, .. } = &mut self {
            args.push((name.into(), value.into()));
        }
        self
    }

    pub fn key(&self) -> Option<&str> {
        match self {
            Self::Literal(_) => None,
            Self::Translatable { key, .. } => Some(key),
        }
    }

    /// Renders through the platform. Arguments are rendered first; a key
    /// the platform cannot localise renders as itself.
    pub fn render<P: SokolPlatform + ?Sized>(&self, platform: &P, locale: &Locale) -> String {
        match self {
            Self::Literal(text) => text.clone(),
            Self::Translatable { key, args } => {
                let args: Vec<(&str, String)> = args
                    .iter()
                    .map(|(name, value)| (name.as_str(), value.render(platform, locale)))
                    .collect();
                platform
                    .localize(locale, key, &args)
                    .unwrap_or_else(|| key.clone())
            }
        }
    }
}

impl From<&str> for Text {
    fn from(text: &str) -> Self {
        Self::literal(text)
    }
}

impl From<String> for Text {
    fn from(text: String) -> Self {
        Self::Literal(text)
    }
}

/// How numbers are written for one locale.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NumberFormat {
    pub decimals: usize,
    pub decimal_separator: char,
    /// Thousands separator; `None` writes digits ungrouped.
    pub grouping: Option<char>,
    /// Drops trailing zeros of the fraction, and the separator with them.
    pub trim_zeros: bool,
}

impl Default for NumberFormat {
    fn default() -> Self {
        Self {
            decimals: 2,
            decimal_separator: '.',
            grouping: None,
            trim_zeros: true,
        }
    }
}

impl NumberFormat {
    pub fn format(&self, value: f64) -> String {
        if !value.is_finite() {
            return value.to_string();
        }

        let fixed = format!("{:.*}", self.decimals, value.abs());
        let (int, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
        let frac = if self.trim_zeros {
            frac.trim_end_matches('0')
        } else {
            frac
        };

        let mut out = String::with_capacity(fixed.len() + 4);
        // `-0` rounds to zero and is written unsigned.
        if value < 0.0 && (int.bytes().any(|b| b != b'0') || !frac.is_empty()) {
            out.push('-');
        }
        match self.grouping {
            Some(separator) => {
                for (i, digit) in int.chars().enumerate() {
                    if i > 0 && (int.len() - i) % 3 == 0 {
                        out.push(separator);
                    }
                    out.push(digit);
                }
            }
            None => out.push_str(int),
        }
        if !frac.is_empty() {
            out.push(self.decimal_separator);
            out.push_str(frac);
        }
        out
    }
}

/// Number formats by locale, with a fallback.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NumberFormats {
    pub default: NumberFormat,
    pub locales: HashMap<Locale, NumberFormat>,
}

impl NumberFormats {
    pub fn new(default: NumberFormat) -> Self {
        Self {
            default,
            locales: HashMap::new(),
        }
    }

    pub fn insert(&mut self, locale: Locale, format: NumberFormat) {
        self.locales.insert(locale, format);
    }

    pub fn get(&self, locale: &Locale) -> &NumberFormat {
        self.locales.get(locale).unwrap_or(&self.default)
    }

    pub fn format(&self, locale: &Locale, value: f64) -> String {
        self.get(locale).format(value)
    }
}
