//! Item lore listing resolved stats.

use std::any::Any;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::item::{CreateItem, ItemSystem};
use super::{System, SystemInstance};
use crate::event::EventDispatcher;
use crate::stat::{StatMap, StatValue};
use crate::text::{Locale, NumberFormats, Text};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsLoreConfig {
    /// Stat keys to list, in display order.
    pub stats: Vec<String>,
    pub priority: i32,
}

#[derive(Debug)]
pub struct StatsLoreSystem {
    config: Arc<StatsLoreConfig>,
    formats: Arc<NumberFormats>,
}

impl StatsLoreSystem {
    pub const ID: &'static str = "stats_lore";

    pub fn new(config: StatsLoreConfig, formats: Arc<NumberFormats>) -> Self {
        Self {
            config: Arc::new(config),
            formats,
        }
    }
}

impl System for StatsLoreSystem {
    fn id(&self) -> &str {
        Self::ID
    }

    fn dependencies(&self) -> &[&str] {
        &[ItemSystem::ID]
    }

    fn instantiate(&self) -> Box<dyn SystemInstance> {
        Box::new(StatsLoreInstance {
            config: Arc::clone(&self.config),
            formats: Arc::clone(&self.formats),
        })
    }
}

#[derive(Clone, Debug)]
pub struct StatsLoreInstance {
    config: Arc<StatsLoreConfig>,
    formats: Arc<NumberFormats>,
}

impl SystemInstance for StatsLoreInstance {
    fn system_id(&self) -> &str {
        StatsLoreSystem::ID
    }

    fn register(&self, events: &mut EventDispatcher) {
        let this = self.clone();
        events.listen::<CreateItem, _>(self.config.priority, move |node, event| {
            let lines = this.lines(node.stats(), &event.locale);
            event.lore.extend(lines);
        });
    }

    fn copy(&self) -> Box<dyn SystemInstance> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl StatsLoreInstance {
    /// One `stat.<key>` line per configured stat that resolves.
    fn lines(&self, stats: &StatMap, locale: &Locale) -> Vec<Text> {
        self.config
            .stats
            .iter()
            .filter_map(|key| {
                let value = stats.val(key)?;
                Some(Text::translatable(format!("stat.{key}")).with_arg("value", self.display(&value, locale)))
            })
            .collect()
    }

    fn display(&self, value: &StatValue, locale: &Locale) -> Text {
        match value {
            StatValue::Number(n) => Text::literal(self.formats.format(locale, *n)),
            StatValue::Flag(true) => Text::translatable("stat_value.true"),
            StatValue::Flag(false) => Text::translatable("stat_value.false"),
            StatValue::Text(text) => Text::literal(text.as_str()),
            StatValue::List(items) => Text::literal(items.join(", ")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stat::StatOp;
    use crate::text::NumberFormat;

    fn instance(stats: &[&str]) -> StatsLoreInstance {
        let mut formats = NumberFormats::default();
        formats.insert(
            Locale::from("de-DE"),
            NumberFormat {
                decimal_separator: ',',
                ..NumberFormat::default()
            },
        );
        StatsLoreInstance {
            config: Arc::new(StatsLoreConfig {
                stats: stats.iter().map(|s| (*s).to_owned()).collect(),
                priority: 0,
            }),
            formats: Arc::new(formats),
        }
    }

    #[test]
    fn lists_configured_stats_that_resolve() {
        let stats = StatMap::from_ops([
            ("damage", StatOp::set(12.5)),
            ("automatic", StatOp::set(true)),
            ("weight", StatOp::set(3.0)),
        ])
        .unwrap();

        let lines = instance(&["damage", "spread", "automatic"]).lines(&stats, &Locale::from("de-DE"));

        assert_eq!(
            lines,
            vec![
                Text::translatable("stat.damage").with_arg("value", "12,5"),
                Text::translatable("stat.automatic").with_arg("value", Text::translatable("stat_value.true")),
            ]
        );
    }
}
