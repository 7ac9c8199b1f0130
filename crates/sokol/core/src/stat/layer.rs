//! Priority-ordered stat layers and the forward/reverse merge.

use serde::{Deserialize, Serialize};

use super::StatMap;
use crate::rule::Rule;

/// Position of a layer in the merge order.
///
/// All forward layers apply before any reverse layer; within a phase,
/// ascending `value`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Priority {
    pub value: i32,
    pub reverse: bool,
}

impl Priority {
    pub const fn forward(value: i32) -> Self {
        Self {
            value,
            reverse: false,
        }
    }

    pub const fn reverse(value: i32) -> Self {
        Self {
            value,
            reverse: true,
        }
    }

    fn sort_key(self) -> (bool, i32) {
        (self.reverse, self.value)
    }
}

/// A stat map gated by an optional rule and placed by a priority.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct StatLayer {
    #[serde(default)]
    pub priority: Priority,
    /// Evaluated against the node that owns the layer; absent means always.
    #[serde(default)]
    pub rule: Option<Rule>,
    pub stats: StatMap,
}

impl StatLayer {
    pub fn new(priority: Priority, stats: StatMap) -> Self {
        Self {
            priority,
            rule: None,
            stats,
        }
    }

    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rule = Some(rule);
        self
    }
}

/// A component's stat layers, partitioned into merge phases.
#[derive(Clone, Debug, Default)]
pub struct StatLists {
    forward: Vec<StatLayer>,
    reverse: Vec<StatLayer>,
}

impl StatLists {
    pub fn new(layers: impl IntoIterator<Item = StatLayer>) -> Self {
        let (mut forward, mut reverse): (Vec<_>, Vec<_>) =
            layers.into_iter().partition(|l| !l.priority.reverse);
        // Stable: equal priorities keep declaration order.
        forward.sort_by_key(|l| l.priority.value);
        reverse.sort_by_key(|l| l.priority.value);
        Self { forward, reverse }
    }

    pub fn forward(&self) -> &[StatLayer] {
        &self.forward
    }

    pub fn reverse(&self) -> &[StatLayer] {
        &self.reverse
    }

    /// Forward layers, then reverse layers.
    pub fn iter(&self) -> impl Iterator<Item = &StatLayer> + '_ {
        self.forward.iter().chain(self.reverse.iter())
    }

    pub fn len(&self) -> usize {
        self.forward.len() + self.reverse.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty() && self.reverse.is_empty()
    }
}

/// Merges already rule-filtered layers into one map.
///
/// Forward layers ascending by priority, then reverse layers ascending by
/// priority. Layers of equal priority keep their input order.
pub fn resolve<'a>(layers: impl IntoIterator<Item = &'a StatLayer>) -> StatMap {
    let mut ordered: Vec<&StatLayer> = layers.into_iter().collect();
    ordered.sort_by_key(|l| l.priority.sort_key());

    let mut result = StatMap::new();
    for layer in ordered {
        result.merge(&layer.stats);
    }
    result
}
