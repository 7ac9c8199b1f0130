//! Stat nodes and the maps that chain them.

use std::collections::BTreeMap;

use serde::Deserialize;
use tracing::warn;

use super::{StatError, StatKind, StatOp, StatValue};

/// A stat's computation chain.
///
/// The value is not stored; it is folded from the chain on every read so that
/// merging never loses earlier contributions.
#[derive(Clone, Debug, PartialEq)]
pub struct StatNode {
    kind: StatKind,
    chain: Vec<StatOp>,
}

impl StatNode {
    pub fn new(op: StatOp) -> Result<Self, StatError> {
        op.validate()?;
        Ok(Self {
            kind: op.kind(),
            chain: vec![op],
        })
    }

    pub fn kind(&self) -> StatKind {
        self.kind
    }

    pub fn chain(&self) -> &[StatOp] {
        &self.chain
    }

    /// Appends `op` to the chain. The operand must match the chain's kind.
    pub fn push(&mut self, op: StatOp) -> Result<(), StatError> {
        op.validate()?;
        if op.kind() != self.kind {
            return Err(StatError::KindMismatch {
                expected: self.kind,
                found: op.kind(),
            });
        }
        self.chain.push(op);
        Ok(())
    }

    /// Folds the chain in insertion order.
    pub fn value(&self) -> StatValue {
        self.chain
            .iter()
            .fold(None, |state, op| Some(op.apply(state)))
            .unwrap_or_else(|| self.kind.identity())
    }
}

/// Ordered collection of stat nodes keyed by stat name.
///
/// In data files a map is written as `{ "damage": Set(10.0), ... }`.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(try_from = "BTreeMap<String, StatOp>")]
pub struct StatMap {
    nodes: BTreeMap<String, StatNode>,
}

impl StatMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a map from `(key, op)` pairs, chaining repeated keys.
    pub fn from_ops<K: Into<String>>(
        ops: impl IntoIterator<Item = (K, StatOp)>,
    ) -> Result<Self, StatError> {
        let mut map = Self::new();
        for (key, op) in ops {
            map.insert(key, op)?;
        }
        Ok(map)
    }

    /// Chains `op` onto `key`, creating the node if needed.
    pub fn insert(&mut self, key: impl Into<String>, op: StatOp) -> Result<(), StatError> {
        let key = key.into();
        match self.nodes.get_mut(&key) {
            Some(node) => node.push(op).map_err(|e| e.for_key(&key)),
            None => {
                let node = StatNode::new(op).map_err(|e| e.for_key(&key))?;
                self.nodes.insert(key, node);
                Ok(())
            }
        }
    }

    /// Merges every node of `other` into this map.
    ///
    /// A new key is inserted; an existing key gets the incoming chain appended
    /// to its own. Entries whose kind disagrees with the existing chain are
    /// dropped.
    pub fn merge(&mut self, other: &StatMap) {
        for (key, incoming) in &other.nodes {
            match self.nodes.get_mut(key) {
                None => {
                    self.nodes.insert(key.clone(), incoming.clone());
                }
                Some(node) if node.kind == incoming.kind => {
                    node.chain.extend(incoming.chain.iter().cloned());
                }
                Some(node) => {
                    warn!(
                        target: "sokol::stat",
                        key = key.as_str(),
                        expected = node.kind.as_ref(),
                        found = incoming.kind.as_ref(),
                        "dropping stat entry of mismatched kind"
                    );
                }
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&StatNode> {
        self.nodes.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.nodes.contains_key(key)
    }

    /// Resolved value of `key`, if any entry contributed to it.
    pub fn val(&self, key: &str) -> Option<StatValue> {
        self.nodes.get(key).map(StatNode::value)
    }

    /// Resolved value of a stat the caller relies on being present.
    pub fn req(&self, key: &str) -> Result<StatValue, StatError> {
        self.val(key)
            .ok_or_else(|| StatError::Missing(key.to_owned()))
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        self.val(key).and_then(|v| v.as_number())
    }

    pub fn req_number(&self, key: &str) -> Result<f64, StatError> {
        self.number(key)
            .ok_or_else(|| StatError::Missing(key.to_owned()))
    }

    pub fn flag(&self, key: &str) -> Option<bool> {
        self.val(key).and_then(|v| v.as_flag())
    }

    pub fn text(&self, key: &str) -> Option<String> {
        match self.val(key)? {
            StatValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn list(&self, key: &str) -> Option<Vec<String>> {
        match self.val(key)? {
            StatValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.nodes.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &StatNode)> + '_ {
        self.nodes.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl TryFrom<BTreeMap<String, StatOp>> for StatMap {
    type Error = StatError;

    fn try_from(ops: BTreeMap<String, StatOp>) -> Result<Self, Self::Error> {
        Self::from_ops(ops)
    }
}
