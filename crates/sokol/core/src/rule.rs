//! Boolean predicates over tree nodes.
//!
//! Rules gate slot compatibility and stat layers. They are immutable
//! expression trees evaluated fresh on every call:
//!
//! - Logic: [`Rule::Constant`], [`Rule::Not`], [`Rule::And`], [`Rule::Or`]
//! - Shape: [`Rule::HasTags`], [`Rule::HasSystems`], [`Rule::IsComplete`],
//!   [`Rule::IsRoot`], [`Rule::Has`]
//! - Navigation: [`Rule::As`], [`Rule::AsRoot`], [`Rule::AsParent`]
//!
//! `And` and `Or` short-circuit in listed order, like a behavior tree's
//! sequence and selector. Navigation that does not resolve makes the rule
//! fail; evaluation itself never fails.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::tree::{NodePath, NodeRef};

/// Context an evaluation runs in.
///
/// `parent` is the node the target hangs from, or would hang from when a slot
/// checks a candidate that is not attached yet. It is passed explicitly
/// rather than stored on the rule, so one rule can be shared across any
/// number of concurrent evaluations.
#[derive(Clone, Debug, Default)]
pub struct RuleContext<'a> {
    parent: Option<NodeRef<'a>>,
}

impl<'a> RuleContext<'a> {
    /// Context from the node's position in its tree.
    pub fn of(node: &NodeRef<'a>) -> Self {
        Self {
            parent: node.parent(),
        }
    }

    pub fn with_parent(parent: NodeRef<'a>) -> Self {
        Self {
            parent: Some(parent),
        }
    }

    pub fn detached() -> Self {
        Self { parent: None }
    }

    pub fn parent(&self) -> Option<&NodeRef<'a>> {
        self.parent.as_ref()
    }
}

/// Code-defined rule term, for predicates that have no data representation.
pub trait RuleTerm: fmt::Debug + Send + Sync {
    fn applies(&self, target: &NodeRef<'_>, ctx: &RuleContext<'_>) -> bool;
}

/// Rule expression.
///
/// Externally tagged in data files, e.g.
/// `And([HasTags(["handle"]), Not(IsRoot)])` or `As(["grip"], IsComplete)`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Rule {
    Constant(bool),
    Not(Box<Rule>),
    And(Vec<Rule>),
    Or(Vec<Rule>),
    /// Component tags intersect the set.
    HasTags(BTreeSet<String>),
    /// Component system ids intersect the set.
    HasSystems(BTreeSet<String>),
    IsComplete,
    IsRoot,
    Has(NodePath),
    As(NodePath, Box<Rule>),
    AsRoot(NodePath, Box<Rule>),
    AsParent(Box<Rule>),
    #[serde(skip)]
    Custom(Arc<dyn RuleTerm>),
}

impl Default for Rule {
    fn default() -> Self {
        Self::Constant(true)
    }
}

impl Rule {
    pub fn always() -> Self {
        Self::Constant(true)
    }

    pub fn never() -> Self {
        Self::Constant(false)
    }

    pub fn not(term: Rule) -> Self {
        Self::Not(Box::new(term))
    }

    pub fn and(terms: impl IntoIterator<Item = Rule>) -> Self {
        Self::And(terms.into_iter().collect())
    }

    pub fn or(terms: impl IntoIterator<Item = Rule>) -> Self {
        Self::Or(terms.into_iter().collect())
    }

    pub fn has_tags<S: Into<String>>(tags: impl IntoIterator<Item = S>) -> Self {
        Self::HasTags(tags.into_iter().map(Into::into).collect())
    }

    pub fn has_systems<S: Into<String>>(ids: impl IntoIterator<Item = S>) -> Self {
        Self::HasSystems(ids.into_iter().map(Into::into).collect())
    }

    pub fn has(path: impl Into<NodePath>) -> Self {
        Self::Has(path.into())
    }

    pub fn at(path: impl Into<NodePath>, term: Rule) -> Self {
        Self::As(path.into(), Box::new(term))
    }

    pub fn at_root(path: impl Into<NodePath>, term: Rule) -> Self {
        Self::AsRoot(path.into(), Box::new(term))
    }

    pub fn as_parent(term: Rule) -> Self {
        Self::AsParent(Box::new(term))
    }

    pub fn custom(term: impl RuleTerm + 'static) -> Self {
        Self::Custom(Arc::new(term))
    }

    /// Evaluates the rule against `target`.
    pub fn applies(&self, target: &NodeRef<'_>, ctx: &RuleContext<'_>) -> bool {
        match self {
            Self::Constant(value) => *value,
            Self::Not(term) => !term.applies(target, ctx),
            Self::And(terms) => terms.iter().all(|t| t.applies(target, ctx)),
            Self::Or(terms) => terms.iter().any(|t| t.applies(target, ctx)),
            Self::HasTags(tags) => tags.iter().any(|t| target.value().has_tag(t)),
            Self::HasSystems(ids) => ids.iter().any(|id| target.value().has_system(id)),
            Self::IsComplete => target.node().complete(),
            Self::IsRoot => target.is_root(),
            Self::Has(path) => target.node_at(path).is_some(),
            Self::As(path, term) => {
                if path.is_empty() {
                    return term.applies(target, ctx);
                }
                Self::applies_at(target.node_at(path), term)
            }
            Self::AsRoot(path, term) => Self::applies_at(target.root().node_at(path), term),
            Self::AsParent(term) => ctx
                .parent()
                .is_some_and(|parent| term.applies(parent, &RuleContext::of(parent))),
            Self::Custom(term) => term.applies(target, ctx),
        }
    }

    /// Applies `term` to a navigated-to node, in that node's own context.
    fn applies_at(resolved: Option<NodeRef<'_>>, term: &Rule) -> bool {
        resolved.is_some_and(|node| term.applies(&node, &RuleContext::of(&node)))
    }
}
