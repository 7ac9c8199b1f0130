//! Stat system.
//!
//! Components declare stats as [`StatLayer`]s: a [`StatMap`] of operator
//! chains, gated by an optional rule and placed by a [`Priority`]. A build pass
//! gathers the active layers of a node and its descendants and merges them:
//!
//! ```text
//! [ forward layers, ascending priority ]
//!      ↓
//! [ reverse layers, ascending priority ]
//!      ↓
//! [ StatMap: key → chain, folded on read ]
//! ```
//!
//! Merging never overwrites; it appends to the key's chain, so `=` followed by
//! `+` always resolves to the sum regardless of where the entries came from.

pub mod layer;
pub mod map;
pub mod value;

pub use layer::{Priority, StatLayer, StatLists, resolve};
pub use map::{StatMap, StatNode};
pub use value::{StatKind, StatOp, StatValue};

use crate::error::{ErrorSeverity, SokolError};

/// Errors raised while building or reading stats.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum StatError {
    /// A stat the caller relies on has no entries.
    #[error("stat `{0}` has no value")]
    Missing(String),

    #[error("unknown stat operator `{0}`")]
    UnknownOperator(String),

    #[error("operator `{op}` is not defined for {kind} stats")]
    InvalidOperator { op: &'static str, kind: StatKind },

    #[error("expected a {expected} operand, found {found}")]
    KindMismatch { expected: StatKind, found: StatKind },

    #[error("stat `{key}` is a {expected} stat, found a {found} operand")]
    KeyedKindMismatch {
        key: String,
        expected: StatKind,
        found: StatKind,
    },
}

impl StatError {
    pub(crate) fn for_key(self, key: &str) -> Self {
        match self {
            Self::KindMismatch { expected, found } => Self::KeyedKindMismatch {
                key: key.to_owned(),
                expected,
                found,
            },
            other => other,
        }
    }
}

impl SokolError for StatError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Missing(_) => ErrorSeverity::Internal,
            _ => ErrorSeverity::Validation,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Missing(_) => "STAT_MISSING",
            Self::UnknownOperator(_) => "STAT_UNKNOWN_OPERATOR",
            Self::InvalidOperator { .. } => "STAT_INVALID_OPERATOR",
            Self::KindMismatch { .. } | Self::KeyedKindMismatch { .. } => "STAT_KIND_MISMATCH",
        }
    }
}
