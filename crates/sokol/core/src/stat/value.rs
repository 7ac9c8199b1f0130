//! Stat values and the operators that combine them.

use serde::{Deserialize, Serialize};

use super::StatError;

/// Type of a stat, inferred from its operands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum StatKind {
    Number,
    Flag,
    Text,
    List,
}

impl StatKind {
    /// Starting state for a chain that does not open with `=`.
    pub fn identity(self) -> StatValue {
        match self {
            Self::Number => StatValue::Number(0.0),
            Self::Flag => StatValue::Flag(false),
            Self::Text => StatValue::Text(String::new()),
            Self::List => StatValue::List(Vec::new()),
        }
    }
}

/// A resolved or operand stat value.
///
/// Untagged in data files: `10.0`, `true`, `"text"`, `["a", "b"]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatValue {
    Flag(bool),
    Number(f64),
    Text(String),
    List(Vec<String>),
}

impl StatValue {
    pub fn kind(&self) -> StatKind {
        match self {
            Self::Flag(_) => StatKind::Flag,
            Self::Number(_) => StatKind::Number,
            Self::Text(_) => StatKind::Text,
            Self::List(_) => StatKind::List,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            Self::Flag(b) => Some(*b),
            _ => None,
        }
    }
}

impl From<f64> for StatValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for StatValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

impl From<&str> for StatValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for StatValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<String>> for StatValue {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

/// One link of a stat's computation chain: an operator and its operand.
///
/// | op    | number | flag | text   | list   |
/// |-------|--------|------|--------|--------|
/// | `=`   | yes    | yes  | yes    | yes    |
/// | `+`   | yes    |      | concat | append |
/// | `-` `*` `/` `min` `max` | yes | | | |
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum StatOp {
    Set(StatValue),
    Add(StatValue),
    Sub(StatValue),
    Mul(StatValue),
    Div(StatValue),
    /// Caps the current value at the operand.
    Min(StatValue),
    /// Floors the current value at the operand.
    Max(StatValue),
}

impl StatOp {
    pub fn set(value: impl Into<StatValue>) -> Self {
        Self::Set(value.into())
    }

    pub fn add(value: impl Into<StatValue>) -> Self {
        Self::Add(value.into())
    }

    pub fn sub(value: impl Into<StatValue>) -> Self {
        Self::Sub(value.into())
    }

    pub fn mul(value: impl Into<StatValue>) -> Self {
        Self::Mul(value.into())
    }

    pub fn div(value: impl Into<StatValue>) -> Self {
        Self::Div(value.into())
    }

    pub fn min(value: impl Into<StatValue>) -> Self {
        Self::Min(value.into())
    }

    pub fn max(value: impl Into<StatValue>) -> Self {
        Self::Max(value.into())
    }

    /// Parses an operator symbol as written in configuration.
    pub fn from_symbol(symbol: &str, operand: StatValue) -> Result<Self, StatError> {
        let op = match symbol {
            "=" => Self::Set(operand),
            "+" => Self::Add(operand),
            "-" => Self::Sub(operand),
            "*" => Self::Mul(operand),
            "/" => Self::Div(operand),
            "min" => Self::Min(operand),
            "max" => Self::Max(operand),
            other => return Err(StatError::UnknownOperator(other.to_owned())),
        };
        op.validate()?;
        Ok(op)
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Set(_) => "=",
            Self::Add(_) => "+",
            Self::Sub(_) => "-",
            Self::Mul(_) => "*",
            Self::Div(_) => "/",
            Self::Min(_) => "min",
            Self::Max(_) => "max",
        }
    }

    pub fn operand(&self) -> &StatValue {
        match self {
            Self::Set(v)
            | Self::Add(v)
            | Self::Sub(v)
            | Self::Mul(v)
            | Self::Div(v)
            | Self::Min(v)
            | Self::Max(v) => v,
        }
    }

    pub fn kind(&self) -> StatKind {
        self.operand().kind()
    }

    /// Returns true if `=` discards everything earlier in the chain.
    pub fn discards(&self) -> bool {
        matches!(self, Self::Set(_))
    }

    /// Checks the operator is defined for its operand's kind.
    pub fn validate(&self) -> Result<(), StatError> {
        let supported = match (self, self.kind()) {
            (Self::Set(_), _) => true,
            (_, StatKind::Number) => true,
            (Self::Add(_), StatKind::Text | StatKind::List) => true,
            _ => false,
        };
        if supported {
            Ok(())
        } else {
            Err(StatError::InvalidOperator {
                op: self.symbol(),
                kind: self.kind(),
            })
        }
    }

    /// Applies this link to the chain state so far.
    ///
    /// `current` must be of the same kind as the operand; an absent state
    /// starts from [`StatKind::identity`].
    pub(crate) fn apply(&self, current: Option<StatValue>) -> StatValue {
        let operand = self.operand();
        if self.discards() {
            return operand.clone();
        }

        let base = current.unwrap_or_else(|| operand.kind().identity());
        match (self, base, operand) {
            (Self::Add(_), StatValue::Number(a), StatValue::Number(b)) => StatValue::Number(a + b),
            (Self::Sub(_), StatValue::Number(a), StatValue::Number(b)) => StatValue::Number(a - b),
            (Self::Mul(_), StatValue::Number(a), StatValue::Number(b)) => StatValue::Number(a * b),
            (Self::Div(_), StatValue::Number(a), StatValue::Number(b)) => StatValue::Number(a / b),
            (Self::Min(_), StatValue::Number(a), StatValue::Number(b)) => {
                StatValue::Number(a.min(*b))
            }
            (Self::Max(_), StatValue::Number(a), StatValue::Number(b)) => {
                StatValue::Number(a.max(*b))
            }
            (Self::Add(_), StatValue::Text(mut a), StatValue::Text(b)) => {
                a.push_str(b);
                StatValue::Text(a)
            }
            (Self::Add(_), StatValue::List(mut a), StatValue::List(b)) => {
                a.extend(b.iter().cloned());
                StatValue::List(a)
            }
            // Unvalidated or mismatched link: leave the state as is.
            (_, base, _) => base,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbols_parse() {
        let op = StatOp::from_symbol("+", 5.0.into()).unwrap();
        assert_eq!(op, StatOp::add(5.0));
        assert_eq!(op.symbol(), "+");

        assert_eq!(
            StatOp::from_symbol("%", 5.0.into()),
            Err(StatError::UnknownOperator("%".into()))
        );
    }

    #[test]
    fn operators_are_checked_per_kind() {
        assert!(StatOp::set(true).validate().is_ok());
        assert!(StatOp::add("suffix").validate().is_ok());
        assert!(StatOp::add(vec!["a".to_owned()]).validate().is_ok());
        assert!(StatOp::min(3.0).validate().is_ok());

        assert_eq!(
            StatOp::add(true).validate(),
            Err(StatError::InvalidOperator {
                op: "+",
                kind: StatKind::Flag
            })
        );
        assert!(StatOp::mul("x").validate().is_err());
    }

    #[test]
    fn numeric_links() {
        assert_eq!(StatOp::add(2.0).apply(None), StatValue::Number(2.0));
        assert_eq!(
            StatOp::mul(3.0).apply(Some(StatValue::Number(2.0))),
            StatValue::Number(6.0)
        );
        assert_eq!(
            StatOp::min(4.0).apply(Some(StatValue::Number(10.0))),
            StatValue::Number(4.0)
        );
        assert_eq!(
            StatOp::max(4.0).apply(Some(StatValue::Number(1.0))),
            StatValue::Number(4.0)
        );
        assert_eq!(
            StatOp::set(1.0).apply(Some(StatValue::Number(99.0))),
            StatValue::Number(1.0)
        );
    }

    #[test]
    fn text_and_list_links() {
        assert_eq!(
            StatOp::add(" mk2").apply(Some("rifle".into())),
            StatValue::Text("rifle mk2".into())
        );
        assert_eq!(
            StatOp::add(vec!["b".to_owned()]).apply(Some(vec!["a".to_owned()].into())),
            StatValue::List(vec!["a".into(), "b".into()])
        );
    }

    #[test]
    fn untagged_values_deserialize() {
        let values: Vec<StatValue> = serde_json::from_str(r#"[1.5, 3, true, "x", ["a"]]"#).unwrap();
        assert_eq!(
            values,
            vec![
                StatValue::Number(1.5),
                StatValue::Number(3.0),
                StatValue::Flag(true),
                StatValue::Text("x".into()),
                StatValue::List(vec!["a".into()]),
            ]
        );
    }
}
