use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Sequence of slot keys leading from a node to one of its descendants.
///
/// Written as `"grip/sight"` in text; the empty path names the node itself.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodePath(Vec<String>);

impl NodePath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.0.iter().map(String::as_str)
    }

    pub fn push(&mut self, key: impl Into<String>) {
        self.0.push(key.into());
    }

    /// This path extended by `key`.
    pub fn child(&self, key: impl Into<String>) -> Self {
        let mut path = self.clone();
        path.push(key);
        path
    }

    /// This path without its last key; `None` for the empty path.
    pub fn parent(&self) -> Option<Self> {
        let (_, rest) = self.0.split_last()?;
        Some(Self(rest.to_vec()))
    }
}

impl FromStr for NodePath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl From<&str> for NodePath {
    fn from(s: &str) -> Self {
        Self(
            s.split('/')
                .filter(|key| !key.is_empty())
                .map(str::to_owned)
                .collect(),
        )
    }
}

impl From<Vec<String>> for NodePath {
    fn from(keys: Vec<String>) -> Self {
        Self(keys)
    }
}

impl<'a> FromIterator<&'a str> for NodePath {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        Self(iter.into_iter().map(str::to_owned).collect())
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_displays() {
        let path: NodePath = "grip/sight".parse().unwrap();
        assert_eq!(path.len(), 2);
        assert_eq!(path.to_string(), "grip/sight");
        assert_eq!(NodePath::from("/grip//sight/"), path);
        assert!(NodePath::from("").is_empty());
    }

    #[test]
    fn parent_and_child() {
        let path = NodePath::from("a/b/c");
        assert_eq!(path.parent(), Some(NodePath::from("a/b")));
        assert_eq!(path.child("d").to_string(), "a/b/c/d");
        assert_eq!(NodePath::new().parent(), None);
    }
}
