use std::fmt::{self, Display};

use serde::Serialize;

/// A dot-joined attribute path addressing one node of the jobset tree.
///
/// The empty path denotes the root. Paths double as the key space of
/// the result document: every entry is keyed by exactly one path.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct AttrPath(String);

impl AttrPath {
    pub fn root() -> Self {
        AttrPath(String::new())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Extends the path by one attribute name.
    pub fn child(&self, name: &str) -> Self {
        if self.is_root() {
            AttrPath(name.to_string())
        } else {
            AttrPath(format!("{}.{}", self.0, name))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for AttrPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AttrPath {
    fn from(path: &str) -> Self {
        AttrPath(path.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_is_empty() {
        assert!(AttrPath::root().is_root());
        assert_eq!(AttrPath::root().as_str(), "");
    }

    #[test]
    fn child_extends_with_dots() {
        let path = AttrPath::root().child("a").child("b").child("c");
        assert_eq!(path.as_str(), "a.b.c");
        assert!(!path.is_root());
    }

    #[test]
    fn child_of_root_has_no_leading_dot() {
        assert_eq!(AttrPath::root().child("pkgs").as_str(), "pkgs");
    }
}
