//! Attribute sets, backed by an ordered map so enumeration is always
//! lexicographic by attribute name.

use std::collections::BTreeMap;

use smol_str::SmolStr;

use super::Value;

#[derive(Clone, Debug, Default)]
pub struct NixAttrs(pub(crate) BTreeMap<SmolStr, Value>);

impl NixAttrs {
    pub fn select(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SmolStr, &Value)> {
        self.0.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &SmolStr> {
        self.0.keys()
    }

    /// The right-biased union used by the `//` operator.
    pub fn update(&self, other: &NixAttrs) -> NixAttrs {
        let mut merged = self.0.clone();
        for (name, value) in &other.0 {
            merged.insert(name.clone(), value.clone());
        }
        NixAttrs(merged)
    }
}

impl FromIterator<(SmolStr, Value)> for NixAttrs {
    fn from_iter<T: IntoIterator<Item = (SmolStr, Value)>>(iter: T) -> Self {
        NixAttrs(iter.into_iter().collect())
    }
}
