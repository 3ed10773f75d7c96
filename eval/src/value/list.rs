//! Lists. Elements stay lazy until individually forced.

use super::Value;

#[derive(Clone, Debug, Default)]
pub struct NixList(pub(crate) Vec<Value>);

impl NixList {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.0.iter()
    }

    pub fn concat(&self, other: &NixList) -> NixList {
        let mut items = self.0.clone();
        items.extend(other.0.iter().cloned());
        NixList(items)
    }
}

impl From<Vec<Value>> for NixList {
    fn from(items: Vec<Value>) -> Self {
        NixList(items)
    }
}

impl FromIterator<Value> for NixList {
    fn from_iter<T: IntoIterator<Item = Value>>(iter: T) -> Self {
        NixList(iter.into_iter().collect())
    }
}

impl IntoIterator for NixList {
    type Item = Value;
    type IntoIter = std::vec::IntoIter<Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
