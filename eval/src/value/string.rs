//! Strings and their dependency context.
//!
//! A string remembers which store-level artefacts its text refers to.
//! Context elements survive concatenation and interpolation, which is
//! what lets a consumer coerce a value to a string and then inspect the
//! derivations that text depends on.

use std::fmt;

use rustc_hash::FxHashSet;

/// One dependency carried by a string.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum NixContextElement {
    /// A plain store path, e.g. an imported source tree.
    Plain(String),

    /// A single output of a derivation, named by output and recipe
    /// path.
    Single { name: String, derivation: String },

    /// A whole derivation, as produced by referencing its `drvPath`.
    Derivation(String),
}

/// The set of dependencies carried by a string.
#[derive(Clone, Debug, Default)]
pub struct NixContext(FxHashSet<NixContextElement>);

impl NixContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn append(&mut self, element: NixContextElement) {
        self.0.insert(element);
    }

    /// Copies all context elements of `other` into this context.
    pub fn mimic(&mut self, other: &NixString) {
        self.0.extend(other.context().iter().cloned());
    }

    pub fn iter(&self) -> impl Iterator<Item = &NixContextElement> {
        self.0.iter()
    }
}

impl FromIterator<NixContextElement> for NixContext {
    fn from_iter<T: IntoIterator<Item = NixContextElement>>(iter: T) -> Self {
        NixContext(iter.into_iter().collect())
    }
}

#[derive(Clone, Debug, Default)]
pub struct NixString {
    text: String,
    context: NixContext,
}

impl NixString {
    pub fn new(text: String, context: NixContext) -> Self {
        NixString { text, context }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn context(&self) -> &NixContext {
        &self.context
    }

    pub fn concat(&self, other: &NixString) -> NixString {
        let mut context = self.context.clone();
        context.mimic(other);
        NixString {
            text: format!("{}{}", self.text, other.text),
            context,
        }
    }
}

impl From<&str> for NixString {
    fn from(text: &str) -> Self {
        NixString {
            text: text.to_string(),
            context: NixContext::new(),
        }
    }
}

impl From<String> for NixString {
    fn from(text: String) -> Self {
        NixString {
            text,
            context: NixContext::new(),
        }
    }
}

// Equality and ordering ignore context, matching the language's
// observable string semantics.
impl PartialEq for NixString {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl Eq for NixString {}

impl PartialOrd for NixString {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for NixString {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.text.cmp(&other.text)
    }
}

impl fmt::Display for NixString {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.text.fmt(f)
    }
}
