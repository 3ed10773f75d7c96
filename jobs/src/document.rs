//! The path-keyed result document emitted at the end of a discovery
//! run.

use std::collections::btree_map::{self, BTreeMap};
use std::io::{self, Write};

use serde::Serialize;

use crate::path::AttrPath;

/// Everything known about one discovered job. Constructed completely
/// before it is written into the document, so a failure halfway through
/// metadata extraction can never leak partial fields into the output.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct JobDescriptor {
    #[serde(rename = "nixName")]
    pub nix_name: String,

    pub system: String,

    #[serde(rename = "drvPath")]
    pub drv_path: String,

    pub description: String,
    pub license: String,
    pub homepage: String,
    pub maintainers: String,

    #[serde(rename = "schedulingPriority")]
    pub scheduling_priority: i64,

    /// Build timeout in seconds.
    pub timeout: i64,

    /// Maximum time in seconds without output before the build is
    /// killed.
    #[serde(rename = "maxSilent")]
    pub max_silent: i64,

    #[serde(rename = "isChannel")]
    pub is_channel: bool,

    /// Space-joined recipe paths of the constituent jobs; present only
    /// for aggregate jobs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constituents: Option<String>,

    /// Output name to output path.
    pub outputs: BTreeMap<String, String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Entry {
    Job(JobDescriptor),
    Error { error: String },
}

/// Accumulates entries keyed by attribute path.
///
/// Append-only with a single writer per path: the walker visits every
/// path at most once, so inserting a path twice is a logic error.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ResultDocument {
    entries: BTreeMap<AttrPath, Entry>,
}

impl ResultDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_job(&mut self, path: AttrPath, job: JobDescriptor) {
        self.insert(path, Entry::Job(job));
    }

    pub fn insert_error(&mut self, path: AttrPath, message: String) {
        self.insert(path, Entry::Error { error: message });
    }

    fn insert(&mut self, path: AttrPath, entry: Entry) {
        match self.entries.entry(path) {
            btree_map::Entry::Vacant(slot) => {
                slot.insert(entry);
            }
            btree_map::Entry::Occupied(slot) => {
                debug_assert!(false, "path '{}' written twice", slot.key());
            }
        }
    }

    pub fn get(&self, path: &AttrPath) -> Option<&Entry> {
        self.entries.get(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AttrPath, &Entry)> {
        self.entries.iter()
    }

    pub fn job_count(&self) -> usize {
        self.entries
            .values()
            .filter(|e| matches!(e, Entry::Job(_)))
            .count()
    }

    pub fn error_count(&self) -> usize {
        self.entries
            .values()
            .filter(|e| matches!(e, Entry::Error { .. }))
            .count()
    }

    /// Serializes the document as a single JSON object whose keys are
    /// dotted attribute paths.
    pub fn write_json<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        serde_json::to_writer(&mut *writer, self)?;
        writeln!(writer)
    }
}
