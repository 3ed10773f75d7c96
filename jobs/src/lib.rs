//! Job discovery for a Hydra-style continuous integration system.
//!
//! Given the root value of a lazily evaluated jobset expression, this
//! crate walks the attribute tree it describes, resolves every
//! derivation it finds into a job descriptor, and collects the results
//! into a path-keyed document. A broken subtree never aborts the walk;
//! its failure is recorded as an error entry at exactly the attribute
//! path where it occurred.
//!
//! The evaluator itself is a collaborator, not part of this crate: all
//! forcing, enumeration and coercion happens through the capability
//! traits in [`evaluator`], so the core never owns evaluator memory.

mod aggregate;
mod classify;
mod document;
mod errors;
mod evaluator;
mod meta;
mod path;
mod roots;
mod walker;

#[cfg(test)]
mod test_utils;

pub use crate::document::{Entry, JobDescriptor, ResultDocument};
pub use crate::errors::{Error, Result};
pub use crate::evaluator::{ContextMarker, Evaluator, Job, ValueKind};
pub use crate::path::AttrPath;
pub use crate::roots::GcRootsDir;
pub use crate::walker::{discover_jobs, Walker};
