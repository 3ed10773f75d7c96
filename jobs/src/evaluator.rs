//! The capability boundary between job discovery and the expression
//! evaluator.
//!
//! Discovery never owns evaluator memory: values stay opaque handles,
//! and everything the walker needs (forcing, enumeration, coercion,
//! derivation probing) goes through the [`Evaluator`] trait. This keeps
//! the core independent of the evaluator's memory model and lets tests
//! drive the walker with a trivial in-memory implementation.

use crate::errors::Result;

/// The kind of a value once it has been forced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueKind {
    AttrSet,
    List,
    String,
    Integer,
    Bool,
    Null,
    /// Anything discovery has no use for (functions, floats, paths, …).
    Other,
}

/// A dependency marker picked up while coercing a value to a string.
///
/// The evaluator encodes "this string came from that derivation" in its
/// string context; the coercion capability surfaces those entries in
/// structured form so no caller has to parse the raw encoding.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ContextMarker {
    /// A single output of a derivation.
    Output { output: String, drv_path: String },

    /// A reference to a whole derivation, as produced by coercing its
    /// `drvPath`.
    Derivation(String),

    /// A plain store path (e.g. sources copied to the store).
    Plain(String),
}

/// Evaluator capabilities consumed by the tree walker.
///
/// All methods that take a value force it first; forcing is memoized by
/// the evaluator, so repeated calls on the same handle are cheap.
/// Recoverable evaluation failures surface as [`crate::Error::Evaluation`].
pub trait Evaluator {
    /// An opaque, cheaply clonable handle to a lazily evaluated value.
    type Value: Clone;

    /// A derivation recognized by [`Evaluator::as_job`].
    type Job: Job<Value = Self::Value>;

    /// Fails with [`crate::Error::Interrupted`] if an interruption was
    /// requested. Called at the top of every visit.
    fn check_interrupt(&self) -> Result<()>;

    /// Auto-calls a function that declares formal arguments, using the
    /// configured default bindings; any other value passes through
    /// unchanged.
    fn auto_call(&self, value: &Self::Value) -> Result<Self::Value>;

    /// Forces the value and reports its evaluated kind.
    fn force(&self, value: &Self::Value) -> Result<ValueKind>;

    /// Human-readable type name of a forced value, for diagnostics.
    fn type_name(&self, value: &Self::Value) -> &'static str;

    /// Probes a forced attribute set for the derivation shape.
    fn as_job(&self, value: &Self::Value) -> Result<Option<Self::Job>>;

    /// Named members of a forced attribute set. The order must be
    /// stable within a single run so output is reproducible.
    fn attrs(&self, value: &Self::Value) -> Result<Vec<(String, Self::Value)>>;

    /// Elements of a forced list, in order.
    fn list(&self, value: &Self::Value) -> Result<Vec<Self::Value>>;

    /// Looks up a member of a forced attribute set without forcing the
    /// member itself.
    fn lookup(&self, value: &Self::Value, name: &str) -> Result<Option<Self::Value>>;

    fn force_string(&self, value: &Self::Value) -> Result<String>;

    fn force_bool(&self, value: &Self::Value) -> Result<bool>;

    fn force_int(&self, value: &Self::Value) -> Result<i64>;

    /// Coerces a value to a string, collecting the dependency markers
    /// produced during coercion. Markers accumulate per invocation,
    /// never globally.
    fn coerce_to_string(&self, value: &Self::Value) -> Result<(String, Vec<ContextMarker>)>;
}

/// Query interface of a recognized derivation.
pub trait Job {
    type Value;

    fn name(&self) -> Result<String>;

    /// The target platform. Queries as the literal `"unknown"` when the
    /// derivation carries no `system` attribute.
    fn system(&self) -> Result<String>;

    /// The build recipe path. Empty when the derivation carries no
    /// `drvPath` attribute.
    fn drv_path(&self) -> Result<String>;

    /// Output name to output path, in stable order.
    fn outputs(&self) -> Result<Vec<(String, String)>>;

    /// A named metadata field, unforced.
    fn meta(&self, field: &str) -> Result<Option<Self::Value>>;
}
