//! Argument canonicalization.
//!
//! Call arguments must survive two trips: hashing into a uniqueness key, and
//! replay through the queue substrate when an attempt is rescheduled. Both
//! require a closed, order-preserving primitive form. Primitives pass through
//! unchanged, sequences recurse element-wise, and entity references collapse
//! to their opaque id. Anything else is a programmer error, rejected at the
//! conversion boundary.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::GuardError;

/// A caller-supplied argument, as a closed tagged union.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Null,
    Bool(bool),
    Int(i64),
    Str(String),
    /// Order-preserving; elements recurse.
    Seq(Vec<ArgValue>),
    /// A domain record; only its id survives canonicalization.
    Entity(EntityRef),
}

/// Reference to an entity by opaque id. The guard never inspects the id
/// beyond carrying it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityRef {
    pub id: String,
}

/// Anything with an opaque id can appear as a guard argument.
pub trait Entity {
    fn entity_id(&self) -> String;
}

impl ArgValue {
    pub fn entity<E: Entity>(entity: &E) -> Self {
        ArgValue::Entity(EntityRef {
            id: entity.entity_id(),
        })
    }

    /// Convert a JSON value arriving from outside (typically a replayed
    /// invocation coming back through the queue substrate). Floats and
    /// objects have no canonical form and are rejected.
    pub fn from_json(value: &Value) -> Result<Self, GuardError> {
        match value {
            Value::Null => Ok(ArgValue::Null),
            Value::Bool(b) => Ok(ArgValue::Bool(*b)),
            Value::Number(n) => n.as_i64().map(ArgValue::Int).ok_or_else(|| {
                GuardError::UnsupportedArgument(format!("non-integer number {n}"))
            }),
            Value::String(s) => Ok(ArgValue::Str(s.clone())),
            Value::Array(items) => items
                .iter()
                .map(Self::from_json)
                .collect::<Result<Vec<_>, _>>()
                .map(ArgValue::Seq),
            Value::Object(_) => Err(GuardError::UnsupportedArgument(
                "objects have no canonical form; pass an entity id instead".to_string(),
            )),
        }
    }
}

/// The persisted and replayable form of an argument: primitives and
/// sequences of primitives only. Serializes as plain JSON, so a replayed
/// argument list round-trips through any JSON-carrying queue payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CanonicalArg {
    Null,
    Bool(bool),
    Int(i64),
    Str(String),
    Seq(Vec<CanonicalArg>),
}

/// Reduce one argument to its canonical form.
pub fn canonicalize(arg: &ArgValue) -> CanonicalArg {
    match arg {
        ArgValue::Null => CanonicalArg::Null,
        ArgValue::Bool(b) => CanonicalArg::Bool(*b),
        ArgValue::Int(i) => CanonicalArg::Int(*i),
        ArgValue::Str(s) => CanonicalArg::Str(s.clone()),
        ArgValue::Seq(items) => CanonicalArg::Seq(items.iter().map(canonicalize).collect()),
        ArgValue::Entity(entity) => CanonicalArg::Str(entity.id.clone()),
    }
}

pub fn canonicalize_args(args: &[ArgValue]) -> Vec<CanonicalArg> {
    args.iter().map(canonicalize).collect()
}

/// Stable string form of a canonicalized argument list. Two identities are
/// "the same work" iff their operation names and this string are equal; the
/// uniqueness digest is computed over it.
pub fn canonical_string(args: &[CanonicalArg]) -> String {
    // The closed enum maps 1:1 onto JSON; serialization cannot fail.
    serde_json::to_string(args).expect("canonical args serialize to JSON")
}
