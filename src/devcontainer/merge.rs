//! Layered configuration merge
//!
//! Documents are folded left to right. For each pair of values:
//! - a missing (or `null`) side yields the other side
//! - objects merge key by key, recursively
//! - arrays concatenate, existing elements first, without de-duplication
//! - anything else is overwritten by the incoming value, unless
//!   [`MergeMode::Strict`] is used and the kinds differ
//!
//! Top-level lifecycle hooks are chained as shell commands with `; `.

use crate::error::MergeError;
use serde_json::{Map, Value};
use tracing::warn;

/// A configuration document: a JSON object
pub type ConfigDocument = Map<String, Value>;

/// Command properties chained instead of overwritten
pub const LIFECYCLE_HOOKS: [&str; 6] = [
    "initializeCommand",
    "onCreateCommand",
    "updateContentCommand",
    "postCreateCommand",
    "postStartCommand",
    "postAttachCommand",
];

/// Separator between chained hook commands
pub const HOOK_SEPARATOR: &str = "; ";

/// How values of different kinds are reconciled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MergeMode {
    /// The incoming value wins on any conflict
    #[default]
    Lenient,
    /// A kind mismatch is a [`MergeError::TypeConflict`]
    Strict,
}

/// Returns true if `key` is a lifecycle hook property
pub fn is_lifecycle_hook(key: &str) -> bool {
    LIFECYCLE_HOOKS.contains(&key)
}

/// Name of a value's JSON kind, used in error messages
pub fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Fold an ordered sequence of documents into one
pub fn merge(documents: &[ConfigDocument], mode: MergeMode) -> Result<ConfigDocument, MergeError> {
    let mut documents = documents.iter();
    let Some(first) = documents.next() else {
        return Ok(ConfigDocument::new());
    };

    documents.try_fold(first.clone(), |merged, incoming| {
        merge_pair(merged, incoming, mode)
    })
}

/// Merge `incoming` into `existing`, chaining top-level lifecycle hooks
pub fn merge_pair(
    mut existing: ConfigDocument,
    incoming: &ConfigDocument,
    mode: MergeMode,
) -> Result<ConfigDocument, MergeError> {
    merge_into(&mut existing, incoming.clone(), "", mode, true)?;
    Ok(existing)
}

/// Combine two values according to the merge rules (no hook chaining)
pub fn combine(existing: Value, incoming: Value, mode: MergeMode) -> Result<Value, MergeError> {
    combine_at("", existing, incoming, mode)
}

fn combine_at(
    path: &str,
    existing: Value,
    incoming: Value,
    mode: MergeMode,
) -> Result<Value, MergeError> {
    match (existing, incoming) {
        (Value::Null, incoming) => Ok(incoming),
        (existing, Value::Null) => Ok(existing),
        (Value::Object(mut existing), Value::Object(incoming)) => {
            merge_into(&mut existing, incoming, path, mode, false)?;
            Ok(Value::Object(existing))
        }
        (Value::Array(mut existing), Value::Array(incoming)) => {
            existing.extend(incoming);
            Ok(Value::Array(existing))
        }
        (existing, incoming) => {
            let (existing_kind, incoming_kind) = (kind_name(&existing), kind_name(&incoming));
            if mode == MergeMode::Strict && existing_kind != incoming_kind {
                return Err(MergeError::type_conflict(
                    display_path(path),
                    existing_kind,
                    incoming_kind,
                ));
            }
            Ok(incoming)
        }
    }
}

/// Merge object entries in place; key order is existing keys, then new incoming keys
fn merge_into(
    target: &mut ConfigDocument,
    incoming: ConfigDocument,
    path: &str,
    mode: MergeMode,
    chain_hooks: bool,
) -> Result<(), MergeError> {
    for (key, incoming_value) in incoming {
        let child_path = if path.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", path, key)
        };

        match target.get_mut(&key) {
            Some(slot) => {
                let current = std::mem::take(slot);
                *slot = if chain_hooks && is_lifecycle_hook(&key) {
                    chain_hook(&key, current, incoming_value, mode)?
                } else {
                    combine_at(&child_path, current, incoming_value, mode)?
                };
            }
            None => {
                target.insert(key, incoming_value);
            }
        }
    }
    Ok(())
}

// Only the string form of a hook can be chained. Array and object forms are
// reported instead of being coerced into a command string.
fn chain_hook(key: &str, existing: Value, incoming: Value, mode: MergeMode) -> Result<Value, MergeError> {
    match (existing, incoming) {
        (Value::Null, value) | (value, Value::Null) => Ok(value),
        (Value::String(first), Value::String(second)) => {
            Ok(Value::String(format!("{}{}{}", first, HOOK_SEPARATOR, second)))
        }
        (existing, incoming) => {
            let found = if existing.is_string() {
                kind_name(&incoming)
            } else {
                kind_name(&existing)
            };
            match mode {
                MergeMode::Strict => Err(MergeError::UnsupportedHookForm {
                    key: key.to_string(),
                    found,
                }),
                MergeMode::Lenient => {
                    warn!(hook = key, found, "lifecycle hook is not a command string, incoming value replaces it");
                    Ok(incoming)
                }
            }
        }
    }
}

fn display_path(path: &str) -> &str {
    if path.is_empty() {
        "<root>"
    } else {
        path
    }
}
