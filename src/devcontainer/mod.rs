//! devcontainer.json handling
//!
//! This module provides:
//! - JSON-with-comments parsing
//! - Left-fold merging of configuration documents
//! - Loading and rewriting of a project's devcontainer.json

mod document;
mod jsonc;
mod merge;

pub use document::{find_devcontainer_json, DevContainer, DEVCONTAINER_JSON_CANDIDATES};
pub use jsonc::{parse as parse_jsonc, standardize};
pub use merge::{
    combine, is_lifecycle_hook, kind_name, merge, merge_pair, ConfigDocument, MergeMode,
    HOOK_SEPARATOR, LIFECYCLE_HOOKS,
};
