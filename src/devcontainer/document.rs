//! devcontainer.json documents
//!
//! Loads the project's devcontainer.json (comments allowed), merges feature
//! fragments into it and folds properties the image build cannot express
//! into `runArgs`.

use crate::devcontainer::jsonc;
use crate::devcontainer::merge::{merge_pair, ConfigDocument, MergeMode};
use crate::error::MergeError;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Locations probed for devcontainer.json, relative to the application folder
pub const DEVCONTAINER_JSON_CANDIDATES: [&str; 3] = [
    ".devcontainer/devcontainer.json",
    ".devcontainer.json",
    "devcontainer.json",
];

/// Find the devcontainer.json of an application folder
pub fn find_devcontainer_json(app_dir: &Path) -> Option<PathBuf> {
    DEVCONTAINER_JSON_CANDIDATES
        .iter()
        .map(|candidate| app_dir.join(candidate))
        .find(|path| path.is_file())
}

/// A devcontainer.json document and where it came from
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DevContainer {
    pub properties: ConfigDocument,
    pub path: Option<PathBuf>,
}

impl DevContainer {
    /// Create an empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the devcontainer.json of an application folder, if there is one
    pub fn load(app_dir: &Path) -> Result<Option<Self>, MergeError> {
        match find_devcontainer_json(app_dir) {
            Some(path) => Self::from_path(&path).map(Some),
            None => {
                debug!(dir = %app_dir.display(), "no devcontainer.json found");
                Ok(None)
            }
        }
    }

    /// Read a document from a file
    pub fn from_path(path: &Path) -> Result<Self, MergeError> {
        let content = std::fs::read_to_string(path).map_err(|e| MergeError::read(path, e))?;
        let mut document = Self::parse(&content, path)?;
        document.path = Some(path.to_path_buf());
        Ok(document)
    }

    /// Parse document text; `origin` is only used in error messages
    pub fn parse(content: &str, origin: &Path) -> Result<Self, MergeError> {
        match jsonc::parse(content, origin)? {
            Value::Object(properties) => Ok(Self {
                properties,
                path: None,
            }),
            _ => Err(MergeError::NotAnObject {
                path: origin.to_path_buf(),
            }),
        }
    }

    /// Merge another document into this one, incoming values winning
    pub fn merge(&mut self, other: &DevContainer) -> Result<(), MergeError> {
        self.merge_properties(&other.properties, MergeMode::Lenient)
    }

    /// Merge a property map into this document
    pub fn merge_properties(
        &mut self,
        incoming: &ConfigDocument,
        mode: MergeMode,
    ) -> Result<(), MergeError> {
        let existing = std::mem::take(&mut self.properties);
        self.properties = merge_pair(existing, incoming, mode)?;
        Ok(())
    }

    /// Fold `privileged`, `init`, `capAdd` and `securityOpt` into `runArgs`
    pub fn convert_unsupported_properties_to_run_args(&mut self) {
        let mut run_args: Vec<String> = match self.properties.get("runArgs") {
            Some(Value::Array(items)) => items.iter().map(value_to_arg).collect(),
            _ => Vec::new(),
        };

        if let Some(value) = self.properties.shift_remove("privileged") {
            if value == Value::Bool(true) {
                add_unique(&mut run_args, "--privileged".to_string());
            }
        }
        if let Some(value) = self.properties.shift_remove("init") {
            if value == Value::Bool(true) {
                add_unique(&mut run_args, "--init".to_string());
            }
        }
        if let Some(Value::Array(caps)) = self.properties.shift_remove("capAdd") {
            for cap in &caps {
                add_unique(&mut run_args, format!("--cap-add={}", value_to_arg(cap)));
            }
        }
        if let Some(Value::Array(opts)) = self.properties.shift_remove("securityOpt") {
            for opt in &opts {
                add_unique(&mut run_args, format!("--security-opt={}", value_to_arg(opt)));
            }
        }

        self.properties.insert(
            "runArgs".to_string(),
            Value::Array(run_args.into_iter().map(Value::String).collect()),
        );
    }

    /// Serialize the document as pretty-printed JSON
    pub fn to_json_pretty(&self) -> String {
        // A map of JSON values always serializes
        serde_json::to_string_pretty(&self.properties).unwrap_or_default()
    }
}

fn value_to_arg(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn add_unique(args: &mut Vec<String>, arg: String) {
    if !args.contains(&arg) {
        args.push(arg);
    }
}
