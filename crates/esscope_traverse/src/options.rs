//! Traversal configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::OptionsError;

/// Options controlling scope resolution. Loaded from JSON with camelCase
/// keys; an empty object gives the defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct TraverseOptions {
    /// Declare every `var` and function declaration of a function body (or
    /// the program) before walking it, so forward references resolve.
    pub hoist_declarations: bool,
    /// Bind an undeclared `x = ...` target in the global scope.
    pub implicit_globals: bool,
}

impl Default for TraverseOptions {
    fn default() -> Self {
        Self {
            hoist_declarations: true,
            implicit_globals: true,
        }
    }
}

impl TraverseOptions {
    pub fn from_json_str(content: &str) -> Result<Self, OptionsError> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, OptionsError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| OptionsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content)
    }
}
