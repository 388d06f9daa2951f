use std::path::PathBuf;

use thiserror::Error;

use crate::scope::ScopeId;

/// Errors that abort a traversal.
#[derive(Debug, Error)]
pub enum TraverseError {
    /// The walk reached syntax that lexical scope resolution does not model,
    /// such as `with`, `catch` parameters or block-scoped declarations.
    #[error("unsupported node type `{kind}` on line {line}")]
    UnsupportedNodeType { kind: &'static str, line: u32 },

    /// A scope was popped that is not the innermost active scope.
    #[error("scope stack mismatch: expected to pop {expected}, found {}", display_top(.found))]
    ScopeStackMismatch {
        expected: ScopeId,
        found: Option<ScopeId>,
    },

    /// The tree nests deeper than the walk follows.
    #[error("maximum nesting depth of {limit} exceeded on line {line}")]
    NestingTooDeep { line: u32, limit: usize },

    #[error("traversal root must be a Program, found `{kind}`")]
    RootNotProgram { kind: &'static str },

    /// The visitor returned an error; the walk stopped at that node.
    #[error("visitor failed on line {line}")]
    Visitor {
        line: u32,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

fn display_top(found: &Option<ScopeId>) -> String {
    match found {
        Some(id) => id.to_string(),
        None => "an empty stack".to_string(),
    }
}

/// Errors raised while loading [`TraverseOptions`](crate::TraverseOptions).
#[derive(Debug, Error)]
pub enum OptionsError {
    #[error("cannot read options file `{}`", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid options: {0}")]
    Json(#[from] serde_json::Error),
}
