//! esscope_traverse: Lexical scope resolution for ECMAScript syntax trees.
//!
//! [`traverse`] walks a parsed program once. It keeps a stack of global and
//! function scopes and records `var`, function and parameter declarations.
//! Every identifier use is rewritten in place into a shared reference to the
//! node that declared it. A caller-supplied visitor sees each node together
//! with the scope that is active at that point.

pub mod error;
mod dispatch;
mod hoist;
pub mod options;
pub mod scope;
pub mod scope_manager;
mod traverse;

pub use dispatch::MAX_NESTING_DEPTH;
pub use error::{OptionsError, TraverseError};
pub use options::TraverseOptions;
pub use scope::{Resolution, Scope, ScopeId, ScopeKind, ScopeRef};
pub use scope_manager::ScopeManager;
pub use traverse::{traverse, try_traverse, Traversal, VisitResult};
