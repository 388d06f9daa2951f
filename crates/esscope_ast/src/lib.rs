//! esscope_ast: Syntax tree definitions for ECMAScript sources.
//!
//! Contains the token kinds produced by the scanner, the arena-allocated
//! node model produced by the parser and rewritten by the scope resolver,
//! operator enums, and structural comparison of trees.

pub mod compare;
pub mod node;
pub mod operators;
pub mod syntax_kind;
pub mod types;

pub use compare::shape_eq;
pub use node::{Node, NodeKind};
pub use syntax_kind::SyntaxKind;
