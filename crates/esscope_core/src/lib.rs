//! esscope_core: Core utilities shared by every esscope crate.
//!
//! Provides the node arena and source position types (text ranges and
//! line maps) used by the scanner, parser, and scope resolver.

pub mod arena;
pub mod text;

// Re-export commonly used types
pub use arena::AstArena;
pub use text::{LineMap, TextRange};
