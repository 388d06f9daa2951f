//! esscope_parser: Recursive descent parser for ECMAScript 5.
//!
//! Parses the token stream of the scanner into an arena-allocated tree of
//! ESTree-shaped [`Node`]s, each annotated with its 1-based source line.

mod parser;
mod precedence;

pub use parser::{parse, Parser};
