//! esscope_scanner: Lexer for ECMAScript 5 source text.
//!
//! Produces [`SyntaxKind`](esscope_ast::SyntaxKind) tokens one at a time for
//! the parser, with:
//! - preceding line break flags for automatic semicolon insertion
//! - decoded string literal values
//! - regular expression literals on request (`rescan_slash_token`)
//! - Unicode identifiers

mod char_codes;
mod scanner;

pub use char_codes::{is_identifier_part, is_identifier_start, is_line_break};
pub use scanner::Scanner;
