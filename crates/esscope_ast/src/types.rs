//! Flag types shared by the scanner and parser.

bitflags::bitflags! {
    /// Flags describing the current token.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TokenFlags: u32 {
        const NONE                  = 0;
        const PRECEDING_LINE_BREAK  = 1 << 0;
        const UNTERMINATED          = 1 << 1;
        const SCIENTIFIC            = 1 << 2;
        const HEX_SPECIFIER         = 1 << 3;
        const OCTAL_SPECIFIER       = 1 << 4;
        const BINARY_SPECIFIER      = 1 << 5;
        const CONTAINS_ESCAPE       = 1 << 6;
    }
}
