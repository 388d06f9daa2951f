//! The ECMAScript scanner.
//!
//! Converts source text into tokens on demand. The parser drives it one token
//! at a time and asks it to rescan `/` and `/=` as regular expression literals
//! where the grammar expects an expression.

use crate::char_codes::*;
use esscope_ast::syntax_kind::SyntaxKind;
use esscope_ast::types::TokenFlags;
use esscope_core::text::TextRange;
use esscope_diagnostics::{messages, Diagnostic, DiagnosticCollection, DiagnosticMessage};

/// The scanner converts source text into tokens.
pub struct Scanner {
    /// The source text being scanned.
    text: Vec<char>,
    /// Current position in the text.
    pos: usize,
    /// Start of the current token (after leading trivia).
    token_start: usize,
    /// The current token kind.
    token: SyntaxKind,
    /// The text of the current token. Decoded for string literals.
    token_value: String,
    /// Token flags for the current token.
    token_flags: TokenFlags,
    /// Accumulated diagnostics.
    diagnostics: DiagnosticCollection,
}

impl Scanner {
    /// Create a new scanner for the given source text.
    pub fn new(text: &str) -> Self {
        Self {
            text: text.chars().collect(),
            pos: 0,
            token_start: 0,
            token: SyntaxKind::Unknown,
            token_value: String::new(),
            token_flags: TokenFlags::NONE,
            diagnostics: DiagnosticCollection::new(),
        }
    }

    /// Skip a `#!` line at the very beginning of the file.
    /// Call this before the first `scan()` call.
    pub fn skip_shebang(&mut self) {
        if self.pos == 0 && self.text.len() >= 2 && self.text[0] == '#' && self.text[1] == '!' {
            self.pos = 2;
            while !self.is_eof() && !is_line_break(self.text[self.pos]) {
                self.pos += 1;
            }
        }
    }

    /// Get the full source text length in characters.
    pub fn text_len(&self) -> usize {
        self.text.len()
    }

    /// Look ahead: save state, call f, restore state and return result.
    /// Diagnostics reported while looking ahead are discarded.
    pub fn look_ahead<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        let save_pos = self.pos;
        let save_start = self.token_start;
        let save_token = self.token;
        let save_value = self.token_value.clone();
        let save_flags = self.token_flags;
        let save_diagnostics = self.diagnostics.len();
        let result = f(self);
        self.pos = save_pos;
        self.token_start = save_start;
        self.token = save_token;
        self.token_value = save_value;
        self.token_flags = save_flags;
        self.diagnostics.truncate(save_diagnostics);
        result
    }

    /// Get the current token kind.
    #[inline]
    pub fn token(&self) -> SyntaxKind {
        self.token
    }

    /// Get the current token's value: the name of an identifier or keyword,
    /// the decoded contents of a string, or the source text otherwise.
    #[inline]
    pub fn token_value(&self) -> &str {
        &self.token_value
    }

    /// Get the start position of the current token (after trivia).
    #[inline]
    pub fn token_start(&self) -> usize {
        self.token_start
    }

    /// Get the current position (end of current token).
    #[inline]
    pub fn token_end(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn token_flags(&self) -> TokenFlags {
        self.token_flags
    }

    /// Whether the current token was preceded by a line break.
    #[inline]
    pub fn has_preceding_line_break(&self) -> bool {
        self.token_flags.contains(TokenFlags::PRECEDING_LINE_BREAK)
    }

    /// The raw source text of the current token.
    pub fn token_text(&self) -> String {
        self.get_text_slice(self.token_start, self.pos)
    }

    /// Get the accumulated diagnostics.
    pub fn diagnostics(&self) -> &DiagnosticCollection {
        &self.diagnostics
    }

    /// Take the accumulated diagnostics, leaving an empty collection.
    pub fn take_diagnostics(&mut self) -> DiagnosticCollection {
        std::mem::take(&mut self.diagnostics)
    }

    /// The numeric value of the current `NumericLiteral` token.
    pub fn token_number_value(&self) -> f64 {
        let text = self.token_value.as_str();
        if self.token_flags.contains(TokenFlags::HEX_SPECIFIER) {
            fold_digits(&text[2..], 16)
        } else if self.token_flags.contains(TokenFlags::BINARY_SPECIFIER) {
            fold_digits(&text[2..], 2)
        } else if self.token_flags.contains(TokenFlags::OCTAL_SPECIFIER) {
            // `0o17` or legacy `017`
            let digits = text.trim_start_matches("0o").trim_start_matches("0O");
            fold_digits(digits, 8)
        } else {
            text.parse::<f64>().unwrap_or(f64::NAN)
        }
    }

    // ========================================================================
    // Core scanning
    // ========================================================================

    #[inline]
    fn current_char(&self) -> Option<char> {
        self.text.get(self.pos).copied()
    }

    /// Look at the character at position pos + offset.
    #[inline]
    fn char_at(&self, offset: usize) -> Option<char> {
        self.text.get(self.pos + offset).copied()
    }

    #[inline]
    fn is_eof(&self) -> bool {
        self.pos >= self.text.len()
    }

    fn error(&mut self, start: usize, message: &DiagnosticMessage, args: &[&str]) {
        let range = TextRange::new(start as u32, self.pos.max(start) as u32);
        self.diagnostics.add(Diagnostic::with_range(range, message, args));
    }

    /// Skip whitespace and comments, setting token_flags for line breaks.
    fn skip_trivia(&mut self) {
        loop {
            if self.is_eof() {
                return;
            }
            let ch = self.text[self.pos];
            match ch {
                '\r' => {
                    self.token_flags |= TokenFlags::PRECEDING_LINE_BREAK;
                    self.pos += 1;
                    if self.current_char() == Some('\n') {
                        self.pos += 1;
                    }
                }
                '\n' | '\u{2028}' | '\u{2029}' => {
                    self.token_flags |= TokenFlags::PRECEDING_LINE_BREAK;
                    self.pos += 1;
                }
                '/' if self.char_at(1) == Some('/') => {
                    self.pos += 2;
                    while !self.is_eof() && !is_line_break(self.text[self.pos]) {
                        self.pos += 1;
                    }
                }
                '/' if self.char_at(1) == Some('*') => {
                    let start = self.pos;
                    self.pos += 2;
                    let mut closed = false;
                    while !self.is_eof() {
                        if self.text[self.pos] == '*' && self.char_at(1) == Some('/') {
                            self.pos += 2;
                            closed = true;
                            break;
                        }
                        if is_line_break(self.text[self.pos]) {
                            self.token_flags |= TokenFlags::PRECEDING_LINE_BREAK;
                        }
                        self.pos += 1;
                    }
                    if !closed {
                        self.error(start, &messages::ASTERISK_SLASH_EXPECTED, &[]);
                    }
                }
                c if is_white_space_single_line(c) => {
                    self.pos += 1;
                }
                _ => return,
            }
        }
    }

    /// Scan the next token and return its kind.
    pub fn scan(&mut self) -> SyntaxKind {
        self.token_flags = TokenFlags::NONE;
        self.token_value.clear();

        self.skip_trivia();
        self.token_start = self.pos;

        if self.is_eof() {
            self.token = SyntaxKind::EndOfFileToken;
            return self.token;
        }

        let ch = self.text[self.pos];
        self.token = match ch {
            '(' => self.single(SyntaxKind::OpenParenToken),
            ')' => self.single(SyntaxKind::CloseParenToken),
            '{' => self.single(SyntaxKind::OpenBraceToken),
            '}' => self.single(SyntaxKind::CloseBraceToken),
            '[' => self.single(SyntaxKind::OpenBracketToken),
            ']' => self.single(SyntaxKind::CloseBracketToken),
            ';' => self.single(SyntaxKind::SemicolonToken),
            ',' => self.single(SyntaxKind::CommaToken),
            '~' => self.single(SyntaxKind::TildeToken),
            ':' => self.single(SyntaxKind::ColonToken),
            '?' => self.single(SyntaxKind::QuestionToken),

            '.' => {
                if self.char_at(1).is_some_and(is_digit) {
                    self.scan_number()
                } else {
                    self.single(SyntaxKind::DotToken)
                }
            }
            '<' => self.scan_less_than(),
            '>' => self.scan_greater_than(),
            '=' => self.scan_equals(),
            '!' => self.scan_exclamation(),
            '+' => self.scan_doubling('+', SyntaxKind::PlusToken, SyntaxKind::PlusPlusToken, SyntaxKind::PlusEqualsToken),
            '-' => self.scan_doubling('-', SyntaxKind::MinusToken, SyntaxKind::MinusMinusToken, SyntaxKind::MinusEqualsToken),
            '&' => self.scan_doubling('&', SyntaxKind::AmpersandToken, SyntaxKind::AmpersandAmpersandToken, SyntaxKind::AmpersandEqualsToken),
            '|' => self.scan_doubling('|', SyntaxKind::BarToken, SyntaxKind::BarBarToken, SyntaxKind::BarEqualsToken),
            '*' => self.scan_compound(SyntaxKind::AsteriskToken, SyntaxKind::AsteriskEqualsToken),
            '/' => self.scan_compound(SyntaxKind::SlashToken, SyntaxKind::SlashEqualsToken),
            '%' => self.scan_compound(SyntaxKind::PercentToken, SyntaxKind::PercentEqualsToken),
            '^' => self.scan_compound(SyntaxKind::CaretToken, SyntaxKind::CaretEqualsToken),

            '\'' | '"' => self.scan_string_literal(ch),

            '0'..='9' => self.scan_number(),

            _ if is_identifier_start(ch) => self.scan_identifier(),

            _ => {
                let start = self.pos;
                self.pos += 1;
                self.error(start, &messages::INVALID_CHARACTER, &[]);
                SyntaxKind::Unknown
            }
        };

        if self.token_value.is_empty() && self.token != SyntaxKind::StringLiteral {
            self.token_value = self.token_text();
        }
        self.token
    }

    // ========================================================================
    // Token-specific scanning methods
    // ========================================================================

    #[inline]
    fn single(&mut self, kind: SyntaxKind) -> SyntaxKind {
        self.pos += 1;
        kind
    }

    /// `x`, `x=`.
    fn scan_compound(&mut self, plain: SyntaxKind, assign: SyntaxKind) -> SyntaxKind {
        if self.char_at(1) == Some('=') {
            self.pos += 2;
            assign
        } else {
            self.pos += 1;
            plain
        }
    }

    /// `x`, `xx`, `x=` for `+`, `-`, `&` and `|`.
    fn scan_doubling(
        &mut self,
        ch: char,
        plain: SyntaxKind,
        doubled: SyntaxKind,
        assign: SyntaxKind,
    ) -> SyntaxKind {
        if self.char_at(1) == Some(ch) {
            self.pos += 2;
            doubled
        } else {
            self.scan_compound(plain, assign)
        }
    }

    fn scan_less_than(&mut self) -> SyntaxKind {
        if self.char_at(1) == Some('<') {
            if self.char_at(2) == Some('=') {
                self.pos += 3;
                SyntaxKind::LessThanLessThanEqualsToken
            } else {
                self.pos += 2;
                SyntaxKind::LessThanLessThanToken
            }
        } else {
            self.scan_compound(SyntaxKind::LessThanToken, SyntaxKind::LessThanEqualsToken)
        }
    }

    fn scan_greater_than(&mut self) -> SyntaxKind {
        match (self.char_at(1), self.char_at(2), self.char_at(3)) {
            (Some('>'), Some('>'), Some('=')) => {
                self.pos += 4;
                SyntaxKind::GreaterThanGreaterThanGreaterThanEqualsToken
            }
            (Some('>'), Some('>'), _) => {
                self.pos += 3;
                SyntaxKind::GreaterThanGreaterThanGreaterThanToken
            }
            (Some('>'), Some('='), _) => {
                self.pos += 3;
                SyntaxKind::GreaterThanGreaterThanEqualsToken
            }
            (Some('>'), _, _) => {
                self.pos += 2;
                SyntaxKind::GreaterThanGreaterThanToken
            }
            _ => self.scan_compound(SyntaxKind::GreaterThanToken, SyntaxKind::GreaterThanEqualsToken),
        }
    }

    fn scan_equals(&mut self) -> SyntaxKind {
        if self.char_at(1) == Some('=') {
            if self.char_at(2) == Some('=') {
                self.pos += 3;
                SyntaxKind::EqualsEqualsEqualsToken
            } else {
                self.pos += 2;
                SyntaxKind::EqualsEqualsToken
            }
        } else {
            self.pos += 1;
            SyntaxKind::EqualsToken
        }
    }

    fn scan_exclamation(&mut self) -> SyntaxKind {
        if self.char_at(1) == Some('=') {
            if self.char_at(2) == Some('=') {
                self.pos += 3;
                SyntaxKind::ExclamationEqualsEqualsToken
            } else {
                self.pos += 2;
                SyntaxKind::ExclamationEqualsToken
            }
        } else {
            self.pos += 1;
            SyntaxKind::ExclamationToken
        }
    }

    fn scan_string_literal(&mut self, quote: char) -> SyntaxKind {
        let start = self.pos;
        self.pos += 1; // skip opening quote
        let mut result = String::new();
        loop {
            if self.is_eof() || is_line_break(self.text[self.pos]) {
                self.error(start, &messages::UNTERMINATED_STRING_LITERAL, &[]);
                self.token_flags |= TokenFlags::UNTERMINATED;
                break;
            }
            let ch = self.text[self.pos];
            if ch == quote {
                self.pos += 1;
                break;
            }
            if ch == '\\' {
                self.token_flags |= TokenFlags::CONTAINS_ESCAPE;
                self.scan_escape_sequence(&mut result);
                continue;
            }
            result.push(ch);
            self.pos += 1;
        }
        self.token_value = result;
        SyntaxKind::StringLiteral
    }

    /// Decode one escape sequence starting at the backslash.
    fn scan_escape_sequence(&mut self, out: &mut String) {
        let start = self.pos;
        self.pos += 1; // skip backslash
        let Some(ch) = self.current_char() else {
            return;
        };
        self.pos += 1;
        match ch {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'b' => out.push('\u{0008}'),
            'f' => out.push('\u{000C}'),
            'v' => out.push('\u{000B}'),
            '0'..='7' => {
                // `\0` or a legacy octal escape of up to three digits.
                let mut value = ch as u32 - '0' as u32;
                let max_len = if ch <= '3' { 3 } else { 2 };
                let mut len = 1;
                while len < max_len {
                    match self.current_char() {
                        Some(d) if is_octal_digit(d) => {
                            value = value * 8 + (d as u32 - '0' as u32);
                            self.pos += 1;
                            len += 1;
                        }
                        _ => break,
                    }
                }
                out.push(char::from_u32(value).unwrap_or('\u{FFFD}'));
            }
            'x' => match self.scan_hex_value(2) {
                Some(value) => out.push(char::from_u32(value).unwrap_or('\u{FFFD}')),
                None => self.error(start, &messages::HEXADECIMAL_DIGIT_EXPECTED, &[]),
            },
            'u' => match self.scan_unicode_escape() {
                Some(value) => out.push(value),
                None => self.error(start, &messages::HEXADECIMAL_DIGIT_EXPECTED, &[]),
            },
            '\r' => {
                // Line continuation.
                if self.current_char() == Some('\n') {
                    self.pos += 1;
                }
            }
            '\n' | '\u{2028}' | '\u{2029}' => {}
            other => out.push(other),
        }
    }

    /// Scan exactly `count` hex digits.
    fn scan_hex_value(&mut self, count: usize) -> Option<u32> {
        let mut value = 0u32;
        for _ in 0..count {
            let digit = self.current_char().and_then(|c| c.to_digit(16))?;
            value = value * 16 + digit;
            self.pos += 1;
        }
        Some(value)
    }

    /// `\uXXXX` or `\u{X...}`, positioned after the `u`.
    fn scan_unicode_escape(&mut self) -> Option<char> {
        if self.current_char() == Some('{') {
            self.pos += 1;
            let mut value = 0u32;
            let mut digits = 0;
            while let Some(digit) = self.current_char().and_then(|c| c.to_digit(16)) {
                value = value.saturating_mul(16).saturating_add(digit);
                digits += 1;
                self.pos += 1;
            }
            if digits == 0 || self.current_char() != Some('}') {
                return None;
            }
            self.pos += 1;
            return char::from_u32(value);
        }
        let value = self.scan_hex_value(4)?;
        Some(char::from_u32(value).unwrap_or('\u{FFFD}'))
    }

    /// Rescan the current `/` or `/=` token as a regular expression literal
    /// (called by the parser where an expression is expected).
    pub fn rescan_slash_token(&mut self) -> SyntaxKind {
        if self.token != SyntaxKind::SlashToken && self.token != SyntaxKind::SlashEqualsToken {
            return self.token;
        }
        self.pos = self.token_start + 1; // after the /
        let mut in_character_class = false;

        loop {
            if self.is_eof() || is_line_break(self.text[self.pos]) {
                self.error(self.token_start, &messages::UNTERMINATED_REGULAR_EXPRESSION_LITERAL, &[]);
                self.token_flags |= TokenFlags::UNTERMINATED;
                break;
            }
            let ch = self.text[self.pos];
            self.pos += 1;
            match ch {
                '\\' => {
                    if !self.is_eof() && !is_line_break(self.text[self.pos]) {
                        self.pos += 1;
                    }
                }
                '[' => in_character_class = true,
                ']' => in_character_class = false,
                '/' if !in_character_class => {
                    while !self.is_eof() && is_identifier_part(self.text[self.pos]) {
                        self.pos += 1;
                    }
                    break;
                }
                _ => {}
            }
        }

        self.token_value = self.token_text();
        self.token = SyntaxKind::RegularExpressionLiteral;
        self.token
    }

    fn scan_number(&mut self) -> SyntaxKind {
        let start = self.pos;

        if self.text[self.pos] == '0' {
            match self.char_at(1) {
                Some('x') | Some('X') => {
                    return self.scan_radix_number(start, TokenFlags::HEX_SPECIFIER, is_hex_digit)
                }
                Some('b') | Some('B') => {
                    return self.scan_radix_number(start, TokenFlags::BINARY_SPECIFIER, |c| {
                        c == '0' || c == '1'
                    })
                }
                Some('o') | Some('O') => {
                    return self.scan_radix_number(start, TokenFlags::OCTAL_SPECIFIER, is_octal_digit)
                }
                Some(c) if is_digit(c) => {
                    // Legacy octal (`017`) unless a non-octal digit follows.
                    let mut end = self.pos + 1;
                    while end < self.text.len() && is_digit(self.text[end]) {
                        end += 1;
                    }
                    if self.text[self.pos + 1..end].iter().all(|c| is_octal_digit(*c)) {
                        self.pos = end;
                        self.token_flags |= TokenFlags::OCTAL_SPECIFIER;
                        self.token_value = self.get_text_slice(start, self.pos);
                        return SyntaxKind::NumericLiteral;
                    }
                }
                _ => {}
            }
        }

        self.scan_digits();

        if self.current_char() == Some('.') {
            self.pos += 1;
            self.scan_digits();
        }

        if let Some('e') | Some('E') = self.current_char() {
            self.pos += 1;
            self.token_flags |= TokenFlags::SCIENTIFIC;
            if let Some('+') | Some('-') = self.current_char() {
                self.pos += 1;
            }
            let digits_start = self.pos;
            self.scan_digits();
            if self.pos == digits_start {
                self.error(start, &messages::_0_EXPECTED, &["digit"]);
            }
        }

        self.token_value = self.get_text_slice(start, self.pos);
        SyntaxKind::NumericLiteral
    }

    fn scan_radix_number(
        &mut self,
        start: usize,
        flag: TokenFlags,
        is_radix_digit: impl Fn(char) -> bool,
    ) -> SyntaxKind {
        self.pos += 2; // skip 0x, 0b or 0o
        self.token_flags |= flag;
        let digits_start = self.pos;
        while !self.is_eof() && is_radix_digit(self.text[self.pos]) {
            self.pos += 1;
        }
        if self.pos == digits_start {
            if flag == TokenFlags::HEX_SPECIFIER {
                self.error(start, &messages::HEXADECIMAL_DIGIT_EXPECTED, &[]);
            } else {
                self.error(start, &messages::_0_EXPECTED, &["digit"]);
            }
        }
        self.token_value = self.get_text_slice(start, self.pos);
        SyntaxKind::NumericLiteral
    }

    fn scan_digits(&mut self) {
        while !self.is_eof() && is_digit(self.text[self.pos]) {
            self.pos += 1;
        }
    }

    fn scan_identifier(&mut self) -> SyntaxKind {
        let start = self.pos;
        self.pos += 1;
        while !self.is_eof() && is_identifier_part(self.text[self.pos]) {
            self.pos += 1;
        }
        self.token_value = self.get_text_slice(start, self.pos);
        SyntaxKind::from_keyword(&self.token_value).unwrap_or(SyntaxKind::Identifier)
    }

    /// Get a substring of the source text.
    pub fn get_text_slice(&self, start: usize, end: usize) -> String {
        let s = start.min(self.text.len());
        let e = end.min(self.text.len()).max(s);
        self.text[s..e].iter().collect()
    }
}

/// Accumulate digits of a radix into an `f64`; literals wider than 53 bits
/// round the same way the language does.
fn fold_digits(digits: &str, radix: u32) -> f64 {
    digits
        .chars()
        .filter_map(|c| c.to_digit(radix))
        .fold(0.0, |acc, d| acc * radix as f64 + d as f64)
}
