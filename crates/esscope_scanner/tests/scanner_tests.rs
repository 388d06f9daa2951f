//! Scanner integration tests.
//!
//! Verifies that the scanner tokenizes ES5 source the way the parser expects.

use esscope_ast::syntax_kind::SyntaxKind;
use esscope_scanner::Scanner;

/// Helper: scan all tokens from source and return as (kind, value) pairs.
fn scan_all(source: &str) -> Vec<(SyntaxKind, String)> {
    let mut scanner = Scanner::new(source);
    let mut tokens = Vec::new();
    loop {
        let kind = scanner.scan();
        if kind == SyntaxKind::EndOfFileToken {
            break;
        }
        tokens.push((kind, scanner.token_value().to_string()));
    }
    tokens
}

/// Helper: scan all token kinds.
fn scan_kinds(source: &str) -> Vec<SyntaxKind> {
    scan_all(source).into_iter().map(|(k, _)| k).collect()
}

#[test]
fn test_empty_source() {
    assert!(scan_all("").is_empty());
}

#[test]
fn test_whitespace_and_comments_only() {
    assert!(scan_all("   \n\t  // hello\n/* block\n */").is_empty());
}

#[test]
fn test_variable_declaration() {
    let tokens = scan_all("var a = 2;");
    assert_eq!(
        tokens,
        vec![
            (SyntaxKind::VarKeyword, "var".to_string()),
            (SyntaxKind::Identifier, "a".to_string()),
            (SyntaxKind::EqualsToken, "=".to_string()),
            (SyntaxKind::NumericLiteral, "2".to_string()),
            (SyntaxKind::SemicolonToken, ";".to_string()),
        ]
    );
}

#[test]
fn test_member_and_call() {
    assert_eq!(
        scan_kinds("a.b(2)"),
        vec![
            SyntaxKind::Identifier,
            SyntaxKind::DotToken,
            SyntaxKind::Identifier,
            SyntaxKind::OpenParenToken,
            SyntaxKind::NumericLiteral,
            SyntaxKind::CloseParenToken,
        ]
    );
}

#[test]
fn test_logical_and_equality_operators() {
    assert_eq!(
        scan_kinds("&& || & | == === != !== += -= ++ --"),
        vec![
            SyntaxKind::AmpersandAmpersandToken,
            SyntaxKind::BarBarToken,
            SyntaxKind::AmpersandToken,
            SyntaxKind::BarToken,
            SyntaxKind::EqualsEqualsToken,
            SyntaxKind::EqualsEqualsEqualsToken,
            SyntaxKind::ExclamationEqualsToken,
            SyntaxKind::ExclamationEqualsEqualsToken,
            SyntaxKind::PlusEqualsToken,
            SyntaxKind::MinusEqualsToken,
            SyntaxKind::PlusPlusToken,
            SyntaxKind::MinusMinusToken,
        ]
    );
}

#[test]
fn test_keywords_versus_identifiers() {
    assert_eq!(
        scan_kinds("function functional typeof instanceof with let"),
        vec![
            SyntaxKind::FunctionKeyword,
            SyntaxKind::Identifier,
            SyntaxKind::TypeOfKeyword,
            SyntaxKind::InstanceOfKeyword,
            SyntaxKind::WithKeyword,
            SyntaxKind::LetKeyword,
        ]
    );
}

#[test]
fn test_unicode_identifier() {
    let tokens = scan_all("café $ _x");
    assert_eq!(tokens[0], (SyntaxKind::Identifier, "café".to_string()));
    assert_eq!(tokens[1], (SyntaxKind::Identifier, "$".to_string()));
    assert_eq!(tokens[2], (SyntaxKind::Identifier, "_x".to_string()));
}

#[test]
fn test_line_break_flags() {
    let mut scanner = Scanner::new("a\nb /* x\n */ c /* y */ d");
    scanner.scan();
    assert!(!scanner.has_preceding_line_break());
    scanner.scan();
    assert!(scanner.has_preceding_line_break());
    scanner.scan();
    assert!(scanner.has_preceding_line_break());
    scanner.scan();
    assert!(!scanner.has_preceding_line_break());
}

#[test]
fn test_token_positions_are_char_offsets() {
    let mut scanner = Scanner::new("'é' x");
    scanner.scan();
    assert_eq!((scanner.token_start(), scanner.token_end()), (0, 3));
    scanner.scan();
    assert_eq!((scanner.token_start(), scanner.token_end()), (4, 5));
}

#[test]
fn test_unterminated_string_reports_diagnostic() {
    let mut scanner = Scanner::new("'abc\nx");
    assert_eq!(scanner.scan(), SyntaxKind::StringLiteral);
    let diagnostics = scanner.take_diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics.diagnostics()[0].code, 1002);
    assert_eq!(scanner.scan(), SyntaxKind::Identifier);
}

#[test]
fn test_unterminated_comment_reports_diagnostic() {
    let mut scanner = Scanner::new("a /* never closed");
    scanner.scan();
    assert_eq!(scanner.scan(), SyntaxKind::EndOfFileToken);
    assert_eq!(scanner.diagnostics().diagnostics()[0].code, 1010);
}

#[test]
fn test_invalid_character() {
    let mut scanner = Scanner::new("a # b");
    scanner.scan();
    assert_eq!(scanner.scan(), SyntaxKind::Unknown);
    assert!(scanner.diagnostics().has_errors());
    assert_eq!(scanner.scan(), SyntaxKind::Identifier);
}

#[test]
fn test_regex_only_on_rescan() {
    let mut scanner = Scanner::new("a / b / c");
    assert_eq!(scanner.scan(), SyntaxKind::Identifier);
    assert_eq!(scanner.scan(), SyntaxKind::SlashToken);
    assert_eq!(scanner.scan(), SyntaxKind::Identifier);

    let mut scanner = Scanner::new("/=ab/g");
    assert_eq!(scanner.scan(), SyntaxKind::SlashEqualsToken);
    assert_eq!(scanner.rescan_slash_token(), SyntaxKind::RegularExpressionLiteral);
    assert_eq!(scanner.token_value(), "/=ab/g");
    assert_eq!(scanner.scan(), SyntaxKind::EndOfFileToken);
}

#[test]
fn test_unterminated_regex() {
    let mut scanner = Scanner::new("/abc\n");
    scanner.scan();
    scanner.rescan_slash_token();
    assert_eq!(scanner.take_diagnostics().diagnostics()[0].code, 1161);
}
