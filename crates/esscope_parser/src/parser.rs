//! The ECMAScript parser implementation.
//!
//! A recursive descent parser over the ES5 grammar. It consumes tokens from
//! the scanner and builds an arena-allocated tree. Syntax errors are
//! collected as diagnostics; the parser recovers at the next statement so
//! every error of a file is reported in one pass.

use std::cell::Cell;

use esscope_ast::node::*;
use esscope_ast::operators::*;
use esscope_ast::syntax_kind::SyntaxKind;
use esscope_core::arena::AstArena;
use esscope_core::text::{LineMap, TextRange};
use esscope_diagnostics::{messages, Diagnostic, DiagnosticCollection, DiagnosticMessage};
use esscope_scanner::Scanner;

use crate::precedence::{get_binary_operator_precedence, OperatorPrecedence};

/// Maximum recursion depth to prevent stack overflow on deeply nested input.
const MAX_RECURSION_DEPTH: u32 = 128;

/// Parse a whole program. Any syntax error fails the parse.
pub fn parse<'a>(arena: &'a AstArena, source: &str) -> Result<&'a Node<'a>, DiagnosticCollection> {
    let mut parser = Parser::new(arena, "<input>", source);
    let program = parser.parse_program();
    let diagnostics = parser.take_diagnostics();
    if diagnostics.has_errors() {
        Err(diagnostics)
    } else {
        Ok(program)
    }
}

/// The parser produces a `Program` node from source text.
pub struct Parser<'a> {
    arena: &'a AstArena,
    scanner: Scanner,
    file_name: String,
    line_map: LineMap,
    diagnostics: DiagnosticCollection,
    /// End of the previously consumed token; the end of every finished node.
    prev_token_end: u32,
    /// Whether `in` is a binary operator here (false in a `for` initializer).
    allow_in: bool,
    /// Tracks recursion depth to prevent stack overflow on deeply nested input.
    recursion_depth: u32,
    /// Number of enclosing function bodies.
    function_depth: u32,
    /// Labels of the enclosing statements, innermost last. Reset at function boundaries.
    labels: Vec<&'a str>,
}

impl<'a> Parser<'a> {
    pub fn new(arena: &'a AstArena, file_name: &str, source_text: &str) -> Self {
        Self {
            arena,
            scanner: Scanner::new(source_text),
            file_name: file_name.to_string(),
            line_map: LineMap::new(source_text),
            diagnostics: DiagnosticCollection::new(),
            prev_token_end: 0,
            allow_in: true,
            recursion_depth: 0,
            function_depth: 0,
            labels: Vec::new(),
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Parse the source text as a `Program`.
    pub fn parse_program(&mut self) -> &'a Node<'a> {
        self.scanner.skip_shebang();
        self.next_token();

        let mut statements = Vec::new();
        while self.current_token() != SyntaxKind::EndOfFileToken {
            if self.current_token() == SyntaxKind::CloseBraceToken {
                self.error(&messages::DECLARATION_OR_STATEMENT_EXPECTED, &[]);
                self.next_token();
                continue;
            }
            self.parse_statement_into(&mut statements);
        }
        let body = alloc_list(self.arena, statements);
        let end = self.scanner.text_len() as u32;
        Node::alloc(
            self.arena,
            NodeData::new(TextRange::new(0, end), 1),
            NodeKind::Program(Program { body }),
        )
    }

    /// Take the scanner and parser diagnostics, located in this file.
    pub fn take_diagnostics(&mut self) -> DiagnosticCollection {
        let mut diagnostics = self.scanner.take_diagnostics();
        diagnostics.extend(std::mem::take(&mut self.diagnostics));
        diagnostics.locate(&self.file_name, &self.line_map);
        diagnostics.sort();
        diagnostics
    }

    // ========================================================================
    // Token management
    // ========================================================================

    #[inline]
    fn current_token(&self) -> SyntaxKind {
        self.scanner.token()
    }

    #[inline]
    fn next_token(&mut self) -> SyntaxKind {
        self.prev_token_end = self.scanner.token_end() as u32;
        self.scanner.scan()
    }

    #[inline]
    fn token_pos(&self) -> u32 {
        self.scanner.token_start() as u32
    }

    #[inline]
    fn token_value(&self) -> &str {
        self.scanner.token_value()
    }

    fn expect_token(&mut self, kind: SyntaxKind) -> bool {
        if self.current_token() == kind {
            self.next_token();
            true
        } else {
            let text = kind.punctuation_text().or_else(|| kind.keyword_text()).unwrap_or("token");
            self.error(&messages::_0_EXPECTED, &[text]);
            false
        }
    }

    fn optional_token(&mut self, kind: SyntaxKind) -> bool {
        if self.current_token() == kind {
            self.next_token();
            true
        } else {
            false
        }
    }

    /// Consume a `;`, or accept an automatically inserted one before a line
    /// break, a `}` or the end of the file.
    fn parse_expected_semicolon(&mut self) {
        if self.optional_token(SyntaxKind::SemicolonToken) {
            return;
        }
        if self.current_token() == SyntaxKind::CloseBraceToken
            || self.current_token() == SyntaxKind::EndOfFileToken
            || self.scanner.has_preceding_line_break()
        {
            return;
        }
        self.error(&messages::_0_EXPECTED, &[";"]);
    }

    /// Report an error at the current token.
    fn error(&mut self, message: &DiagnosticMessage, args: &[&str]) {
        let range = TextRange::new(self.token_pos(), self.scanner.token_end() as u32);
        self.diagnostics.add(Diagnostic::with_range(range, message, args));
    }

    /// Allocate a node spanning from `pos` to the end of the last consumed token.
    fn finish(&self, pos: u32, kind: NodeKind<'a>) -> &'a Node<'a> {
        let end = self.prev_token_end.max(pos);
        let data = NodeData::new(TextRange::new(pos, end), self.line_map.line_of(pos));
        Node::alloc(self.arena, data, kind)
    }

    fn list(&self, nodes: Vec<&'a Node<'a>>) -> NodeList<'a> {
        alloc_list(self.arena, nodes)
    }

    /// Run `f` with `in` accepted as a binary operator.
    fn with_in_allowed<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        let saved = self.allow_in;
        self.allow_in = true;
        let result = f(self);
        self.allow_in = saved;
        result
    }

    /// Enter one level of nesting; false once the limit is reached, after
    /// which the rest of the input is skipped.
    fn enter_nesting(&mut self) -> bool {
        self.recursion_depth += 1;
        if self.recursion_depth > MAX_RECURSION_DEPTH {
            self.error(&messages::MAXIMUM_NESTING_DEPTH_EXCEEDED, &[]);
            while self.current_token() != SyntaxKind::EndOfFileToken {
                self.next_token();
            }
            self.recursion_depth -= 1;
            return false;
        }
        true
    }

    fn exit_nesting(&mut self) {
        self.recursion_depth -= 1;
    }

    // ========================================================================
    // Statement parsing
    // ========================================================================

    /// Parse a statement and push it, recovering if no progress was made.
    fn parse_statement_into(&mut self, statements: &mut Vec<&'a Node<'a>>) {
        let saved_pos = self.scanner.token_start();
        let statement = self.parse_statement();
        statements.push(statement);

        // The statement consumed nothing; skip forward so one bad token
        // cannot stall the parser.
        if self.scanner.token_start() == saved_pos && self.current_token() != SyntaxKind::EndOfFileToken {
            self.next_token();
            self.skip_to_next_statement();
        }
    }

    /// Error recovery: skip tokens until one that can start a new statement.
    fn skip_to_next_statement(&mut self) {
        while self.current_token() != SyntaxKind::EndOfFileToken {
            match self.current_token() {
                SyntaxKind::VarKeyword
                | SyntaxKind::LetKeyword
                | SyntaxKind::ConstKeyword
                | SyntaxKind::FunctionKeyword
                | SyntaxKind::IfKeyword
                | SyntaxKind::ForKeyword
                | SyntaxKind::WhileKeyword
                | SyntaxKind::DoKeyword
                | SyntaxKind::SwitchKeyword
                | SyntaxKind::ReturnKeyword
                | SyntaxKind::ThrowKeyword
                | SyntaxKind::TryKeyword
                | SyntaxKind::BreakKeyword
                | SyntaxKind::ContinueKeyword
                | SyntaxKind::WithKeyword
                | SyntaxKind::CloseBraceToken => return,
                SyntaxKind::SemicolonToken => {
                    self.next_token();
                    return;
                }
                _ => {
                    self.next_token();
                }
            }
        }
    }

    fn parse_statement(&mut self) -> &'a Node<'a> {
        if !self.enter_nesting() {
            return self.finish(self.token_pos(), NodeKind::EmptyStatement);
        }
        let statement = match self.current_token() {
            SyntaxKind::SemicolonToken => {
                let pos = self.token_pos();
                self.next_token();
                self.finish(pos, NodeKind::EmptyStatement)
            }
            SyntaxKind::OpenBraceToken => self.parse_block(),
            SyntaxKind::VarKeyword | SyntaxKind::LetKeyword | SyntaxKind::ConstKeyword => {
                let declaration = self.parse_variable_declaration();
                self.parse_expected_semicolon();
                declaration
            }
            SyntaxKind::FunctionKeyword => self.parse_function(true),
            SyntaxKind::IfKeyword => self.parse_if_statement(),
            SyntaxKind::ForKeyword => self.parse_for_statement(),
            SyntaxKind::WhileKeyword => self.parse_while_statement(),
            SyntaxKind::DoKeyword => self.parse_do_statement(),
            SyntaxKind::ReturnKeyword => self.parse_return_statement(),
            SyntaxKind::BreakKeyword | SyntaxKind::ContinueKeyword => self.parse_jump_statement(),
            SyntaxKind::ThrowKeyword => self.parse_throw_statement(),
            SyntaxKind::TryKeyword => self.parse_try_statement(),
            SyntaxKind::SwitchKeyword => self.parse_switch_statement(),
            SyntaxKind::WithKeyword => self.parse_with_statement(),
            SyntaxKind::Identifier if self.is_label() => self.parse_labeled_statement(),
            _ => self.parse_expression_statement(),
        };
        self.exit_nesting();
        statement
    }

    fn is_label(&mut self) -> bool {
        self.scanner.look_ahead(|s| s.scan() == SyntaxKind::ColonToken)
    }

    fn parse_block(&mut self) -> &'a Node<'a> {
        let pos = self.token_pos();
        self.expect_token(SyntaxKind::OpenBraceToken);
        let mut statements = Vec::new();
        while self.current_token() != SyntaxKind::CloseBraceToken
            && self.current_token() != SyntaxKind::EndOfFileToken
        {
            self.parse_statement_into(&mut statements);
        }
        self.expect_token(SyntaxKind::CloseBraceToken);
        let body = self.list(statements);
        self.finish(pos, NodeKind::BlockStatement(BlockStatement { body }))
    }

    fn parse_expression_statement(&mut self) -> &'a Node<'a> {
        let pos = self.token_pos();
        let expression = self.parse_expression();
        self.parse_expected_semicolon();
        self.finish(
            pos,
            NodeKind::ExpressionStatement(ExpressionStatement {
                expression: Cell::new(expression),
            }),
        )
    }

    /// `var`, `let` or `const` with its declarators, without the semicolon.
    fn parse_variable_declaration(&mut self) -> &'a Node<'a> {
        let pos = self.token_pos();
        let kind = match self.current_token() {
            SyntaxKind::LetKeyword => VariableKind::Let,
            SyntaxKind::ConstKeyword => VariableKind::Const,
            _ => VariableKind::Var,
        };
        self.next_token();

        let mut declarations = Vec::new();
        loop {
            let declarator_pos = self.token_pos();
            if self.current_token() != SyntaxKind::Identifier {
                self.error(&messages::VARIABLE_DECLARATION_EXPECTED, &[]);
                break;
            }
            let id = self.parse_identifier();
            let init = if self.optional_token(SyntaxKind::EqualsToken) {
                Some(self.parse_assignment_expression())
            } else {
                None
            };
            declarations.push(self.finish(
                declarator_pos,
                NodeKind::VariableDeclarator(VariableDeclarator {
                    id: Cell::new(id),
                    init: Cell::new(init),
                }),
            ));
            if !self.optional_token(SyntaxKind::CommaToken) {
                break;
            }
        }

        let declarations = self.list(declarations);
        self.finish(pos, NodeKind::VariableDeclaration(VariableDeclaration { declarations, kind }))
    }

    /// A function declaration or expression, starting at `function`.
    fn parse_function(&mut self, is_declaration: bool) -> &'a Node<'a> {
        let pos = self.token_pos();
        self.expect_token(SyntaxKind::FunctionKeyword);
        let generator = self.optional_token(SyntaxKind::AsteriskToken);

        let id = if self.current_token() == SyntaxKind::Identifier {
            Some(self.parse_identifier())
        } else {
            if is_declaration {
                self.error(&messages::IDENTIFIER_EXPECTED, &[]);
            }
            None
        };

        let (params, body) = self.with_in_allowed(|p| p.parse_function_rest());
        let function = Function {
            id: Cell::new(id),
            params,
            body: Cell::new(body),
            generator,
            expression: false,
        };
        let kind = if is_declaration {
            NodeKind::FunctionDeclaration(function)
        } else {
            NodeKind::FunctionExpression(function)
        };
        self.finish(pos, kind)
    }

    /// Parameter list and body of a function.
    fn parse_function_rest(&mut self) -> (NodeList<'a>, &'a Node<'a>) {
        let mut params = Vec::new();
        self.expect_token(SyntaxKind::OpenParenToken);
        while self.current_token() != SyntaxKind::CloseParenToken
            && self.current_token() != SyntaxKind::EndOfFileToken
        {
            if self.current_token() != SyntaxKind::Identifier {
                self.error(&messages::IDENTIFIER_EXPECTED, &[]);
                break;
            }
            params.push(self.parse_identifier());
            if !self.optional_token(SyntaxKind::CommaToken) {
                break;
            }
        }
        self.expect_token(SyntaxKind::CloseParenToken);
        let outer_labels = std::mem::take(&mut self.labels);
        self.function_depth += 1;
        let body = self.parse_block();
        self.function_depth -= 1;
        self.labels = outer_labels;
        (self.list(params), body)
    }

    fn parse_if_statement(&mut self) -> &'a Node<'a> {
        let pos = self.token_pos();
        self.expect_token(SyntaxKind::IfKeyword);
        let test = self.parse_parenthesized_expression();
        let consequent = self.parse_statement();
        let alternate = if self.optional_token(SyntaxKind::ElseKeyword) {
            Some(self.parse_statement())
        } else {
            None
        };
        self.finish(
            pos,
            NodeKind::IfStatement(IfStatement {
                test: Cell::new(test),
                consequent: Cell::new(consequent),
                alternate: Cell::new(alternate),
            }),
        )
    }

    fn parse_parenthesized_expression(&mut self) -> &'a Node<'a> {
        self.expect_token(SyntaxKind::OpenParenToken);
        let expression = self.with_in_allowed(|p| p.parse_expression());
        self.expect_token(SyntaxKind::CloseParenToken);
        expression
    }

    fn parse_for_statement(&mut self) -> &'a Node<'a> {
        let pos = self.token_pos();
        self.expect_token(SyntaxKind::ForKeyword);
        self.expect_token(SyntaxKind::OpenParenToken);

        let saved_allow_in = self.allow_in;
        self.allow_in = false;
        let init = match self.current_token() {
            SyntaxKind::SemicolonToken => None,
            SyntaxKind::VarKeyword | SyntaxKind::LetKeyword | SyntaxKind::ConstKeyword => {
                Some(self.parse_variable_declaration())
            }
            _ => Some(self.parse_expression()),
        };
        self.allow_in = saved_allow_in;

        if self.current_token() == SyntaxKind::InKeyword {
            let left = match init {
                Some(left) if self.is_for_in_target(left) => left,
                Some(left) => {
                    self.error(&messages::INVALID_LEFT_HAND_SIDE_IN_ASSIGNMENT, &[]);
                    left
                }
                None => {
                    self.error(&messages::EXPRESSION_EXPECTED, &[]);
                    self.missing_expression()
                }
            };
            self.next_token();
            let right = self.with_in_allowed(|p| p.parse_expression());
            self.expect_token(SyntaxKind::CloseParenToken);
            let body = self.parse_statement();
            return self.finish(
                pos,
                NodeKind::ForInStatement(ForInStatement {
                    left: Cell::new(left),
                    right: Cell::new(right),
                    body: Cell::new(body),
                }),
            );
        }

        self.expect_token(SyntaxKind::SemicolonToken);
        let test = if self.current_token() != SyntaxKind::SemicolonToken {
            Some(self.with_in_allowed(|p| p.parse_expression()))
        } else {
            None
        };
        self.expect_token(SyntaxKind::SemicolonToken);
        let update = if self.current_token() != SyntaxKind::CloseParenToken {
            Some(self.with_in_allowed(|p| p.parse_expression()))
        } else {
            None
        };
        self.expect_token(SyntaxKind::CloseParenToken);
        let body = self.parse_statement();

        self.finish(
            pos,
            NodeKind::ForStatement(ForStatement {
                init: Cell::new(init),
                test: Cell::new(test),
                update: Cell::new(update),
                body: Cell::new(body),
            }),
        )
    }

    /// A for-in left side: a declaration of exactly one variable, or a
    /// simple assignment target.
    fn is_for_in_target(&self, node: &Node<'a>) -> bool {
        match &node.kind {
            NodeKind::VariableDeclaration(declaration) => declaration.declarations.len() == 1,
            _ => is_simple_assignment_target(node),
        }
    }

    fn parse_while_statement(&mut self) -> &'a Node<'a> {
        let pos = self.token_pos();
        self.expect_token(SyntaxKind::WhileKeyword);
        let test = self.parse_parenthesized_expression();
        let body = self.parse_statement();
        self.finish(
            pos,
            NodeKind::WhileStatement(WhileStatement {
                test: Cell::new(test),
                body: Cell::new(body),
            }),
        )
    }

    fn parse_do_statement(&mut self) -> &'a Node<'a> {
        let pos = self.token_pos();
        self.expect_token(SyntaxKind::DoKeyword);
        let body = self.parse_statement();
        self.expect_token(SyntaxKind::WhileKeyword);
        let test = self.parse_parenthesized_expression();
        // `do ... while (x)` may be followed directly by another statement.
        self.optional_token(SyntaxKind::SemicolonToken);
        self.finish(
            pos,
            NodeKind::DoWhileStatement(WhileStatement {
                test: Cell::new(test),
                body: Cell::new(body),
            }),
        )
    }

    /// Whether an expression may follow without an intervening line break
    /// (`return`, `throw`, `break label`).
    fn can_continue_on_same_line(&self) -> bool {
        self.current_token() != SyntaxKind::SemicolonToken
            && self.current_token() != SyntaxKind::CloseBraceToken
            && self.current_token() != SyntaxKind::EndOfFileToken
            && !self.scanner.has_preceding_line_break()
    }

    fn parse_return_statement(&mut self) -> &'a Node<'a> {
        let pos = self.token_pos();
        if self.function_depth == 0 {
            self.error(&messages::A_RETURN_STATEMENT_CAN_ONLY_BE_USED_WITHIN_A_FUNCTION_BODY, &[]);
        }
        self.expect_token(SyntaxKind::ReturnKeyword);
        let argument = if self.can_continue_on_same_line() {
            Some(self.parse_expression())
        } else {
            None
        };
        self.parse_expected_semicolon();
        self.finish(
            pos,
            NodeKind::ReturnStatement(ReturnStatement {
                argument: Cell::new(argument),
            }),
        )
    }

    fn parse_jump_statement(&mut self) -> &'a Node<'a> {
        let pos = self.token_pos();
        let is_break = self.current_token() == SyntaxKind::BreakKeyword;
        self.next_token();
        let label = if self.current_token() == SyntaxKind::Identifier && self.can_continue_on_same_line() {
            Some(self.parse_identifier())
        } else {
            None
        };
        if let Some(label) = label {
            let declared = label
                .identifier_name()
                .is_some_and(|name| self.labels.contains(&name));
            if !declared {
                let message = if is_break {
                    &messages::A_BREAK_STATEMENT_CAN_ONLY_JUMP_TO_A_LABEL_OF_AN_ENCLOSING_STATEMENT
                } else {
                    &messages::A_CONTINUE_STATEMENT_CAN_ONLY_JUMP_TO_A_LABEL_OF_AN_ENCLOSING_STATEMENT
                };
                self.diagnostics.add(Diagnostic::with_range(label.data.range, message, &[]));
            }
        }
        self.parse_expected_semicolon();
        let jump = JumpStatement {
            label: Cell::new(label),
        };
        let kind = if is_break {
            NodeKind::BreakStatement(jump)
        } else {
            NodeKind::ContinueStatement(jump)
        };
        self.finish(pos, kind)
    }

    fn parse_throw_statement(&mut self) -> &'a Node<'a> {
        let pos = self.token_pos();
        self.expect_token(SyntaxKind::ThrowKeyword);
        // No line terminator is allowed between `throw` and its expression.
        if self.scanner.has_preceding_line_break() {
            self.error(&messages::EXPRESSION_EXPECTED, &[]);
        }
        let argument = self.parse_expression();
        self.parse_expected_semicolon();
        self.finish(
            pos,
            NodeKind::ThrowStatement(ThrowStatement {
                argument: Cell::new(argument),
            }),
        )
    }

    fn parse_try_statement(&mut self) -> &'a Node<'a> {
        let pos = self.token_pos();
        self.expect_token(SyntaxKind::TryKeyword);
        let block = self.parse_block();

        let handler = if self.current_token() == SyntaxKind::CatchKeyword {
            let catch_pos = self.token_pos();
            self.next_token();
            self.expect_token(SyntaxKind::OpenParenToken);
            let param = if self.current_token() == SyntaxKind::Identifier {
                self.parse_identifier()
            } else {
                self.error(&messages::IDENTIFIER_EXPECTED, &[]);
                self.missing_expression()
            };
            self.expect_token(SyntaxKind::CloseParenToken);
            let body = self.parse_block();
            Some(self.finish(
                catch_pos,
                NodeKind::CatchClause(CatchClause {
                    param: Cell::new(param),
                    body: Cell::new(body),
                }),
            ))
        } else {
            None
        };

        let finalizer = if self.optional_token(SyntaxKind::FinallyKeyword) {
            Some(self.parse_block())
        } else {
            None
        };

        if handler.is_none() && finalizer.is_none() {
            self.error(&messages::CATCH_OR_FINALLY_EXPECTED, &[]);
        }

        self.finish(
            pos,
            NodeKind::TryStatement(TryStatement {
                block: Cell::new(block),
                handler: Cell::new(handler),
                finalizer: Cell::new(finalizer),
            }),
        )
    }

    fn parse_switch_statement(&mut self) -> &'a Node<'a> {
        let pos = self.token_pos();
        self.expect_token(SyntaxKind::SwitchKeyword);
        let discriminant = self.parse_parenthesized_expression();
        self.expect_token(SyntaxKind::OpenBraceToken);

        let mut cases = Vec::new();
        while self.current_token() != SyntaxKind::CloseBraceToken
            && self.current_token() != SyntaxKind::EndOfFileToken
        {
            let case_pos = self.token_pos();
            let test = match self.current_token() {
                SyntaxKind::CaseKeyword => {
                    self.next_token();
                    Some(self.with_in_allowed(|p| p.parse_expression()))
                }
                SyntaxKind::DefaultKeyword => {
                    self.next_token();
                    None
                }
                _ => {
                    self.error(&messages::_0_EXPECTED, &["case"]);
                    self.skip_to_next_statement();
                    if self.current_token() == SyntaxKind::CloseBraceToken {
                        break;
                    }
                    continue;
                }
            };
            self.expect_token(SyntaxKind::ColonToken);

            let mut consequent = Vec::new();
            while !matches!(
                self.current_token(),
                SyntaxKind::CaseKeyword
                    | SyntaxKind::DefaultKeyword
                    | SyntaxKind::CloseBraceToken
                    | SyntaxKind::EndOfFileToken
            ) {
                self.parse_statement_into(&mut consequent);
            }
            let consequent = self.list(consequent);
            cases.push(self.finish(
                case_pos,
                NodeKind::SwitchCase(SwitchCase {
                    test: Cell::new(test),
                    consequent,
                }),
            ));
        }
        self.expect_token(SyntaxKind::CloseBraceToken);

        let cases = self.list(cases);
        self.finish(
            pos,
            NodeKind::SwitchStatement(SwitchStatement {
                discriminant: Cell::new(discriminant),
                cases,
            }),
        )
    }

    fn parse_with_statement(&mut self) -> &'a Node<'a> {
        let pos = self.token_pos();
        self.expect_token(SyntaxKind::WithKeyword);
        let object = self.parse_parenthesized_expression();
        let body = self.parse_statement();
        self.finish(
            pos,
            NodeKind::WithStatement(WithStatement {
                object: Cell::new(object),
                body: Cell::new(body),
            }),
        )
    }

    fn parse_labeled_statement(&mut self) -> &'a Node<'a> {
        let pos = self.token_pos();
        let label = self.parse_identifier();
        self.expect_token(SyntaxKind::ColonToken);
        self.labels.extend(label.identifier_name());
        let body = self.parse_statement();
        if label.identifier_name().is_some() {
            self.labels.pop();
        }
        self.finish(
            pos,
            NodeKind::LabeledStatement(LabeledStatement {
                label: Cell::new(label),
                body: Cell::new(body),
            }),
        )
    }

    // ========================================================================
    // Expression parsing
    // ========================================================================

    /// An expression, including the comma operator.
    fn parse_expression(&mut self) -> &'a Node<'a> {
        let pos = self.token_pos();
        let first = self.parse_assignment_expression();
        if self.current_token() != SyntaxKind::CommaToken {
            return first;
        }
        let mut expressions = vec![first];
        while self.optional_token(SyntaxKind::CommaToken) {
            expressions.push(self.parse_assignment_expression());
        }
        let expressions = self.list(expressions);
        self.finish(pos, NodeKind::SequenceExpression(SequenceExpression { expressions }))
    }

    fn parse_assignment_expression(&mut self) -> &'a Node<'a> {
        if !self.enter_nesting() {
            return self.missing_expression();
        }
        let pos = self.token_pos();
        let left = self.parse_conditional_expression();

        let expression = match AssignmentOperator::from_token(self.current_token()) {
            Some(operator) => {
                if !is_simple_assignment_target(left) {
                    self.error(&messages::INVALID_LEFT_HAND_SIDE_IN_ASSIGNMENT, &[]);
                }
                self.next_token();
                let right = self.parse_assignment_expression();
                self.finish(
                    pos,
                    NodeKind::AssignmentExpression(AssignmentExpression {
                        operator,
                        left: Cell::new(left),
                        right: Cell::new(right),
                    }),
                )
            }
            None => left,
        };
        self.exit_nesting();
        expression
    }

    fn parse_conditional_expression(&mut self) -> &'a Node<'a> {
        let pos = self.token_pos();
        let test = self.parse_binary_expression(OperatorPrecedence::Lowest);
        if !self.optional_token(SyntaxKind::QuestionToken) {
            return test;
        }
        let consequent = self.with_in_allowed(|p| p.parse_assignment_expression());
        self.expect_token(SyntaxKind::ColonToken);
        let alternate = self.parse_assignment_expression();
        self.finish(
            pos,
            NodeKind::ConditionalExpression(ConditionalExpression {
                test: Cell::new(test),
                consequent: Cell::new(consequent),
                alternate: Cell::new(alternate),
            }),
        )
    }

    fn parse_binary_expression(&mut self, min_precedence: OperatorPrecedence) -> &'a Node<'a> {
        let pos = self.token_pos();
        let mut left = self.parse_unary_expression();

        loop {
            let token = self.current_token();
            let precedence = get_binary_operator_precedence(token, self.allow_in);
            if precedence == OperatorPrecedence::Invalid || precedence <= min_precedence {
                break;
            }
            self.next_token();
            let right = self.parse_binary_expression(precedence);
            let kind = match LogicalOperator::from_token(token) {
                Some(operator) => NodeKind::LogicalExpression(LogicalExpression {
                    operator,
                    left: Cell::new(left),
                    right: Cell::new(right),
                }),
                None => match BinaryOperator::from_token(token) {
                    Some(operator) => NodeKind::BinaryExpression(BinaryExpression {
                        operator,
                        left: Cell::new(left),
                        right: Cell::new(right),
                    }),
                    None => break,
                },
            };
            left = self.finish(pos, kind);
        }

        left
    }

    fn parse_unary_expression(&mut self) -> &'a Node<'a> {
        let pos = self.token_pos();
        let token = self.current_token();

        if let Some(operator) = UpdateOperator::from_token(token) {
            self.next_token();
            let argument = self.parse_nested_unary_operand();
            if !is_simple_assignment_target(argument) {
                self.error(&messages::INVALID_LEFT_HAND_SIDE_IN_ASSIGNMENT, &[]);
            }
            return self.finish(
                pos,
                NodeKind::UpdateExpression(UpdateExpression {
                    operator,
                    argument: Cell::new(argument),
                    prefix: true,
                }),
            );
        }

        if let Some(operator) = UnaryOperator::from_token(token) {
            self.next_token();
            let argument = self.parse_nested_unary_operand();
            return self.finish(
                pos,
                NodeKind::UnaryExpression(UnaryExpression {
                    operator,
                    argument: Cell::new(argument),
                }),
            );
        }

        self.parse_postfix_expression()
    }

    /// The operand of a prefix operator, one nesting level down.
    fn parse_nested_unary_operand(&mut self) -> &'a Node<'a> {
        if !self.enter_nesting() {
            return self.missing_expression();
        }
        let argument = self.parse_unary_expression();
        self.exit_nesting();
        argument
    }

    fn parse_postfix_expression(&mut self) -> &'a Node<'a> {
        let pos = self.token_pos();
        let expression = self.parse_left_hand_side_expression();
        if self.scanner.has_preceding_line_break() {
            return expression;
        }
        match UpdateOperator::from_token(self.current_token()) {
            Some(operator) => {
                if !is_simple_assignment_target(expression) {
                    self.error(&messages::INVALID_LEFT_HAND_SIDE_IN_ASSIGNMENT, &[]);
                }
                self.next_token();
                self.finish(
                    pos,
                    NodeKind::UpdateExpression(UpdateExpression {
                        operator,
                        argument: Cell::new(expression),
                        prefix: false,
                    }),
                )
            }
            None => expression,
        }
    }

    /// Member accesses and calls.
    fn parse_left_hand_side_expression(&mut self) -> &'a Node<'a> {
        let pos = self.token_pos();
        let mut expression = self.parse_member_expression();
        loop {
            expression = match self.current_token() {
                SyntaxKind::OpenParenToken => {
                    let arguments = self.parse_arguments();
                    self.finish(
                        pos,
                        NodeKind::CallExpression(CallExpression {
                            callee: Cell::new(expression),
                            arguments,
                        }),
                    )
                }
                SyntaxKind::DotToken | SyntaxKind::OpenBracketToken => {
                    self.parse_member_suffix(pos, expression)
                }
                _ => return expression,
            };
        }
    }

    /// A member expression without call suffixes (the callee of `new`).
    fn parse_member_expression(&mut self) -> &'a Node<'a> {
        let pos = self.token_pos();
        let mut expression = if self.current_token() == SyntaxKind::NewKeyword {
            self.parse_new_expression()
        } else {
            self.parse_primary_expression()
        };
        while matches!(self.current_token(), SyntaxKind::DotToken | SyntaxKind::OpenBracketToken) {
            expression = self.parse_member_suffix(pos, expression);
        }
        expression
    }

    /// `.name` or `[expression]` applied to `object`.
    fn parse_member_suffix(&mut self, pos: u32, object: &'a Node<'a>) -> &'a Node<'a> {
        let (property, computed) = if self.optional_token(SyntaxKind::DotToken) {
            (self.parse_identifier_name(), false)
        } else {
            self.expect_token(SyntaxKind::OpenBracketToken);
            let property = self.with_in_allowed(|p| p.parse_expression());
            self.expect_token(SyntaxKind::CloseBracketToken);
            (property, true)
        };
        self.finish(
            pos,
            NodeKind::MemberExpression(MemberExpression {
                object: Cell::new(object),
                property: Cell::new(property),
                computed,
            }),
        )
    }

    fn parse_new_expression(&mut self) -> &'a Node<'a> {
        let pos = self.token_pos();
        self.expect_token(SyntaxKind::NewKeyword);
        if !self.enter_nesting() {
            return self.missing_expression();
        }
        let callee = self.parse_member_expression();
        self.exit_nesting();
        let arguments = if self.current_token() == SyntaxKind::OpenParenToken {
            self.parse_arguments()
        } else {
            self.list(Vec::new())
        };
        self.finish(
            pos,
            NodeKind::NewExpression(CallExpression {
                callee: Cell::new(callee),
                arguments,
            }),
        )
    }

    fn parse_arguments(&mut self) -> NodeList<'a> {
        self.expect_token(SyntaxKind::OpenParenToken);
        let mut arguments = Vec::new();
        self.with_in_allowed(|p| {
            while p.current_token() != SyntaxKind::CloseParenToken
                && p.current_token() != SyntaxKind::EndOfFileToken
            {
                arguments.push(p.parse_assignment_expression());
                if !p.optional_token(SyntaxKind::CommaToken) {
                    break;
                }
            }
        });
        self.expect_token(SyntaxKind::CloseParenToken);
        self.list(arguments)
    }

    fn parse_primary_expression(&mut self) -> &'a Node<'a> {
        let pos = self.token_pos();
        match self.current_token() {
            SyntaxKind::Identifier => self.parse_identifier(),
            SyntaxKind::ThisKeyword => {
                self.next_token();
                self.finish(pos, NodeKind::ThisExpression)
            }
            SyntaxKind::NumericLiteral
            | SyntaxKind::StringLiteral
            | SyntaxKind::NullKeyword
            | SyntaxKind::TrueKeyword
            | SyntaxKind::FalseKeyword => self.parse_literal(),
            SyntaxKind::SlashToken | SyntaxKind::SlashEqualsToken => {
                self.scanner.rescan_slash_token();
                self.parse_literal()
            }
            SyntaxKind::OpenParenToken => self.parse_parenthesized_expression(),
            SyntaxKind::OpenBracketToken => self.parse_array_literal(),
            SyntaxKind::OpenBraceToken => self.parse_object_literal(),
            SyntaxKind::FunctionKeyword => self.parse_function(false),
            _ => {
                self.error(&messages::EXPRESSION_EXPECTED, &[]);
                self.missing_expression()
            }
        }
    }

    /// The literal at the current token.
    fn parse_literal(&mut self) -> &'a Node<'a> {
        let pos = self.token_pos();
        let raw = self.arena.alloc_str(&self.scanner.token_text());
        let value = match self.current_token() {
            SyntaxKind::NumericLiteral => LiteralValue::Number(self.scanner.token_number_value()),
            SyntaxKind::StringLiteral => LiteralValue::String(self.arena.alloc_str(self.token_value())),
            SyntaxKind::NullKeyword => LiteralValue::Null,
            SyntaxKind::TrueKeyword => LiteralValue::Boolean(true),
            SyntaxKind::FalseKeyword => LiteralValue::Boolean(false),
            _ => {
                let (pattern, flags) = split_regex(raw);
                LiteralValue::RegExp { pattern, flags }
            }
        };
        self.next_token();
        self.finish(pos, NodeKind::Literal(Literal { value, raw }))
    }

    fn parse_array_literal(&mut self) -> &'a Node<'a> {
        let pos = self.token_pos();
        self.expect_token(SyntaxKind::OpenBracketToken);
        let mut elements = Vec::new();
        self.with_in_allowed(|p| {
            while p.current_token() != SyntaxKind::CloseBracketToken
                && p.current_token() != SyntaxKind::EndOfFileToken
            {
                if p.optional_token(SyntaxKind::CommaToken) {
                    elements.push(None);
                    continue;
                }
                elements.push(Some(p.parse_assignment_expression()));
                if !p.optional_token(SyntaxKind::CommaToken) {
                    break;
                }
            }
        });
        self.expect_token(SyntaxKind::CloseBracketToken);
        let elements = alloc_optional_list(self.arena, elements);
        self.finish(pos, NodeKind::ArrayExpression(ArrayExpression { elements }))
    }

    fn parse_object_literal(&mut self) -> &'a Node<'a> {
        let pos = self.token_pos();
        self.expect_token(SyntaxKind::OpenBraceToken);
        let mut properties = Vec::new();
        self.with_in_allowed(|p| {
            while p.current_token() != SyntaxKind::CloseBraceToken
                && p.current_token() != SyntaxKind::EndOfFileToken
            {
                match p.parse_property() {
                    Some(property) => properties.push(property),
                    None => break,
                }
                if !p.optional_token(SyntaxKind::CommaToken) {
                    break;
                }
            }
        });
        self.expect_token(SyntaxKind::CloseBraceToken);
        let properties = self.list(properties);
        self.finish(pos, NodeKind::ObjectExpression(ObjectExpression { properties }))
    }

    /// `key: value`, `get key() {}` or `set key(v) {}`.
    fn parse_property(&mut self) -> Option<&'a Node<'a>> {
        let pos = self.token_pos();
        let accessor = match self.token_value() {
            "get" if self.current_token() == SyntaxKind::Identifier => Some(PropertyKind::Get),
            "set" if self.current_token() == SyntaxKind::Identifier => Some(PropertyKind::Set),
            _ => None,
        };
        if let Some(kind) = accessor {
            let is_accessor = self.scanner.look_ahead(|s| {
                let next = s.scan();
                next.is_identifier_name()
                    || next == SyntaxKind::StringLiteral
                    || next == SyntaxKind::NumericLiteral
            });
            if is_accessor {
                self.next_token();
                let key = self.parse_property_key()?;
                let value_pos = self.token_pos();
                let (params, body) = self.parse_function_rest();
                let value = self.finish(
                    value_pos,
                    NodeKind::FunctionExpression(Function {
                        id: Cell::new(None),
                        params,
                        body: Cell::new(body),
                        generator: false,
                        expression: false,
                    }),
                );
                return Some(self.finish(
                    pos,
                    NodeKind::Property(Property {
                        key: Cell::new(key),
                        value: Cell::new(value),
                        kind,
                    }),
                ));
            }
        }

        let key = self.parse_property_key()?;
        self.expect_token(SyntaxKind::ColonToken);
        let value = self.parse_assignment_expression();
        Some(self.finish(
            pos,
            NodeKind::Property(Property {
                key: Cell::new(key),
                value: Cell::new(value),
                kind: PropertyKind::Init,
            }),
        ))
    }

    fn parse_property_key(&mut self) -> Option<&'a Node<'a>> {
        match self.current_token() {
            SyntaxKind::StringLiteral | SyntaxKind::NumericLiteral => Some(self.parse_literal()),
            kind if kind.is_identifier_name() => Some(self.parse_identifier_name()),
            _ => {
                self.error(&messages::PROPERTY_ASSIGNMENT_EXPECTED, &[]);
                None
            }
        }
    }

    fn parse_identifier(&mut self) -> &'a Node<'a> {
        if self.current_token() != SyntaxKind::Identifier {
            self.error(&messages::IDENTIFIER_EXPECTED, &[]);
            return self.missing_expression();
        }
        self.parse_identifier_name()
    }

    /// An identifier where reserved words are allowed (after `.`, object keys).
    fn parse_identifier_name(&mut self) -> &'a Node<'a> {
        if !self.current_token().is_identifier_name() {
            self.error(&messages::IDENTIFIER_EXPECTED, &[]);
            return self.missing_expression();
        }
        let pos = self.token_pos();
        let name = self.arena.alloc_str(self.token_value());
        self.next_token();
        self.finish(pos, NodeKind::Identifier(Identifier { name }))
    }

    /// Placeholder for a missing expression; the parse already has an error.
    fn missing_expression(&self) -> &'a Node<'a> {
        let pos = self.token_pos();
        let data = NodeData::new(TextRange::empty(pos), self.line_map.line_of(pos));
        Node::alloc(self.arena, data, NodeKind::Identifier(Identifier { name: "" }))
    }
}

/// Whether `node` may appear on the left of an assignment or as the operand
/// of `++`/`--`.
fn is_simple_assignment_target(node: &Node<'_>) -> bool {
    matches!(node.kind, NodeKind::Identifier(_) | NodeKind::MemberExpression(_))
}

/// Split `/pattern/flags` into its parts.
fn split_regex(raw: &str) -> (&str, &str) {
    match raw.rfind('/') {
        Some(last) if last > 0 => (&raw[1..last], &raw[last + 1..]),
        _ => (raw.get(1..).unwrap_or(""), ""),
    }
}
