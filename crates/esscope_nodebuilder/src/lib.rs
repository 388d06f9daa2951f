//! esscope_nodebuilder: Synthetic syntax node construction.
//!
//! Builds nodes with the exact shapes the parser produces, without source
//! positions. Tests use them as expected trees for
//! [`shape_eq`](esscope_ast::shape_eq); tools use them to synthesize code
//! that is then run through the scope resolver.

use std::cell::Cell;

use esscope_ast::node::*;
use esscope_ast::operators::AssignmentOperator;
use esscope_core::arena::AstArena;

/// Flags of a synthesized function.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FunctionOptions {
    pub generator: bool,
    pub expression: bool,
}

/// Creates synthesized nodes in an arena. Every node it returns has no line;
/// the scope resolver fills lines in from the nearest annotated ancestor.
#[derive(Clone, Copy)]
pub struct NodeBuilder<'a> {
    arena: &'a AstArena,
}

impl<'a> NodeBuilder<'a> {
    pub fn new(arena: &'a AstArena) -> Self {
        Self { arena }
    }

    pub fn arena(&self) -> &'a AstArena {
        self.arena
    }

    fn node(&self, kind: NodeKind<'a>) -> &'a Node<'a> {
        Node::alloc(self.arena, NodeData::synthesized(), kind)
    }

    fn list(&self, nodes: &[&'a Node<'a>]) -> NodeList<'a> {
        alloc_list(self.arena, nodes.to_vec())
    }

    fn literal(&self, value: LiteralValue<'a>, raw: String) -> &'a Node<'a> {
        let raw = self.arena.alloc_str(&raw);
        self.node(NodeKind::Literal(Literal { value, raw }))
    }

    // ========================================================================
    // Literals and names
    // ========================================================================

    /// A numeric literal.
    ///
    /// # Example
    /// ```
    /// use esscope_core::arena::AstArena;
    /// use esscope_nodebuilder::NodeBuilder;
    /// let arena = AstArena::new();
    /// let b = NodeBuilder::new(&arena);
    /// assert_eq!(b.l(2.0).syntax_name(), "Literal");
    /// ```
    pub fn l(&self, value: f64) -> &'a Node<'a> {
        self.literal(LiteralValue::Number(value), value.to_string())
    }

    /// A string literal.
    pub fn s(&self, value: &str) -> &'a Node<'a> {
        let value = self.arena.alloc_str(value);
        self.literal(LiteralValue::String(value), format!("{:?}", value))
    }

    /// A boolean literal.
    pub fn b(&self, value: bool) -> &'a Node<'a> {
        self.literal(LiteralValue::Boolean(value), value.to_string())
    }

    pub fn null(&self) -> &'a Node<'a> {
        self.literal(LiteralValue::Null, "null".to_string())
    }

    /// An identifier.
    pub fn i(&self, name: &str) -> &'a Node<'a> {
        let name = self.arena.alloc_str(name);
        self.node(NodeKind::Identifier(Identifier { name }))
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    /// `object.property` from two names.
    ///
    /// # Example
    /// ```
    /// use esscope_ast::NodeKind;
    /// use esscope_core::arena::AstArena;
    /// use esscope_nodebuilder::NodeBuilder;
    /// let arena = AstArena::new();
    /// let b = NodeBuilder::new(&arena);
    /// let NodeKind::MemberExpression(member) = &b.me("a", "b").kind else { unreachable!() };
    /// assert_eq!(member.qualified_name().as_deref(), Some("a.b"));
    /// ```
    pub fn me(&self, object: &str, property: &str) -> &'a Node<'a> {
        self.member(self.i(object), self.i(property), false)
    }

    /// `object.property` or `object[property]`.
    pub fn member(&self, object: &'a Node<'a>, property: &'a Node<'a>, computed: bool) -> &'a Node<'a> {
        self.node(NodeKind::MemberExpression(MemberExpression {
            object: Cell::new(object),
            property: Cell::new(property),
            computed,
        }))
    }

    /// `callee(arguments...)`.
    pub fn ce(&self, callee: &'a Node<'a>, arguments: &[&'a Node<'a>]) -> &'a Node<'a> {
        self.node(NodeKind::CallExpression(CallExpression {
            callee: Cell::new(callee),
            arguments: self.list(arguments),
        }))
    }

    /// `new callee(arguments...)`.
    pub fn new_expr(&self, callee: &'a Node<'a>, arguments: &[&'a Node<'a>]) -> &'a Node<'a> {
        self.node(NodeKind::NewExpression(CallExpression {
            callee: Cell::new(callee),
            arguments: self.list(arguments),
        }))
    }

    /// An array literal; `None` is a hole.
    pub fn array(&self, elements: &[Option<&'a Node<'a>>]) -> &'a Node<'a> {
        let elements = alloc_optional_list(self.arena, elements.to_vec());
        self.node(NodeKind::ArrayExpression(ArrayExpression { elements }))
    }

    /// An object literal.
    pub fn oe(&self, properties: &[&'a Node<'a>]) -> &'a Node<'a> {
        self.node(NodeKind::ObjectExpression(ObjectExpression {
            properties: self.list(properties),
        }))
    }

    /// A `key: value` property with an identifier key.
    pub fn prop(&self, key: &str, value: &'a Node<'a>) -> &'a Node<'a> {
        self.node(NodeKind::Property(Property {
            key: Cell::new(self.i(key)),
            value: Cell::new(value),
            kind: PropertyKind::Init,
        }))
    }

    /// `left = right`.
    pub fn assign(&self, left: &'a Node<'a>, right: &'a Node<'a>) -> &'a Node<'a> {
        self.node(NodeKind::AssignmentExpression(AssignmentExpression {
            operator: AssignmentOperator::Assign,
            left: Cell::new(left),
            right: Cell::new(right),
        }))
    }

    /// A function expression with no parameters and an empty body.
    pub fn func(&self, name: Option<&str>) -> &'a Node<'a> {
        let function = self.function(name, &[], None, FunctionOptions::default());
        self.node(NodeKind::FunctionExpression(function))
    }

    // ========================================================================
    // Statements
    // ========================================================================

    /// A function declaration. A missing body is an empty block.
    pub fn dec_func(
        &self,
        name: &str,
        params: &[&str],
        body: Option<&'a Node<'a>>,
        options: FunctionOptions,
    ) -> &'a Node<'a> {
        let function = self.function(Some(name), params, body, options);
        self.node(NodeKind::FunctionDeclaration(function))
    }

    fn function(
        &self,
        name: Option<&str>,
        params: &[&str],
        body: Option<&'a Node<'a>>,
        options: FunctionOptions,
    ) -> Function<'a> {
        let params: Vec<_> = params.iter().map(|param| self.i(param)).collect();
        Function {
            id: Cell::new(name.map(|name| self.i(name))),
            params: alloc_list(self.arena, params),
            body: Cell::new(body.unwrap_or_else(|| self.block(&[]))),
            generator: options.generator,
            expression: options.expression,
        }
    }

    /// A block statement.
    pub fn block(&self, statements: &[&'a Node<'a>]) -> &'a Node<'a> {
        self.node(NodeKind::BlockStatement(BlockStatement {
            body: self.list(statements),
        }))
    }

    /// `var name = init;` with a single declarator.
    pub fn var_decl(&self, name: &str, init: Option<&'a Node<'a>>) -> &'a Node<'a> {
        let declarator = self.node(NodeKind::VariableDeclarator(VariableDeclarator {
            id: Cell::new(self.i(name)),
            init: Cell::new(init),
        }));
        self.node(NodeKind::VariableDeclaration(VariableDeclaration {
            declarations: self.list(&[declarator]),
            kind: VariableKind::Var,
        }))
    }

    /// An expression statement.
    pub fn expr_stmt(&self, expression: &'a Node<'a>) -> &'a Node<'a> {
        self.node(NodeKind::ExpressionStatement(ExpressionStatement {
            expression: Cell::new(expression),
        }))
    }

    /// A whole program.
    pub fn program(&self, statements: &[&'a Node<'a>]) -> &'a Node<'a> {
        self.node(NodeKind::Program(Program {
            body: self.list(statements),
        }))
    }
}
