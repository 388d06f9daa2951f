//! AST node definitions.
//!
//! The node shapes follow the ESTree conventions for the ES5 subset the
//! parser accepts. Every node is allocated in an [`AstArena`] and children are
//! held in `Cell` slots, so the scope resolver can rewrite an identifier use
//! into a shared reference to its declaring node without copying it.

use crate::operators::*;
use esscope_core::arena::AstArena;
use esscope_core::text::TextRange;
use std::cell::Cell;

// ============================================================================
// Core Node Wrapper
// ============================================================================

/// A rewritable reference to a child node.
pub type Child<'a> = Cell<&'a Node<'a>>;

/// A rewritable reference to an optional child node.
pub type OptionalChild<'a> = Cell<Option<&'a Node<'a>>>;

/// A list of child slots, allocated in the arena.
pub type NodeList<'a> = &'a [Child<'a>];

/// Common data shared by all AST nodes.
#[derive(Debug, Clone)]
pub struct NodeData {
    /// Source position range; empty for synthesized nodes.
    pub range: TextRange,
    /// 1-based source line. Set by the parser, or by the scope resolver
    /// for nodes that were built without one.
    line: Cell<Option<u32>>,
}

impl NodeData {
    pub fn new(range: TextRange, line: u32) -> Self {
        Self {
            range,
            line: Cell::new(Some(line)),
        }
    }

    /// Data for a node that has no source position.
    pub fn synthesized() -> Self {
        Self {
            range: TextRange::default(),
            line: Cell::new(None),
        }
    }
}

#[derive(Debug)]
pub struct Node<'a> {
    pub data: NodeData,
    pub kind: NodeKind<'a>,
}

#[derive(Debug)]
pub enum NodeKind<'a> {
    Program(Program<'a>),

    // -- Statements --
    EmptyStatement,
    ExpressionStatement(ExpressionStatement<'a>),
    BlockStatement(BlockStatement<'a>),
    VariableDeclaration(VariableDeclaration<'a>),
    VariableDeclarator(VariableDeclarator<'a>),
    FunctionDeclaration(Function<'a>),
    IfStatement(IfStatement<'a>),
    ForStatement(ForStatement<'a>),
    ForInStatement(ForInStatement<'a>),
    WhileStatement(WhileStatement<'a>),
    DoWhileStatement(WhileStatement<'a>),
    ReturnStatement(ReturnStatement<'a>),
    BreakStatement(JumpStatement<'a>),
    ContinueStatement(JumpStatement<'a>),
    ThrowStatement(ThrowStatement<'a>),
    TryStatement(TryStatement<'a>),
    CatchClause(CatchClause<'a>),
    WithStatement(WithStatement<'a>),
    LabeledStatement(LabeledStatement<'a>),
    SwitchStatement(SwitchStatement<'a>),
    SwitchCase(SwitchCase<'a>),

    // -- Expressions --
    Identifier(Identifier<'a>),
    Literal(Literal<'a>),
    ThisExpression,
    ArrayExpression(ArrayExpression<'a>),
    ObjectExpression(ObjectExpression<'a>),
    Property(Property<'a>),
    FunctionExpression(Function<'a>),
    MemberExpression(MemberExpression<'a>),
    CallExpression(CallExpression<'a>),
    NewExpression(CallExpression<'a>),
    AssignmentExpression(AssignmentExpression<'a>),
    BinaryExpression(BinaryExpression<'a>),
    LogicalExpression(LogicalExpression<'a>),
    UnaryExpression(UnaryExpression<'a>),
    UpdateExpression(UpdateExpression<'a>),
    ConditionalExpression(ConditionalExpression<'a>),
    SequenceExpression(SequenceExpression<'a>),
}

impl<'a> Node<'a> {
    /// Allocate a node in the arena.
    pub fn alloc(arena: &'a AstArena, data: NodeData, kind: NodeKind<'a>) -> &'a Node<'a> {
        arena.alloc(Node { data, kind })
    }

    /// Whether two references point at the very same node.
    #[inline]
    pub fn same_node(a: &Node<'_>, b: &Node<'_>) -> bool {
        std::ptr::eq(a as *const Node<'_> as *const u8, b as *const Node<'_> as *const u8)
    }

    #[inline]
    pub fn line(&self) -> Option<u32> {
        self.data.line.get()
    }

    #[inline]
    pub fn set_line(&self, line: u32) {
        self.data.line.set(Some(line));
    }

    #[inline]
    pub fn range(&self) -> TextRange {
        self.data.range
    }

    /// The identifier name if this node is an `Identifier`.
    pub fn identifier_name(&self) -> Option<&'a str> {
        match &self.kind {
            NodeKind::Identifier(ident) => Some(ident.name),
            _ => None,
        }
    }

    /// The statement list of a `Program` or `BlockStatement`.
    pub fn statements(&self) -> Option<NodeList<'a>> {
        match &self.kind {
            NodeKind::Program(program) => Some(program.body),
            NodeKind::BlockStatement(block) => Some(block.body),
            _ => None,
        }
    }

    /// The function payload of a function declaration or expression.
    pub fn as_function(&self) -> Option<&Function<'a>> {
        match &self.kind {
            NodeKind::FunctionDeclaration(func) | NodeKind::FunctionExpression(func) => Some(func),
            _ => None,
        }
    }

    /// The ESTree type name of this node.
    pub fn syntax_name(&self) -> &'static str {
        match &self.kind {
            NodeKind::Program(_) => "Program",
            NodeKind::EmptyStatement => "EmptyStatement",
            NodeKind::ExpressionStatement(_) => "ExpressionStatement",
            NodeKind::BlockStatement(_) => "BlockStatement",
            NodeKind::VariableDeclaration(_) => "VariableDeclaration",
            NodeKind::VariableDeclarator(_) => "VariableDeclarator",
            NodeKind::FunctionDeclaration(_) => "FunctionDeclaration",
            NodeKind::IfStatement(_) => "IfStatement",
            NodeKind::ForStatement(_) => "ForStatement",
            NodeKind::ForInStatement(_) => "ForInStatement",
            NodeKind::WhileStatement(_) => "WhileStatement",
            NodeKind::DoWhileStatement(_) => "DoWhileStatement",
            NodeKind::ReturnStatement(_) => "ReturnStatement",
            NodeKind::BreakStatement(_) => "BreakStatement",
            NodeKind::ContinueStatement(_) => "ContinueStatement",
            NodeKind::ThrowStatement(_) => "ThrowStatement",
            NodeKind::TryStatement(_) => "TryStatement",
            NodeKind::CatchClause(_) => "CatchClause",
            NodeKind::WithStatement(_) => "WithStatement",
            NodeKind::LabeledStatement(_) => "LabeledStatement",
            NodeKind::SwitchStatement(_) => "SwitchStatement",
            NodeKind::SwitchCase(_) => "SwitchCase",
            NodeKind::Identifier(_) => "Identifier",
            NodeKind::Literal(_) => "Literal",
            NodeKind::ThisExpression => "ThisExpression",
            NodeKind::ArrayExpression(_) => "ArrayExpression",
            NodeKind::ObjectExpression(_) => "ObjectExpression",
            NodeKind::Property(_) => "Property",
            NodeKind::FunctionExpression(_) => "FunctionExpression",
            NodeKind::MemberExpression(_) => "MemberExpression",
            NodeKind::CallExpression(_) => "CallExpression",
            NodeKind::NewExpression(_) => "NewExpression",
            NodeKind::AssignmentExpression(_) => "AssignmentExpression",
            NodeKind::BinaryExpression(_) => "BinaryExpression",
            NodeKind::LogicalExpression(_) => "LogicalExpression",
            NodeKind::UnaryExpression(_) => "UnaryExpression",
            NodeKind::UpdateExpression(_) => "UpdateExpression",
            NodeKind::ConditionalExpression(_) => "ConditionalExpression",
            NodeKind::SequenceExpression(_) => "SequenceExpression",
        }
    }
}

/// Allocate a list of child slots.
pub fn alloc_list<'a>(arena: &'a AstArena, nodes: Vec<&'a Node<'a>>) -> NodeList<'a> {
    arena.alloc_vec(nodes.into_iter().map(Cell::new).collect())
}

/// Allocate a list of optional child slots (array literals with holes).
pub fn alloc_optional_list<'a>(
    arena: &'a AstArena,
    nodes: Vec<Option<&'a Node<'a>>>,
) -> &'a [OptionalChild<'a>] {
    arena.alloc_vec(nodes.into_iter().map(Cell::new).collect())
}

// ============================================================================
// Program and Statements
// ============================================================================

#[derive(Debug)]
pub struct Program<'a> {
    pub body: NodeList<'a>,
}

#[derive(Debug)]
pub struct ExpressionStatement<'a> {
    pub expression: Child<'a>,
}

#[derive(Debug)]
pub struct BlockStatement<'a> {
    pub body: NodeList<'a>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableKind {
    Var,
    Let,
    Const,
}

impl VariableKind {
    pub fn as_str(self) -> &'static str {
        match self {
            VariableKind::Var => "var",
            VariableKind::Let => "let",
            VariableKind::Const => "const",
        }
    }
}

#[derive(Debug)]
pub struct VariableDeclaration<'a> {
    pub declarations: NodeList<'a>,
    pub kind: VariableKind,
}

#[derive(Debug)]
pub struct VariableDeclarator<'a> {
    pub id: Child<'a>,
    pub init: OptionalChild<'a>,
}

/// Shared payload of `FunctionDeclaration` and `FunctionExpression`.
#[derive(Debug)]
pub struct Function<'a> {
    pub id: OptionalChild<'a>,
    pub params: NodeList<'a>,
    /// Always a `BlockStatement`.
    pub body: Child<'a>,
    pub generator: bool,
    pub expression: bool,
}

#[derive(Debug)]
pub struct IfStatement<'a> {
    pub test: Child<'a>,
    pub consequent: Child<'a>,
    pub alternate: OptionalChild<'a>,
}

#[derive(Debug)]
pub struct ForStatement<'a> {
    pub init: OptionalChild<'a>,
    pub test: OptionalChild<'a>,
    pub update: OptionalChild<'a>,
    pub body: Child<'a>,
}

#[derive(Debug)]
pub struct ForInStatement<'a> {
    /// A `VariableDeclaration` with one declarator, or an assignment target.
    pub left: Child<'a>,
    pub right: Child<'a>,
    pub body: Child<'a>,
}

/// Payload of `while` and `do ... while` loops.
#[derive(Debug)]
pub struct WhileStatement<'a> {
    pub test: Child<'a>,
    pub body: Child<'a>,
}

#[derive(Debug)]
pub struct ReturnStatement<'a> {
    pub argument: OptionalChild<'a>,
}

/// Payload of `break` and `continue`.
#[derive(Debug)]
pub struct JumpStatement<'a> {
    pub label: OptionalChild<'a>,
}

#[derive(Debug)]
pub struct ThrowStatement<'a> {
    pub argument: Child<'a>,
}

#[derive(Debug)]
pub struct TryStatement<'a> {
    pub block: Child<'a>,
    pub handler: OptionalChild<'a>,
    pub finalizer: OptionalChild<'a>,
}

#[derive(Debug)]
pub struct CatchClause<'a> {
    pub param: Child<'a>,
    pub body: Child<'a>,
}

#[derive(Debug)]
pub struct WithStatement<'a> {
    pub object: Child<'a>,
    pub body: Child<'a>,
}

#[derive(Debug)]
pub struct LabeledStatement<'a> {
    pub label: Child<'a>,
    pub body: Child<'a>,
}

#[derive(Debug)]
pub struct SwitchStatement<'a> {
    pub discriminant: Child<'a>,
    pub cases: NodeList<'a>,
}

#[derive(Debug)]
pub struct SwitchCase<'a> {
    /// `None` for the `default` clause.
    pub test: OptionalChild<'a>,
    pub consequent: NodeList<'a>,
}

// ============================================================================
// Expressions
// ============================================================================

#[derive(Debug)]
pub struct Identifier<'a> {
    pub name: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LiteralValue<'a> {
    Null,
    Boolean(bool),
    Number(f64),
    String(&'a str),
    RegExp { pattern: &'a str, flags: &'a str },
}

#[derive(Debug)]
pub struct Literal<'a> {
    pub value: LiteralValue<'a>,
    /// Source text of the literal.
    pub raw: &'a str,
}

#[derive(Debug)]
pub struct ArrayExpression<'a> {
    /// `None` entries are holes (`[1, , 3]`).
    pub elements: &'a [OptionalChild<'a>],
}

#[derive(Debug)]
pub struct ObjectExpression<'a> {
    pub properties: NodeList<'a>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    Init,
    Get,
    Set,
}

#[derive(Debug)]
pub struct Property<'a> {
    /// An `Identifier` or `Literal`; never resolved.
    pub key: Child<'a>,
    pub value: Child<'a>,
    pub kind: PropertyKind,
}

#[derive(Debug)]
pub struct MemberExpression<'a> {
    pub object: Child<'a>,
    pub property: Child<'a>,
    pub computed: bool,
}

impl<'a> MemberExpression<'a> {
    /// The dotted path of a non-computed member chain rooted at an
    /// identifier, e.g. `"a.b.c"`.
    pub fn qualified_name(&self) -> Option<String> {
        if self.computed {
            return None;
        }
        let property = self.property.get().identifier_name()?;
        let object = self.object.get();
        let prefix = match &object.kind {
            NodeKind::Identifier(ident) => ident.name.to_string(),
            NodeKind::MemberExpression(inner) => inner.qualified_name()?,
            _ => return None,
        };
        Some(format!("{}.{}", prefix, property))
    }
}

/// Payload of `CallExpression` and `NewExpression`.
#[derive(Debug)]
pub struct CallExpression<'a> {
    pub callee: Child<'a>,
    pub arguments: NodeList<'a>,
}

#[derive(Debug)]
pub struct AssignmentExpression<'a> {
    pub operator: AssignmentOperator,
    pub left: Child<'a>,
    pub right: Child<'a>,
}

#[derive(Debug)]
pub struct BinaryExpression<'a> {
    pub operator: BinaryOperator,
    pub left: Child<'a>,
    pub right: Child<'a>,
}

#[derive(Debug)]
pub struct LogicalExpression<'a> {
    pub operator: LogicalOperator,
    pub left: Child<'a>,
    pub right: Child<'a>,
}

#[derive(Debug)]
pub struct UnaryExpression<'a> {
    pub operator: UnaryOperator,
    pub argument: Child<'a>,
}

#[derive(Debug)]
pub struct UpdateExpression<'a> {
    pub operator: UpdateOperator,
    pub argument: Child<'a>,
    pub prefix: bool,
}

#[derive(Debug)]
pub struct ConditionalExpression<'a> {
    pub test: Child<'a>,
    pub consequent: Child<'a>,
    pub alternate: Child<'a>,
}

#[derive(Debug)]
pub struct SequenceExpression<'a> {
    pub expressions: NodeList<'a>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident<'a>(arena: &'a AstArena, name: &str) -> &'a Node<'a> {
        let name = arena.alloc_str(name);
        Node::alloc(arena, NodeData::synthesized(), NodeKind::Identifier(Identifier { name }))
    }

    fn member<'a>(arena: &'a AstArena, object: &'a Node<'a>, property: &'a Node<'a>) -> &'a Node<'a> {
        Node::alloc(
            arena,
            NodeData::synthesized(),
            NodeKind::MemberExpression(MemberExpression {
                object: Cell::new(object),
                property: Cell::new(property),
                computed: false,
            }),
        )
    }

    #[test]
    fn test_same_node_is_identity() {
        let arena = AstArena::new();
        let a = ident(&arena, "a");
        let b = ident(&arena, "a");
        assert!(Node::same_node(a, a));
        assert!(!Node::same_node(a, b));
    }

    #[test]
    fn test_line_is_settable_through_shared_reference() {
        let arena = AstArena::new();
        let a = ident(&arena, "a");
        assert_eq!(a.line(), None);
        a.set_line(4);
        assert_eq!(a.line(), Some(4));
    }

    #[test]
    fn test_qualified_name() {
        let arena = AstArena::new();
        let ab = member(&arena, ident(&arena, "a"), ident(&arena, "b"));
        let abc = member(&arena, ab, ident(&arena, "c"));
        let NodeKind::MemberExpression(m) = &abc.kind else {
            panic!("expected member expression");
        };
        assert_eq!(m.qualified_name().as_deref(), Some("a.b.c"));
        assert_eq!(abc.syntax_name(), "MemberExpression");
    }
}
