//! Operator enums carried by expression nodes.

use crate::syntax_kind::SyntaxKind;

macro_rules! operator_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($variant:ident => $text:literal, $token:ident;)*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant,)*
        }

        impl $name {
            /// The operator as written in source.
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text,)*
                }
            }

            /// Map a token to this operator, if it is one.
            pub fn from_token(kind: SyntaxKind) -> Option<Self> {
                match kind {
                    $(SyntaxKind::$token => Some($name::$variant),)*
                    _ => None,
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

operator_enum! {
    /// `=` and the compound assignment operators.
    pub enum AssignmentOperator {
        Assign => "=", EqualsToken;
        AddAssign => "+=", PlusEqualsToken;
        SubAssign => "-=", MinusEqualsToken;
        MulAssign => "*=", AsteriskEqualsToken;
        DivAssign => "/=", SlashEqualsToken;
        RemAssign => "%=", PercentEqualsToken;
        ShlAssign => "<<=", LessThanLessThanEqualsToken;
        ShrAssign => ">>=", GreaterThanGreaterThanEqualsToken;
        UShrAssign => ">>>=", GreaterThanGreaterThanGreaterThanEqualsToken;
        BitAndAssign => "&=", AmpersandEqualsToken;
        BitOrAssign => "|=", BarEqualsToken;
        BitXorAssign => "^=", CaretEqualsToken;
    }
}

operator_enum! {
    /// Non-short-circuiting binary operators.
    pub enum BinaryOperator {
        Eq => "==", EqualsEqualsToken;
        NotEq => "!=", ExclamationEqualsToken;
        StrictEq => "===", EqualsEqualsEqualsToken;
        StrictNotEq => "!==", ExclamationEqualsEqualsToken;
        Lt => "<", LessThanToken;
        LtEq => "<=", LessThanEqualsToken;
        Gt => ">", GreaterThanToken;
        GtEq => ">=", GreaterThanEqualsToken;
        Shl => "<<", LessThanLessThanToken;
        Shr => ">>", GreaterThanGreaterThanToken;
        UShr => ">>>", GreaterThanGreaterThanGreaterThanToken;
        Add => "+", PlusToken;
        Sub => "-", MinusToken;
        Mul => "*", AsteriskToken;
        Div => "/", SlashToken;
        Rem => "%", PercentToken;
        BitOr => "|", BarToken;
        BitXor => "^", CaretToken;
        BitAnd => "&", AmpersandToken;
        In => "in", InKeyword;
        InstanceOf => "instanceof", InstanceOfKeyword;
    }
}

operator_enum! {
    /// `&&` and `||`.
    pub enum LogicalOperator {
        And => "&&", AmpersandAmpersandToken;
        Or => "||", BarBarToken;
    }
}

operator_enum! {
    /// Prefix unary operators.
    pub enum UnaryOperator {
        Minus => "-", MinusToken;
        Plus => "+", PlusToken;
        Not => "!", ExclamationToken;
        BitNot => "~", TildeToken;
        TypeOf => "typeof", TypeOfKeyword;
        Void => "void", VoidKeyword;
        Delete => "delete", DeleteKeyword;
    }
}

operator_enum! {
    /// `++` and `--`.
    pub enum UpdateOperator {
        Increment => "++", PlusPlusToken;
        Decrement => "--", MinusMinusToken;
    }
}
