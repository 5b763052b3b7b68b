//! Expression nodes.

use glsl_grammar::SyntaxKind;

use super::macros::ast_node;
use super::macros::ast_union;
use super::Identifier;
use crate::node::AstNode;

ast_node!(
    /// A reference to an identifier (a variable, function, or type name
    /// used as a call target).
    ReferenceExpr,
    SyntaxKind::ReferenceExpr
);

impl ReferenceExpr {
    /// The referenced name.
    pub fn identifier(&self) -> Option<Identifier> {
        self.syntax().first_child_as()
    }

    /// The referenced name's current spelling.
    pub fn name(&self) -> Option<String> {
        self.identifier().and_then(|id| id.text())
    }
}

ast_node!(
    /// An integer/float/double/bool/string literal.
    LiteralExpr,
    SyntaxKind::LiteralExpr
);

impl LiteralExpr {
    /// The literal's exact source text.
    pub fn text(&self) -> Option<String> {
        self.syntax().tokens().into_iter().map(|t| t.text).next()
    }
}

ast_node!(
    /// `(...)`.
    GroupingExpr,
    SyntaxKind::GroupingExpr
);

impl GroupingExpr {
    /// The parenthesized expression.
    pub fn inner(&self) -> Option<Expression> {
        self.syntax().first_child_as()
    }
}

ast_node!(
    /// `a.b`.
    MemberAccessExpr,
    SyntaxKind::MemberAccessExpr
);

impl MemberAccessExpr {
    /// The base expression (`a`).
    pub fn base(&self) -> Option<Expression> {
        self.syntax().first_child_as()
    }

    /// The accessed member name (`b`).
    pub fn member(&self) -> Option<String> {
        self.syntax().first_token_text(SyntaxKind::Ident)
    }
}

ast_node!(
    /// `a[b]`.
    ArrayAccessExpr,
    SyntaxKind::ArrayAccessExpr
);

impl ArrayAccessExpr {
    /// The indexed expression.
    pub fn base(&self) -> Option<Expression> {
        self.syntax().children_as::<Expression>().into_iter().next()
    }

    /// The index expression.
    pub fn index(&self) -> Option<Expression> {
        self.syntax().children_as::<Expression>().into_iter().nth(1)
    }
}

ast_node!(
    /// `f(a, b)`.
    CallExpr,
    SyntaxKind::CallExpr
);

impl CallExpr {
    /// The call target, usually a [`ReferenceExpr`] or a [`MemberAccessExpr`].
    pub fn callee(&self) -> Option<Expression> {
        self.syntax().children_as::<Expression>().into_iter().next()
    }

    /// The call's argument expressions, in source order.
    pub fn args(&self) -> Vec<Expression> {
        self.syntax().children_as::<Expression>().into_iter().skip(1).collect()
    }
}

ast_node!(
    /// `a++` / `a--`.
    PostfixExpr,
    SyntaxKind::PostfixExpr
);

impl PostfixExpr {
    /// The operand.
    pub fn operand(&self) -> Option<Expression> {
        self.syntax().first_child_as()
    }

    /// The operator spelling (`++` or `--`).
    pub fn operator(&self) -> Option<String> {
        self.syntax().first_token_text(SyntaxKind::Operator)
    }
}

ast_node!(
    /// `++a` / `--a` / unary `+a`/`-a`/`!a`/`~a`.
    PrefixExpr,
    SyntaxKind::PrefixExpr
);

impl PrefixExpr {
    /// The operator spelling.
    pub fn operator(&self) -> Option<String> {
        self.syntax().first_token_text(SyntaxKind::Operator)
    }

    /// The operand.
    pub fn operand(&self) -> Option<Expression> {
        self.syntax().first_child_as()
    }
}

ast_node!(
    /// Any binary operator, including assignment flavors (`=`, `+=`, ...).
    BinaryExpr,
    SyntaxKind::BinaryExpr
);

impl BinaryExpr {
    /// The left operand.
    pub fn lhs(&self) -> Option<Expression> {
        self.syntax().children_as::<Expression>().into_iter().next()
    }

    /// The operator spelling.
    pub fn operator(&self) -> Option<String> {
        self.syntax()
            .tokens()
            .into_iter()
            .find(|t| matches!(t.kind, SyntaxKind::Operator | SyntaxKind::Eq))
            .map(|t| t.text)
    }

    /// The right operand.
    pub fn rhs(&self) -> Option<Expression> {
        self.syntax().children_as::<Expression>().into_iter().nth(1)
    }

    /// Whether this binary expression is one of the `=`/`+=`/`-=`/... forms.
    pub fn is_assignment(&self) -> bool {
        matches!(self.operator().as_deref(), Some("=" | "+=" | "-=" | "*=" | "/=" | "%=" | "<<=" | ">>=" | "&=" | "^=" | "|="))
    }
}

ast_node!(
    /// `a ? b : c`.
    TernaryExpr,
    SyntaxKind::TernaryExpr
);

impl TernaryExpr {
    /// The condition.
    pub fn condition(&self) -> Option<Expression> {
        self.syntax().children_as::<Expression>().into_iter().next()
    }

    /// The value when `condition` is true.
    pub fn then_branch(&self) -> Option<Expression> {
        self.syntax().children_as::<Expression>().into_iter().nth(1)
    }

    /// The value when `condition` is false.
    pub fn else_branch(&self) -> Option<Expression> {
        self.syntax().children_as::<Expression>().into_iter().nth(2)
    }
}

ast_node!(
    /// `a, b, c`.
    SequenceExpr,
    SyntaxKind::SequenceExpr
);

impl SequenceExpr {
    /// The comma-separated expressions, in source order.
    pub fn items(&self) -> Vec<Expression> {
        self.syntax().children_as()
    }
}

ast_union!(
    /// Any expression node.
    Expression {
        Reference(ReferenceExpr),
        Literal(LiteralExpr),
        Grouping(GroupingExpr),
        MemberAccess(MemberAccessExpr),
        ArrayAccess(ArrayAccessExpr),
        Call(CallExpr),
        Postfix(PostfixExpr),
        Prefix(PrefixExpr),
        Binary(BinaryExpr),
        Ternary(TernaryExpr),
        Sequence(SequenceExpr),
    }
);
