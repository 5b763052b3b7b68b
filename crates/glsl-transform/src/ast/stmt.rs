//! Statement nodes.

use glsl_grammar::SyntaxKind;

use super::macros::ast_node;
use super::macros::ast_union;
use super::Expression;
use super::PrecisionDeclaration;
use super::TypeAndInitDeclaration;
use crate::node::AstNode;

ast_node!(
    /// `{ ... }`.
    CompoundStatement,
    SyntaxKind::CompoundStatement
);

impl CompoundStatement {
    /// The statements directly inside this block, in source order.
    pub fn statements(&self) -> Vec<Statement> {
        self.syntax().children_as()
    }
}

ast_node!(
    /// An expression used as a statement (`foo();`, or a bare `;`).
    ExpressionStatement,
    SyntaxKind::ExpressionStatement
);

impl ExpressionStatement {
    /// The expression, absent for a bare `;`.
    pub fn expr(&self) -> Option<Expression> {
        self.syntax().first_child_as()
    }
}

ast_node!(
    /// A local declaration used as a statement.
    DeclarationStatement,
    SyntaxKind::DeclarationStatement
);

impl DeclarationStatement {
    /// The wrapped declaration.
    pub fn declaration(&self) -> Option<Declaration> {
        self.syntax().first_child_as()
    }
}

ast_union!(
    /// A declaration that can appear inside a [`DeclarationStatement`].
    Declaration {
        TypeAndInit(TypeAndInitDeclaration),
        Precision(PrecisionDeclaration),
    }
);

ast_node!(
    /// `if (...) ... else ...`.
    SelectionStatement,
    SyntaxKind::SelectionStatement
);

impl SelectionStatement {
    /// The branch condition.
    pub fn condition(&self) -> Option<Expression> {
        self.syntax().first_child_as()
    }

    /// The statement run when `condition` is true.
    pub fn then_branch(&self) -> Option<Statement> {
        self.syntax().children().into_iter().filter_map(Statement::cast).next()
    }

    /// The statement run when `condition` is false, if an `else` is present.
    pub fn else_branch(&self) -> Option<Statement> {
        self.syntax().children().into_iter().filter_map(Statement::cast).nth(1)
    }
}

ast_node!(
    /// `switch (...) { ... }`.
    SwitchStatement,
    SyntaxKind::SwitchStatement
);

impl SwitchStatement {
    /// The switch condition.
    pub fn condition(&self) -> Option<Expression> {
        self.syntax().first_child_as()
    }

    /// The statements making up the switch body, including [`CaseLabel`]s.
    pub fn body(&self) -> Vec<Statement> {
        self.syntax()
            .children()
            .into_iter()
            .skip(1)
            .filter_map(Statement::cast)
            .collect()
    }
}

ast_node!(
    /// `for (init; cond; step) body`.
    ForStatement,
    SyntaxKind::ForStatement
);

impl ForStatement {
    /// The loop initializer, either a [`DeclarationStatement`] or an
    /// [`ExpressionStatement`].
    pub fn init(&self) -> Option<Statement> {
        self.syntax().children().into_iter().find_map(Statement::cast)
    }

    /// The loop condition, absent means "always true".
    pub fn condition(&self) -> Option<Expression> {
        self.syntax().children().into_iter().filter_map(Expression::cast).next()
    }

    /// The loop body.
    pub fn body(&self) -> Option<Statement> {
        self.syntax().children().into_iter().filter_map(Statement::cast).nth(1)
    }
}

ast_node!(
    /// `while (...) body`.
    WhileStatement,
    SyntaxKind::WhileStatement
);

impl WhileStatement {
    /// The loop condition.
    pub fn condition(&self) -> Option<Expression> {
        self.syntax().first_child_as()
    }

    /// The loop body.
    pub fn body(&self) -> Option<Statement> {
        self.syntax().children().into_iter().filter_map(Statement::cast).next()
    }
}

ast_node!(
    /// `do body while (...);`.
    DoWhileStatement,
    SyntaxKind::DoWhileStatement
);

impl DoWhileStatement {
    /// The loop body.
    pub fn body(&self) -> Option<Statement> {
        self.syntax().children().into_iter().filter_map(Statement::cast).next()
    }

    /// The loop condition.
    pub fn condition(&self) -> Option<Expression> {
        self.syntax().first_child_as()
    }
}

ast_node!(
    /// `break`/`continue`/`return [expr]`/`discard`.
    JumpStatement,
    SyntaxKind::JumpStatement
);

impl JumpStatement {
    /// This jump's keyword kind (`KwBreak`, `KwContinue`, `KwReturn`, or
    /// `KwDiscard`).
    pub fn keyword(&self) -> Option<SyntaxKind> {
        self.syntax()
            .tokens()
            .into_iter()
            .find(|t| {
                matches!(
                    t.kind,
                    SyntaxKind::KwBreak | SyntaxKind::KwContinue | SyntaxKind::KwReturn | SyntaxKind::KwDiscard
                )
            })
            .map(|t| t.kind)
    }

    /// The returned expression, present only on `return EXPR;`.
    pub fn value(&self) -> Option<Expression> {
        self.syntax().first_child_as()
    }
}

ast_node!(
    /// `case EXPR:` or `default:`.
    CaseLabel,
    SyntaxKind::CaseLabel
);

impl CaseLabel {
    /// The case expression; `None` for `default:`.
    pub fn value(&self) -> Option<Expression> {
        self.syntax().first_child_as()
    }
}

ast_node!(
    /// A standalone `;` used as a statement.
    EmptyStatement,
    SyntaxKind::EmptyStatement
);

ast_union!(
    /// Any node that can appear directly inside a [`CompoundStatement`] or
    /// as a loop/branch body.
    Statement {
        Compound(CompoundStatement),
        Expression(ExpressionStatement),
        Declaration(DeclarationStatement),
        Selection(SelectionStatement),
        Switch(SwitchStatement),
        For(ForStatement),
        While(WhileStatement),
        DoWhile(DoWhileStatement),
        Jump(JumpStatement),
        Case(CaseLabel),
        Empty(EmptyStatement),
    }
);
