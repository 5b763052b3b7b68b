//! Translation-unit-level nodes: the document root and its external
//! declarations.

use glsl_grammar::SyntaxKind;

use super::macros::ast_node;
use super::macros::ast_union;
use super::CompoundStatement;
use super::InterfaceBlockDeclaration;
use super::PrecisionDeclaration;
use super::TypeAndInitDeclaration;
use super::TypeSpecifier;
use crate::node::AstNode;

ast_node!(
    /// The root of a parsed document: an ordered sequence of external
    /// declarations.
    TranslationUnit,
    SyntaxKind::TranslationUnit
);

impl TranslationUnit {
    /// This document's top-level items, in source order.
    pub fn external_declarations(&self) -> Vec<ExternalDeclaration> {
        self.syntax().children_as()
    }
}

ast_node!(
    /// `#version NUMBER [PROFILE]`.
    VersionDirective,
    SyntaxKind::VersionDirective
);

impl VersionDirective {
    /// The directive's raw text after `#version`, if the parser kept it
    /// (missing only for a malformed `#version` with nothing following).
    pub fn rest(&self) -> Option<String> {
        self.syntax().first_token_text(SyntaxKind::DirectiveRest)
    }
}

ast_node!(
    /// `#extension NAME : BEHAVIOR`.
    ExtensionDirective,
    SyntaxKind::ExtensionDirective
);

impl ExtensionDirective {
    /// The directive's raw text after `#extension`.
    pub fn rest(&self) -> Option<String> {
        self.syntax().first_token_text(SyntaxKind::DirectiveRest)
    }
}

ast_node!(
    /// `#pragma ...`.
    PragmaDirective,
    SyntaxKind::PragmaDirective
);

impl PragmaDirective {
    /// The directive's raw text after `#pragma`.
    pub fn rest(&self) -> Option<String> {
        self.syntax().first_token_text(SyntaxKind::DirectiveRest)
    }
}

ast_node!(
    /// A standalone `;` at the top level.
    EmptyExternalDecl,
    SyntaxKind::EmptyExternalDecl
);

ast_node!(
    /// `layout(...) in;` / `layout(...) out;`.
    LayoutDefaults,
    SyntaxKind::LayoutDefaults
);

impl LayoutDefaults {
    /// The qualifier list this default applies.
    pub fn qualifier(&self) -> Option<super::TypeQualifier> {
        self.syntax().first_child_as()
    }
}

ast_node!(
    /// A function definition: a header plus a [`CompoundStatement`] body.
    FunctionDefinition,
    SyntaxKind::FunctionDefinition
);

impl FunctionDefinition {
    /// The function's declared return type.
    pub fn return_type(&self) -> Option<TypeSpecifier> {
        self.syntax().first_child_as()
    }

    /// The function name.
    pub fn name(&self) -> Option<String> {
        self.syntax().first_token_text(SyntaxKind::Ident)
    }

    /// The function's parameter list, empty for `()` or `(void)`.
    pub fn parameters(&self) -> Vec<FunctionParameter> {
        self.syntax().children_as()
    }

    /// The function body.
    pub fn body(&self) -> Option<CompoundStatement> {
        self.syntax().first_child_as()
    }
}

ast_node!(
    /// A function prototype with no body (`void foo();`).
    FunctionPrototype,
    SyntaxKind::FunctionPrototype
);

impl FunctionPrototype {
    /// The function's declared return type.
    pub fn return_type(&self) -> Option<TypeSpecifier> {
        self.syntax().first_child_as()
    }

    /// The function name.
    pub fn name(&self) -> Option<String> {
        self.syntax().first_token_text(SyntaxKind::Ident)
    }

    /// The function's parameter list.
    pub fn parameters(&self) -> Vec<FunctionParameter> {
        self.syntax().children_as()
    }
}

ast_node!(
    /// One parameter of a [`FunctionDefinition`]/[`FunctionPrototype`].
    FunctionParameter,
    SyntaxKind::FunctionParameter
);

impl FunctionParameter {
    /// The parameter's qualifier list, if any.
    pub fn qualifier(&self) -> Option<super::TypeQualifier> {
        self.syntax().first_child_as()
    }

    /// The parameter's declared type.
    pub fn ty(&self) -> Option<TypeSpecifier> {
        self.syntax().first_child_as()
    }

    /// The parameter's name, if it has one (unnamed parameters are legal).
    pub fn name(&self) -> Option<String> {
        self.syntax().first_token_text(SyntaxKind::Ident)
    }
}

ast_union!(
    /// Any top-level item of a [`TranslationUnit`].
    ExternalDeclaration {
        Version(VersionDirective),
        Extension(ExtensionDirective),
        Pragma(PragmaDirective),
        Empty(EmptyExternalDecl),
        LayoutDefaults(LayoutDefaults),
        FunctionDefinition(FunctionDefinition),
        FunctionPrototype(FunctionPrototype),
        TypeAndInit(TypeAndInitDeclaration),
        InterfaceBlock(InterfaceBlockDeclaration),
        Precision(PrecisionDeclaration),
    }
);
