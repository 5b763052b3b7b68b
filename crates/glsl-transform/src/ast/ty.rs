//! Type-system nodes: qualifiers, specifiers, structs, and declarations
//! built from them.

use glsl_grammar::SyntaxKind;

use super::macros::ast_node;
use super::Expression;
use crate::node::AstNode;
use crate::node::Node;

ast_node!(
    /// A mutable identifier name, indexable by current spelling.
    Identifier,
    SyntaxKind::Identifier
);

impl Identifier {
    /// This identifier's current spelling.
    pub fn text(&self) -> Option<String> {
        self.syntax().text()
    }

    /// Renames this identifier in place, keeping the identifier index in
    /// sync with the new spelling.
    pub fn set_text(&self, new_name: impl Into<String>) {
        let new_name = new_name.into();
        let root = self.syntax().root();
        let old = self.text();
        root.with_inner_mut(|inner| {
            let data = inner.arena.get_mut(self.syntax().id());
            data.text = Some(new_name.clone());
            for child in &mut data.children {
                if let crate::arena::Child::Token(tok) = child {
                    if tok.kind == SyntaxKind::Ident {
                        tok.text = new_name.clone();
                    }
                }
            }
        });
        if let Some(old) = old {
            root.with_inner_mut(|inner| inner.rename_identifier(self.syntax().id(), &old, &new_name));
        }
    }
}

ast_node!(
    /// An ordered sequence of qualifier parts (storage, interpolation,
    /// precision, `invariant`, `precise`, memory, `layout(...)`).
    TypeQualifier,
    SyntaxKind::TypeQualifier
);

impl TypeQualifier {
    /// This qualifier's `layout(...)` clause, if any.
    pub fn layout(&self) -> Option<LayoutQualifier> {
        self.syntax().first_child_as()
    }

    /// Every non-layout qualifier keyword's text, in source order.
    pub fn keywords(&self) -> Vec<String> {
        self.syntax().tokens().into_iter().map(|t| t.text).collect()
    }

    /// Whether any token is the storage keyword `qualifier` (e.g. `"in"`,
    /// `"out"`, `"uniform"`).
    pub fn has_storage(&self, qualifier: &str) -> bool {
        self.keywords().iter().any(|k| k == qualifier)
    }
}

ast_node!(
    /// `layout(...)`.
    LayoutQualifier,
    SyntaxKind::LayoutQualifier
);

impl LayoutQualifier {
    /// The individual `name`/`name = expr` entries, in source order.
    pub fn ids(&self) -> Vec<LayoutQualifierId> {
        self.syntax().children_as()
    }
}

ast_node!(
    /// One `name` or `name = expr` entry of a [`LayoutQualifier`].
    LayoutQualifierId,
    SyntaxKind::LayoutQualifierId
);

impl LayoutQualifierId {
    /// The entry's name (e.g. `"location"`, `"binding"`).
    pub fn name(&self) -> Option<String> {
        self.syntax().first_token_text(SyntaxKind::Ident)
    }

    /// The entry's value expression, if it has an `= expr` part.
    pub fn value(&self) -> Option<Expression> {
        self.syntax().first_child_as()
    }
}

ast_node!(
    /// A type specifier: a builtin, struct, or named type, with an optional
    /// array specifier.
    TypeSpecifier,
    SyntaxKind::TypeSpecifier
);

impl TypeSpecifier {
    /// The specifier's base type name: a builtin (`vec4`), `void`, a struct
    /// name, or an already-declared type name.
    pub fn name(&self) -> Option<String> {
        self.syntax()
            .tokens()
            .into_iter()
            .find(|t| matches!(t.kind, SyntaxKind::KwBuiltinType | SyntaxKind::KwVoid | SyntaxKind::Ident))
            .map(|t| t.text)
    }

    /// The inline `struct { ... }` definition, if this specifier is one.
    pub fn struct_specifier(&self) -> Option<StructSpecifier> {
        self.syntax().first_child_as()
    }

    /// This specifier's trailing array specifier, if any (the
    /// `float[4] a;`-shaped form, as opposed to an array specifier on the
    /// declaration member itself).
    pub fn array_specifier(&self) -> Option<ArraySpecifier> {
        self.syntax().first_child_as()
    }
}

ast_node!(
    /// `struct Name { ... }`.
    StructSpecifier,
    SyntaxKind::StructSpecifier
);

impl StructSpecifier {
    /// The struct's name, absent for an anonymous struct.
    pub fn name(&self) -> Option<String> {
        self.syntax().first_token_text(SyntaxKind::Ident)
    }

    /// The struct's members, in source order.
    pub fn members(&self) -> Vec<StructMember> {
        self.syntax().children_as()
    }
}

ast_node!(
    /// One member of a [`StructSpecifier`] or an [`InterfaceBlockDeclaration`].
    StructMember,
    SyntaxKind::StructMember
);

impl StructMember {
    /// The member's qualifier list, if any.
    pub fn qualifier(&self) -> Option<TypeQualifier> {
        self.syntax().first_child_as()
    }

    /// The member's declared type.
    pub fn ty(&self) -> Option<TypeSpecifier> {
        self.syntax().first_child_as()
    }

    /// The member's declared names (a member list may declare more than
    /// one, e.g. `float a, b;`).
    pub fn declarators(&self) -> Vec<DeclarationMember> {
        self.syntax().children_as()
    }
}

ast_node!(
    /// `[N]` or `[]`.
    ArraySpecifier,
    SyntaxKind::ArraySpecifier
);

impl ArraySpecifier {
    /// The declared size, absent for an unsized (`[]`) specifier.
    pub fn size(&self) -> Option<Expression> {
        self.syntax().first_child_as()
    }
}

ast_node!(
    /// One name (plus optional array specifier and initializer) of a
    /// [`TypeAndInitDeclaration`] or [`StructMember`].
    DeclarationMember,
    SyntaxKind::DeclarationMember
);

impl DeclarationMember {
    /// The declared name.
    pub fn name(&self) -> Option<String> {
        self.syntax().first_token_text(SyntaxKind::Ident)
    }

    /// The member's array specifier(s), in source order (GLSL allows
    /// stacking, e.g. `float a[4][2];`).
    pub fn array_specifiers(&self) -> Vec<ArraySpecifier> {
        self.syntax().children_as()
    }

    /// The initializer expression, if this member has one.
    pub fn initializer(&self) -> Option<Expression> {
        self.syntax().first_child_as()
    }
}

ast_node!(
    /// `QUALIFIER? TYPE name [= init], name2 [= init2], ...;`.
    TypeAndInitDeclaration,
    SyntaxKind::TypeAndInitDeclaration
);

impl TypeAndInitDeclaration {
    /// This declaration's qualifier list, if any.
    pub fn qualifier(&self) -> Option<TypeQualifier> {
        self.syntax().first_child_as()
    }

    /// This declaration's type.
    pub fn ty(&self) -> Option<TypeSpecifier> {
        self.syntax().first_child_as()
    }

    /// This declaration's member list (one per comma-separated name).
    pub fn members(&self) -> Vec<DeclarationMember> {
        self.syntax().children_as()
    }
}

ast_node!(
    /// `QUALIFIER? Name { ... } [instanceName [array]];`.
    InterfaceBlockDeclaration,
    SyntaxKind::InterfaceBlockDeclaration
);

impl InterfaceBlockDeclaration {
    /// This block's qualifier list, if any.
    pub fn qualifier(&self) -> Option<TypeQualifier> {
        self.syntax().first_child_as()
    }

    /// The block's type name.
    pub fn block_name(&self) -> Option<String> {
        self.syntax().first_token_text(SyntaxKind::Ident)
    }

    /// The block's members.
    pub fn members(&self) -> Vec<StructMember> {
        self.syntax().children_as()
    }

    /// The block's instance name, if it declares one (`} name;`).
    pub fn instance_name(&self) -> Option<String> {
        self.syntax().tokens().into_iter().filter(|t| t.kind == SyntaxKind::Ident).nth(1).map(|t| t.text)
    }

    /// The instance's array specifier, if the instance is itself arrayed.
    pub fn array_specifier(&self) -> Option<ArraySpecifier> {
        self.syntax().first_child_as()
    }
}

ast_node!(
    /// `precision QUALIFIER TYPE;`.
    PrecisionDeclaration,
    SyntaxKind::PrecisionDeclaration
);

impl PrecisionDeclaration {
    /// The precision qualifier keyword's text (`highp`/`mediump`/`lowp`).
    pub fn qualifier(&self) -> Option<String> {
        self.syntax().first_token_text(SyntaxKind::KwPrecision)
    }

    /// The type this precision applies to.
    pub fn ty(&self) -> Option<TypeSpecifier> {
        self.syntax().first_child_as()
    }
}

/// A qualifier/specifier pair read off of any node that carries them as
/// direct children (declarations, function parameters, struct members).
/// Unlike the other wrappers here this has no single backing `SyntaxKind` of
/// its own — the grammar never materializes a standalone node for it — so
/// it's a plain read view rather than an [`AstNode`] impl.
#[derive(Debug, Clone)]
pub struct FullySpecifiedType {
    /// The qualifier list, if any.
    pub qualifier: Option<TypeQualifier>,
    /// The type specifier.
    pub specifier: Option<TypeSpecifier>,
}

impl FullySpecifiedType {
    /// Reads the qualifier/specifier pair directly off `node`'s children.
    pub fn of(node: &Node) -> Self {
        FullySpecifiedType {
            qualifier: node.first_child_as(),
            specifier: node.first_child_as(),
        }
    }
}
