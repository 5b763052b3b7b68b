//! Typed wrappers over [`crate::node::Node`], one per node family, grouped
//! the way `wdl-ast` groups its `v1` module: top-level items, statements,
//! expressions, then the type system.

pub(crate) mod macros;

mod expr;
mod item;
mod stmt;
mod ty;

pub use expr::ArrayAccessExpr;
pub use expr::BinaryExpr;
pub use expr::CallExpr;
pub use expr::Expression;
pub use expr::GroupingExpr;
pub use expr::LiteralExpr;
pub use expr::MemberAccessExpr;
pub use expr::PostfixExpr;
pub use expr::PrefixExpr;
pub use expr::ReferenceExpr;
pub use expr::SequenceExpr;
pub use expr::TernaryExpr;
pub use item::EmptyExternalDecl;
pub use item::ExtensionDirective;
pub use item::ExternalDeclaration;
pub use item::FunctionDefinition;
pub use item::FunctionParameter;
pub use item::FunctionPrototype;
pub use item::LayoutDefaults;
pub use item::PragmaDirective;
pub use item::TranslationUnit;
pub use item::VersionDirective;
pub use stmt::CaseLabel;
pub use stmt::CompoundStatement;
pub use stmt::Declaration;
pub use stmt::DeclarationStatement;
pub use stmt::DoWhileStatement;
pub use stmt::EmptyStatement;
pub use stmt::ExpressionStatement;
pub use stmt::ForStatement;
pub use stmt::JumpStatement;
pub use stmt::SelectionStatement;
pub use stmt::Statement;
pub use stmt::SwitchStatement;
pub use stmt::WhileStatement;
pub use ty::ArraySpecifier;
pub use ty::DeclarationMember;
pub use ty::FullySpecifiedType;
pub use ty::Identifier;
pub use ty::InterfaceBlockDeclaration;
pub use ty::LayoutQualifier;
pub use ty::LayoutQualifierId;
pub use ty::PrecisionDeclaration;
pub use ty::StructMember;
pub use ty::StructSpecifier;
pub use ty::TypeAndInitDeclaration;
pub use ty::TypeQualifier;
pub use ty::TypeSpecifier;

use crate::node::AstNode;
use crate::node::Node;
use crate::root::Root;

/// Builds a [`TranslationUnit`] by walking a [`glsl_grammar::ParseTree`] into
/// fresh arena nodes inside `root`, then registering the whole tree with
/// `root`'s indices in one recursive pass.
///
/// Grounded on the same two-step shape the teacher's AST crate uses: a
/// syntax-free grammar crate produces an untyped tree, and the AST crate's
/// builder walks it once to produce the owned, mutable representation this
/// crate transforms.
pub fn build(tree: &glsl_grammar::ParseTree, root: &Root) -> TranslationUnit {
    root.index_build_session(|root| {
        let unit_id = build_node(tree, tree.root(), root);
        root.register(unit_id);
        TranslationUnit::cast(Node::new(unit_id, root.clone())).expect("parser always roots a document in TranslationUnit")
    })
}

/// Builds a raw [`Node`] from a parse tree rooted at any grammar rule
/// (`externalDeclaration`, `statement`, `expression`, ...), for fragments
/// that a [`crate::template::Matcher`]/[`crate::template::Template`] compiles
/// rather than a whole document.
pub fn build_fragment(tree: &glsl_grammar::ParseTree, root: &Root) -> Node {
    root.index_build_session(|root| {
        let id = build_node(tree, tree.root(), root);
        root.register(id);
        Node::new(id, root.clone())
    })
}

fn build_node(tree: &glsl_grammar::ParseTree, idx: glsl_grammar::NodeIdx, root: &Root) -> crate::arena::NodeId {
    use crate::arena::Child;
    use crate::arena::LeafToken;
    use crate::arena::NodeData;
    use glsl_grammar::ParseElement;

    let parse_node = tree.node(idx);
    let mut children = Vec::with_capacity(parse_node.children.len());
    let mut leaf_text = None;
    if parse_node.kind == glsl_grammar::SyntaxKind::Identifier {
        leaf_text = tree.child_tokens(idx).next().map(|t| t.text.clone());
    }
    for child in &parse_node.children {
        match child {
            ParseElement::Node(child_idx) => {
                let child_id = build_node(tree, *child_idx, root);
                children.push(Child::Node(child_id));
            }
            ParseElement::Token(tok) => children.push(Child::Token(LeafToken {
                kind: tok.kind,
                text: tok.text.clone(),
            })),
        }
    }
    let id = root.alloc(NodeData {
        kind: parse_node.kind,
        parent: None,
        children,
        text: leaf_text,
    });
    for child_id in root.with_inner(|inner| inner.arena.get(id).child_nodes().collect::<Vec<_>>()) {
        root.with_inner_mut(|inner| inner.arena.get_mut(child_id).parent = Some(id));
    }
    id
}
