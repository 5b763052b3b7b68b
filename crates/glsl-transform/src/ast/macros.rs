//! Declarative macros that stamp out typed AST wrapper boilerplate, grounded
//! on the `wdl-ast` convention of a one-field newtype over a generic node
//! whose `can_cast`/`cast`/`syntax` methods check a single `SyntaxKind`.

/// Defines a single-kind typed wrapper: `struct $name(Node)` whose
/// `can_cast` matches exactly `$kind`.
macro_rules! ast_node {
    ($(#[$meta:meta])* $name:ident, $kind:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $name(crate::node::Node);

        impl crate::node::AstNode for $name {
            fn can_cast(kind: glsl_grammar::SyntaxKind) -> bool {
                kind == $kind
            }

            fn cast(node: crate::node::Node) -> Option<Self> {
                if Self::can_cast(node.kind()) {
                    Some($name(node))
                } else {
                    None
                }
            }

            fn syntax(&self) -> &crate::node::Node {
                &self.0
            }
        }
    };
}

/// Defines a union wrapper over several typed variants, each represented by
/// an existing `AstNode` type, dispatching `cast` to whichever variant's
/// `can_cast` accepts the node's kind.
macro_rules! ast_union {
    ($(#[$meta:meta])* $name:ident { $($variant:ident($ty:ty)),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub enum $name {
            $($variant($ty)),+
        }

        impl crate::node::AstNode for $name {
            fn can_cast(kind: glsl_grammar::SyntaxKind) -> bool {
                $(<$ty as crate::node::AstNode>::can_cast(kind))||+
            }

            fn cast(node: crate::node::Node) -> Option<Self> {
                $(
                    if <$ty as crate::node::AstNode>::can_cast(node.kind()) {
                        return <$ty as crate::node::AstNode>::cast(node).map($name::$variant);
                    }
                )+
                None
            }

            fn syntax(&self) -> &crate::node::Node {
                match self {
                    $($name::$variant(inner) => inner.syntax()),+
                }
            }
        }
    };
}

pub(crate) use ast_node;
pub(crate) use ast_union;
