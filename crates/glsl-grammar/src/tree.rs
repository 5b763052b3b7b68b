//! The concrete parse tree produced by [`crate::parser`].
//!
//! Modeled on the teacher's `wdl_grammar::core::tree` cursor tree: an arena of
//! nodes addressed by index, each carrying an ordered list of children that
//! are either further nodes or leaf tokens (so hidden tokens survive into the
//! tree rather than being discarded at lex time).

use crate::Span;
use crate::kind::SyntaxKind;
use crate::lexer::Token;

/// An index into a [`ParseTree`]'s node arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIdx(pub(crate) u32);

/// One child of a parse tree node: either a nested node or a leaf token.
#[derive(Debug, Clone)]
pub enum ParseElement {
    /// A nested node.
    Node(NodeIdx),
    /// A leaf token, including hidden (trivia) tokens.
    Token(Token),
}

impl ParseElement {
    /// The kind of this element, whichever variant it is.
    pub fn kind(&self, tree: &ParseTree) -> SyntaxKind {
        match self {
            ParseElement::Node(idx) => tree.node(*idx).kind,
            ParseElement::Token(tok) => tok.kind,
        }
    }
}

/// One interior node of the parse tree.
#[derive(Debug, Clone)]
pub struct ParseNode {
    /// The grammar rule (or directive shape) this node represents.
    pub kind: SyntaxKind,
    /// The byte span covered by this node, including leading/trailing trivia
    /// attached to its descendant tokens.
    pub span: Span,
    /// This node's children, in source order.
    pub children: Vec<ParseElement>,
}

/// A parsed concrete syntax tree: an arena of [`ParseNode`]s plus the index of
/// the root.
#[derive(Debug, Clone)]
pub struct ParseTree {
    nodes: Vec<ParseNode>,
    root: NodeIdx,
    /// Diagnostics collected while building this tree (non-fatal; see
    /// [`crate::parser::ParsingStrategy`]).
    pub diagnostics: Vec<crate::error::ParseDiagnostic>,
}

impl ParseTree {
    pub(crate) fn new(nodes: Vec<ParseNode>, root: NodeIdx, diagnostics: Vec<crate::error::ParseDiagnostic>) -> Self {
        ParseTree {
            nodes,
            root,
            diagnostics,
        }
    }

    /// The root node's index (always the `translationUnit`/rule-specific root
    /// for a whole-document parse).
    pub fn root(&self) -> NodeIdx {
        self.root
    }

    /// Looks up a node by index.
    pub fn node(&self, idx: NodeIdx) -> &ParseNode {
        &self.nodes[idx.0 as usize]
    }

    /// Iterates a node's children that are themselves nodes, skipping tokens.
    pub fn child_nodes(&self, idx: NodeIdx) -> impl Iterator<Item = NodeIdx> + '_ {
        self.node(idx).children.iter().filter_map(|c| match c {
            ParseElement::Node(n) => Some(*n),
            ParseElement::Token(_) => None,
        })
    }

    /// Iterates a node's children that are tokens on the default (non-hidden)
    /// channel.
    pub fn child_tokens(&self, idx: NodeIdx) -> impl Iterator<Item = &Token> + '_ {
        self.node(idx).children.iter().filter_map(|c| match c {
            ParseElement::Token(t) if !t.kind.is_trivia() => Some(t),
            _ => None,
        })
    }
}

/// A mutable builder used by [`crate::parser::Parser`] to assemble a
/// [`ParseTree`] bottom-up: a rule starts a node, appends children (tokens or
/// finished child nodes), and finishes the node to get a [`NodeIdx`].
#[derive(Debug, Default)]
pub struct TreeBuilder {
    nodes: Vec<ParseNode>,
}

impl TreeBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        TreeBuilder::default()
    }

    /// Finishes a node of the given `kind` with `children`, computing its
    /// span as the union of its children's spans.
    pub fn finish_node(&mut self, kind: SyntaxKind, children: Vec<ParseElement>) -> NodeIdx {
        let span = span_of(&children, &self.nodes);
        let idx = NodeIdx(self.nodes.len() as u32);
        self.nodes.push(ParseNode {
            kind,
            span,
            children,
        });
        idx
    }

    /// Consumes the builder, producing a [`ParseTree`] rooted at `root`.
    pub fn build(self, root: NodeIdx, diagnostics: Vec<crate::error::ParseDiagnostic>) -> ParseTree {
        ParseTree::new(self.nodes, root, diagnostics)
    }
}

fn span_of(children: &[ParseElement], nodes: &[ParseNode]) -> Span {
    let mut start = None;
    let mut end = None;
    for child in children {
        let span = match child {
            ParseElement::Node(idx) => nodes[idx.0 as usize].span,
            ParseElement::Token(tok) => tok.span,
        };
        start = Some(start.map_or(span.start, |s: usize| s.min(span.start)));
        end = Some(end.map_or(span.end, |e: usize| e.max(span.end)));
    }
    Span {
        start: start.unwrap_or(0),
        end: end.unwrap_or(0),
    }
}
