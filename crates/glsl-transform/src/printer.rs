//! Reprints an AST to source text.
//!
//! Every token the parser produced — including hidden-channel whitespace and
//! comments — survives unchanged inside the AST's node children (see
//! [`crate::ast::build`]), so printing is mostly "walk the tree, concatenate
//! every token's text in order". The one place this crate adds anything of
//! its own is guaranteeing exactly one trailing newline after a `#version`/
//! `#extension`/`#pragma`/layout-defaults declaration, since a freshly
//! parsed or templated fragment injected at one of those positions may not
//! carry one.

use glsl_grammar::SyntaxKind;

use crate::ast;
use crate::node::AstNode;
use crate::node::Node;
use crate::node::RawChild;

/// Prints `unit` back to source text.
pub fn print(unit: &ast::TranslationUnit) -> String {
    let mut out = String::new();
    print_node(unit.syntax(), &mut out);
    out
}

fn print_node(node: &Node, out: &mut String) {
    let wants_trailing_newline = matches!(
        node.kind(),
        SyntaxKind::VersionDirective | SyntaxKind::ExtensionDirective | SyntaxKind::PragmaDirective | SyntaxKind::LayoutDefaults
    );
    let start = out.len();
    for child in node.raw_children() {
        match child {
            RawChild::Node(n) => print_node(&n, out),
            RawChild::Token(tok) => out.push_str(&tok.text),
        }
    }
    if wants_trailing_newline && out.len() > start && !out[start..].ends_with('\n') {
        out.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::root::Root;
    use crate::root::RootSupplier;
    use pretty_assertions::assert_eq;

    fn roundtrip(source: &str) -> String {
        let tree = glsl_grammar::parse_document(source).unwrap();
        let root = Root::new(RootSupplier::DEFAULT);
        let unit = ast::build(&tree, &root);
        print(&unit)
    }

    #[test]
    fn reprints_untouched_source_unchanged() {
        let source = "uniform float a;\nvoid main() {\n    foo();\n}\n";
        assert_eq!(roundtrip(source), source);
    }

    #[test]
    fn printing_is_idempotent_across_reparse() {
        let source = "#version 450\nuniform vec4 color;\n";
        let once = roundtrip(source);
        let twice = roundtrip(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn version_directive_gets_exactly_one_trailing_newline() {
        let tree = glsl_grammar::parse_document("#version 450\nvoid main(){}").unwrap();
        let root = Root::new(RootSupplier::DEFAULT);
        let unit = ast::build(&tree, &root);
        let printed = print(&unit);
        assert!(printed.starts_with("#version 450\n"));
        assert!(!printed.starts_with("#version 450\n\n"));
    }
}
