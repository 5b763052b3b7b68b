//! The "parse a fragment on demand" half of the programmatic API, as opposed
//! to [`crate::manager::TransformationManager`]'s "parse a whole document and
//! drive phases over it" half. A phase's `run`/`enter`/`exit` reaches these
//! through [`crate::phase::PhaseEnv`]; callers building fragments by hand
//! (e.g. constructing a template's replacement by hand rather than through
//! [`crate::template::Template`]) use these directly.

use crate::ast;
use crate::error::Result;
use crate::node::Node;
use crate::root::Root;
use crate::root::RootSupplier;
use crate::template::ParseShape;
use crate::template::parse_fragment;

/// Parses `source` as a single `externalDeclaration`, attaching the result to
/// `root`.
pub fn parse_external_declaration(root: &Root, source: &str) -> Result<Node> {
    parse_node_separate(root, ParseShape::ExternalDeclaration, source)
}

/// Parses `source` as a single `statement`, attaching the result to `root`.
pub fn parse_statement(root: &Root, source: &str) -> Result<Node> {
    parse_node_separate(root, ParseShape::Statement, source)
}

/// Parses `source` as a single `expression`, attaching the result to `root`.
pub fn parse_expression(root: &Root, source: &str) -> Result<Node> {
    parse_node_separate(root, ParseShape::Expression, source)
}

/// Parses `source` as `shape`, attaching the result to a node graph owned by
/// `root`. Unlike [`crate::manager::TransformationManager::transform`], this
/// does not select a root supplier itself — `root` must already exist (built
/// with whichever supplier the caller wants this fragment indexed under).
pub fn parse_node_separate(root: &Root, shape: ParseShape, source: &str) -> Result<Node> {
    let (tree, _) = parse_fragment(source, shape)?;
    Ok(ast::build_fragment(&tree, root))
}

/// Parses `source` as a full `translationUnit` into a fresh [`Root`] built
/// with `supplier`.
pub fn parse_translation_unit(supplier: RootSupplier, source: &str) -> Result<(Root, ast::TranslationUnit)> {
    let (tree, _) = parse_fragment(source, ParseShape::TranslationUnit)?;
    let root = Root::new(supplier);
    let unit = ast::build(&tree, &root);
    Ok((root, unit))
}

#[cfg(test)]
mod tests {
    use super::*;
    use glsl_grammar::SyntaxKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_a_detached_statement() {
        let root = Root::new(RootSupplier::DEFAULT);
        let stmt = parse_statement(&root, "foo();").unwrap();
        assert_eq!(stmt.kind(), SyntaxKind::ExpressionStatement);
    }

    #[test]
    fn parses_a_full_translation_unit() {
        let (_, unit) = parse_translation_unit(RootSupplier::DEFAULT, "void main(){}").unwrap();
        assert_eq!(unit.external_declarations().len(), 1);
    }
}
