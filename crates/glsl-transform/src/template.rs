//! Matcher and Template: the two faces of a placeholder-bearing GLSL
//! fragment, one for structural matching, one for instantiation.

use std::collections::HashMap;

use glsl_grammar::SyntaxKind;

use crate::ast;
use crate::error::Error;
use crate::error::Result;
use crate::node::AstNode;
use crate::node::Node;
use crate::root::Root;
use crate::root::RootSupplier;

/// Which grammar rule a pattern fragment was parsed as, mirroring the
/// external parser's per-rule entrypoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseShape {
    /// `translationUnit`.
    TranslationUnit,
    /// `externalDeclaration`.
    ExternalDeclaration,
    /// `statement`.
    Statement,
    /// `expression`.
    Expression,
    /// `compoundStatement`.
    CompoundStatement,
}

pub(crate) fn parse_fragment(source: &str, shape: ParseShape) -> Result<(glsl_grammar::ParseTree, SyntaxKind)> {
    use glsl_grammar::Parser;
    let mut parser = Parser::new(source);
    parser.throw_parse_errors(true);
    let parse = match shape {
        ParseShape::TranslationUnit => parser.parse_translation_unit(),
        ParseShape::ExternalDeclaration => parser.parse_external_declaration(),
        ParseShape::Statement => parser.parse_statement(),
        ParseShape::Expression => parser.parse_expression(),
        ParseShape::CompoundStatement => parser.parse_compound_statement(),
    }?;
    let kind = parse.tree.node(parse.tree.root()).kind;
    Ok((parse.tree, kind))
}

/// The values captured by a successful [`Matcher::matches`].
#[derive(Debug, Clone, Default)]
pub struct Captures {
    nodes: HashMap<String, Node>,
    strings: HashMap<String, String>,
}

impl Captures {
    /// The node captured under `name`, requiring it to cast to `expected`
    /// being any node of kind `expected_kind` (spec's `getNodeMatch`).
    pub fn get_node_match(&self, name: &str, expected_kind: SyntaxKind) -> Result<&Node> {
        let node = self
            .nodes
            .get(name)
            .ok_or_else(|| Error::TemplateHoleMissing(format!("no node captured for '{name}'")))?;
        if node.kind() != expected_kind {
            return Err(Error::ShapeMismatch(format!(
                "capture '{name}' has kind {:?}, expected {expected_kind:?}",
                node.kind()
            )));
        }
        Ok(node)
    }

    /// The string captured under `name` (an identifier-wildcard capture).
    pub fn get_string_data_match(&self, name: &str) -> Result<&str> {
        self.strings
            .get(name)
            .map(|s| s.as_str())
            .ok_or_else(|| Error::TemplateHoleMissing(format!("no string captured for '{name}'")))
    }
}

/// A compiled, placeholder-bearing GLSL fragment used to test whether a
/// candidate subtree has the same shape, capturing placeholder positions
/// along the way.
pub struct Matcher {
    pattern_root: Root,
    pattern: Node,
    prefix: String,
    class_wildcards: HashMap<String, SyntaxKind>,
}

impl Matcher {
    /// Compiles `source` as `shape`, using `prefix` (commonly `"__"`) to
    /// recognize placeholder identifiers.
    pub fn new(source: &str, shape: ParseShape, prefix: impl Into<String>) -> Result<Matcher> {
        let (tree, _) = parse_fragment(source, shape)?;
        let pattern_root = Root::new(RootSupplier::DEFAULT);
        let unit_or_node = ast::build_fragment(&tree, &pattern_root);
        Ok(Matcher {
            pattern_root,
            pattern: unit_or_node,
            prefix: prefix.into(),
            class_wildcards: HashMap::new(),
        })
    }

    /// Registers `name` (a placeholder appearing as a [`crate::ast::ReferenceExpr`]
    /// in the pattern) as matching any candidate node of `kind`, regardless
    /// of the candidate's internal contents (spec's `markClassWildcard`).
    pub fn mark_class_wildcard(&mut self, name: impl Into<String>, kind: SyntaxKind) -> &mut Self {
        self.class_wildcards.insert(name.into(), kind);
        self
    }

    /// Tests `candidate` against this pattern, returning captures on
    /// success.
    pub fn matches(&self, candidate: &Node) -> Option<Captures> {
        let mut captures = Captures::default();
        if !self.match_node(&self.pattern, candidate, &mut captures) {
            return None;
        }
        Some(captures)
    }

    fn placeholder_name<'a>(&self, text: &'a str) -> Option<&'a str> {
        text.strip_prefix(self.prefix.as_str())
    }

    fn match_node(&self, pattern: &Node, candidate: &Node, captures: &mut Captures) -> bool {
        // A `ReferenceExpr` over a placeholder identifier captures whatever
        // expression-shaped subtree sits at the equivalent candidate
        // position (or, if a class wildcard was registered for that name,
        // any candidate node of the declared kind).
        if pattern.kind() == SyntaxKind::ReferenceExpr {
            if let Some(name) = pattern
                .first_child_of_kind(SyntaxKind::Identifier)
                .and_then(|id| id.text())
                .and_then(|t| self.placeholder_name(&t).map(str::to_owned))
            {
                if let Some(&expected) = self.class_wildcards.get(&name) {
                    if candidate.kind() != expected {
                        return false;
                    }
                }
                return self.bind_node_capture(&name, candidate, captures);
            }
        }

        if pattern.kind() != candidate.kind() {
            return false;
        }

        let pattern_tokens = pattern.tokens();
        let candidate_tokens = candidate.tokens();
        if pattern_tokens.len() != candidate_tokens.len() {
            return false;
        }
        for (p, c) in pattern_tokens.iter().zip(candidate_tokens.iter()) {
            if p.kind != c.kind {
                return false;
            }
            // An `Ident` leaf spelled with the placeholder prefix is an
            // identifier wildcard: it matches any spelling and records the
            // candidate's text. This is how member names, declarator
            // names, and block/function names (which the grammar carries
            // as bare tokens, not `Identifier` nodes) are captured.
            match self.placeholder_name(&p.text) {
                Some(name) if p.kind == SyntaxKind::Ident => {
                    if !self.bind_string_capture(&name.to_string(), c.text.clone(), captures) {
                        return false;
                    }
                }
                _ if p.text != c.text => return false,
                _ => {}
            }
        }

        let pattern_children = pattern.children();
        let candidate_children = candidate.children();
        if pattern_children.len() != candidate_children.len() {
            return false;
        }
        pattern_children
            .iter()
            .zip(candidate_children.iter())
            .all(|(p, c)| self.match_node(p, c, captures))
    }

    fn bind_node_capture(&self, name: &str, candidate: &Node, captures: &mut Captures) -> bool {
        if let Some(existing) = captures.nodes.get(name) {
            return structural_eq(existing, candidate);
        }
        captures.nodes.insert(name.to_string(), candidate.clone());
        true
    }

    fn bind_string_capture(&self, name: &str, text: String, captures: &mut Captures) -> bool {
        if let Some(existing) = captures.strings.get(name) {
            return *existing == text;
        }
        captures.strings.insert(name.to_string(), text);
        true
    }
}

/// Structural equality used both for repeated-placeholder validation and
/// for comparing a detached clone against its original.
pub fn structural_eq(a: &Node, b: &Node) -> bool {
    if a.kind() != b.kind() {
        return false;
    }
    if a.text() != b.text() {
        return false;
    }
    let at = a.tokens();
    let bt = b.tokens();
    if at.len() != bt.len() || at.iter().zip(bt.iter()).any(|(x, y)| x.kind != y.kind || x.text != y.text) {
        return false;
    }
    let ac = a.children();
    let bc = b.children();
    ac.len() == bc.len() && ac.iter().zip(bc.iter()).all(|(x, y)| structural_eq(x, y))
}

/// What a named hole in a [`Template`] accepts.
enum Hole {
    /// A node of the declared kind is substituted whole.
    Local(SyntaxKind),
    /// An identifier's spelling is substituted.
    Identifier,
}

/// A value supplied to fill one [`Template`] hole.
pub enum Value {
    /// A node, consumed by clone (the template does not take ownership of
    /// the caller's node).
    Node(Node),
    /// A new identifier spelling.
    Text(String),
}

/// The substitution bag passed to [`Template::instantiate`].
#[derive(Default)]
pub struct Substitutions(HashMap<String, Value>);

impl Substitutions {
    /// Creates an empty substitution bag.
    pub fn new() -> Self {
        Substitutions::default()
    }

    /// Supplies a node for hole `name`.
    pub fn with_node(mut self, name: impl Into<String>, node: Node) -> Self {
        self.0.insert(name.into(), Value::Node(node));
        self
    }

    /// Supplies identifier text for hole `name`.
    pub fn with_text(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.0.insert(name.into(), Value::Text(text.into()));
        self
    }
}

/// A compiled, placeholder-bearing GLSL fragment used to instantiate fresh
/// subtrees with holes filled in.
pub struct Template {
    pattern_root: Root,
    pattern: Node,
    prefix: String,
    holes: HashMap<String, Hole>,
}

impl Template {
    /// Compiles `source` as `shape`.
    pub fn new(source: &str, shape: ParseShape, prefix: impl Into<String>) -> Result<Template> {
        let (tree, _) = parse_fragment(source, shape)?;
        let pattern_root = Root::new(RootSupplier::DEFAULT);
        let pattern = ast::build_fragment(&tree, &pattern_root);
        Ok(Template {
            pattern_root,
            pattern,
            prefix: prefix.into(),
            holes: HashMap::new(),
        })
    }

    /// `Template::new(src, ExternalDeclaration, "__")`.
    pub fn with_external_declaration(source: &str) -> Result<Template> {
        Template::new(source, ParseShape::ExternalDeclaration, "__")
    }

    /// `Template::new(src, Statement, "__")`.
    pub fn with_statement(source: &str) -> Result<Template> {
        Template::new(source, ParseShape::Statement, "__")
    }

    /// `Template::new(src, Expression, "__")`.
    pub fn with_expression(source: &str) -> Result<Template> {
        Template::new(source, ParseShape::Expression, "__")
    }

    /// Declares that hole `name` accepts a node of `kind`.
    pub fn mark_local_replacement(&mut self, name: impl Into<String>, kind: SyntaxKind) -> &mut Self {
        self.holes.insert(name.into(), Hole::Local(kind));
        self
    }

    /// Declares that hole `name` accepts an identifier spelling.
    pub fn mark_identifier_replacement(&mut self, name: impl Into<String>) -> &mut Self {
        self.holes.insert(name.into(), Hole::Identifier);
        self
    }

    /// Instantiates this template into `dest`, filling every declared hole
    /// from `values`. Fails before any tree surfaces if a hole is unfilled
    /// or a value's kind doesn't match its hole's declared kind.
    pub fn instantiate(&self, dest: &Root, values: &Substitutions) -> Result<Node> {
        for (name, hole) in &self.holes {
            match (hole, values.0.get(name)) {
                (Hole::Local(kind), Some(Value::Node(node))) if node.kind() == *kind => {}
                (Hole::Identifier, Some(Value::Text(_))) => {}
                (_, None) => return Err(Error::TemplateHoleMissing(name.clone())),
                _ => return Err(Error::ShapeMismatch(format!("hole '{name}' given a value of the wrong shape"))),
            }
        }
        dest.index_build_session(|dest| self.instantiate_node(&self.pattern, dest, values))
    }

    fn instantiate_node(&self, pattern: &Node, dest: &Root, values: &Substitutions) -> Result<Node> {
        if pattern.kind() == SyntaxKind::ReferenceExpr {
            if let Some(name) = pattern
                .first_child_of_kind(SyntaxKind::Identifier)
                .and_then(|id| id.text())
                .and_then(|t| t.strip_prefix(self.prefix.as_str()).map(str::to_owned))
            {
                if matches!(self.holes.get(&name), Some(Hole::Local(_))) {
                    let Some(Value::Node(supplied)) = values.0.get(&name) else {
                        return Err(Error::TemplateHoleMissing(name));
                    };
                    return Ok(supplied.clone_into(dest));
                }
            }
        }
        if pattern.kind() == SyntaxKind::Identifier {
            if let Some(name) = pattern.text().and_then(|t| t.strip_prefix(self.prefix.as_str()).map(str::to_owned)) {
                if matches!(self.holes.get(&name), Some(Hole::Identifier)) {
                    let Some(Value::Text(text)) = values.0.get(&name) else {
                        return Err(Error::TemplateHoleMissing(name));
                    };
                    let cloned = pattern.clone_into(dest);
                    if let Some(identifier) = crate::ast::Identifier::cast(cloned.clone()) {
                        identifier.set_text(text.clone());
                    }
                    return Ok(cloned);
                }
            }
        }

        // Neither a hole itself nor an ancestor whose direct children are
        // all holeless: rebuild this node's child list fresh rather than
        // clone-then-replace, so a hole nested several levels down is
        // substituted in place instead of being spliced into a throwaway
        // copy of its surroundings.
        crate::node::clone_shell_with(dest, pattern, &mut |dest, child| self.instantiate_node(child, dest, values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::root::Root;
    use pretty_assertions::assert_eq;

    #[test]
    fn matcher_captures_declarator_name_as_string() {
        let matcher = Matcher::new("float __name;", ParseShape::ExternalDeclaration, "__").unwrap();
        let root = Root::new(RootSupplier::DEFAULT);
        let tree = glsl_grammar::parse_document("float counter;").unwrap();
        let unit = ast::build(&tree, &root);
        let decl = unit.syntax().children()[0].clone();
        let caps = matcher.matches(&decl).expect("should match");
        assert_eq!(caps.get_string_data_match("name").unwrap(), "counter");
    }

    #[test]
    fn matcher_captures_call_argument_as_node() {
        let matcher = Matcher::new("foo(__arg);", ParseShape::Statement, "__").unwrap();
        let root = Root::new(RootSupplier::DEFAULT);
        let tree = glsl_grammar::parse_document("void main(){ foo(bar + 1); }").unwrap();
        let unit = ast::build(&tree, &root);
        let func = unit.syntax().children()[0].clone();
        let body = func.children().into_iter().find(|c| c.kind() == SyntaxKind::CompoundStatement).unwrap();
        let call_stmt = body.children()[0].clone();
        let caps = matcher.matches(&call_stmt).expect("should match");
        let arg = caps.get_node_match("arg", SyntaxKind::BinaryExpr).unwrap();
        assert_eq!(arg.kind(), SyntaxKind::BinaryExpr);
    }

    #[test]
    fn template_fills_identifier_hole() {
        let mut tpl = Template::with_external_declaration("float __name;").unwrap();
        tpl.mark_identifier_replacement("name");
        let root = Root::new(RootSupplier::DEFAULT);
        let node = tpl
            .instantiate(&root, &Substitutions::new().with_text("name", "frame"))
            .unwrap();
        assert_eq!(node.kind(), SyntaxKind::TypeAndInitDeclaration);
    }
}
