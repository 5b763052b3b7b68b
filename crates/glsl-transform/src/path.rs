//! A small compiled, XPath-like query language over the AST, per node-kind
//! steps rather than free text: `"child::CallExpr/child::ReferenceExpr[1]"`.

use glsl_grammar::SyntaxKind;

use crate::error::Error;
use crate::error::Result;
use crate::node::Node;

/// The traversal direction of one path step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Direct structural children.
    Child,
    /// All structural descendants, any depth.
    Descendant,
    /// All ancestors, nearest first.
    Ancestor,
}

/// One step of a compiled [`Path`]: an axis, an optional kind filter, and an
/// optional 1-based ordinal filter among the axis's matches.
#[derive(Debug, Clone)]
struct Step {
    axis: Axis,
    kind: Option<SyntaxKind>,
    ordinal: Option<usize>,
}

/// A compiled path expression, reusable across runs once compiled in a
/// phase's `init`.
#[derive(Debug, Clone)]
pub struct Path {
    steps: Vec<Step>,
}

impl Path {
    /// Compiles `source`, a `/`-separated sequence of steps shaped
    /// `axis::Kind[n]` (`axis::` and `[n]` both optional; axis defaults to
    /// `child`).
    pub fn compile(source: &str) -> Result<Path> {
        let mut steps = Vec::new();
        for raw in source.split('/').filter(|s| !s.is_empty()) {
            steps.push(compile_step(raw)?);
        }
        if steps.is_empty() {
            return Err(Error::InvalidPattern("path has no steps".into()));
        }
        Ok(Path { steps })
    }

    /// Evaluates this path starting from `start`, returning every matching
    /// node in document order (or nearest-first for a trailing `ancestor`
    /// step).
    pub fn evaluate(&self, start: &Node) -> Vec<Node> {
        let mut current = vec![start.clone()];
        for step in &self.steps {
            let mut next = Vec::new();
            for node in &current {
                next.extend(step_matches(step, node));
            }
            current = next;
        }
        current
    }
}

fn compile_step(raw: &str) -> Result<Step> {
    let (axis_str, rest) = match raw.split_once("::") {
        Some((a, r)) => (a, r),
        None => ("child", raw),
    };
    let axis = match axis_str {
        "child" => Axis::Child,
        "descendant" => Axis::Descendant,
        "ancestor" => Axis::Ancestor,
        other => return Err(Error::InvalidPattern(format!("unknown axis '{other}'"))),
    };
    let (kind_str, ordinal) = if let Some(start) = rest.find('[') {
        if !rest.ends_with(']') {
            return Err(Error::InvalidPattern(format!("unterminated ordinal in step '{raw}'")));
        }
        let n: usize = rest[start + 1..rest.len() - 1]
            .parse()
            .map_err(|_| Error::InvalidPattern(format!("bad ordinal in step '{raw}'")))?;
        (&rest[..start], Some(n))
    } else {
        (rest, None)
    };
    let kind = if kind_str.is_empty() || kind_str == "*" {
        None
    } else {
        Some(kind_from_name(kind_str).ok_or_else(|| Error::InvalidPattern(format!("unknown node kind '{kind_str}'")))?)
    };
    Ok(Step { axis, kind, ordinal })
}

fn step_matches(step: &Step, node: &Node) -> Vec<Node> {
    let candidates: Vec<Node> = match step.axis {
        Axis::Child => node.children(),
        Axis::Descendant => descendants(node),
        Axis::Ancestor => ancestors(node),
    };
    let mut filtered: Vec<Node> = candidates
        .into_iter()
        .filter(|n| step.kind.map(|k| n.kind() == k).unwrap_or(true))
        .collect();
    if let Some(n) = step.ordinal {
        filtered = filtered.into_iter().nth(n.saturating_sub(1)).into_iter().collect();
    }
    filtered
}

fn descendants(node: &Node) -> Vec<Node> {
    let mut out = Vec::new();
    for child in node.children() {
        out.push(child.clone());
        out.extend(descendants(&child));
    }
    out
}

fn ancestors(node: &Node) -> Vec<Node> {
    let mut out = Vec::new();
    let mut current = node.parent();
    while let Some(n) = current {
        current = n.parent();
        out.push(n);
    }
    out
}

/// Maps a path step's kind name onto a [`SyntaxKind`]. Only node kinds are
/// reachable this way; token kinds never appear as structural path steps.
fn kind_from_name(name: &str) -> Option<SyntaxKind> {
    use SyntaxKind::*;
    Some(match name {
        "TranslationUnit" => TranslationUnit,
        "VersionDirective" => VersionDirective,
        "ExtensionDirective" => ExtensionDirective,
        "PragmaDirective" => PragmaDirective,
        "EmptyExternalDecl" => EmptyExternalDecl,
        "LayoutDefaults" => LayoutDefaults,
        "FunctionDefinition" => FunctionDefinition,
        "FunctionPrototype" => FunctionPrototype,
        "FunctionParameter" => FunctionParameter,
        "TypeAndInitDeclaration" => TypeAndInitDeclaration,
        "DeclarationMember" => DeclarationMember,
        "InterfaceBlockDeclaration" => InterfaceBlockDeclaration,
        "PrecisionDeclaration" => PrecisionDeclaration,
        "EmptyDeclaration" => EmptyDeclaration,
        "CompoundStatement" => CompoundStatement,
        "ExpressionStatement" => ExpressionStatement,
        "DeclarationStatement" => DeclarationStatement,
        "SelectionStatement" => SelectionStatement,
        "SwitchStatement" => SwitchStatement,
        "ForStatement" => ForStatement,
        "WhileStatement" => WhileStatement,
        "DoWhileStatement" => DoWhileStatement,
        "JumpStatement" => JumpStatement,
        "CaseLabel" => CaseLabel,
        "EmptyStatement" => EmptyStatement,
        "ReferenceExpr" => ReferenceExpr,
        "LiteralExpr" => LiteralExpr,
        "GroupingExpr" => GroupingExpr,
        "MemberAccessExpr" => MemberAccessExpr,
        "ArrayAccessExpr" => ArrayAccessExpr,
        "CallExpr" => CallExpr,
        "PostfixExpr" => PostfixExpr,
        "PrefixExpr" => PrefixExpr,
        "BinaryExpr" => BinaryExpr,
        "TernaryExpr" => TernaryExpr,
        "SequenceExpr" => SequenceExpr,
        "TypeQualifier" => TypeQualifier,
        "LayoutQualifier" => LayoutQualifier,
        "LayoutQualifierId" => LayoutQualifierId,
        "TypeSpecifier" => TypeSpecifier,
        "StructSpecifier" => StructSpecifier,
        "StructMember" => StructMember,
        "ArraySpecifier" => ArraySpecifier,
        "Identifier" => Identifier,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::AstNode;
    use pretty_assertions::assert_eq;

    #[test]
    fn compiles_and_rejects_bad_axis() {
        assert!(Path::compile("child::CallExpr").is_ok());
        assert!(Path::compile("sideways::CallExpr").is_err());
    }

    #[test]
    fn finds_descendant_call_expressions() {
        let root = crate::root::Root::new(crate::root::RootSupplier::DEFAULT);
        let tree = glsl_grammar::parse_document("void main(){ foo(1); bar(2); }").unwrap();
        let unit = crate::ast::build(&tree, &root);
        let path = Path::compile("descendant::CallExpr").unwrap();
        let matches = path.evaluate(unit.syntax());
        assert_eq!(matches.len(), 2);
    }
}
