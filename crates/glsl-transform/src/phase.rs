//! A transformation phase's contract and the environment it runs through.
//!
//! A phase is either **walk-shaped** (enter/exit callbacks driven by a
//! shared depth-first traversal, fused with every other walk phase scheduled
//! at the same `(index, group)`) or **run-shaped** (a single callback
//! invoked with the translation-unit root, for bulk index queries). Which
//! shape a phase is drives how a [`crate::transformation::PhaseCollector`]
//! schedules it; `PhaseEnv` is the same regardless of shape.

use std::cell::RefCell;
use std::collections::HashMap;

use glsl_grammar::SyntaxKind;

use crate::ast;
use crate::error::Error;
use crate::error::Result;
use crate::node::AstNode;
use crate::node::Node;
use crate::path::Path;
use crate::root::Root;
use crate::template::Matcher;
use crate::template::ParseShape;

/// The lifecycle a bound phase moves through across runs: `Created` until
/// its first `init`, then `Initialized`; `Active`/`Skipped` reflect the
/// current run's `Phase::is_active` check and flip back to `Initialized`
/// once the run ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseState {
    /// Registered with a collector but never run.
    Created,
    /// `init` has run at least once.
    Initialized,
    /// Participating in the run currently in progress.
    Active,
    /// Skipped for the run currently in progress (`is_active` returned
    /// `false`).
    Skipped,
}

/// Which traversal shape a [`Phase`] wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseShape {
    /// Driven node-by-node by a shared depth-first traversal.
    Walk,
    /// Invoked once per run with the translation-unit root.
    Run,
}

/// A unique insertion slot in a translation unit's top-level child sequence,
/// or inside a named function's body. Multiple injections to the same point
/// preserve their relative call order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InjectionPoint {
    /// Before any `#version` directive (and before everything else).
    BeforeVersion,
    /// After `#version`, before any `#extension` directive.
    BeforeExtensions,
    /// After `#version`/`#extension`, before any `#pragma` directive.
    BeforeDirectives,
    /// After every directive, before the first non-directive declaration.
    BeforeDeclarations,
    /// At the very end of the translation unit.
    BeforeEof,
    /// At the end of the named function's body, before its closing brace.
    EndOfFunctionBody(String),
    /// At the start of the named function's body, before its first
    /// statement.
    BeforeFunctionBody(String),
}

/// Where an external-declaration kind sits in the directive ordering: lower
/// sorts earlier. Used to find the insertion boundary for the four
/// directive-relative injection points.
fn family(kind: SyntaxKind) -> u8 {
    match kind {
        SyntaxKind::VersionDirective => 0,
        SyntaxKind::ExtensionDirective => 1,
        SyntaxKind::PragmaDirective => 2,
        _ => 3,
    }
}

fn family_threshold(point: &InjectionPoint) -> Option<u8> {
    match point {
        InjectionPoint::BeforeVersion => Some(0),
        InjectionPoint::BeforeExtensions => Some(1),
        InjectionPoint::BeforeDirectives => Some(2),
        InjectionPoint::BeforeDeclarations => Some(3),
        _ => None,
    }
}

/// The environment a phase acts through: pattern/path compilation, and the
/// AST-mutating operations spec'd for phase use (injection, sibling lookup,
/// main-function convenience helpers).
pub struct PhaseEnv<'a> {
    root: &'a Root,
    unit: &'a ast::TranslationUnit,
    active: bool,
    /// The last node injected at each [`InjectionPoint`] during this env's
    /// lifetime, so a second injection to the same point lands after the
    /// first rather than recomputing its position from scratch (which would
    /// place it before the first, since the first injection now itself
    /// satisfies whatever boundary condition located the insertion point).
    injection_cursors: RefCell<HashMap<InjectionPoint, Node>>,
}

impl<'a> PhaseEnv<'a> {
    pub(crate) fn new(root: &'a Root, unit: &'a ast::TranslationUnit, active: bool) -> Self {
        PhaseEnv {
            root,
            unit,
            active,
            injection_cursors: RefCell::new(HashMap::new()),
        }
    }

    /// The root this run's AST lives in.
    pub fn root(&self) -> &Root {
        self.root
    }

    /// The translation unit this run is transforming.
    pub fn unit(&self) -> &ast::TranslationUnit {
        self.unit
    }

    /// Compiles a structural query, meant to be called once from
    /// `Phase::init` and reused every run.
    pub fn compile_path(&self, source: &str) -> Result<Path> {
        Path::compile(source)
    }

    /// Compiles a placeholder-bearing pattern as `shape`, meant to be called
    /// once from `Phase::init` and reused every run.
    pub fn compile_pattern(&self, source: &str, shape: ParseShape, prefix: impl Into<String>) -> Result<Matcher> {
        Matcher::new(source, shape, prefix)
    }

    /// Whether this phase is participating in the current run.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// This node's siblings, excluding itself, in source order.
    pub fn get_siblings(&self, node: &Node) -> Vec<Node> {
        node.parent()
            .map(|parent| parent.children().into_iter().filter(|c| c != node).collect())
            .unwrap_or_default()
    }

    /// Parses `source` as an external declaration and injects it at `point`.
    pub fn inject_external_declaration(&self, source: &str, point: &InjectionPoint) -> Result<()> {
        let (tree, _) = crate::template::parse_fragment(source, ParseShape::ExternalDeclaration)?;
        let node = ast::build_fragment(&tree, self.root);
        self.inject_node(point, node)
    }

    /// Injects a single already-built node at `point`.
    pub fn inject_node(&self, point: &InjectionPoint, node: Node) -> Result<()> {
        self.inject_nodes(point, vec![node])
    }

    /// Injects several already-built nodes at `point`, in the given order.
    pub fn inject_nodes(&self, point: &InjectionPoint, nodes: Vec<Node>) -> Result<()> {
        let Some(last) = nodes.last().cloned() else {
            return Ok(());
        };
        match point {
            InjectionPoint::EndOfFunctionBody(name) => {
                let body = self.function_body(name)?;
                for node in nodes {
                    node.setup(&body);
                }
            }
            InjectionPoint::BeforeFunctionBody(name) => {
                let body = self.function_body(name)?;
                let start = self.cursor_start(point, &body, || 0);
                self.insert_sequence(&body, start, nodes);
            }
            InjectionPoint::BeforeEof => {
                for node in nodes {
                    node.setup(self.unit.syntax());
                }
            }
            _ => {
                let threshold = family_threshold(point).expect("top-level injection point");
                let unit_node = self.unit.syntax().clone();
                let start = self.cursor_start(point, &unit_node, || {
                    unit_node
                        .children()
                        .iter()
                        .position(|c| family(c.kind()) >= threshold)
                        .unwrap_or(unit_node.children().len())
                });
                self.insert_sequence(&unit_node, start, nodes);
            }
        }
        self.injection_cursors.borrow_mut().insert(point.clone(), last);
        Ok(())
    }

    /// The index to insert at for a repeated injection to `point`: right
    /// after the previous injection's last node if it's still where we left
    /// it, otherwise `default_start` (the initial-injection boundary scan).
    fn cursor_start(&self, point: &InjectionPoint, parent: &Node, default_start: impl FnOnce() -> usize) -> usize {
        let cursors = self.injection_cursors.borrow();
        match cursors.get(point) {
            Some(last) => parent.children().iter().position(|c| c == last).map_or_else(default_start, |i| i + 1),
            None => default_start(),
        }
    }

    fn insert_sequence(&self, parent: &Node, start: usize, nodes: Vec<Node>) {
        for (offset, node) in nodes.into_iter().enumerate() {
            parent.insert_child_at(start + offset, &node);
        }
    }

    fn function_body(&self, name: &str) -> Result<Node> {
        for decl in self.unit.external_declarations() {
            if let ast::ExternalDeclaration::FunctionDefinition(f) = decl {
                if f.name().as_deref() == Some(name) {
                    let body = f
                        .body()
                        .ok_or_else(|| Error::ShapeMismatch(format!("function '{name}' has no body")))?;
                    return Ok(body.syntax().clone());
                }
            }
        }
        Err(Error::UniquenessViolation(format!("no function definition named '{name}'")))
    }

    /// Prepends `stmt` to `main`'s body (`BeforeFunctionBody("main")`).
    pub fn prepend_main_function_body(&self, stmt: Node) -> Result<()> {
        self.inject_node(&InjectionPoint::BeforeFunctionBody("main".to_string()), stmt)
    }

    /// Appends `stmt` to `main`'s body (`EndOfFunctionBody("main")`).
    pub fn append_main_function_body(&self, stmt: Node) -> Result<()> {
        self.inject_node(&InjectionPoint::EndOfFunctionBody("main".to_string()), stmt)
    }
}

/// A unit of traversal/rewrite a [`crate::transformation::Transformation`]
/// schedules. Most phases only need `run` (bulk index queries, matcher/
/// template rewrites) or `enter`/`exit` (local walk-driven rewrites); the
/// defaults make every other callback a no-op.
pub trait Phase {
    /// Whether this phase wants `run` (once per tree) or `enter`/`exit`
    /// (once per visited node, fused with sibling walk phases).
    fn shape(&self) -> PhaseShape;

    /// Runs at most once per bound phase-collector, before this phase's
    /// first run. Used to compile paths/patterns that are then reused.
    fn init(&mut self, _env: &mut PhaseEnv<'_>) -> Result<()> {
        Ok(())
    }

    /// Checked once at the start of each run; `false` skips this phase for
    /// the run without advancing its internal state.
    fn is_active(&self, _env: &PhaseEnv<'_>) -> bool {
        true
    }

    /// Invoked once per run for a [`PhaseShape::Run`] phase.
    fn run(&mut self, _env: &mut PhaseEnv<'_>) -> Result<()> {
        Ok(())
    }

    /// Invoked on entering `node`, before its children, for a
    /// [`PhaseShape::Walk`] phase.
    fn enter(&mut self, _env: &mut PhaseEnv<'_>, _node: &Node) -> Result<()> {
        Ok(())
    }

    /// Invoked on exiting `node`, after every descendant has been visited,
    /// for a [`PhaseShape::Walk`] phase.
    fn exit(&mut self, _env: &mut PhaseEnv<'_>, _node: &Node) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::root::RootSupplier;

    #[test]
    fn injects_external_declaration_before_declarations() {
        let root = Root::new(RootSupplier::DEFAULT);
        let tree = glsl_grammar::parse_document("#version 450\nuniform float a;").unwrap();
        let unit = ast::build(&tree, &root);
        let env = PhaseEnv::new(&root, &unit, true);
        env.inject_external_declaration("uniform float injected;", &InjectionPoint::BeforeDeclarations)
            .unwrap();
        let names: Vec<_> = unit
            .external_declarations()
            .into_iter()
            .filter_map(|d| match d {
                ast::ExternalDeclaration::TypeAndInit(t) => t.members().first().and_then(|m| m.name()),
                _ => None,
            })
            .collect();
        assert_eq!(names, vec!["injected".to_string(), "a".to_string()]);
    }

    #[test]
    fn appends_to_named_function_body() {
        let root = Root::new(RootSupplier::DEFAULT);
        let tree = glsl_grammar::parse_document("void main(){ foo(); }").unwrap();
        let unit = ast::build(&tree, &root);
        let env = PhaseEnv::new(&root, &unit, true);
        let (stmt_tree, _) = crate::template::parse_fragment("bar();", ParseShape::Statement).unwrap();
        let stmt = ast::build_fragment(&stmt_tree, &root);
        env.append_main_function_body(stmt).unwrap();
        let ast::ExternalDeclaration::FunctionDefinition(main) = unit.external_declarations().remove(0) else {
            panic!("expected a function definition");
        };
        let body = main.body().unwrap();
        assert_eq!(body.statements().len(), 2);
    }
}
