//! A small library of built-in phases, one per scheduled-transform scenario
//! this engine was built to support. Each is grounded directly in
//! [`crate::template`]/[`crate::phase`]'s public surface rather than any
//! private node surgery, so they double as worked examples of the
//! programmatic API.

use std::cell::RefCell;
use std::rc::Rc;

use glsl_grammar::SyntaxKind;

use crate::ast;
use crate::error::Error;
use crate::error::Result;
use crate::node::AstNode;
use crate::node::Node;
use crate::node::RawChild;
use crate::phase::InjectionPoint;
use crate::phase::Phase;
use crate::phase::PhaseEnv;
use crate::phase::PhaseShape;
use crate::root::Root;
use crate::root::RootSupplier;
use crate::template::Matcher;
use crate::template::ParseShape;
use crate::template::Substitutions;
use crate::template::Template;
use crate::template::parse_fragment;

/// Removes a top-level `uniform` declaration whose every member name is
/// already declared inside a `uniform` interface block, leaving the block
/// itself untouched.
#[derive(Default)]
pub struct RemoveUniformsShadowedByBlock;

impl Phase for RemoveUniformsShadowedByBlock {
    fn shape(&self) -> PhaseShape {
        PhaseShape::Run
    }

    fn run(&mut self, env: &mut PhaseEnv<'_>) -> Result<()> {
        let mut block_member_names = std::collections::HashSet::new();
        for decl in env.unit().external_declarations() {
            let ast::ExternalDeclaration::InterfaceBlock(block) = decl else { continue };
            if !block.qualifier().map(|q| q.has_storage("uniform")).unwrap_or(false) {
                continue;
            }
            for member in block.members() {
                for d in member.declarators() {
                    if let Some(name) = d.name() {
                        block_member_names.insert(name);
                    }
                }
            }
        }

        for decl in env.unit().external_declarations() {
            let ast::ExternalDeclaration::TypeAndInit(t) = decl else { continue };
            if !t.qualifier().map(|q| q.has_storage("uniform")).unwrap_or(false) {
                continue;
            }
            let members = t.members();
            if members.is_empty() {
                continue;
            }
            let all_shadowed = members.iter().all(|m| m.name().is_some_and(|n| block_member_names.contains(&n)));
            if all_shadowed {
                t.syntax().detach_and_delete()?;
            }
        }
        Ok(())
    }
}

/// Rewrites `shadow2D(sampler, coord)` calls to `vec4(texture(sampler,
/// coord))`, the GLSL ES 3.x replacement for the removed builtin.
pub struct Shadow2DToTexture {
    matcher: Option<Matcher>,
}

impl Default for Shadow2DToTexture {
    fn default() -> Self {
        Shadow2DToTexture { matcher: None }
    }
}

impl Phase for Shadow2DToTexture {
    fn shape(&self) -> PhaseShape {
        PhaseShape::Walk
    }

    fn init(&mut self, env: &mut PhaseEnv<'_>) -> Result<()> {
        let mut matcher = env.compile_pattern("shadow2D(__sampler, __coord);", ParseShape::Statement, "__")?;
        matcher.mark_class_wildcard("sampler", SyntaxKind::ReferenceExpr);
        matcher.mark_class_wildcard("coord", SyntaxKind::ReferenceExpr);
        self.matcher = Some(matcher);
        Ok(())
    }

    fn enter(&mut self, env: &mut PhaseEnv<'_>, node: &Node) -> Result<()> {
        if node.kind() != SyntaxKind::ExpressionStatement {
            return Ok(());
        }
        let matcher = self.matcher.as_ref().expect("init runs before enter");
        let Some(caps) = matcher.matches(node) else { return Ok(()) };
        let sampler = caps.get_node_match("sampler", SyntaxKind::ReferenceExpr)?.clone();
        let coord = caps.get_node_match("coord", SyntaxKind::ReferenceExpr)?.clone();

        let mut tpl = Template::with_statement("vec4(texture(__sampler, __coord));")?;
        tpl.mark_local_replacement("sampler", SyntaxKind::ReferenceExpr);
        tpl.mark_local_replacement("coord", SyntaxKind::ReferenceExpr);
        let replacement = tpl.instantiate(
            env.root(),
            &Substitutions::new().with_node("sampler", sampler).with_node("coord", coord),
        )?;
        node.replace_by_and_delete(&replacement)?;
        Ok(())
    }
}

/// Assigns `layout(location = N)` to every single-name `out` declaration
/// whose name ends in a location number and that doesn't already carry a
/// layout qualifier. Declarations with more than one name are left alone: a
/// shared location number would be ambiguous.
#[derive(Default)]
pub struct AssignOutDeclarationLocations;

impl Phase for AssignOutDeclarationLocations {
    fn shape(&self) -> PhaseShape {
        PhaseShape::Run
    }

    fn run(&mut self, env: &mut PhaseEnv<'_>) -> Result<()> {
        for decl in env.unit().external_declarations() {
            let ast::ExternalDeclaration::TypeAndInit(t) = decl else { continue };
            let members = t.members();
            if members.len() != 1 {
                continue;
            }
            let Some(qualifier) = t.qualifier() else { continue };
            if !qualifier.has_storage("out") || qualifier.layout().is_some() {
                continue;
            }
            let Some(name) = members[0].name() else { continue };
            let digits: String = name.chars().rev().take_while(char::is_ascii_digit).collect::<String>().chars().rev().collect();
            if digits.is_empty() {
                continue;
            }
            let location: u32 = digits.parse().expect("all-digit string");
            let Some(ty_name) = t.ty().and_then(|ty| ty.name()) else { continue };
            let source = format!("out layout(location = {location}) {ty_name} __name;");
            let mut tpl = Template::with_external_declaration(&source)?;
            tpl.mark_identifier_replacement("name");
            let replacement = tpl.instantiate(env.root(), &Substitutions::new().with_text("name", name))?;
            t.syntax().replace_by_and_delete(&replacement)?;
        }
        Ok(())
    }
}

/// Injects each requested external declaration before the first
/// non-directive declaration, skipping any whose declared name already
/// exists in the external-declaration index.
pub struct AddDeclarationsIfMissing {
    requested: Vec<String>,
}

impl AddDeclarationsIfMissing {
    /// `requested` is a list of declaration sources (e.g. `"in vec2 foo"`),
    /// the trailing `;` optional.
    pub fn new(requested: impl IntoIterator<Item = impl Into<String>>) -> Self {
        AddDeclarationsIfMissing {
            requested: requested.into_iter().map(Into::into).collect(),
        }
    }
}

impl Phase for AddDeclarationsIfMissing {
    fn shape(&self) -> PhaseShape {
        PhaseShape::Run
    }

    fn run(&mut self, env: &mut PhaseEnv<'_>) -> Result<()> {
        for requested in &self.requested {
            let source = if requested.trim_end().ends_with(';') { requested.clone() } else { format!("{requested};") };
            let name = declared_name(&source)?;
            if !env.root().external_declaration_index().get(&name).is_empty() {
                continue;
            }
            env.inject_external_declaration(&source, &InjectionPoint::BeforeDeclarations)?;
        }
        Ok(())
    }
}

fn declared_name(source: &str) -> Result<String> {
    let (tree, _) = parse_fragment(source, ParseShape::ExternalDeclaration)?;
    let root = Root::new(RootSupplier::DEFAULT);
    let node = ast::build_fragment(&tree, &root);
    node.children_as::<ast::DeclarationMember>()
        .first()
        .and_then(|m| m.name())
        .ok_or_else(|| Error::ShapeMismatch(format!("declaration '{source}' declares no name")))
}

/// Moves a per-declarator unsized array specifier (`int foo[], bar[];`) up
/// onto the type (`int[] foo, bar;`) when every declarator in the
/// declaration shares the same bare `[]` and the type itself has none.
/// Declarations with a sized specifier, a stacked specifier, or a type-level
/// specifier already present are left unchanged.
#[derive(Default)]
pub struct HoistUnsizedArraySpecifiers;

impl Phase for HoistUnsizedArraySpecifiers {
    fn shape(&self) -> PhaseShape {
        PhaseShape::Run
    }

    fn run(&mut self, env: &mut PhaseEnv<'_>) -> Result<()> {
        for decl in env.unit().external_declarations() {
            let ast::ExternalDeclaration::TypeAndInit(t) = decl else { continue };
            let Some(ty) = t.ty() else { continue };
            if ty.array_specifier().is_some() {
                continue;
            }
            let members = t.members();
            if members.is_empty() {
                continue;
            }
            let all_bare_unsized = members.iter().all(|m| {
                let specs = m.array_specifiers();
                specs.len() == 1 && specs[0].size().is_none()
            });
            if !all_bare_unsized {
                continue;
            }
            let qualifier_prefix = t
                .qualifier()
                .map(|q| format!("{} ", q.keywords().join(" ")))
                .unwrap_or_default();
            let Some(ty_name) = ty.name() else { continue };
            let names: Vec<String> = members.iter().filter_map(|m| m.name()).collect();
            if names.len() != members.len() {
                continue;
            }
            let source = format!("{qualifier_prefix}{ty_name}[] {};", names.join(", "));
            let (tree, _) = parse_fragment(&source, ParseShape::ExternalDeclaration)?;
            let replacement = ast::build_fragment(&tree, env.root());
            t.syntax().replace_by_and_delete(&replacement)?;
        }
        Ok(())
    }
}

/// A `(format_string, argument_source_texts)` pair recorded for every
/// `printf` call site a [`ExtractPrintfCalls`] phase rewrites.
pub type PrintfJobParameters = Rc<RefCell<Vec<(String, Vec<String>)>>>;

/// Rewrites `printf(fmt, args...)` calls into a buffer write against an
/// injected `PrintfOutputStream` block, and records each call's arguments
/// for the caller to pick up afterward (the device side has no stdout, so
/// the decoded format/argument pairing has to be replayed host-side from
/// this accumulator).
pub struct ExtractPrintfCalls {
    injected_buffer_decl: bool,
    job_parameters: PrintfJobParameters,
}

impl ExtractPrintfCalls {
    /// A fresh phase plus a cloneable handle onto its accumulated call-site
    /// parameters (shared, since the phase itself is moved into a
    /// [`crate::transformation::Transformation`] by the time it runs).
    pub fn new() -> (Self, PrintfJobParameters) {
        let job_parameters: PrintfJobParameters = Rc::new(RefCell::new(Vec::new()));
        (
            ExtractPrintfCalls {
                injected_buffer_decl: false,
                job_parameters: job_parameters.clone(),
            },
            job_parameters,
        )
    }
}

impl Phase for ExtractPrintfCalls {
    fn shape(&self) -> PhaseShape {
        PhaseShape::Run
    }

    fn run(&mut self, env: &mut PhaseEnv<'_>) -> Result<()> {
        self.job_parameters.borrow_mut().clear();
        let root = env.root().clone();
        let call_ids = root.node_index().get(SyntaxKind::CallExpr);

        for id in call_ids {
            let node = Node::new(id, root.clone());
            let Some(call) = ast::CallExpr::cast(node.clone()) else { continue };
            let Some(ast::Expression::Reference(callee)) = call.callee() else { continue };
            if callee.name().as_deref() != Some("printf") {
                continue;
            }
            let args = call.args();
            let Some(ast::Expression::Literal(format_arg)) = args.first() else { continue };
            let Some(format_text) = format_arg.text() else { continue };
            let format_string = format_text.trim_matches('"').to_string();
            let arg_texts: Vec<String> = args[1..].iter().map(|a| expr_text(a.syntax())).collect();

            let format_id = self.job_parameters.borrow().len();
            self.job_parameters.borrow_mut().push((format_string, arg_texts.clone()));

            if !self.injected_buffer_decl {
                env.inject_external_declaration(
                    "layout(binding = 0, std430) restrict buffer PrintfOutputStream { uint index; uint stream[]; } printfOutputStruct;",
                    &InjectionPoint::BeforeDeclarations,
                )?;
                self.injected_buffer_decl = true;
            }

            let Some(stmt) = node.get_ancestor_of_kind(SyntaxKind::ExpressionStatement) else { continue };
            let source = printf_replacement_block(format_id, &arg_texts);
            let (tree, _) = parse_fragment(&source, ParseShape::Statement)?;
            let replacement = ast::build_fragment(&tree, env.root());
            stmt.replace_by_and_delete(&replacement)?;
        }
        Ok(())
    }
}

fn printf_replacement_block(format_id: usize, args: &[String]) -> String {
    let slots = args.len() + 1;
    let mut body = format!("{{ uint __printfIdx = atomicAdd(printfOutputStruct.index, {slots}u); ");
    body.push_str(&format!("printfOutputStruct.stream[__printfIdx] = {format_id}u; "));
    for (i, arg) in args.iter().enumerate() {
        body.push_str(&format!(
            "printfOutputStruct.stream[__printfIdx + {}u] = floatBitsToUint(float({arg})); ",
            i + 1
        ));
    }
    body.push('}');
    body
}

fn expr_text(node: &Node) -> String {
    let mut tokens = Vec::new();
    collect_default_tokens(node, &mut tokens);
    tokens.join(" ")
}

fn collect_default_tokens(node: &Node, out: &mut Vec<String>) {
    for child in node.raw_children() {
        match child {
            RawChild::Node(n) => collect_default_tokens(&n, out),
            RawChild::Token(tok) if !tok.is_hidden() => out.push(tok.text),
            RawChild::Token(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::TransformationManager;
    use crate::transformation::Transformation;
    use pretty_assertions::assert_eq;

    fn run_one(phase: impl Phase + 'static, source: &str) -> String {
        let mut manager = TransformationManager::new();
        let mut t = Transformation::new();
        t.add_phase(phase);
        manager.register_transformation(t);
        manager.transform(source).unwrap()
    }

    #[test]
    fn removes_uniforms_shadowed_by_block() {
        let out = run_one(
            RemoveUniformsShadowedByBlock,
            "uniform UniformBlock { float a; float b; } ;\nuniform float a;\nuniform float b;\n",
        );
        assert_eq!(out, "uniform UniformBlock { float a; float b; } ;\n");
    }

    #[test]
    fn rewrites_shadow2d_call() {
        let out = run_one(Shadow2DToTexture { matcher: None }, "void main(){ shadow2D(s, c); }");
        assert_eq!(out, "void main(){ vec4(texture(s, c)); }");
    }

    #[test]
    fn assigns_out_declaration_locations() {
        let out = run_one(
            AssignOutDeclarationLocations,
            "out vec4 outColor4;\nout vec3 outColor0;\nout vec3 outColor10, fooBar;\n",
        );
        assert_eq!(
            out,
            "out layout(location = 4) vec4 outColor4;\nout layout(location = 0) vec3 outColor0;\nout vec3 outColor10, fooBar;\n"
        );
    }

    #[test]
    fn adds_missing_declarations_only() {
        let out = run_one(
            AddDeclarationsIfMissing::new(["in vec2 foo", "in vec2 bar", "uniform mat2 zub"]),
            "in vec2 bar;\n",
        );
        assert_eq!(out.matches("bar").count(), 1);
        assert!(out.contains("foo"));
        assert!(out.contains("zub"));
    }

    #[test]
    fn hoists_unsized_array_specifiers() {
        let out = run_one(HoistUnsizedArraySpecifiers, "int foo[], bar[];\n");
        assert_eq!(out, "int[] foo, bar;\n");
    }

    #[test]
    fn leaves_stacked_array_specifiers_unchanged() {
        let out = run_one(HoistUnsizedArraySpecifiers, "int[7] foo[5];\n");
        assert_eq!(out, "int[7] foo[5];\n");
    }

    #[test]
    fn extracts_printf_call_and_records_job_parameters() {
        let (phase, job_parameters) = ExtractPrintfCalls::new();
        let mut manager = TransformationManager::new();
        let mut t = Transformation::new();
        t.add_phase(phase);
        manager.register_transformation(t);
        let out = manager.transform("void main(){ printf(\"Hello\",5,foo,bar+gob); }").unwrap();

        assert!(out.contains("PrintfOutputStream"));
        assert!(out.contains("atomicAdd"));
        assert_eq!(
            job_parameters.borrow().as_slice(),
            &[("Hello".to_string(), vec!["5".to_string(), "foo".to_string(), "bar + gob".to_string()])]
        );
    }
}
