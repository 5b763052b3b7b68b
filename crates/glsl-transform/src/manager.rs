//! `TransformationManager`: the public facade. Owns the registered
//! transformations and the parse-time options, and turns a source string
//! into a transformed source string in one call.

use glsl_grammar::Parser;
use glsl_grammar::ParsingStrategy;
use glsl_grammar::TokenFilter;

use crate::ast;
use crate::error::Result;
use crate::printer;
use crate::root::Root;
use crate::root::RootSupplier;
use crate::transformation::PhaseCollector;
use crate::transformation::Transformation;

/// Produces a fresh [`TokenFilter`] for every parse, since filter state is
/// scoped to a single parse (resource scopes, "Parse scope").
type FilterFactory = Box<dyn Fn() -> Box<dyn TokenFilter>>;

/// The engine's public facade: register transformations once, then call
/// [`TransformationManager::transform`] per source string.
pub struct TransformationManager {
    collector: PhaseCollector,
    root_supplier: RootSupplier,
    parsing_strategy: ParsingStrategy,
    filter_factory: Option<FilterFactory>,
    throw_parse_errors: bool,
}

impl Default for TransformationManager {
    fn default() -> Self {
        TransformationManager::new()
    }
}

impl TransformationManager {
    /// A manager with no registered transformations, default options
    /// (`RootSupplier::DEFAULT`, `ParsingStrategy::SllAndLlOnError`, identity
    /// token filter, parse errors thrown).
    pub fn new() -> Self {
        TransformationManager {
            collector: PhaseCollector::new(),
            root_supplier: RootSupplier::DEFAULT,
            parsing_strategy: ParsingStrategy::default(),
            filter_factory: None,
            throw_parse_errors: true,
        }
    }

    /// Registers `transformation` to run on every future `transform` call.
    pub fn register_transformation(&mut self, transformation: Transformation) -> &mut Self {
        self.collector.register(transformation);
        self
    }

    /// Sets which index policy the AST builder uses for every future parse.
    pub fn set_root_supplier(&mut self, supplier: RootSupplier) -> &mut Self {
        self.root_supplier = supplier;
        self
    }

    /// Sets the parser's SLL/LL retry strategy.
    pub fn set_parsing_strategy(&mut self, strategy: ParsingStrategy) -> &mut Self {
        self.parsing_strategy = strategy;
        self
    }

    /// Whether a malformed source aborts `transform` with [`crate::error::Error::Parse`]
    /// (the default) or is instead swallowed, leaving the best-effort parse
    /// tree in place.
    pub fn throw_parse_errors(&mut self, throw: bool) -> &mut Self {
        self.throw_parse_errors = throw;
        self
    }

    /// Installs a token filter factory, called fresh for every parse so that
    /// a filter with per-parse state (e.g. a macro-expansion buffer) never
    /// leaks state across runs.
    pub fn set_parse_token_filter<F, T>(&mut self, factory: F) -> &mut Self
    where
        F: Fn() -> T + 'static,
        T: TokenFilter + 'static,
    {
        self.filter_factory = Some(Box::new(move || Box::new(factory()) as Box<dyn TokenFilter>));
        self
    }

    /// Parses `source`, builds an AST, runs every registered transformation's
    /// scheduled phases over it, and reprints the result.
    pub fn transform(&mut self, source: &str) -> Result<String> {
        let span = tracing::debug_span!(
            "transform",
            source_len = source.len(),
            transformations = self.collector.len()
        );
        let _guard = span.enter();

        let mut parser = match &self.filter_factory {
            Some(factory) => Parser::with_filter(source, factory()),
            None => Parser::new(source),
        };
        parser.throw_parse_errors(self.throw_parse_errors).set_strategy(self.parsing_strategy);
        let parse = parser.parse_translation_unit()?;

        let root = Root::new(self.root_supplier);
        let unit = ast::build(&parse.tree, &root);

        self.collector.run(&root, &unit)?;

        Ok(printer::print(&unit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::AstNode;
    use crate::phase::Phase;
    use crate::phase::PhaseEnv;
    use crate::phase::PhaseShape;
    use crate::template::Matcher;
    use crate::template::ParseShape;
    use crate::template::Substitutions;
    use crate::template::Template;
    use pretty_assertions::assert_eq;

    struct RenameFooToBar {
        matcher: Option<Matcher>,
    }

    impl Phase for RenameFooToBar {
        fn shape(&self) -> PhaseShape {
            PhaseShape::Run
        }

        fn init(&mut self, env: &mut PhaseEnv<'_>) -> Result<()> {
            self.matcher = Some(env.compile_pattern("foo();", ParseShape::Statement, "__")?);
            Ok(())
        }

        fn run(&mut self, env: &mut PhaseEnv<'_>) -> Result<()> {
            let matcher = self.matcher.as_ref().unwrap();
            for decl in env.unit().external_declarations() {
                let ast::ExternalDeclaration::FunctionDefinition(f) = decl else { continue };
                let Some(body) = f.body() else { continue };
                for stmt in body.statements() {
                    if matcher.matches(stmt.syntax()).is_some() {
                        let replacement = Template::with_statement("bar();")?.instantiate(env.root(), &Substitutions::new())?;
                        stmt.syntax().replace_by(&replacement)?;
                    }
                }
            }
            Ok(())
        }
    }

    #[test]
    fn transforms_source_end_to_end() {
        let mut manager = TransformationManager::new();
        let mut t = Transformation::new();
        t.add_phase(RenameFooToBar { matcher: None });
        manager.register_transformation(t);

        let out = manager.transform("void main() {\n    foo();\n}\n").unwrap();
        assert_eq!(out, "void main() {\n    bar();\n}\n");
    }

    #[test]
    fn leaves_untouched_source_unchanged() {
        let mut manager = TransformationManager::new();
        let out = manager.transform("uniform float a;\n").unwrap();
        assert_eq!(out, "uniform float a;\n");
    }
}
