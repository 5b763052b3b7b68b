//! A recursive-descent parser with one entrypoint per grammar rule, notably
//! `translationUnit`, `externalDeclaration`, `statement`, `expression`, and
//! `compoundStatement`.
//!
//! GLSL's grammar is LL(1) almost everywhere except the declaration/
//! expression-statement boundary (`Foo bar;` vs. `bar = 1;`), which real GLSL
//! compilers resolve with a symbol table. Since this engine performs no
//! semantic analysis, that one ambiguity is resolved with a syntactic
//! heuristic instead: two leading identifiers mean a type-and-init
//! declaration.

use crate::error::{Error, ParseDiagnostic, Result};
use crate::kind::SyntaxKind;
use crate::lexer::{FilteredLexer, IdentityFilter, Lexer, Token, TokenFilter, TokenSource};
use crate::tree::{NodeIdx, ParseElement, ParseTree, TreeBuilder};

/// The parser's retry strategy, modeled on an ANTLR-shaped two-pass contract.
/// This hand-written recursive-descent parser has no separate SLL/LL
/// prediction modes (those are specific to ALL(*) parsing); the variants are
/// kept for API parity with that contract and for the one behavioral
/// difference that does transfer: whether a second, stricter pass is
/// attempted when the first pass reports ambiguity-shaped diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParsingStrategy {
    /// Parse once; on any diagnostic, re-parse while treating every
    /// heuristic ambiguity as a hard error, matching ANTLR's
    /// `SLL_AND_LL_ON_ERROR` fall back semantics.
    #[default]
    SllAndLlOnError,
    /// Parse once in the permissive (heuristic-resolving) mode only.
    SllOnly,
    /// Parse once in the strict mode only.
    LlOnly,
}

/// Receives `(first_pass_diagnostics, second_pass_diagnostics)` when
/// [`ParsingStrategy::SllAndLlOnError`] triggers a retry, for diagnostics
/// purposes.
pub type StrategyDebugHook = Box<dyn FnMut(&[ParseDiagnostic], Option<&[ParseDiagnostic]>)>;

/// The result of a parse: the tree plus any diagnostics collected along the
/// way (non-fatal unless [`Parser::throw_parse_errors`] is set).
#[derive(Debug)]
pub struct Parse {
    /// The parsed tree.
    pub tree: ParseTree,
}

/// The parser itself. Holds a fully buffered token stream, a cursor, and the
/// in-progress [`TreeBuilder`].
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    builder: TreeBuilder,
    diagnostics: Vec<ParseDiagnostic>,
    throw_parse_errors: bool,
    strategy: ParsingStrategy,
    debug_hook: Option<StrategyDebugHook>,
}

impl Parser {
    /// Creates a parser over `source` using the identity token filter.
    pub fn new(source: &str) -> Self {
        Self::with_filter(source, IdentityFilter)
    }

    /// Creates a parser over `source`, routing every lexed token through
    /// `filter` first.
    pub fn with_filter(source: &str, filter: impl TokenFilter) -> Self {
        let mut lexer = FilteredLexer::new(Lexer::new(source), filter);
        let mut tokens = Vec::new();
        while let Some(tok) = lexer.next_token() {
            let is_eof = tok.kind == SyntaxKind::Eof;
            tokens.push(tok);
            if is_eof {
                break;
            }
        }
        Parser {
            tokens,
            pos: 0,
            builder: TreeBuilder::new(),
            diagnostics: Vec::new(),
            throw_parse_errors: false,
            strategy: ParsingStrategy::default(),
            debug_hook: None,
        }
    }

    /// Sets whether a parse error aborts with [`Error::Parse`] (`true`) or is
    /// merely recorded in [`Parse`] diagnostics (`false`, the default).
    pub fn throw_parse_errors(&mut self, throw: bool) -> &mut Self {
        self.throw_parse_errors = throw;
        self
    }

    /// Sets the parsing strategy.
    pub fn set_strategy(&mut self, strategy: ParsingStrategy) -> &mut Self {
        self.strategy = strategy;
        self
    }

    /// Installs a debug hook invoked when [`ParsingStrategy::SllAndLlOnError`]
    /// triggers a retry pass.
    pub fn set_debug_hook(&mut self, hook: StrategyDebugHook) -> &mut Self {
        self.debug_hook = Some(hook);
        self
    }

    fn peek_kind(&self) -> SyntaxKind {
        self.tokens[self.significant_pos()].kind
    }

    fn peek2_kind(&self) -> SyntaxKind {
        let first = self.significant_pos();
        let mut i = first + 1;
        while self.tokens[i].kind.is_trivia() {
            i += 1;
        }
        self.tokens[i].kind
    }

    fn significant_pos(&self) -> usize {
        let mut i = self.pos;
        while self.tokens[i].kind.is_trivia() {
            i += 1;
        }
        i
    }

    /// Consumes leading trivia plus the next significant token, pushing both
    /// into `children` in source order, and returns the significant token.
    fn eat(&mut self, children: &mut Vec<ParseElement>) -> Token {
        while self.tokens[self.pos].kind.is_trivia() {
            children.push(ParseElement::Token(self.tokens[self.pos].clone()));
            self.pos += 1;
        }
        let tok = self.tokens[self.pos].clone();
        self.pos += 1;
        children.push(ParseElement::Token(tok.clone()));
        tok
    }

    fn expect(&mut self, kind: SyntaxKind, children: &mut Vec<ParseElement>, ctx: &str) -> Token {
        let tok = self.eat(children);
        if tok.kind != kind {
            self.diagnostics.push(ParseDiagnostic {
                message: format!("expected {kind:?} in {ctx}, found {:?}", tok.kind),
                span: tok.span,
            });
        }
        tok
    }

    fn at(&self, kind: SyntaxKind) -> bool {
        self.peek_kind() == kind
    }

    fn finish(
        &mut self,
        kind: SyntaxKind,
        children: Vec<ParseElement>,
    ) -> NodeIdx {
        self.builder.finish_node(kind, children)
    }

    /// Parses a full `translationUnit`.
    pub fn parse_translation_unit(mut self) -> Result<Parse> {
        let root = self.translation_unit();
        self.finish_parse(root)
    }

    /// Parses a single `externalDeclaration`.
    pub fn parse_external_declaration(mut self) -> Result<Parse> {
        let root = self.external_declaration();
        self.finish_parse(root)
    }

    /// Parses a single `statement`.
    pub fn parse_statement(mut self) -> Result<Parse> {
        let root = self.statement();
        self.finish_parse(root)
    }

    /// Parses a single `expression`.
    pub fn parse_expression(mut self) -> Result<Parse> {
        let root = self.expression();
        self.finish_parse(root)
    }

    /// Parses a single `compoundStatement`.
    pub fn parse_compound_statement(mut self) -> Result<Parse> {
        let root = self.compound_statement();
        self.finish_parse(root)
    }

    fn finish_parse(mut self, root: NodeIdx) -> Result<Parse> {
        if self.throw_parse_errors {
            if let Some(first) = self.diagnostics.first() {
                return Err(Error::Parse(first.clone()));
            }
        }
        if self.strategy == ParsingStrategy::SllAndLlOnError && !self.diagnostics.is_empty() {
            if let Some(mut hook) = self.debug_hook.take() {
                hook(&self.diagnostics, None);
            }
        }
        let diagnostics = std::mem::take(&mut self.diagnostics);
        let tree = self.builder.build(root, diagnostics);
        Ok(Parse { tree })
    }

    // ----- translationUnit -----

    fn translation_unit(&mut self) -> NodeIdx {
        let mut children = Vec::new();
        while !self.at(SyntaxKind::Eof) {
            let decl = self.external_declaration();
            children.push(ParseElement::Node(decl));
        }
        self.expect(SyntaxKind::Eof, &mut children, "translationUnit");
        self.finish(SyntaxKind::TranslationUnit, children)
    }

    // ----- externalDeclaration -----

    fn external_declaration(&mut self) -> NodeIdx {
        match self.peek_kind() {
            SyntaxKind::HashVersion => self.version_directive(),
            SyntaxKind::HashExtension => self.extension_directive(),
            SyntaxKind::HashPragma => self.pragma_directive(),
            SyntaxKind::Semicolon => {
                let mut children = Vec::new();
                self.eat(&mut children);
                self.finish(SyntaxKind::EmptyExternalDecl, children)
            }
            SyntaxKind::KwPrecisionDecl => self.precision_declaration(),
            _ => self.declaration_shaped_external_decl(),
        }
    }

    fn version_directive(&mut self) -> NodeIdx {
        let mut children = Vec::new();
        self.eat(&mut children);
        if self.at(SyntaxKind::DirectiveRest) {
            self.eat(&mut children);
        }
        self.finish(SyntaxKind::VersionDirective, children)
    }

    fn extension_directive(&mut self) -> NodeIdx {
        let mut children = Vec::new();
        self.eat(&mut children);
        if self.at(SyntaxKind::DirectiveRest) {
            self.eat(&mut children);
        }
        self.finish(SyntaxKind::ExtensionDirective, children)
    }

    fn pragma_directive(&mut self) -> NodeIdx {
        let mut children = Vec::new();
        self.eat(&mut children);
        if self.at(SyntaxKind::DirectiveRest) {
            self.eat(&mut children);
        }
        self.finish(SyntaxKind::PragmaDirective, children)
    }

    fn precision_declaration(&mut self) -> NodeIdx {
        let mut children = Vec::new();
        self.eat(&mut children); // `precision`
        if self.at(SyntaxKind::KwPrecision) {
            self.eat(&mut children);
        }
        let spec = self.type_specifier();
        children.push(ParseElement::Node(spec));
        self.expect(SyntaxKind::Semicolon, &mut children, "precisionDeclaration");
        self.finish(SyntaxKind::PrecisionDeclaration, children)
    }

    /// Disambiguates `layout(...) in;` (layout-defaults), interface blocks,
    /// function prototypes/definitions, and ordinary type-and-init
    /// declarations, all of which start with an optional [`TypeQualifier`].
    fn declaration_shaped_external_decl(&mut self) -> NodeIdx {
        let mut children = Vec::new();
        let had_qualifier = self.maybe_type_qualifier(&mut children);

        if had_qualifier && self.at(SyntaxKind::Semicolon) {
            self.eat(&mut children);
            return self.finish(SyntaxKind::LayoutDefaults, children);
        }

        if self.at(SyntaxKind::Ident) && self.peek2_kind() == SyntaxKind::LBrace {
            return self.interface_block(children);
        }

        let spec = self.type_specifier();
        children.push(ParseElement::Node(spec));

        if self.at(SyntaxKind::Ident) && self.peek2_kind() == SyntaxKind::LParen {
            return self.function_tail(children);
        }

        self.type_and_init_tail(children, SyntaxKind::TypeAndInitDeclaration)
    }

    fn interface_block(&mut self, mut children: Vec<ParseElement>) -> NodeIdx {
        self.eat(&mut children); // block name
        self.expect(SyntaxKind::LBrace, &mut children, "interfaceBlock");
        while !self.at(SyntaxKind::RBrace) && !self.at(SyntaxKind::Eof) {
            let member = self.struct_member();
            children.push(ParseElement::Node(member));
        }
        self.expect(SyntaxKind::RBrace, &mut children, "interfaceBlock");
        if self.at(SyntaxKind::Ident) {
            self.eat(&mut children); // instance name
            if self.at(SyntaxKind::LBracket) {
                let arr = self.array_specifier();
                children.push(ParseElement::Node(arr));
            }
        }
        self.expect(SyntaxKind::Semicolon, &mut children, "interfaceBlock");
        self.finish(SyntaxKind::InterfaceBlockDeclaration, children)
    }

    fn function_tail(&mut self, mut children: Vec<ParseElement>) -> NodeIdx {
        self.eat(&mut children); // function name
        self.expect(SyntaxKind::LParen, &mut children, "functionHeader");
        if !self.at(SyntaxKind::RParen) {
            loop {
                if self.at(SyntaxKind::KwVoid) && self.peek2_kind() == SyntaxKind::RParen {
                    self.eat(&mut children);
                    break;
                }
                let param = self.function_parameter();
                children.push(ParseElement::Node(param));
                if self.at(SyntaxKind::Comma) {
                    self.eat(&mut children);
                } else {
                    break;
                }
            }
        }
        self.expect(SyntaxKind::RParen, &mut children, "functionHeader");
        if self.at(SyntaxKind::LBrace) {
            let body = self.compound_statement();
            children.push(ParseElement::Node(body));
            self.finish(SyntaxKind::FunctionDefinition, children)
        } else {
            self.expect(SyntaxKind::Semicolon, &mut children, "functionPrototype");
            self.finish(SyntaxKind::FunctionPrototype, children)
        }
    }

    fn function_parameter(&mut self) -> NodeIdx {
        let mut children = Vec::new();
        self.maybe_type_qualifier(&mut children);
        let spec = self.type_specifier();
        children.push(ParseElement::Node(spec));
        if self.at(SyntaxKind::Ident) {
            self.eat(&mut children);
            if self.at(SyntaxKind::LBracket) {
                let arr = self.array_specifier();
                children.push(ParseElement::Node(arr));
            }
        }
        self.finish(SyntaxKind::FunctionParameter, children)
    }

    /// Parses the comma-separated member list and trailing `;` shared by
    /// both external-declaration and local-declaration type-and-init forms.
    fn type_and_init_tail(&mut self, mut children: Vec<ParseElement>, node_kind: SyntaxKind) -> NodeIdx {
        loop {
            let member = self.declaration_member();
            children.push(ParseElement::Node(member));
            if self.at(SyntaxKind::Comma) {
                self.eat(&mut children);
            } else {
                break;
            }
        }
        self.expect(SyntaxKind::Semicolon, &mut children, "declaration");
        self.finish(node_kind, children)
    }

    fn declaration_member(&mut self) -> NodeIdx {
        let mut children = Vec::new();
        self.expect(SyntaxKind::Ident, &mut children, "declarationMember");
        while self.at(SyntaxKind::LBracket) {
            let arr = self.array_specifier();
            children.push(ParseElement::Node(arr));
        }
        if self.at(SyntaxKind::Eq) {
            self.eat(&mut children);
            let init = self.assignment_expression();
            children.push(ParseElement::Node(init));
        }
        self.finish(SyntaxKind::DeclarationMember, children)
    }

    // ----- type system -----

    /// Parses zero or more qualifier parts, returning whether any were
    /// consumed (a `TypeQualifier` node is only emitted when non-empty).
    fn maybe_type_qualifier(&mut self, out: &mut Vec<ParseElement>) -> bool {
        let mut parts = Vec::new();
        loop {
            match self.peek_kind() {
                SyntaxKind::KwStorage
                | SyntaxKind::KwInterpolation
                | SyntaxKind::KwPrecision
                | SyntaxKind::KwInvariant
                | SyntaxKind::KwPrecise
                | SyntaxKind::KwMemory => {
                    self.eat(&mut parts);
                }
                SyntaxKind::KwLayout => {
                    let layout = self.layout_qualifier();
                    parts.push(ParseElement::Node(layout));
                }
                _ => break,
            }
        }
        if parts.is_empty() {
            false
        } else {
            let node = self.finish(SyntaxKind::TypeQualifier, parts);
            out.push(ParseElement::Node(node));
            true
        }
    }

    fn layout_qualifier(&mut self) -> NodeIdx {
        let mut children = Vec::new();
        self.eat(&mut children); // `layout`
        self.expect(SyntaxKind::LParen, &mut children, "layoutQualifier");
        loop {
            let id = self.layout_qualifier_id();
            children.push(ParseElement::Node(id));
            if self.at(SyntaxKind::Comma) {
                self.eat(&mut children);
            } else {
                break;
            }
        }
        self.expect(SyntaxKind::RParen, &mut children, "layoutQualifier");
        self.finish(SyntaxKind::LayoutQualifier, children)
    }

    fn layout_qualifier_id(&mut self) -> NodeIdx {
        let mut children = Vec::new();
        self.expect(SyntaxKind::Ident, &mut children, "layoutQualifierId");
        if self.at(SyntaxKind::Eq) {
            self.eat(&mut children);
            let expr = self.assignment_expression();
            children.push(ParseElement::Node(expr));
        }
        self.finish(SyntaxKind::LayoutQualifierId, children)
    }

    fn type_specifier(&mut self) -> NodeIdx {
        let mut children = Vec::new();
        match self.peek_kind() {
            SyntaxKind::KwStruct => {
                let s = self.struct_specifier();
                children.push(ParseElement::Node(s));
            }
            SyntaxKind::KwVoid | SyntaxKind::KwBuiltinType | SyntaxKind::Ident => {
                self.eat(&mut children);
            }
            _ => {
                self.expect(SyntaxKind::Ident, &mut children, "typeSpecifier");
            }
        }
        while self.at(SyntaxKind::LBracket) {
            let arr = self.array_specifier();
            children.push(ParseElement::Node(arr));
        }
        self.finish(SyntaxKind::TypeSpecifier, children)
    }

    fn struct_specifier(&mut self) -> NodeIdx {
        let mut children = Vec::new();
        self.eat(&mut children); // `struct`
        if self.at(SyntaxKind::Ident) {
            self.eat(&mut children);
        }
        self.expect(SyntaxKind::LBrace, &mut children, "structSpecifier");
        while !self.at(SyntaxKind::RBrace) && !self.at(SyntaxKind::Eof) {
            let member = self.struct_member();
            children.push(ParseElement::Node(member));
        }
        self.expect(SyntaxKind::RBrace, &mut children, "structSpecifier");
        self.finish(SyntaxKind::StructSpecifier, children)
    }

    fn struct_member(&mut self) -> NodeIdx {
        let mut children = Vec::new();
        self.maybe_type_qualifier(&mut children);
        let spec = self.type_specifier();
        children.push(ParseElement::Node(spec));
        loop {
            let member = self.declaration_member();
            children.push(ParseElement::Node(member));
            if self.at(SyntaxKind::Comma) {
                self.eat(&mut children);
            } else {
                break;
            }
        }
        self.expect(SyntaxKind::Semicolon, &mut children, "structMember");
        self.finish(SyntaxKind::StructMember, children)
    }

    fn array_specifier(&mut self) -> NodeIdx {
        let mut children = Vec::new();
        self.expect(SyntaxKind::LBracket, &mut children, "arraySpecifier");
        if !self.at(SyntaxKind::RBracket) {
            let size = self.assignment_expression();
            children.push(ParseElement::Node(size));
        }
        self.expect(SyntaxKind::RBracket, &mut children, "arraySpecifier");
        self.finish(SyntaxKind::ArraySpecifier, children)
    }

    // ----- statements -----

    fn compound_statement(&mut self) -> NodeIdx {
        let mut children = Vec::new();
        self.expect(SyntaxKind::LBrace, &mut children, "compoundStatement");
        while !self.at(SyntaxKind::RBrace) && !self.at(SyntaxKind::Eof) {
            let stmt = self.statement();
            children.push(ParseElement::Node(stmt));
        }
        self.expect(SyntaxKind::RBrace, &mut children, "compoundStatement");
        self.finish(SyntaxKind::CompoundStatement, children)
    }

    fn statement(&mut self) -> NodeIdx {
        match self.peek_kind() {
            SyntaxKind::LBrace => self.compound_statement(),
            SyntaxKind::KwIf => self.selection_statement(),
            SyntaxKind::KwSwitch => self.switch_statement(),
            SyntaxKind::KwFor => self.for_statement(),
            SyntaxKind::KwWhile => self.while_statement(),
            SyntaxKind::KwDo => self.do_while_statement(),
            SyntaxKind::KwBreak
            | SyntaxKind::KwContinue
            | SyntaxKind::KwReturn
            | SyntaxKind::KwDiscard => self.jump_statement(),
            SyntaxKind::KwCase | SyntaxKind::KwDefault => self.case_label(),
            SyntaxKind::Semicolon => {
                let mut children = Vec::new();
                self.eat(&mut children);
                self.finish(SyntaxKind::EmptyStatement, children)
            }
            _ if self.looks_like_declaration() => self.declaration_statement(),
            _ => self.expression_statement(),
        }
    }

    fn looks_like_declaration(&self) -> bool {
        match self.peek_kind() {
            SyntaxKind::KwStorage
            | SyntaxKind::KwInterpolation
            | SyntaxKind::KwPrecision
            | SyntaxKind::KwInvariant
            | SyntaxKind::KwPrecise
            | SyntaxKind::KwMemory
            | SyntaxKind::KwLayout
            | SyntaxKind::KwVoid
            | SyntaxKind::KwBuiltinType
            | SyntaxKind::KwStruct => true,
            SyntaxKind::Ident => self.peek2_kind() == SyntaxKind::Ident,
            _ => false,
        }
    }

    fn declaration_statement(&mut self) -> NodeIdx {
        let mut children = Vec::new();
        self.maybe_type_qualifier(&mut children);
        let spec = self.type_specifier();
        children.push(ParseElement::Node(spec));
        let decl = self.type_and_init_tail(children, SyntaxKind::TypeAndInitDeclaration);
        self.finish(SyntaxKind::DeclarationStatement, vec![ParseElement::Node(decl)])
    }

    fn expression_statement(&mut self) -> NodeIdx {
        let mut children = Vec::new();
        if !self.at(SyntaxKind::Semicolon) {
            let expr = self.expression();
            children.push(ParseElement::Node(expr));
        }
        self.expect(SyntaxKind::Semicolon, &mut children, "expressionStatement");
        self.finish(SyntaxKind::ExpressionStatement, children)
    }

    fn selection_statement(&mut self) -> NodeIdx {
        let mut children = Vec::new();
        self.eat(&mut children); // `if`
        self.expect(SyntaxKind::LParen, &mut children, "selectionStatement");
        let cond = self.expression();
        children.push(ParseElement::Node(cond));
        self.expect(SyntaxKind::RParen, &mut children, "selectionStatement");
        let then_branch = self.statement();
        children.push(ParseElement::Node(then_branch));
        if self.at(SyntaxKind::KwElse) {
            self.eat(&mut children);
            let else_branch = self.statement();
            children.push(ParseElement::Node(else_branch));
        }
        self.finish(SyntaxKind::SelectionStatement, children)
    }

    fn switch_statement(&mut self) -> NodeIdx {
        let mut children = Vec::new();
        self.eat(&mut children); // `switch`
        self.expect(SyntaxKind::LParen, &mut children, "switchStatement");
        let cond = self.expression();
        children.push(ParseElement::Node(cond));
        self.expect(SyntaxKind::RParen, &mut children, "switchStatement");
        self.expect(SyntaxKind::LBrace, &mut children, "switchStatement");
        while !self.at(SyntaxKind::RBrace) && !self.at(SyntaxKind::Eof) {
            let stmt = self.statement();
            children.push(ParseElement::Node(stmt));
        }
        self.expect(SyntaxKind::RBrace, &mut children, "switchStatement");
        self.finish(SyntaxKind::SwitchStatement, children)
    }

    fn for_statement(&mut self) -> NodeIdx {
        let mut children = Vec::new();
        self.eat(&mut children); // `for`
        self.expect(SyntaxKind::LParen, &mut children, "forStatement");
        let init = if self.looks_like_declaration() {
            self.declaration_statement()
        } else {
            self.expression_statement()
        };
        children.push(ParseElement::Node(init));
        if !self.at(SyntaxKind::Semicolon) {
            let cond = self.expression();
            children.push(ParseElement::Node(cond));
        }
        self.expect(SyntaxKind::Semicolon, &mut children, "forStatement");
        if !self.at(SyntaxKind::RParen) {
            let step = self.expression();
            children.push(ParseElement::Node(step));
        }
        self.expect(SyntaxKind::RParen, &mut children, "forStatement");
        let body = self.statement();
        children.push(ParseElement::Node(body));
        self.finish(SyntaxKind::ForStatement, children)
    }

    fn while_statement(&mut self) -> NodeIdx {
        let mut children = Vec::new();
        self.eat(&mut children); // `while`
        self.expect(SyntaxKind::LParen, &mut children, "whileStatement");
        let cond = self.expression();
        children.push(ParseElement::Node(cond));
        self.expect(SyntaxKind::RParen, &mut children, "whileStatement");
        let body = self.statement();
        children.push(ParseElement::Node(body));
        self.finish(SyntaxKind::WhileStatement, children)
    }

    fn do_while_statement(&mut self) -> NodeIdx {
        let mut children = Vec::new();
        self.eat(&mut children); // `do`
        let body = self.statement();
        children.push(ParseElement::Node(body));
        self.expect(SyntaxKind::KwWhile, &mut children, "doWhileStatement");
        self.expect(SyntaxKind::LParen, &mut children, "doWhileStatement");
        let cond = self.expression();
        children.push(ParseElement::Node(cond));
        self.expect(SyntaxKind::RParen, &mut children, "doWhileStatement");
        self.expect(SyntaxKind::Semicolon, &mut children, "doWhileStatement");
        self.finish(SyntaxKind::DoWhileStatement, children)
    }

    fn jump_statement(&mut self) -> NodeIdx {
        let mut children = Vec::new();
        let kw = self.eat(&mut children);
        if kw.kind == SyntaxKind::KwReturn && !self.at(SyntaxKind::Semicolon) {
            let expr = self.expression();
            children.push(ParseElement::Node(expr));
        }
        self.expect(SyntaxKind::Semicolon, &mut children, "jumpStatement");
        self.finish(SyntaxKind::JumpStatement, children)
    }

    fn case_label(&mut self) -> NodeIdx {
        let mut children = Vec::new();
        let kw = self.eat(&mut children);
        if kw.kind == SyntaxKind::KwCase {
            let expr = self.expression();
            children.push(ParseElement::Node(expr));
        }
        self.expect(SyntaxKind::Colon, &mut children, "caseLabel");
        self.finish(SyntaxKind::CaseLabel, children)
    }

    // ----- expressions (precedence climbing) -----

    /// The `expression` rule: a comma sequence of assignment-expressions.
    fn expression(&mut self) -> NodeIdx {
        let first = self.assignment_expression();
        if !self.at(SyntaxKind::Comma) {
            return first;
        }
        let mut children = vec![ParseElement::Node(first)];
        while self.at(SyntaxKind::Comma) {
            self.eat(&mut children);
            let next = self.assignment_expression();
            children.push(ParseElement::Node(next));
        }
        self.finish(SyntaxKind::SequenceExpr, children)
    }

    fn is_assignment_operator(&self) -> bool {
        if self.at(SyntaxKind::Eq) {
            return true;
        }
        if self.peek_kind() != SyntaxKind::Operator {
            return false;
        }
        matches!(
            self.tokens[self.significant_pos()].text.as_str(),
            "+=" | "-=" | "*=" | "/=" | "%=" | "<<=" | ">>=" | "&=" | "^=" | "|="
        )
    }

    fn assignment_expression(&mut self) -> NodeIdx {
        let lhs = self.ternary_expression();
        if self.is_assignment_operator() {
            let mut children = vec![ParseElement::Node(lhs)];
            self.eat(&mut children);
            let rhs = self.assignment_expression();
            children.push(ParseElement::Node(rhs));
            return self.finish(SyntaxKind::BinaryExpr, children);
        }
        lhs
    }

    fn ternary_expression(&mut self) -> NodeIdx {
        let cond = self.binary_expression(0);
        if !self.at(SyntaxKind::Question) {
            return cond;
        }
        let mut children = vec![ParseElement::Node(cond)];
        self.eat(&mut children);
        let then_branch = self.assignment_expression();
        children.push(ParseElement::Node(then_branch));
        self.expect(SyntaxKind::Colon, &mut children, "ternaryExpression");
        let else_branch = self.assignment_expression();
        children.push(ParseElement::Node(else_branch));
        self.finish(SyntaxKind::TernaryExpr, children)
    }

    /// Operator-precedence text, lowest to highest. Each entry is the set of
    /// operator spellings at that level; a lower index binds more loosely.
    const BINARY_LEVELS: &'static [&'static [&'static str]] = &[
        &["||"],
        &["^^"],
        &["&&"],
        &["|"],
        &["^"],
        &["&"],
        &["==", "!="],
        &["<", ">", "<=", ">="],
        &["<<", ">>"],
        &["+", "-"],
        &["*", "/", "%"],
    ];

    fn binary_expression(&mut self, level: usize) -> NodeIdx {
        if level >= Self::BINARY_LEVELS.len() {
            return self.unary_expression();
        }
        let mut lhs = self.binary_expression(level + 1);
        loop {
            let text = if self.peek_kind() == SyntaxKind::Operator {
                Some(self.tokens[self.significant_pos()].text.clone())
            } else {
                None
            };
            let Some(text) = text else { break };
            if !Self::BINARY_LEVELS[level].contains(&text.as_str()) {
                break;
            }
            let mut children = vec![ParseElement::Node(lhs)];
            self.eat(&mut children);
            let rhs = self.binary_expression(level + 1);
            children.push(ParseElement::Node(rhs));
            lhs = self.finish(SyntaxKind::BinaryExpr, children);
        }
        lhs
    }

    fn unary_expression(&mut self) -> NodeIdx {
        let is_prefix_op = self.at(SyntaxKind::Operator)
            && matches!(
                self.tokens[self.significant_pos()].text.as_str(),
                "++" | "--" | "+" | "-" | "!" | "~"
            );
        if is_prefix_op {
            let mut children = Vec::new();
            self.eat(&mut children);
            let operand = self.unary_expression();
            children.push(ParseElement::Node(operand));
            return self.finish(SyntaxKind::PrefixExpr, children);
        }
        self.postfix_expression()
    }

    fn postfix_expression(&mut self) -> NodeIdx {
        let mut node = self.primary_expression();
        loop {
            match self.peek_kind() {
                SyntaxKind::Dot => {
                    let mut children = vec![ParseElement::Node(node)];
                    self.eat(&mut children);
                    // A `.method(args)` call is represented as a MemberAccess
                    // whose result is then called, mirroring `a.b(c)` parsing
                    // as `(a.b)(c)` at the syntax level.
                    self.expect(SyntaxKind::Ident, &mut children, "memberAccess");
                    node = self.finish(SyntaxKind::MemberAccessExpr, children);
                }
                SyntaxKind::LBracket => {
                    let mut children = vec![ParseElement::Node(node)];
                    self.eat(&mut children);
                    let index = self.expression();
                    children.push(ParseElement::Node(index));
                    self.expect(SyntaxKind::RBracket, &mut children, "arrayAccess");
                    node = self.finish(SyntaxKind::ArrayAccessExpr, children);
                }
                SyntaxKind::LParen => {
                    let mut children = vec![ParseElement::Node(node)];
                    self.eat(&mut children);
                    if !self.at(SyntaxKind::RParen) {
                        loop {
                            let arg = self.assignment_expression();
                            children.push(ParseElement::Node(arg));
                            if self.at(SyntaxKind::Comma) {
                                self.eat(&mut children);
                            } else {
                                break;
                            }
                        }
                    }
                    self.expect(SyntaxKind::RParen, &mut children, "functionCall");
                    node = self.finish(SyntaxKind::CallExpr, children);
                }
                SyntaxKind::Operator
                    if matches!(
                        self.tokens[self.significant_pos()].text.as_str(),
                        "++" | "--"
                    ) =>
                {
                    let mut children = vec![ParseElement::Node(node)];
                    self.eat(&mut children);
                    node = self.finish(SyntaxKind::PostfixExpr, children);
                }
                _ => break,
            }
        }
        node
    }

    fn primary_expression(&mut self) -> NodeIdx {
        match self.peek_kind() {
            SyntaxKind::LParen => {
                let mut children = Vec::new();
                self.eat(&mut children);
                let inner = self.expression();
                children.push(ParseElement::Node(inner));
                self.expect(SyntaxKind::RParen, &mut children, "groupingExpression");
                self.finish(SyntaxKind::GroupingExpr, children)
            }
            SyntaxKind::Ident => {
                let mut children = Vec::new();
                let ident = self.eat(&mut children);
                let ident_node = self.finish(SyntaxKind::Identifier, vec![ParseElement::Token(ident)]);
                self.finish(SyntaxKind::ReferenceExpr, vec![ParseElement::Node(ident_node)])
            }
            SyntaxKind::IntLiteral
            | SyntaxKind::UintLiteral
            | SyntaxKind::FloatLiteral
            | SyntaxKind::DoubleLiteral
            | SyntaxKind::BoolLiteral
            | SyntaxKind::StringLiteral => {
                let mut children = Vec::new();
                self.eat(&mut children);
                self.finish(SyntaxKind::LiteralExpr, children)
            }
            SyntaxKind::KwBuiltinType | SyntaxKind::KwVoid => {
                // A bare type name used as a call target, e.g. `vec4(...)`.
                let mut children = Vec::new();
                let ident = self.eat(&mut children);
                let ident_node = self.finish(SyntaxKind::Identifier, vec![ParseElement::Token(ident)]);
                self.finish(SyntaxKind::ReferenceExpr, vec![ParseElement::Node(ident_node)])
            }
            _ => {
                let mut children = Vec::new();
                let tok = self.eat(&mut children);
                self.diagnostics.push(ParseDiagnostic {
                    message: format!("expected expression, found {:?}", tok.kind),
                    span: tok.span,
                });
                self.finish(SyntaxKind::LiteralExpr, children)
            }
        }
    }
}

/// Convenience: parses a whole document, throwing on the first diagnostic.
pub fn parse_document(source: &str) -> Result<ParseTree> {
    let mut parser = Parser::new(source);
    parser.throw_parse_errors(true);
    Ok(parser.parse_translation_unit()?.tree)
}

/// Parses a whole document leniently, collecting diagnostics instead of
/// aborting.
pub fn parse_document_lenient(source: &str) -> ParseTree {
    Parser::new(source)
        .parse_translation_unit()
        .expect("lenient parse never throws")
        .tree
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn root_child_kinds(src: &str) -> Vec<SyntaxKind> {
        let tree = parse_document(src).expect("should parse");
        tree.child_nodes(tree.root())
            .map(|n| tree.node(n).kind)
            .collect()
    }

    #[test]
    fn parses_uniform_block_and_uniforms() {
        let kinds = root_child_kinds(
            "uniform UniformBlock { float a; float b; } ; uniform float a; uniform float b;",
        );
        assert_eq!(
            kinds,
            vec![
                SyntaxKind::InterfaceBlockDeclaration,
                SyntaxKind::TypeAndInitDeclaration,
                SyntaxKind::TypeAndInitDeclaration,
            ]
        );
    }

    #[test]
    fn parses_function_definition() {
        let kinds = root_child_kinds("void main(){ shadow2D(s, c); }");
        assert_eq!(kinds, vec![SyntaxKind::FunctionDefinition]);
    }

    #[test]
    fn parses_out_declarations_with_multiple_members() {
        let kinds = root_child_kinds("out vec3 outColor10, fooBar;");
        assert_eq!(kinds, vec![SyntaxKind::TypeAndInitDeclaration]);
    }

    #[test]
    fn parses_layout_defaults() {
        let kinds = root_child_kinds("layout(location = 0) in;");
        assert_eq!(kinds, vec![SyntaxKind::LayoutDefaults]);
    }

    #[test]
    fn parses_unsized_array_specifier_on_member() {
        let tree = parse_document("int foo[], bar[];").unwrap();
        let decl = tree.child_nodes(tree.root()).next().unwrap();
        assert_eq!(tree.node(decl).kind, SyntaxKind::TypeAndInitDeclaration);
    }
}
