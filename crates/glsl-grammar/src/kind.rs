//! The single kind space shared by lexical tokens and parse tree nodes.
//!
//! Mirroring `rowan`'s `SyntaxKind` convention (as used by the teacher's
//! experimental WDL parser), one flat enum covers both leaves (tokens) and
//! interior nodes (grammar rules), so a parse tree can be walked generically
//! without a second tag space.

/// A single lexical or structural kind.
///
/// Token variants (leaves) are produced directly by the [`lexer`](crate::lexer);
/// node variants (interior) are produced by the [`parser`](crate::parser) to
/// tag the shape of a subtree. `glsl-transform`'s AST builder casts each node
/// by this kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[non_exhaustive]
pub enum SyntaxKind {
    // --- trivia (hidden channel) ---
    /// Horizontal/vertical whitespace.
    Whitespace,
    /// A `//` or `/* */` comment.
    Comment,

    // --- literal/identifier tokens ---
    /// An identifier, including placeholder identifiers (e.g. `__name`).
    Ident,
    /// An integer literal (`5`).
    IntLiteral,
    /// An unsigned integer literal (`5u`).
    UintLiteral,
    /// A float literal (`5.0`).
    FloatLiteral,
    /// A double literal (`5.0lf`).
    DoubleLiteral,
    /// A string literal — not standard GLSL, but accepted inside vendor
    /// extension calls such as `printf(...)`.
    StringLiteral,
    /// `true` or `false`.
    BoolLiteral,

    // --- keyword tokens relevant to storage/interpolation/precision ---
    /// A storage qualifier keyword (`in`, `out`, `uniform`, `buffer`, `const`,
    /// `shared`, `attribute`, `varying`, `centroid`, `sample`, `patch`).
    KwStorage,
    /// An interpolation qualifier keyword (`flat`, `smooth`, `noperspective`).
    KwInterpolation,
    /// A precision qualifier keyword (`highp`, `mediump`, `lowp`).
    KwPrecision,
    /// The `invariant` keyword.
    KwInvariant,
    /// The `precise` keyword.
    KwPrecise,
    /// A memory qualifier keyword (`restrict`, `readonly`, `writeonly`,
    /// `coherent`, `volatile`).
    KwMemory,
    /// The `layout` keyword.
    KwLayout,
    /// The `precision` keyword (precision declaration, not qualifier).
    KwPrecisionDecl,
    /// The `struct` keyword.
    KwStruct,
    /// The `void` keyword.
    KwVoid,
    /// A builtin numeric or fixed-size type name (`float`, `vec4`, `mat4`,
    /// `sampler2D`, ...).
    KwBuiltinType,
    /// `if`.
    KwIf,
    /// `else`.
    KwElse,
    /// `switch`.
    KwSwitch,
    /// `case`.
    KwCase,
    /// `default`.
    KwDefault,
    /// `for`.
    KwFor,
    /// `while`.
    KwWhile,
    /// `do`.
    KwDo,
    /// `break`.
    KwBreak,
    /// `continue`.
    KwContinue,
    /// `return`.
    KwReturn,
    /// `discard`.
    KwDiscard,

    // --- punctuation tokens ---
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `;`
    Semicolon,
    /// `,`
    Comma,
    /// `.`
    Dot,
    /// `:`
    Colon,
    /// `?`
    Question,
    /// `=`
    Eq,
    /// Any other operator token (`+`, `-`, `*`, `/`, `%`, `++`, `--`, `<<`,
    /// `>>`, `<`, `>`, `<=`, `>=`, `==`, `!=`, `&`, `|`, `^`, `&&`, `||`, `^^`,
    /// `!`, `~`, and their `=`-suffixed assignment forms). The exact operator
    /// spelling is recovered from the token text; collapsing them into one
    /// kind keeps this enum small the way a hand grammar's "OP" class would.
    Operator,

    // --- preprocessor-shaped directives (kept as hidden-adjacent tokens) ---
    /// `#version`.
    HashVersion,
    /// `#extension`.
    HashExtension,
    /// `#pragma`.
    HashPragma,
    /// The remainder of a directive line, verbatim.
    DirectiveRest,

    /// End of input.
    Eof,

    // --- node (interior) kinds ---
    /// The root of a parsed document.
    TranslationUnit,
    /// A `#version` directive.
    VersionDirective,
    /// A `#extension` directive.
    ExtensionDirective,
    /// A `#pragma` directive.
    PragmaDirective,
    /// A standalone `;` at the top level.
    EmptyExternalDecl,
    /// A `layout(...) in;` / `layout(...) out;` layout-defaults declaration.
    LayoutDefaults,
    /// A function definition (prototype + body).
    FunctionDefinition,
    /// A function prototype with no body, terminated by `;`.
    FunctionPrototype,
    /// A parameter in a function prototype/definition.
    FunctionParameter,
    /// A type-and-init declaration (`uniform float a, b = 1.0;`).
    TypeAndInitDeclaration,
    /// One member of a [`TypeAndInitDeclaration`](Self::TypeAndInitDeclaration).
    DeclarationMember,
    /// An interface block declaration (`uniform Block { ... } name;`).
    InterfaceBlockDeclaration,
    /// A precision declaration (`precision highp float;`).
    PrecisionDeclaration,
    /// An empty declaration (`;` where a declaration was expected).
    EmptyDeclaration,
    /// `{ ... }`.
    CompoundStatement,
    /// An expression used as a statement.
    ExpressionStatement,
    /// A local declaration used as a statement.
    DeclarationStatement,
    /// `if (...) ... else ...`.
    SelectionStatement,
    /// `switch (...) { ... }`.
    SwitchStatement,
    /// `for (...; ...; ...) ...`.
    ForStatement,
    /// `while (...) ...`.
    WhileStatement,
    /// `do ... while (...);`.
    DoWhileStatement,
    /// `break`/`continue`/`return`/`discard`.
    JumpStatement,
    /// `case EXPR:` or `default:`.
    CaseLabel,
    /// A standalone `;` used as a statement.
    EmptyStatement,
    /// A reference to an identifier.
    ReferenceExpr,
    /// A literal expression.
    LiteralExpr,
    /// A parenthesized expression.
    GroupingExpr,
    /// `a.b`.
    MemberAccessExpr,
    /// `a[b]`.
    ArrayAccessExpr,
    /// `f(a, b)` or `a.f(b)`.
    CallExpr,
    /// `a++` / `a--`.
    PostfixExpr,
    /// `++a` / `--a` / unary `+a`/`-a`/`!a`/`~a`.
    PrefixExpr,
    /// Any binary operator, including assignment flavors.
    BinaryExpr,
    /// `a ? b : c`.
    TernaryExpr,
    /// `a, b, c`.
    SequenceExpr,
    /// An ordered sequence of qualifier parts.
    TypeQualifier,
    /// `layout(...)`.
    LayoutQualifier,
    /// One `name` / `name = expr` / `shared` part of a [`LayoutQualifier`](Self::LayoutQualifier).
    LayoutQualifierId,
    /// A type specifier (builtin, struct, or named type), with optional array
    /// specifier.
    TypeSpecifier,
    /// `struct Name { ... }`.
    StructSpecifier,
    /// One member of a [`StructSpecifier`](Self::StructSpecifier).
    StructMember,
    /// `[N]` or `[]`.
    ArraySpecifier,
    /// A mutable identifier name, indexable by current spelling.
    Identifier,
}

impl SyntaxKind {
    /// Whether this kind is a trivia (hidden-channel) token.
    pub fn is_trivia(self) -> bool {
        matches!(self, SyntaxKind::Whitespace | SyntaxKind::Comment)
    }

    /// Whether this kind is a token (leaf), as opposed to a node (interior).
    pub fn is_token(self) -> bool {
        (self as u8) <= (SyntaxKind::Eof as u8)
    }
}
