//! The lexer: a `logos`-backed tokenizer plus a chainable [`TokenFilter`].
//!
//! Spec §6.1 describes the external parser's lexer as exposing "a mutable
//! input stream and an error listener" with a settable [`TokenFilter`] placed
//! on the lexer's token source. We keep that shape: [`Lexer::new`] builds the
//! raw token stream, and [`Lexer::with_filter`] interposes a filter that may
//! drop, rewrite, or inject tokens before they reach the parser.

use logos::Logos;

use crate::Span;
use crate::kind::SyntaxKind;

/// The raw lexical token alphabet, mapped 1:1 onto the token-shaped subset of
/// [`SyntaxKind`]. Kept as its own `Logos` enum (rather than deriving `Logos`
/// directly on `SyntaxKind`) because `logos` requires a flat `#[token]`/
/// `#[regex]`-annotated type and we do not want those annotations leaking into
/// the shared kind space that also tags interior nodes.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n]+")]
enum Tok {
    #[regex(r"//[^\n]*")]
    LineComment,
    #[regex(r"/\*([^*]|\*[^/])*\*/")]
    BlockComment,

    #[regex(r"#[ \t]*version")]
    HashVersion,
    #[regex(r"#[ \t]*extension")]
    HashExtension,
    #[regex(r"#[ \t]*pragma")]
    HashPragma,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident,
    #[regex(r#""[^"]*""#)]
    StringLiteral,
    #[regex(r"[0-9]+[uU]")]
    UintLiteral,
    #[regex(r"[0-9]+\.[0-9]*([eE][+-]?[0-9]+)?[lL][fF]|[0-9]+\.[0-9]*([eE][+-]?[0-9]+)?")]
    FloatOrDoubleLiteral,
    #[regex(r"[0-9]+")]
    IntLiteral,

    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(";")]
    Semicolon,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token(":")]
    Colon,
    #[token("?")]
    Question,

    #[token("=")]
    Eq,
    #[token("==")]
    EqEq,
    #[token("!=")]
    BangEq,
    #[token("<=")]
    LtEq,
    #[token(">=")]
    GtEq,
    #[token("<<=")]
    ShlEq,
    #[token(">>=")]
    ShrEq,
    #[token("<<")]
    Shl,
    #[token(">>")]
    Shr,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("&&")]
    AmpAmp,
    #[token("||")]
    PipePipe,
    #[token("^^")]
    CaretCaret,
    #[token("++")]
    PlusPlus,
    #[token("--")]
    MinusMinus,
    #[token("+=")]
    PlusEq,
    #[token("-=")]
    MinusEq,
    #[token("*=")]
    StarEq,
    #[token("/=")]
    SlashEq,
    #[token("%=")]
    PercentEq,
    #[token("&=")]
    AmpEq,
    #[token("|=")]
    PipeEq,
    #[token("^=")]
    CaretEq,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("&")]
    Amp,
    #[token("|")]
    Pipe,
    #[token("^")]
    Caret,
    #[token("!")]
    Bang,
    #[token("~")]
    Tilde,
}

/// One lexed token with its text span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// The token's kind.
    pub kind: SyntaxKind,
    /// The token's exact source text.
    pub text: String,
    /// The token's byte span in the original source.
    pub span: Span,
}

/// A small fixed table of reserved words that are not punctuation but still
/// distinguish `Ident` into a more specific [`SyntaxKind`].
const STORAGE_KEYWORDS: &[&str] = &[
    "in", "out", "uniform", "buffer", "const", "shared", "attribute", "varying", "centroid",
    "sample", "patch",
];
const INTERPOLATION_KEYWORDS: &[&str] = &["flat", "smooth", "noperspective"];
const PRECISION_KEYWORDS: &[&str] = &["highp", "mediump", "lowp"];
const MEMORY_KEYWORDS: &[&str] = &["restrict", "readonly", "writeonly", "coherent", "volatile"];
const BUILTIN_TYPES: &[&str] = &[
    "float", "double", "int", "uint", "bool", "vec2", "vec3", "vec4", "ivec2", "ivec3", "ivec4",
    "uvec2", "uvec3", "uvec4", "bvec2", "bvec3", "bvec4", "dvec2", "dvec3", "dvec4", "mat2",
    "mat3", "mat4", "mat2x2", "mat2x3", "mat2x4", "mat3x2", "mat3x3", "mat3x4", "mat4x2", "mat4x3",
    "mat4x4", "sampler1D", "sampler2D", "sampler3D", "samplerCube", "sampler2DArray",
    "sampler2DShadow", "samplerCubeShadow", "isampler2D", "usampler2D",
];

/// Classifies an identifier-shaped lexeme into the most specific [`SyntaxKind`]
/// it could represent. Called once per `Ident` token from the raw lexer.
fn classify_ident(text: &str) -> SyntaxKind {
    match text {
        "void" => SyntaxKind::KwVoid,
        "struct" => SyntaxKind::KwStruct,
        "layout" => SyntaxKind::KwLayout,
        "precision" => SyntaxKind::KwPrecisionDecl,
        "invariant" => SyntaxKind::KwInvariant,
        "precise" => SyntaxKind::KwPrecise,
        "if" => SyntaxKind::KwIf,
        "else" => SyntaxKind::KwElse,
        "switch" => SyntaxKind::KwSwitch,
        "case" => SyntaxKind::KwCase,
        "default" => SyntaxKind::KwDefault,
        "for" => SyntaxKind::KwFor,
        "while" => SyntaxKind::KwWhile,
        "do" => SyntaxKind::KwDo,
        "break" => SyntaxKind::KwBreak,
        "continue" => SyntaxKind::KwContinue,
        "return" => SyntaxKind::KwReturn,
        "discard" => SyntaxKind::KwDiscard,
        "true" | "false" => SyntaxKind::BoolLiteral,
        _ if STORAGE_KEYWORDS.contains(&text) => SyntaxKind::KwStorage,
        _ if INTERPOLATION_KEYWORDS.contains(&text) => SyntaxKind::KwInterpolation,
        _ if PRECISION_KEYWORDS.contains(&text) => SyntaxKind::KwPrecision,
        _ if MEMORY_KEYWORDS.contains(&text) => SyntaxKind::KwMemory,
        _ if BUILTIN_TYPES.contains(&text) => SyntaxKind::KwBuiltinType,
        _ => SyntaxKind::Ident,
    }
}

fn classify_number(text: &str) -> SyntaxKind {
    if text.ends_with("lf") || text.ends_with("LF") || text.ends_with("lF") || text.ends_with("Lf")
    {
        SyntaxKind::DoubleLiteral
    } else if text.contains('.') || text.contains('e') || text.contains('E') {
        SyntaxKind::FloatLiteral
    } else {
        SyntaxKind::IntLiteral
    }
}

/// A token source a [`TokenFilter`] can rewrite. Implemented by the raw lexer
/// and by every filter in a chain, so filters compose.
pub trait TokenSource {
    /// Returns the next token, or `None` at end of input (before the
    /// synthetic [`SyntaxKind::Eof`] token is emitted).
    fn next_token(&mut self) -> Option<Token>;
}

/// A token-stream transformer interposed between the lexer and the parser
/// The default filter is the identity; a custom filter may drop
/// trivia, rewrite directive text, or inject synthetic tokens.
pub trait TokenFilter {
    /// Processes one token pulled from `upstream`, returning the token (or
    /// tokens, via repeated calls) to hand to the parser. Returning `None`
    /// drops the token.
    fn filter(&mut self, token: Token) -> Option<Token>;
}

/// The identity filter: passes every token through unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityFilter;

impl TokenFilter for IdentityFilter {
    fn filter(&mut self, token: Token) -> Option<Token> {
        Some(token)
    }
}

impl TokenFilter for Box<dyn TokenFilter> {
    fn filter(&mut self, token: Token) -> Option<Token> {
        (**self).filter(token)
    }
}

/// The raw tokenizer over a source string.
pub struct Lexer<'s> {
    inner: logos::Lexer<'s, Tok>,
    source: &'s str,
    /// Set once the end of input has been reached, so `next_token` can emit
    /// exactly one `Eof` token (matching the parser's lookahead contract).
    emitted_eof: bool,
}

impl<'s> Lexer<'s> {
    /// Creates a lexer over `source`. Parse-scope state (here, none beyond the
    /// cursor itself) is always fresh for each parse.
    pub fn new(source: &'s str) -> Self {
        Lexer {
            inner: Tok::lexer(source),
            source,
            emitted_eof: false,
        }
    }

    fn lex_directive_rest(&mut self) -> Token {
        // Directives are newline-terminated; consume the remainder of the
        // underlying slice up to (not including) the next '\n' directly from
        // the logos remainder, since the rest-of-line text is not itself
        // meaningfully tokenizable (profile names, extension behaviors, and
        // pragma bodies are all just words).
        let remainder = self.inner.remainder();
        let end_in_remainder = remainder.find('\n').unwrap_or(remainder.len());
        let start = self.inner.span().end;
        let text = remainder[..end_in_remainder].trim().to_string();
        for _ in 0..end_in_remainder {
            self.inner.bump(1);
        }
        Token {
            kind: SyntaxKind::DirectiveRest,
            span: Span {
                start,
                end: start + end_in_remainder,
            },
            text,
        }
    }
}

impl TokenSource for Lexer<'_> {
    fn next_token(&mut self) -> Option<Token> {
        loop {
            let next = self.inner.next();
            let Some(result) = next else {
                if self.emitted_eof {
                    return None;
                }
                self.emitted_eof = true;
                return Some(Token {
                    kind: SyntaxKind::Eof,
                    text: String::new(),
                    span: Span {
                        start: self.source.len(),
                        end: self.source.len(),
                    },
                });
            };
            let span = self.inner.span();
            let text = self.inner.slice().to_string();
            let tok = match result {
                Ok(tok) => tok,
                Err(()) => {
                    // Surface as a comment-shaped trivia token rather than
                    // aborting the whole stream; the parser will report a
                    // diagnostic if this text ends up somewhere unexpected.
                    return Some(Token {
                        kind: SyntaxKind::Comment,
                        text,
                        span: Span {
                            start: span.start,
                            end: span.end,
                        },
                    });
                }
            };
            let kind = match tok {
                Tok::LineComment | Tok::BlockComment => SyntaxKind::Comment,
                Tok::HashVersion => SyntaxKind::HashVersion,
                Tok::HashExtension => SyntaxKind::HashExtension,
                Tok::HashPragma => SyntaxKind::HashPragma,
                Tok::Ident => classify_ident(&text),
                Tok::StringLiteral => SyntaxKind::StringLiteral,
                Tok::UintLiteral => SyntaxKind::UintLiteral,
                Tok::FloatOrDoubleLiteral => classify_number(&text),
                Tok::IntLiteral => SyntaxKind::IntLiteral,
                Tok::LBrace => SyntaxKind::LBrace,
                Tok::RBrace => SyntaxKind::RBrace,
                Tok::LParen => SyntaxKind::LParen,
                Tok::RParen => SyntaxKind::RParen,
                Tok::LBracket => SyntaxKind::LBracket,
                Tok::RBracket => SyntaxKind::RBracket,
                Tok::Semicolon => SyntaxKind::Semicolon,
                Tok::Comma => SyntaxKind::Comma,
                Tok::Dot => SyntaxKind::Dot,
                Tok::Colon => SyntaxKind::Colon,
                Tok::Question => SyntaxKind::Question,
                Tok::Eq => SyntaxKind::Eq,
                _ => SyntaxKind::Operator,
            };
            if matches!(
                kind,
                SyntaxKind::HashVersion | SyntaxKind::HashExtension | SyntaxKind::HashPragma
            ) {
                // Return the directive keyword now; the rest-of-line text is
                // returned as a single `DirectiveRest` token on the next call.
                return Some(Token {
                    kind,
                    text,
                    span: Span {
                        start: span.start,
                        end: span.end,
                    },
                });
            }
            return Some(Token {
                kind,
                text,
                span: Span {
                    start: span.start,
                    end: span.end,
                },
            });
        }
    }
}

/// A lexer wrapped with a [`TokenFilter`], and aware that directive keywords
/// must be immediately followed by a [`SyntaxKind::DirectiveRest`] token.
pub struct FilteredLexer<'s, F> {
    lexer: Lexer<'s>,
    filter: F,
    pending_directive_rest: bool,
}

impl<'s, F: TokenFilter> FilteredLexer<'s, F> {
    /// Wraps `lexer` with `filter`.
    pub fn new(lexer: Lexer<'s>, filter: F) -> Self {
        FilteredLexer {
            lexer,
            filter,
            pending_directive_rest: false,
        }
    }
}

impl<F: TokenFilter> TokenSource for FilteredLexer<'_, F> {
    fn next_token(&mut self) -> Option<Token> {
        if self.pending_directive_rest {
            self.pending_directive_rest = false;
            let rest = self.lexer.lex_directive_rest();
            return self.filter.filter(rest);
        }
        let token = self.lexer.next_token()?;
        if matches!(
            token.kind,
            SyntaxKind::HashVersion | SyntaxKind::HashExtension | SyntaxKind::HashPragma
        ) {
            self.pending_directive_rest = true;
        }
        self.filter.filter(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<SyntaxKind> {
        let mut lexer = Lexer::new(src);
        let mut out = Vec::new();
        while let Some(tok) = lexer.next_token() {
            if tok.kind == SyntaxKind::Eof {
                break;
            }
            if tok.kind.is_trivia() {
                continue;
            }
            out.push(tok.kind);
        }
        out
    }

    #[test]
    fn lexes_uniform_declaration() {
        assert_eq!(
            kinds("uniform float a;"),
            vec![
                SyntaxKind::KwStorage,
                SyntaxKind::KwBuiltinType,
                SyntaxKind::Ident,
                SyntaxKind::Semicolon,
            ]
        );
    }

    #[test]
    fn lexes_version_directive_as_two_tokens() {
        let mut lexer = Lexer::new("#version 330 core\nvoid main(){}");
        assert_eq!(lexer.next_token().unwrap().kind, SyntaxKind::HashVersion);
        let rest = lexer.lex_directive_rest();
        assert_eq!(rest.kind, SyntaxKind::DirectiveRest);
        assert_eq!(rest.text, "330 core");
    }

    #[test]
    fn lexes_compound_assignment_operators() {
        assert_eq!(kinds("a += 1;")[1], SyntaxKind::Operator);
    }
}
