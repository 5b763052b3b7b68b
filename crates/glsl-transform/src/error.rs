//! Error types for the transformation engine.

/// Errors produced while building, querying, or mutating an AST, or while
/// running a transformation over one.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A parse failed before the AST builder ever ran.
    #[error(transparent)]
    Parse(#[from] glsl_grammar::Error),

    /// A `Matcher` or `Template` hole was left unfilled, or a capture name
    /// was referenced that the pattern never bound.
    #[error("template hole missing: {0}")]
    TemplateHoleMissing(String),

    /// A typed AST cast (`AstNode::cast`) was attempted against a node of
    /// the wrong kind, or a structural assumption about a node's children
    /// (arity, ordering) did not hold.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    /// An index lookup expected exactly one match and found zero or more
    /// than one.
    #[error("uniqueness violation: {0}")]
    UniquenessViolation(String),

    /// An operation required a node to be attached to (or detached from) a
    /// tree, and it was not.
    #[error("detachment violation: {0}")]
    DetachmentViolation(String),

    /// An arena handle was used after the node was detached and deleted, or
    /// an index was found to disagree with the tree it indexes.
    #[error("index invariant broken: {0}")]
    IndexInvariantBroken(String),

    /// A compiled path expression or matcher pattern failed to parse.
    #[error("invalid pattern: {0}")]
    InvalidPattern(String),
}

/// A [`Result`](std::result::Result) specialized for this crate's [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
