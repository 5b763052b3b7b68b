//! A programmable source-to-source transformation engine for GLSL.
//!
//! An AST here is a mutable, owned tree living inside a [`Root`]: nodes are
//! arena-allocated and addressed by handle, so "parent", "child", and index
//! entries are plain `Copy` ids rather than `Rc`/`RefCell` cycles. Building
//! one is cheap (`ast::build` walks a `glsl_grammar::ParseTree` once); editing
//! one mutates the arena directly rather than rebuilding a new tree, since the
//! whole point of this crate is driving many small, scheduled rewrites over
//! the same document.
//!
//! # Examples
//!
//! ```rust
//! use glsl_transform::Transformation;
//! use glsl_transform::TransformationManager;
//!
//! let mut manager = TransformationManager::new();
//! manager.register_transformation(Transformation::new());
//! let out = manager.transform("uniform float a;\n").unwrap();
//! assert_eq!(out, "uniform float a;\n");
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![warn(rust_2021_compatibility)]
#![warn(missing_debug_implementations)]

mod arena;
mod ast_parser;
mod error;
mod manager;
mod node;
mod path;
mod phase;
mod printer;
mod root;
mod template;
mod transformation;

pub mod ast;
pub mod phases;

pub use ast_parser::parse_expression;
pub use ast_parser::parse_external_declaration;
pub use ast_parser::parse_node_separate;
pub use ast_parser::parse_statement;
pub use ast_parser::parse_translation_unit;
pub use error::Error;
pub use error::Result;
pub use manager::TransformationManager;
pub use node::AstNode;
pub use node::Node;
pub use path::Axis;
pub use path::Path;
pub use phase::InjectionPoint;
pub use phase::Phase;
pub use phase::PhaseEnv;
pub use phase::PhaseShape;
pub use phase::PhaseState;
pub use printer::print;
pub use root::IndexPolicy;
pub use root::Root;
pub use root::RootSupplier;
pub use template::Captures;
pub use template::Matcher;
pub use template::ParseShape;
pub use template::Substitutions;
pub use template::Template;
pub use transformation::PhaseCollector;
pub use transformation::Transformation;

pub use glsl_grammar::ParsingStrategy;
pub use glsl_grammar::TokenFilter;
