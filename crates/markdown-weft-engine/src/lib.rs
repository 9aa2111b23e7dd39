//! Core engine for markdown-weft: a commonmark-family markdown parser
//! producing an abstract syntax tree, plus the walker protocol and
//! renderer contract that output formats build on.
//!
//! Parsing is a pure transformation over a read-only byte buffer and is
//! total: any input, including invalid UTF-8 and pathological nesting,
//! yields a complete well-formed tree. See [`parse`] for the one-call
//! entry point and [`parse::Parser`] for configured parsing.

pub mod ast;
pub mod parse;
pub mod render;

// Re-export key types for easier usage
pub use ast::{
    CellAlign, CellData, CodeBlockData, HeadingData, LinkData, ListData, ListFlags, NodeId,
    NodeKind, NodeVisitor, Tree, TreeError, WalkStatus, walk,
};
pub use parse::{Extensions, Parser, ParserOptions};
pub use parse::refs::{Reference, ReferenceOverrideFn};
pub use render::{Renderer, render};

/// Parses `input` with the given extension set and default options.
pub fn parse(input: &[u8], extensions: Extensions) -> Tree {
    Parser::new(ParserOptions {
        extensions,
        ..Default::default()
    })
    .parse(input)
}
