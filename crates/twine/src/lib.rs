//! Twine stitches a graph of JavaScript files linked by `require("path")`
//! directives into a single script, in depth-first, first-occurrence order,
//! and produces a source map attributing every output line to its original
//! file and line.

pub mod assembler;
pub mod ast;
pub mod config;
pub mod emitter;
pub mod error;
pub mod lexer;
pub mod loader;
pub mod orchestrator;
pub mod parser;
pub mod resolver;
pub mod scanner;
pub mod template;

pub use crate::{
    config::{Config, ContentProcess},
    emitter::Bundle,
    error::{Result, TwineError},
    orchestrator::Bundler,
};
