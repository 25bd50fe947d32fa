// Parser module: source text to structural records

pub mod ast;
mod python;
pub mod syntax;

pub use ast::*;
pub use python::{decode_lossy, extract, PythonParser, SourceTree};
