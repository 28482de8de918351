//! Frontend module - Lexer, Parser, file-scope binding and source access

pub mod token;
pub mod lexer;
pub mod ast;
pub mod parser;
pub mod scope;
pub mod source;

pub use parser::parse_file;
pub use source::{DiskSource, MemorySource, SourceProvider};
