//! Ruby declaration extraction built on tree-sitter-ruby.

pub mod extractor;
pub mod names;

pub use extractor::extract;
