//! Weft AST - Arena syntax tree for the aspect weaver
//!
//! This crate defines the node types handed to the weaving pass by the host
//! build pipeline: compilation units holding types and methods in an arena,
//! statements and expressions for method bodies, annotations and spans.
//! It also provides the canonical source printer used to materialize
//! woven trees.

mod span;
mod types;
mod annotation;
mod expr;
mod stmt;
mod decl;
mod unit;
mod printer;

pub use span::*;
pub use types::*;
pub use annotation::*;
pub use expr::*;
pub use stmt::*;
pub use decl::*;
pub use unit::*;
pub use printer::*;
