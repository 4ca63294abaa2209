//! Weft - Compile-time aspect weaving
//!
//! This is the root workspace crate that provides integration tests.
//! The actual implementation is in the workspace member crates.

// Re-export main crates for convenience
pub use weft_ast as ast;
pub use weft_weaver as weaver;
