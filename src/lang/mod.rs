//! # Expression tree
//!
//! The tree produced by the parser, rewritten by constant folding and walked
//! by the code generator.

pub mod node;

pub use node::{BinOp, Function, Node};
