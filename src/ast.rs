//! # treeq expression language - Abstract Syntax Tree
//!
//! This module defines the Abstract Syntax Tree (AST) for treeq expressions,
//! a small jq-flavoured language for querying and rewriting YAML, JSON and
//! properties documents.
//!
//! ## Architecture Overview
//!
//! - **[tokens]** - Lexical tokens produced by the lexer
//! - **[expressions]** - [`ExpressionNode`], an operation with optional operands
//! - **[operators]** - [`Operation`], the closed set of operations the navigator dispatches on
//!
//! ## Quick Start
//!
//! ```text
//! .users[] | .name |= trim
//! ```
//!
//! ## Core Concepts
//!
//! ### Paths
//!
//! ```text
//! .                  the current node
//! .a.b               nested mapping lookup
//! .items[0]          sequence position (negative counts from the end)
//! .items[]           every element
//! ```
//!
//! ### Composition
//!
//! ```text
//! a | b              feed every result of a into b
//! a, b               results of a followed by results of b
//! .a = "x"           assign the same value to every match
//! .a |= upcase       rewrite every match with its own result
//! ```
//!
//! ### String Interpolation
//!
//! String literals may embed expressions with `\( ... )`:
//!
//! ```text
//! "Hello \(.name), you have \(.count) messages"
//! ```
//!
//! ### String Operators
//!
//! ```text
//! trim  upcase  downcase  to_string  join(", ")  split(",")
//! sub("a"; "b")  match("a+"; "g")  capture("(?P<x>\d+)")  test("^a")
//! ```
pub mod expressions;
pub mod operators;
pub mod tokens;

pub use expressions::ExpressionNode;
pub use operators::{CaseDirection, Operation};
pub use tokens::Token;
