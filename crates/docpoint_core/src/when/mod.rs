//! When-clause boundary.
//!
//! # Responsibility
//! - Define the predicate evaluator contract used by resolution.
//! - Provide the context-key context and evaluator used by default.
//!
//! # Invariants
//! - Evaluation never mutates the context.

pub mod context;
pub mod evaluator;
