//! Typed documentation contribution model.
//!
//! # Responsibility
//! - Define the entries extensions contribute and their registered wrappers.
//!
//! # Invariants
//! - Field names exist once, as constants in `contribution::fields`.

pub mod contribution;
