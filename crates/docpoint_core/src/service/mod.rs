//! Use-case services consumed by hosts and presentation code.
//!
//! # Responsibility
//! - Resolve visible documentation for presentation callers.
//! - Own the registry lifecycle on behalf of the host.
//!
//! # Invariants
//! - Services never expose which extension supplied a resolved entry.

pub mod documentation_service;
pub mod runtime;
