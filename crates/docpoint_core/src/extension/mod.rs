//! Extension contribution pipeline.
//!
//! This module defines the `documentation` extension point: its schema and
//! validator, the process registry, the binding descriptor handed to the host
//! loader, and the diagnostic and localization boundaries. Extension
//! discovery and activation belong to the host.

pub mod diagnostics;
pub mod localize;
pub mod manifest;
pub mod point;
pub mod registry;
pub mod schema;
