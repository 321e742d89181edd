//! Flutter bridge for the documentation pipeline.

pub mod api;
