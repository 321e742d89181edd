//! Core pipeline for extension-contributed documentation.
//! Extensions declare refactoring and view documentation; this crate
//! validates, aggregates and resolves it for presentation code.

pub mod config;
pub mod extension;
pub mod logging;
pub mod model;
pub mod service;
pub mod when;

pub use config::{ConfigError, PipelineConfig};
pub use extension::diagnostics::{
    CollectingDiagnosticSink, ContributionDiagnostic, DiagnosticSink, LogDiagnosticSink,
    SchemaValidationError, UnknownReferenceWarning,
};
pub use extension::localize::{FallbackLocalizer, Localizer};
pub use extension::manifest::{ExtensionManifest, ManifestValidationError};
pub use extension::point::{
    order_points, ExtensionPointDescriptor, PointDeclaration, PointOrderError,
    DOCUMENTATION_POINT, DOCUMENTATION_POINT_NAME, LANGUAGES_POINT_NAME,
};
pub use extension::registry::{
    ContributionError, ContributionRegistry, RegistrationReceipt, RegistrySnapshot,
};
pub use extension::schema::{
    validate, validate_block, BlockValidation, SchemaViolation, ValidatedEntries, ViolationReason,
};
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use model::contribution::{
    ContributionKind, DocumentationBlock, DocumentationEntry, RefactoringDocumentation,
    RegisteredContribution, RegisteredEntry, ViewDocumentation,
};
pub use service::documentation_service::{
    DocumentationService, ResolvedRefactoring, ResolvedView,
};
pub use service::runtime::{AcceptanceReport, DocumentationRuntime, TargetCatalog};
pub use when::context::WhenContext;
pub use when::evaluator::{ContextKeyEvaluator, PredicateEvaluationError, WhenEvaluator};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
