//! Documentation runtime: the host-owned service wiring validation,
//! registration, diagnostics and resolution together.
//!
//! # Responsibility
//! - Own the process registry from host startup to host shutdown.
//! - Drive validate -> register for each activated extension.
//! - Route every rejection to the diagnostic sink, never to the caller.
//!
//! # Invariants
//! - One extension's malformed entries never affect other entries.
//! - `shutdown` leaves the registry empty; nothing survives a restart.

use crate::config::PipelineConfig;
use crate::extension::diagnostics::{
    ContributionDiagnostic, DiagnosticSink, LogDiagnosticSink, SchemaValidationError,
    UnknownReferenceWarning,
};
use crate::extension::manifest::ExtensionManifest;
use crate::extension::point::{ExtensionPointDescriptor, DOCUMENTATION_POINT};
use crate::extension::registry::{
    normalize_extension_id, ContributionError, ContributionRegistry, RegistrationReceipt,
};
use crate::model::contribution::{ContributionKind, DocumentationBlock, DocumentationEntry};
use crate::service::documentation_service::{
    DocumentationService, ResolvedRefactoring, ResolvedView,
};
use crate::when::evaluator::{ContextKeyEvaluator, WhenEvaluator};
use log::info;
use serde_json::Value;
use std::sync::Arc;

/// Host-side lookup of currently known command and view ids.
pub trait TargetCatalog {
    fn has_command(&self, command_id: &str) -> bool;
    fn has_view(&self, view_id: &str) -> bool;
}

/// Result of accepting one extension's contribution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptanceReport {
    pub receipt: RegistrationReceipt,
    /// Elements dropped by schema validation, counted once per element.
    pub rejected: usize,
    /// Elements dropped by the per-extension cap.
    pub truncated: usize,
}

/// Process-wide documentation service.
pub struct DocumentationRuntime<E = ContextKeyEvaluator> {
    config: PipelineConfig,
    point: &'static ExtensionPointDescriptor,
    service: DocumentationService<E>,
    sink: Arc<dyn DiagnosticSink>,
}

impl DocumentationRuntime<ContextKeyEvaluator> {
    /// Starts a runtime with the built-in evaluator and log diagnostics.
    pub fn start(config: PipelineConfig) -> Self {
        Self::with_parts(config, ContextKeyEvaluator, Arc::new(LogDiagnosticSink))
    }
}

impl<E> DocumentationRuntime<E> {
    pub fn with_parts(config: PipelineConfig, evaluator: E, sink: Arc<dyn DiagnosticSink>) -> Self {
        let registry = Arc::new(ContributionRegistry::new());
        info!(
            "event=runtime_start module=runtime status=ok point={} max_entries_per_extension={}",
            DOCUMENTATION_POINT.name, config.max_entries_per_extension
        );
        Self {
            config,
            point: &DOCUMENTATION_POINT,
            service: DocumentationService::new(registry, evaluator),
            sink,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn point(&self) -> &'static ExtensionPointDescriptor {
        self.point
    }

    pub fn registry(&self) -> &Arc<ContributionRegistry> {
        self.service.registry()
    }

    pub fn service(&self) -> &DocumentationService<E> {
        &self.service
    }

    /// Validates and registers an extension's raw documentation block.
    ///
    /// Malformed elements are dropped and reported; the rest are registered.
    ///
    /// # Errors
    /// - Returns an error only when `extension_id` itself is unusable.
    pub fn accept_contribution(
        &self,
        extension_id: &str,
        raw: &Value,
    ) -> Result<AcceptanceReport, ContributionError> {
        let extension_id = normalize_extension_id(extension_id)?;
        let extension_id = extension_id.as_str();
        let validation = self.point.validate(raw);
        let rejected = validation.rejected_count();
        for violation in validation.violations {
            self.sink
                .report(&ContributionDiagnostic::SchemaValidation(SchemaValidationError {
                    extension_id: extension_id.to_string(),
                    violation,
                }));
        }

        let mut block = validation.block;
        let truncated = self.enforce_entry_cap(extension_id, &mut block);
        let receipt = self.registry().register(extension_id, block)?;
        Ok(AcceptanceReport {
            receipt,
            rejected,
            truncated,
        })
    }

    /// Accepts the `documentation` contribution declared in a manifest.
    ///
    /// A manifest without the contribution clears any earlier registration of
    /// the same extension.
    pub fn accept_manifest(
        &self,
        manifest: &ExtensionManifest,
    ) -> Result<AcceptanceReport, ContributionError> {
        manifest
            .validate()
            .map_err(ContributionError::InvalidManifest)?;
        match manifest.contribution(self.point.name) {
            Some(raw) => self.accept_contribution(&manifest.id, raw),
            None => {
                let receipt = self
                    .registry()
                    .register(&manifest.id, DocumentationBlock::default())?;
                Ok(AcceptanceReport {
                    receipt,
                    rejected: 0,
                    truncated: 0,
                })
            }
        }
    }

    /// Removes an extension's documentation on deactivation.
    pub fn deactivate(&self, extension_id: &str) -> usize {
        self.registry().unregister(extension_id)
    }

    /// Reports registered ids the host does not currently know.
    ///
    /// Returns the warnings; they are also sent to the sink unless reporting
    /// is disabled in config.
    pub fn unknown_references(&self, catalog: &dyn TargetCatalog) -> Vec<UnknownReferenceWarning> {
        let snapshot = self.registry().snapshot();
        let mut warnings = Vec::new();
        for registered in snapshot.refactorings() {
            if !catalog.has_command(registered.entry.target()) {
                warnings.push(UnknownReferenceWarning {
                    extension_id: registered.extension_id.clone(),
                    kind: ContributionKind::Refactoring,
                    target: registered.entry.target().to_string(),
                });
            }
        }
        for registered in snapshot.views() {
            if !catalog.has_view(registered.entry.target()) {
                warnings.push(UnknownReferenceWarning {
                    extension_id: registered.extension_id.clone(),
                    kind: ContributionKind::View,
                    target: registered.entry.target().to_string(),
                });
            }
        }

        if self.config.report_unknown_references {
            for warning in &warnings {
                self.sink
                    .report(&ContributionDiagnostic::UnknownReference(warning.clone()));
            }
        }
        warnings
    }

    /// Refactoring documentation for `command_id` visible in `context`.
    pub fn resolve_refactoring<C>(&self, command_id: &str, context: &C) -> Vec<ResolvedRefactoring>
    where
        C: ?Sized,
        E: WhenEvaluator<C>,
    {
        self.service.resolve_refactoring(command_id, context)
    }

    /// View documentation for `view_id` visible in `context`.
    pub fn resolve_view<C>(&self, view_id: &str, context: &C) -> Vec<ResolvedView>
    where
        C: ?Sized,
        E: WhenEvaluator<C>,
    {
        self.service.resolve_view(view_id, context)
    }

    /// Tears down every registration at host shutdown.
    pub fn shutdown(&self) -> usize {
        let removed = self.registry().clear();
        info!(
            "event=runtime_shutdown module=runtime status=ok removed={}",
            removed
        );
        removed
    }

    fn enforce_entry_cap(&self, extension_id: &str, block: &mut DocumentationBlock) -> usize {
        let cap = self.config.max_entries_per_extension;
        let mut truncated = 0;
        for kind in ContributionKind::ALL {
            let dropped = match kind {
                ContributionKind::Refactoring => truncate_to(&mut block.refactoring, cap),
                ContributionKind::View => truncate_to(&mut block.view, cap),
            };
            if dropped > 0 {
                self.sink.report(&ContributionDiagnostic::EntryLimitExceeded {
                    extension_id: extension_id.to_string(),
                    kind,
                    dropped,
                });
                truncated += dropped;
            }
        }
        truncated
    }
}

fn truncate_to<T>(entries: &mut Vec<T>, cap: usize) -> usize {
    let dropped = entries.len().saturating_sub(cap);
    entries.truncate(cap);
    dropped
}
