//! Contribution diagnostics and the host diagnostic channel.
//!
//! # Responsibility
//! - Attribute schema violations and dangling references to their extension.
//! - Deliver diagnostics to the host without failing registration.
//!
//! # Invariants
//! - Diagnostics never carry authored documentation text.
//! - Reporting never fails and never panics.

use crate::extension::schema::SchemaViolation;
use crate::model::contribution::ContributionKind;
use log::warn;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Mutex, PoisonError};

/// Schema violation attributed to the extension that declared it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaValidationError {
    pub extension_id: String,
    pub violation: SchemaViolation,
}

impl Display for SchemaValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid documentation contribution from `{}`: {}",
            self.extension_id, self.violation
        )
    }
}

impl Error for SchemaValidationError {}

/// Registered entry whose target id is not known to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownReferenceWarning {
    pub extension_id: String,
    pub kind: ContributionKind,
    pub target: String,
}

impl Display for UnknownReferenceWarning {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "`{}` documents unknown {} `{}`",
            self.extension_id,
            self.kind.target_field(),
            self.target
        )
    }
}

/// Everything the pipeline reports to the host's diagnostic channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContributionDiagnostic {
    SchemaValidation(SchemaValidationError),
    UnknownReference(UnknownReferenceWarning),
    EntryLimitExceeded {
        extension_id: String,
        kind: ContributionKind,
        dropped: usize,
    },
}

impl ContributionDiagnostic {
    pub fn extension_id(&self) -> &str {
        match self {
            Self::SchemaValidation(err) => &err.extension_id,
            Self::UnknownReference(warning) => &warning.extension_id,
            Self::EntryLimitExceeded { extension_id, .. } => extension_id,
        }
    }

    /// Stable event name used in log lines.
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::SchemaValidation(_) => "contribution_rejected",
            Self::UnknownReference(_) => "unknown_reference",
            Self::EntryLimitExceeded { .. } => "entry_limit_exceeded",
        }
    }
}

impl Display for ContributionDiagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SchemaValidation(err) => write!(f, "{err}"),
            Self::UnknownReference(warning) => write!(f, "{warning}"),
            Self::EntryLimitExceeded {
                extension_id,
                kind,
                dropped,
            } => write!(
                f,
                "`{extension_id}` exceeds the {kind} entry limit; dropped {dropped} entries"
            ),
        }
    }
}

/// Host diagnostic channel.
pub trait DiagnosticSink: Send + Sync {
    fn report(&self, diagnostic: &ContributionDiagnostic);
}

/// Writes diagnostics to the core log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogDiagnosticSink;

impl DiagnosticSink for LogDiagnosticSink {
    fn report(&self, diagnostic: &ContributionDiagnostic) {
        match diagnostic {
            ContributionDiagnostic::SchemaValidation(err) => warn!(
                "event={} module=schema status=warn extension_id={} path={} reason={:?}",
                diagnostic.event_name(),
                err.extension_id,
                err.violation.path(),
                err.violation.reason
            ),
            ContributionDiagnostic::UnknownReference(warning) => warn!(
                "event={} module=registry status=warn extension_id={} kind={} target={}",
                diagnostic.event_name(),
                warning.extension_id,
                warning.kind,
                warning.target
            ),
            ContributionDiagnostic::EntryLimitExceeded {
                extension_id,
                kind,
                dropped,
            } => warn!(
                "event={} module=registry status=warn extension_id={} kind={} dropped={}",
                diagnostic.event_name(),
                extension_id,
                kind,
                dropped
            ),
        }
    }
}

/// Keeps diagnostics in memory for hosts that surface them later.
#[derive(Debug, Default)]
pub struct CollectingDiagnosticSink {
    reported: Mutex<Vec<ContributionDiagnostic>>,
}

impl CollectingDiagnosticSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drains collected diagnostics in report order.
    pub fn take(&self) -> Vec<ContributionDiagnostic> {
        let mut reported = self.reported.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *reported)
    }

    pub fn len(&self) -> usize {
        self.reported
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DiagnosticSink for CollectingDiagnosticSink {
    fn report(&self, diagnostic: &ContributionDiagnostic) {
        self.reported
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(diagnostic.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::{
        CollectingDiagnosticSink, ContributionDiagnostic, DiagnosticSink, SchemaValidationError,
        UnknownReferenceWarning,
    };
    use crate::extension::schema::{SchemaViolation, ViolationReason};
    use crate::model::contribution::ContributionKind;

    #[test]
    fn schema_error_names_extension_and_path() {
        let err = SchemaValidationError {
            extension_id: "acme.refactor".to_string(),
            violation: SchemaViolation {
                kind: Some(ContributionKind::Refactoring),
                index: Some(3),
                field: Some("command"),
                reason: ViolationReason::MissingField,
            },
        };
        assert_eq!(
            err.to_string(),
            "invalid documentation contribution from `acme.refactor`: refactoring[3].command: required field is missing"
        );
    }

    #[test]
    fn collecting_sink_drains_in_report_order() {
        let sink = CollectingDiagnosticSink::new();
        for target in ["a", "b"] {
            sink.report(&ContributionDiagnostic::UnknownReference(
                UnknownReferenceWarning {
                    extension_id: "acme.views".to_string(),
                    kind: ContributionKind::View,
                    target: target.to_string(),
                },
            ));
        }
        assert_eq!(sink.len(), 2);

        let drained = sink.take();
        assert!(sink.is_empty());
        assert_eq!(drained[0].to_string(), "`acme.views` documents unknown view `a`");
        assert_eq!(drained[1].extension_id(), "acme.views");
    }
}
