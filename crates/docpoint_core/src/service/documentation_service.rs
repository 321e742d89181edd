//! Resolution queries over registered documentation.
//!
//! # Responsibility
//! - Select entries for one command or view id.
//! - Filter them through the when evaluator against a caller context.
//!
//! # Invariants
//! - Results keep registry order; nothing is re-sorted.
//! - No match yields an empty list, never an error.
//! - An evaluator failure hides only the entry it was evaluating.

use crate::extension::registry::ContributionRegistry;
use crate::model::contribution::{DocumentationEntry, RegisteredEntry};
use crate::when::evaluator::WhenEvaluator;
use log::warn;
use serde::Serialize;
use std::sync::Arc;

/// Refactoring documentation visible for one query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedRefactoring {
    pub title: String,
    /// Command to run when the user picks this documentation action.
    pub command: String,
}

/// View documentation visible for one query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedView {
    pub contents: String,
}

/// Read-side service used by presentation code.
pub struct DocumentationService<E> {
    registry: Arc<ContributionRegistry>,
    evaluator: E,
}

impl<E> DocumentationService<E> {
    pub fn new(registry: Arc<ContributionRegistry>, evaluator: E) -> Self {
        Self {
            registry,
            evaluator,
        }
    }

    pub fn registry(&self) -> &Arc<ContributionRegistry> {
        &self.registry
    }

    /// Refactoring documentation for `command_id` visible in `context`.
    pub fn resolve_refactoring<C>(&self, command_id: &str, context: &C) -> Vec<ResolvedRefactoring>
    where
        C: ?Sized,
        E: WhenEvaluator<C>,
    {
        let snapshot = self.registry.snapshot();
        snapshot
            .refactorings()
            .iter()
            .filter(|registered| self.is_visible(registered, command_id, context))
            .map(|registered| ResolvedRefactoring {
                title: registered.entry.title.clone(),
                command: registered.entry.command.clone(),
            })
            .collect()
    }

    /// View documentation for `view_id` visible in `context`.
    pub fn resolve_view<C>(&self, view_id: &str, context: &C) -> Vec<ResolvedView>
    where
        C: ?Sized,
        E: WhenEvaluator<C>,
    {
        let snapshot = self.registry.snapshot();
        snapshot
            .views()
            .iter()
            .filter(|registered| self.is_visible(registered, view_id, context))
            .map(|registered| ResolvedView {
                contents: registered.entry.contents.clone(),
            })
            .collect()
    }

    fn is_visible<T, C>(&self, registered: &RegisteredEntry<T>, target: &str, context: &C) -> bool
    where
        T: DocumentationEntry,
        C: ?Sized,
        E: WhenEvaluator<C>,
    {
        if registered.entry.target() != target {
            return false;
        }
        let Some(expression) = registered
            .entry
            .when()
            .filter(|expression| !expression.trim().is_empty())
        else {
            return true;
        };
        match self.evaluator.evaluate(expression, context) {
            Ok(visible) => visible,
            Err(err) => {
                warn!(
                    "event=predicate_failed module=resolution status=warn extension_id={} kind={} sequence={} reason={}",
                    registered.extension_id,
                    T::KIND,
                    registered.sequence,
                    err.reason
                );
                false
            }
        }
    }
}
