//! Process-wide contribution registry.
//!
//! # Responsibility
//! - Aggregate accepted documentation entries from every active extension.
//! - Serve consistent snapshots to resolution queries.
//!
//! # Invariants
//! - Mutation is bulk add / bulk remove scoped by owning extension.
//! - Readers observe a whole snapshot, never a partially applied mutation.
//! - Entries are ordered by sequence number; one extension's entries keep
//!   their declared order.

use crate::model::contribution::{
    ContributionKind, DocumentationBlock, DocumentationEntry, RefactoringDocumentation,
    RegisteredContribution, RegisteredEntry, ViewDocumentation,
};
use log::{debug, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, PoisonError, RwLock};

/// Immutable view of the registry at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrySnapshot {
    refactoring: Vec<RegisteredEntry<RefactoringDocumentation>>,
    view: Vec<RegisteredEntry<ViewDocumentation>>,
    activation_order: Vec<String>,
}

impl RegistrySnapshot {
    pub fn refactorings(&self) -> &[RegisteredEntry<RefactoringDocumentation>] {
        &self.refactoring
    }

    pub fn views(&self) -> &[RegisteredEntry<ViewDocumentation>] {
        &self.view
    }

    /// Full ordered sequence for one kind.
    pub fn all(&self, kind: ContributionKind) -> Vec<RegisteredContribution> {
        match kind {
            ContributionKind::Refactoring => self
                .refactoring
                .iter()
                .cloned()
                .map(RegisteredContribution::Refactoring)
                .collect(),
            ContributionKind::View => self
                .view
                .iter()
                .cloned()
                .map(RegisteredContribution::View)
                .collect(),
        }
    }

    /// Entries owned by one extension, refactorings first.
    pub fn entries_for(&self, extension_id: &str) -> Vec<RegisteredContribution> {
        ContributionKind::ALL
            .into_iter()
            .flat_map(|kind| self.all(kind))
            .filter(|entry| entry.extension_id() == extension_id)
            .collect()
    }

    /// Extensions with registered entries, in activation order.
    pub fn extension_ids(&self) -> &[String] {
        &self.activation_order
    }

    pub fn len(&self) -> usize {
        self.refactoring.len() + self.view.len()
    }

    pub fn is_empty(&self) -> bool {
        self.refactoring.is_empty() && self.view.is_empty()
    }

    fn remove_owner(&mut self, extension_id: &str) -> usize {
        let before = self.len();
        self.refactoring
            .retain(|registered| registered.extension_id != extension_id);
        self.view
            .retain(|registered| registered.extension_id != extension_id);
        self.activation_order.retain(|id| id != extension_id);
        before - self.len()
    }
}

/// Outcome of one `register` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationReceipt {
    pub extension_id: String,
    pub refactoring_count: usize,
    pub view_count: usize,
    /// Entries removed by the implicit unregister of a previous registration.
    pub replaced: usize,
}

#[derive(Debug, Default)]
struct RegistryState {
    snapshot: Arc<RegistrySnapshot>,
    next_sequence: u64,
}

/// Copy-on-write registry shared between the activation owner and readers.
///
/// Writers hold the lock for the whole mutation; readers only clone the
/// current `Arc` and query it lock-free.
#[derive(Debug, Default)]
pub struct ContributionRegistry {
    state: RwLock<RegistryState>,
}

impl ContributionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers every entry of `block` under `extension_id`.
    ///
    /// Replaces any earlier registration of the same extension. Entries get
    /// fresh sequence numbers, so a reloaded extension orders after the
    /// extensions activated before its reload.
    ///
    /// Registering the same block twice leaves the same owners, entries and
    /// relative order as registering it once. Sequence numbers differ, so
    /// compare snapshots by owner and order, not by sequence.
    ///
    /// # Errors
    /// - Returns an error when `extension_id` is blank.
    pub fn register(
        &self,
        extension_id: &str,
        block: DocumentationBlock,
    ) -> Result<RegistrationReceipt, ContributionError> {
        let extension_id = normalize_extension_id(extension_id)?;
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let RegistryState {
            snapshot,
            next_sequence,
        } = &mut *state;
        let snapshot = Arc::make_mut(snapshot);

        let replaced = snapshot.remove_owner(&extension_id);
        let receipt = RegistrationReceipt {
            extension_id: extension_id.clone(),
            refactoring_count: block.refactoring.len(),
            view_count: block.view.len(),
            replaced,
        };
        if !block.is_empty() {
            snapshot.activation_order.push(extension_id.clone());
        }
        for entry in block.refactoring {
            snapshot
                .refactoring
                .push(wrap(&extension_id, next_sequence, entry));
        }
        for entry in block.view {
            snapshot.view.push(wrap(&extension_id, next_sequence, entry));
        }

        info!(
            "event=contribution_registered module=registry status=ok extension_id={} refactoring={} view={} replaced={}",
            receipt.extension_id, receipt.refactoring_count, receipt.view_count, receipt.replaced
        );
        Ok(receipt)
    }

    /// Removes every entry owned by `extension_id`. Returns the number removed.
    pub fn unregister(&self, extension_id: &str) -> usize {
        let extension_id = extension_id.trim();
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if !state
            .snapshot
            .activation_order
            .iter()
            .any(|id| id == extension_id)
        {
            debug!(
                "event=contribution_unregistered module=registry status=ok extension_id={} removed=0",
                extension_id
            );
            return 0;
        }
        let removed = Arc::make_mut(&mut state.snapshot).remove_owner(extension_id);
        info!(
            "event=contribution_unregistered module=registry status=ok extension_id={} removed={}",
            extension_id, removed
        );
        removed
    }

    /// Drops every registration. Used at host shutdown.
    pub fn clear(&self) -> usize {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let removed = state.snapshot.len();
        state.snapshot = Arc::new(RegistrySnapshot::default());
        removed
    }

    /// Current snapshot; stays valid and unchanged while the caller holds it.
    pub fn snapshot(&self) -> Arc<RegistrySnapshot> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .snapshot
            .clone()
    }

    /// Full ordered sequence for one kind.
    pub fn all(&self, kind: ContributionKind) -> Vec<RegisteredContribution> {
        self.snapshot().all(kind)
    }

    pub fn entries_for(&self, extension_id: &str) -> Vec<RegisteredContribution> {
        self.snapshot().entries_for(extension_id.trim())
    }

    pub fn extension_ids(&self) -> Vec<String> {
        self.snapshot().extension_ids().to_vec()
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }
}

fn wrap<T: DocumentationEntry>(
    extension_id: &str,
    next_sequence: &mut u64,
    entry: T,
) -> RegisteredEntry<T> {
    let sequence = *next_sequence;
    *next_sequence += 1;
    RegisteredEntry {
        extension_id: extension_id.to_string(),
        sequence,
        entry,
    }
}

pub(crate) fn normalize_extension_id(value: &str) -> Result<String, ContributionError> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.chars().any(char::is_whitespace) {
        return Err(ContributionError::InvalidExtensionId(value.to_string()));
    }
    Ok(trimmed.to_string())
}

/// Registration-level errors. Schema problems are diagnostics, not errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContributionError {
    InvalidExtensionId(String),
    InvalidManifest(crate::extension::manifest::ManifestValidationError),
}

impl Display for ContributionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidExtensionId(value) => write!(f, "extension id is invalid: `{value}`"),
            Self::InvalidManifest(err) => write!(f, "invalid extension manifest: {err}"),
        }
    }
}

impl Error for ContributionError {}

#[cfg(test)]
mod tests {
    use super::{ContributionError, ContributionRegistry};
    use crate::model::contribution::{
        ContributionKind, DocumentationBlock, RefactoringDocumentation, ViewDocumentation,
    };

    fn refactoring(title: &str, command: &str) -> RefactoringDocumentation {
        RefactoringDocumentation {
            title: title.to_string(),
            when: "true".to_string(),
            command: command.to_string(),
        }
    }

    fn block(titles: &[&str]) -> DocumentationBlock {
        DocumentationBlock {
            refactoring: titles
                .iter()
                .map(|title| refactoring(title, "refactor.extract"))
                .collect(),
            view: vec![ViewDocumentation {
                view: "outline".to_string(),
                contents: "docs".to_string(),
                when: None,
            }],
        }
    }

    #[test]
    fn assigns_increasing_sequence_numbers() {
        let registry = ContributionRegistry::new();
        registry
            .register("acme.a", block(&["one", "two"]))
            .expect("register a");
        registry
            .register("acme.b", block(&["three"]))
            .expect("register b");

        let sequences = registry
            .all(ContributionKind::Refactoring)
            .iter()
            .map(|entry| entry.sequence())
            .collect::<Vec<_>>();
        assert!(sequences.windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(registry.extension_ids(), vec!["acme.a", "acme.b"]);
    }

    #[test]
    fn snapshot_is_unaffected_by_later_mutation() {
        let registry = ContributionRegistry::new();
        registry
            .register("acme.a", block(&["one"]))
            .expect("register a");
        let before = registry.snapshot();

        registry.unregister("acme.a");
        assert_eq!(before.len(), 2);
        assert!(registry.is_empty());
    }

    #[test]
    fn unregister_unknown_extension_is_noop() {
        let registry = ContributionRegistry::new();
        assert_eq!(registry.unregister("acme.missing"), 0);
        registry
            .register("acme.a", block(&["one"]))
            .expect("register a");
        assert_eq!(registry.unregister("acme.missing"), 0);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn reregistration_reports_replaced_entries() {
        let registry = ContributionRegistry::new();
        registry
            .register("acme.a", block(&["one", "two"]))
            .expect("first registration");
        let receipt = registry
            .register("acme.a", block(&["one"]))
            .expect("second registration");
        assert_eq!(receipt.replaced, 3);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn empty_block_registers_nothing() {
        let registry = ContributionRegistry::new();
        let receipt = registry
            .register("acme.empty", DocumentationBlock::default())
            .expect("empty block is accepted");
        assert_eq!(receipt.refactoring_count + receipt.view_count, 0);
        assert!(registry.is_empty());
        assert!(registry.extension_ids().is_empty());
    }

    #[test]
    fn rejects_blank_extension_id() {
        let registry = ContributionRegistry::new();
        let err = registry
            .register("   ", block(&["one"]))
            .expect_err("blank id must fail");
        assert!(matches!(err, ContributionError::InvalidExtensionId(_)));
    }

    #[test]
    fn entries_for_returns_owned_entries_only() {
        let registry = ContributionRegistry::new();
        registry
            .register("acme.a", block(&["one"]))
            .expect("register a");
        registry
            .register("acme.b", block(&["two", "three"]))
            .expect("register b");

        let owned = registry.entries_for("acme.b");
        assert_eq!(owned.len(), 3);
        assert!(owned.iter().all(|entry| entry.extension_id() == "acme.b"));
        assert_eq!(owned[0].kind(), ContributionKind::Refactoring);
        assert_eq!(owned[2].kind(), ContributionKind::View);
    }

    #[test]
    fn clear_drops_all_entries() {
        let registry = ContributionRegistry::new();
        registry
            .register("acme.a", block(&["one"]))
            .expect("register a");
        assert_eq!(registry.clear(), 2);
        assert!(registry.is_empty());
    }
}
