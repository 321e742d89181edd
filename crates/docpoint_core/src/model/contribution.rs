//! Documentation contribution model.
//!
//! # Responsibility
//! - Define typed entries for each contribution kind.
//! - Define the registered wrapper that carries owner and ordering metadata.
//!
//! # Invariants
//! - An entry never changes kind after validation.
//! - Registered entries are immutable; the registry only adds or removes them.
//! - `sequence` is unique and strictly increasing across one registry lifetime.

use serde::{Deserialize, Serialize};

/// Field name constants shared by the validator, the typed entries and the
/// generated JSON schema.
pub mod fields {
    /// Label shown for refactoring documentation.
    pub const TITLE: &str = "title";
    /// Visibility predicate.
    pub const WHEN: &str = "when";
    /// Command documented by a refactoring entry.
    pub const COMMAND: &str = "command";
    /// View documented by a view entry.
    pub const VIEW: &str = "view";
    /// Authored documentation body of a view entry.
    pub const CONTENTS: &str = "contents";
}

/// Block property holding refactoring entries.
pub const REFACTORING_PROPERTY: &str = "refactoring";
/// Block property holding view entries.
pub const VIEW_PROPERTY: &str = "view";

/// Contribution category. Each kind has its own required field set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContributionKind {
    Refactoring,
    View,
}

impl ContributionKind {
    /// All kinds in block declaration order.
    pub const ALL: [ContributionKind; 2] = [ContributionKind::Refactoring, ContributionKind::View];

    /// Property name of this kind inside a contribution block.
    pub fn property(self) -> &'static str {
        match self {
            Self::Refactoring => REFACTORING_PROPERTY,
            Self::View => VIEW_PROPERTY,
        }
    }

    /// Field identifying the documented target (command id or view id).
    pub fn target_field(self) -> &'static str {
        match self {
            Self::Refactoring => fields::COMMAND,
            Self::View => fields::VIEW,
        }
    }
}

impl std::fmt::Display for ContributionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.property())
    }
}

/// Shared accessors over typed documentation entries.
pub trait DocumentationEntry {
    const KIND: ContributionKind;

    /// Identifier of the command or view this entry documents.
    fn target(&self) -> &str;

    /// Visibility predicate, `None` when the entry is always visible.
    fn when(&self) -> Option<&str>;
}

/// Documentation attached to a refactoring command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefactoringDocumentation {
    /// Label used in the UI. Never empty.
    pub title: String,
    /// When clause controlling visibility.
    pub when: String,
    /// Command executed when the documentation action is picked. May reference
    /// a command that is not registered yet.
    pub command: String,
}

impl DocumentationEntry for RefactoringDocumentation {
    const KIND: ContributionKind = ContributionKind::Refactoring;

    fn target(&self) -> &str {
        &self.command
    }

    fn when(&self) -> Option<&str> {
        Some(self.when.as_str())
    }
}

/// Documentation attached to a UI view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewDocumentation {
    /// View identifier.
    pub view: String,
    /// Authored documentation body, passed through unchanged. Never empty.
    pub contents: String,
    /// Optional when clause; absent means always visible.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when: Option<String>,
}

impl DocumentationEntry for ViewDocumentation {
    const KIND: ContributionKind = ContributionKind::View;

    fn target(&self) -> &str {
        &self.view
    }

    fn when(&self) -> Option<&str> {
        self.when.as_deref()
    }
}

/// Validated contribution block of one extension.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentationBlock {
    #[serde(default)]
    pub refactoring: Vec<RefactoringDocumentation>,
    #[serde(default)]
    pub view: Vec<ViewDocumentation>,
}

impl DocumentationBlock {
    /// Total number of entries across both kinds.
    pub fn len(&self) -> usize {
        self.refactoring.len() + self.view.len()
    }

    pub fn is_empty(&self) -> bool {
        self.refactoring.is_empty() && self.view.is_empty()
    }

    pub fn count(&self, kind: ContributionKind) -> usize {
        match kind {
            ContributionKind::Refactoring => self.refactoring.len(),
            ContributionKind::View => self.view.len(),
        }
    }
}

/// Entry accepted into the registry, tagged with its owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisteredEntry<T> {
    /// Owning extension id, used for diagnostics and unregistration.
    pub extension_id: String,
    /// Registry-wide insertion sequence; defines resolution order.
    pub sequence: u64,
    pub entry: T,
}

impl<T: DocumentationEntry> RegisteredEntry<T> {
    pub fn kind(&self) -> ContributionKind {
        T::KIND
    }
}

/// Kind-tagged registered entry returned by kind-generic queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RegisteredContribution {
    Refactoring(RegisteredEntry<RefactoringDocumentation>),
    View(RegisteredEntry<ViewDocumentation>),
}

impl RegisteredContribution {
    pub fn kind(&self) -> ContributionKind {
        match self {
            Self::Refactoring(_) => ContributionKind::Refactoring,
            Self::View(_) => ContributionKind::View,
        }
    }

    pub fn extension_id(&self) -> &str {
        match self {
            Self::Refactoring(registered) => &registered.extension_id,
            Self::View(registered) => &registered.extension_id,
        }
    }

    pub fn sequence(&self) -> u64 {
        match self {
            Self::Refactoring(registered) => registered.sequence,
            Self::View(registered) => registered.sequence,
        }
    }

    pub fn target(&self) -> &str {
        match self {
            Self::Refactoring(registered) => registered.entry.target(),
            Self::View(registered) => registered.entry.target(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        ContributionKind, DocumentationBlock, DocumentationEntry, RefactoringDocumentation,
        RegisteredContribution, RegisteredEntry, ViewDocumentation,
    };

    #[test]
    fn view_entry_without_when_is_always_visible() {
        let entry = ViewDocumentation {
            view: "outline".to_string(),
            contents: "Shows symbol hierarchy.".to_string(),
            when: None,
        };
        assert_eq!(entry.when(), None);
        assert_eq!(entry.target(), "outline");
    }

    #[test]
    fn block_counts_entries_per_kind() {
        let block = DocumentationBlock {
            refactoring: vec![RefactoringDocumentation {
                title: "Extract Function".to_string(),
                when: "editorHasSelection".to_string(),
                command: "refactor.extractFunction".to_string(),
            }],
            view: vec![],
        };
        assert_eq!(block.len(), 1);
        assert_eq!(block.count(ContributionKind::Refactoring), 1);
        assert_eq!(block.count(ContributionKind::View), 0);
        assert!(!block.is_empty());
        assert!(DocumentationBlock::default().is_empty());
    }

    #[test]
    fn registered_contribution_serializes_kind_tag() {
        let registered = RegisteredContribution::View(RegisteredEntry {
            extension_id: "acme.outline".to_string(),
            sequence: 7,
            entry: ViewDocumentation {
                view: "outline".to_string(),
                contents: "docs".to_string(),
                when: None,
            },
        });

        let json = serde_json::to_value(&registered).expect("serialize registered entry");
        assert_eq!(json["kind"], "view");
        assert_eq!(json["extension_id"], "acme.outline");
        assert_eq!(json["sequence"], 7);
        assert_eq!(json["entry"]["view"], "outline");
        assert!(json["entry"].get("when").is_none());
        assert_eq!(registered.target(), "outline");
    }
}
