//! Machine-checkable schema and validator for documentation contributions.
//!
//! # Responsibility
//! - Declare the accepted shape of a contribution block per kind.
//! - Validate raw JSON against that shape, collecting every violation.
//!
//! # Invariants
//! - Validation is pure and never short-circuits within a block.
//! - Unknown element fields are ignored.
//! - Description strings are message ids only; display text is resolved
//!   through the localization boundary.

use crate::model::contribution::{
    fields, ContributionKind, DocumentationBlock, RefactoringDocumentation, ViewDocumentation,
};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Declared shape of one element field. All documentation fields are strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSchema {
    pub name: &'static str,
    pub required: bool,
    /// Reject strings that are empty after trimming.
    pub non_empty: bool,
    pub description_key: &'static str,
}

/// Declared shape of one kind's array and its elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemSchema {
    pub kind: ContributionKind,
    pub array_description_key: &'static str,
    pub item_description_key: &'static str,
    pub fields: &'static [FieldSchema],
}

impl ItemSchema {
    pub fn required_fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields
            .iter()
            .filter(|field| field.required)
            .map(|field| field.name)
    }
}

/// Declared shape of a whole contribution block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentationSchema {
    pub description_key: &'static str,
    pub items: &'static [ItemSchema],
}

impl DocumentationSchema {
    pub fn item(&self, kind: ContributionKind) -> Option<&ItemSchema> {
        self.items.iter().find(|item| item.kind == kind)
    }
}

const REFACTORING_FIELDS: &[FieldSchema] = &[
    FieldSchema {
        name: fields::TITLE,
        required: true,
        non_empty: true,
        description_key: "contributes.documentation.refactoring.title",
    },
    FieldSchema {
        name: fields::WHEN,
        required: true,
        non_empty: false,
        description_key: "contributes.documentation.refactoring.when",
    },
    FieldSchema {
        name: fields::COMMAND,
        required: true,
        non_empty: false,
        description_key: "contributes.documentation.refactoring.command",
    },
];

const VIEW_FIELDS: &[FieldSchema] = &[
    FieldSchema {
        name: fields::VIEW,
        required: true,
        non_empty: false,
        description_key: "contributes.documentation.view.view",
    },
    FieldSchema {
        name: fields::CONTENTS,
        required: true,
        non_empty: true,
        description_key: "contributes.documentation.view.contents",
    },
    FieldSchema {
        name: fields::WHEN,
        required: false,
        non_empty: false,
        description_key: "contributes.documentation.view.when",
    },
];

/// Schema of the `documentation` extension point.
pub static DOCUMENTATION_SCHEMA: DocumentationSchema = DocumentationSchema {
    description_key: "contributes.documentation",
    items: &[
        ItemSchema {
            kind: ContributionKind::Refactoring,
            array_description_key: "contributes.documentation.refactorings",
            item_description_key: "contributes.documentation.refactoring",
            fields: REFACTORING_FIELDS,
        },
        ItemSchema {
            kind: ContributionKind::View,
            array_description_key: "contributes.documentation.views",
            item_description_key: "contributes.documentation.view",
            fields: VIEW_FIELDS,
        },
    ],
};

/// Why one part of a raw block was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViolationReason {
    NotAnObject { found: &'static str },
    NotAnArray { found: &'static str },
    MissingField,
    WrongType {
        expected: &'static str,
        found: &'static str,
    },
    EmptyValue,
}

/// One schema violation. `index` and `field` are absent for block-level
/// violations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    pub kind: Option<ContributionKind>,
    pub index: Option<usize>,
    pub field: Option<&'static str>,
    pub reason: ViolationReason,
}

impl SchemaViolation {
    fn block(reason: ViolationReason) -> Self {
        Self {
            kind: None,
            index: None,
            field: None,
            reason,
        }
    }

    fn array(kind: ContributionKind, reason: ViolationReason) -> Self {
        Self {
            kind: Some(kind),
            index: None,
            field: None,
            reason,
        }
    }

    fn element(
        kind: ContributionKind,
        index: usize,
        field: Option<&'static str>,
        reason: ViolationReason,
    ) -> Self {
        Self {
            kind: Some(kind),
            index: Some(index),
            field,
            reason,
        }
    }

    /// Dotted location of the violation, e.g. `refactoring[2].command`.
    pub fn path(&self) -> String {
        let mut path = match self.kind {
            Some(kind) => kind.property().to_string(),
            None => "<block>".to_string(),
        };
        if let Some(index) = self.index {
            path.push_str(&format!("[{index}]"));
        }
        if let Some(field) = self.field {
            path.push('.');
            path.push_str(field);
        }
        path
    }
}

impl Display for SchemaViolation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let path = self.path();
        match &self.reason {
            ViolationReason::NotAnObject { found } => {
                write!(f, "{path}: expected object, found {found}")
            }
            ViolationReason::NotAnArray { found } => {
                write!(f, "{path}: expected array, found {found}")
            }
            ViolationReason::MissingField => write!(f, "{path}: required field is missing"),
            ViolationReason::WrongType { expected, found } => {
                write!(f, "{path}: expected {expected}, found {found}")
            }
            ViolationReason::EmptyValue => write!(f, "{path}: value must not be empty"),
        }
    }
}

impl Error for SchemaViolation {}

/// Entries of one kind that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidatedEntries {
    Refactoring(Vec<RefactoringDocumentation>),
    View(Vec<ViewDocumentation>),
}

impl ValidatedEntries {
    fn empty(kind: ContributionKind) -> Self {
        match kind {
            ContributionKind::Refactoring => Self::Refactoring(Vec::new()),
            ContributionKind::View => Self::View(Vec::new()),
        }
    }

    pub fn kind(&self) -> ContributionKind {
        match self {
            Self::Refactoring(_) => ContributionKind::Refactoring,
            Self::View(_) => ContributionKind::View,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Refactoring(entries) => entries.len(),
            Self::View(entries) => entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Result of validating a whole block with per-element dropping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockValidation {
    /// Elements that passed, in declared order.
    pub block: DocumentationBlock,
    /// Every violation found, in document order.
    pub violations: Vec<SchemaViolation>,
}

impl BlockValidation {
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }

    /// Number of dropped parts: each malformed element once, however many
    /// violations it has, plus each block- or array-level violation.
    pub fn rejected_count(&self) -> usize {
        self.violations
            .iter()
            .map(|violation| (violation.kind, violation.index))
            .collect::<BTreeSet<_>>()
            .len()
    }
}

/// Validates the array contributed for one kind.
///
/// Strict form: any violation rejects the array and every violation is
/// returned.
pub fn validate(
    kind: ContributionKind,
    raw: &Value,
) -> Result<ValidatedEntries, Vec<SchemaViolation>> {
    let mut violations = Vec::new();
    let entries = validate_entries(&DOCUMENTATION_SCHEMA, kind, raw, &mut violations);
    if violations.is_empty() {
        Ok(entries)
    } else {
        Err(violations)
    }
}

/// Validates a raw contribution block, keeping every valid element and
/// reporting the rest.
pub fn validate_block(raw: &Value) -> BlockValidation {
    let mut validation = BlockValidation::default();
    let Some(object) = raw.as_object() else {
        validation
            .violations
            .push(SchemaViolation::block(ViolationReason::NotAnObject {
                found: json_type_name(raw),
            }));
        return validation;
    };

    for kind in ContributionKind::ALL {
        let Some(value) = object.get(kind.property()) else {
            continue;
        };
        match validate_entries(&DOCUMENTATION_SCHEMA, kind, value, &mut validation.violations) {
            ValidatedEntries::Refactoring(entries) => validation.block.refactoring = entries,
            ValidatedEntries::View(entries) => validation.block.view = entries,
        }
    }
    validation
}

fn validate_entries(
    schema: &DocumentationSchema,
    kind: ContributionKind,
    raw: &Value,
    violations: &mut Vec<SchemaViolation>,
) -> ValidatedEntries {
    let mut entries = ValidatedEntries::empty(kind);
    let Some(item) = schema.item(kind) else {
        return entries;
    };
    let Some(elements) = raw.as_array() else {
        violations.push(SchemaViolation::array(
            kind,
            ViolationReason::NotAnArray {
                found: json_type_name(raw),
            },
        ));
        return entries;
    };

    for (index, element) in elements.iter().enumerate() {
        let Some(mut values) = check_element(item, index, element, violations) else {
            continue;
        };
        match &mut entries {
            ValidatedEntries::Refactoring(list) => list.push(RefactoringDocumentation {
                title: values.take(fields::TITLE),
                when: values.take(fields::WHEN),
                command: values.take(fields::COMMAND),
            }),
            ValidatedEntries::View(list) => list.push(ViewDocumentation {
                view: values.take(fields::VIEW),
                contents: values.take(fields::CONTENTS),
                when: values.take_optional(fields::WHEN),
            }),
        }
    }
    entries
}

/// String values of one element that passed its field checks.
struct CheckedFields(BTreeMap<&'static str, String>);

impl CheckedFields {
    // Only called for fields the schema marks required, which are present
    // once checks pass.
    fn take(&mut self, name: &'static str) -> String {
        self.0.remove(name).unwrap_or_default()
    }

    fn take_optional(&mut self, name: &'static str) -> Option<String> {
        self.0.remove(name)
    }
}

fn check_element(
    item: &ItemSchema,
    index: usize,
    element: &Value,
    violations: &mut Vec<SchemaViolation>,
) -> Option<CheckedFields> {
    let Some(object) = element.as_object() else {
        violations.push(SchemaViolation::element(
            item.kind,
            index,
            None,
            ViolationReason::NotAnObject {
                found: json_type_name(element),
            },
        ));
        return None;
    };

    let before = violations.len();
    let mut values = BTreeMap::new();
    for field in item.fields {
        match check_field(object, field) {
            Ok(Some(value)) => {
                values.insert(field.name, value);
            }
            Ok(None) => {}
            Err(reason) => violations.push(SchemaViolation::element(
                item.kind,
                index,
                Some(field.name),
                reason,
            )),
        }
    }

    if violations.len() == before {
        Some(CheckedFields(values))
    } else {
        None
    }
}

fn check_field(
    object: &Map<String, Value>,
    field: &FieldSchema,
) -> Result<Option<String>, ViolationReason> {
    match object.get(field.name) {
        None if field.required => Err(ViolationReason::MissingField),
        None => Ok(None),
        Some(Value::String(value)) => {
            if field.non_empty && value.trim().is_empty() {
                Err(ViolationReason::EmptyValue)
            } else {
                Ok(Some(value.clone()))
            }
        }
        Some(other) => Err(ViolationReason::WrongType {
            expected: "string",
            found: json_type_name(other),
        }),
    }
}

/// JSON type name used in violation messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
