//! Extension point binding consumed by the host loader.
//!
//! # Responsibility
//! - Describe the `documentation` point: name, processing dependencies and
//!   validation schema.
//! - Render the machine schema as a JSON schema with localized descriptions.
//! - Order point processing by declared dependencies.
//!
//! # Invariants
//! - The descriptor holds no state and performs no registration itself.
//! - Processing order is deterministic for a given declaration order.

use crate::extension::localize::{describe, Localizer};
use crate::extension::schema::{
    validate_block, BlockValidation, DocumentationSchema, ItemSchema, DOCUMENTATION_SCHEMA,
};
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Name of the documentation extension point.
pub const DOCUMENTATION_POINT_NAME: &str = "documentation";
/// Point that registers language and command identifiers.
pub const LANGUAGES_POINT_NAME: &str = "languages";

/// Static extension point descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtensionPointDescriptor {
    pub name: &'static str,
    /// Points the host must finish processing before this one.
    pub dependencies: &'static [&'static str],
    pub schema: &'static DocumentationSchema,
}

/// Descriptor of the `documentation` point.
pub static DOCUMENTATION_POINT: ExtensionPointDescriptor = ExtensionPointDescriptor {
    name: DOCUMENTATION_POINT_NAME,
    dependencies: &[LANGUAGES_POINT_NAME],
    schema: &DOCUMENTATION_SCHEMA,
};

impl ExtensionPointDescriptor {
    /// Validates one raw contribution against this point's schema.
    pub fn validate(&self, raw: &Value) -> BlockValidation {
        validate_block(raw)
    }

    /// Name and dependency edges used for processing order.
    pub fn declaration(&self) -> PointDeclaration<'static> {
        PointDeclaration {
            name: self.name,
            dependencies: self.dependencies,
        }
    }

    /// JSON schema of the point, descriptions resolved through `localizer`.
    pub fn json_schema(&self, localizer: &dyn Localizer) -> Value {
        let mut properties = Map::new();
        for item in self.schema.items {
            properties.insert(
                item.kind.property().to_string(),
                json!({
                    "type": "array",
                    "description": describe(localizer, item.array_description_key),
                    "items": item_json_schema(item, localizer),
                }),
            );
        }
        json!({
            "type": "object",
            "description": describe(localizer, self.schema.description_key),
            "properties": properties,
        })
    }
}

fn item_json_schema(item: &ItemSchema, localizer: &dyn Localizer) -> Value {
    let mut properties = Map::new();
    for field in item.fields {
        properties.insert(
            field.name.to_string(),
            json!({
                "type": "string",
                "description": describe(localizer, field.description_key),
            }),
        );
    }
    json!({
        "type": "object",
        "description": describe(localizer, item.item_description_key),
        "required": item.required_fields().collect::<Vec<_>>(),
        "properties": properties,
    })
}

/// Name plus dependency edges of one extension point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointDeclaration<'a> {
    pub name: &'a str,
    pub dependencies: &'a [&'a str],
}

/// Orders points so every point follows its dependencies.
///
/// Ties keep declaration order.
pub fn order_points<'a>(
    points: &[PointDeclaration<'a>],
) -> Result<Vec<&'a str>, PointOrderError> {
    let mut positions = BTreeMap::new();
    for (position, point) in points.iter().enumerate() {
        if positions.insert(point.name, position).is_some() {
            return Err(PointOrderError::DuplicatePoint(point.name.to_string()));
        }
    }
    for point in points {
        for dependency in point.dependencies {
            if !positions.contains_key(dependency) {
                return Err(PointOrderError::UnknownDependency {
                    point: point.name.to_string(),
                    dependency: dependency.to_string(),
                });
            }
        }
    }

    let mut ordered = Vec::with_capacity(points.len());
    let mut done = BTreeSet::new();
    while ordered.len() < points.len() {
        let next = points.iter().find(|point| {
            !done.contains(point.name)
                && point
                    .dependencies
                    .iter()
                    .all(|dependency| done.contains(dependency))
        });
        let Some(point) = next else {
            let mut pending = points
                .iter()
                .filter(|point| !done.contains(point.name))
                .map(|point| point.name.to_string())
                .collect::<Vec<_>>();
            pending.sort();
            return Err(PointOrderError::DependencyCycle(pending));
        };
        done.insert(point.name);
        ordered.push(point.name);
    }
    Ok(ordered)
}

/// Point ordering errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PointOrderError {
    DuplicatePoint(String),
    UnknownDependency { point: String, dependency: String },
    DependencyCycle(Vec<String>),
}

impl Display for PointOrderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicatePoint(name) => write!(f, "extension point declared twice: {name}"),
            Self::UnknownDependency { point, dependency } => write!(
                f,
                "extension point `{point}` depends on unknown point `{dependency}`"
            ),
            Self::DependencyCycle(points) => write!(
                f,
                "extension point dependency cycle among: {}",
                points.join(", ")
            ),
        }
    }
}

impl Error for PointOrderError {}
