//! Extension manifest declaration and validation.
//!
//! The host loader owns manifest discovery and file format; this module only
//! reads the already-parsed JSON it hands over.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Declarative extension manifest as delivered by the host loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtensionManifest {
    /// Stable extension identifier, e.g. `acme.refactor-tools`.
    pub id: String,
    /// Manifest semantic version string (`major.minor.patch[-pre]`).
    pub version: String,
    /// Contributions keyed by extension point name.
    #[serde(default)]
    pub contributes: Map<String, Value>,
}

impl ExtensionManifest {
    /// Parses a manifest from JSON text.
    pub fn from_json_str(raw: &str) -> Result<Self, ManifestValidationError> {
        serde_json::from_str(raw).map_err(|err| ManifestValidationError::Malformed(err.to_string()))
    }

    /// Parses a manifest from an already-decoded JSON value.
    pub fn from_value(value: Value) -> Result<Self, ManifestValidationError> {
        serde_json::from_value(value)
            .map_err(|err| ManifestValidationError::Malformed(err.to_string()))
    }

    /// Validates declaration-level manifest invariants.
    pub fn validate(&self) -> Result<(), ManifestValidationError> {
        let id = self.id.trim();
        if id.is_empty() {
            return Err(ManifestValidationError::EmptyId);
        }
        if !is_valid_extension_id(id) {
            return Err(ManifestValidationError::InvalidId(self.id.clone()));
        }

        let version = self.version.trim();
        if version.is_empty() {
            return Err(ManifestValidationError::EmptyVersion);
        }
        if !is_semver(version) {
            return Err(ManifestValidationError::InvalidVersion(
                self.version.clone(),
            ));
        }
        Ok(())
    }

    /// Raw contribution for one extension point, if declared.
    pub fn contribution(&self, point: &str) -> Option<&Value> {
        self.contributes.get(point)
    }

    /// Raw `documentation` contribution block, if declared.
    pub fn documentation_contribution(&self) -> Option<&Value> {
        self.contribution(crate::extension::point::DOCUMENTATION_POINT_NAME)
    }
}

/// Extension ids are `publisher.name`: two or more dot-separated segments of
/// ASCII alphanumerics, `-` or `_`.
fn is_valid_extension_id(value: &str) -> bool {
    let segments: Vec<&str> = value.split('.').collect();
    if segments.len() < 2 {
        return false;
    }
    segments.iter().all(|segment| {
        let mut chars = segment.chars();
        match chars.next() {
            Some(first) if first.is_ascii_alphanumeric() => {}
            _ => return false,
        }
        chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    })
}

fn is_semver(value: &str) -> bool {
    let core = match value.split_once('-') {
        Some((core, pre)) if !pre.is_empty() => core,
        Some(_) => return false,
        None => value,
    };
    let parts: Vec<&str> = core.split('.').collect();
    if parts.len() != 3 {
        return false;
    }
    parts
        .iter()
        .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()))
}

/// Manifest parse and validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestValidationError {
    Malformed(String),
    EmptyId,
    InvalidId(String),
    EmptyVersion,
    InvalidVersion(String),
}

impl Display for ManifestValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed(reason) => write!(f, "manifest is malformed: {reason}"),
            Self::EmptyId => write!(f, "manifest id must not be empty"),
            Self::InvalidId(value) => write!(
                f,
                "manifest id is invalid: {value} (expected publisher.name)"
            ),
            Self::EmptyVersion => write!(f, "manifest version must not be empty"),
            Self::InvalidVersion(value) => write!(
                f,
                "manifest version is invalid: {value} (expected major.minor.patch)"
            ),
        }
    }
}

impl Error for ManifestValidationError {}

#[cfg(test)]
mod tests {
    use super::{ExtensionManifest, ManifestValidationError};
    use serde_json::json;

    fn valid_manifest() -> ExtensionManifest {
        ExtensionManifest::from_value(json!({
            "id": "acme.refactor-tools",
            "version": "1.2.0",
            "contributes": {
                "documentation": {
                    "refactoring": [
                        {"title": "Extract Function", "when": "editorHasSelection", "command": "refactor.extractFunction"}
                    ]
                }
            }
        }))
        .expect("valid manifest json")
    }

    #[test]
    fn validates_baseline_manifest() {
        let manifest = valid_manifest();
        assert!(manifest.validate().is_ok());
        let block = manifest
            .documentation_contribution()
            .expect("documentation contribution");
        assert!(block["refactoring"].is_array());
    }

    #[test]
    fn contributes_defaults_to_empty() {
        let manifest =
            ExtensionManifest::from_json_str(r#"{"id": "acme.bare", "version": "0.1.0"}"#)
                .expect("manifest without contributes");
        assert!(manifest.documentation_contribution().is_none());
    }

    #[test]
    fn accepts_prerelease_versions_and_mixed_case_publishers() {
        let mut manifest = valid_manifest();
        manifest.id = "GitHub.copilot-chat".to_string();
        manifest.version = "0.9.1-insider".to_string();
        assert!(manifest.validate().is_ok());
    }

    #[test]
    fn rejects_invalid_id_format() {
        let mut manifest = valid_manifest();
        manifest.id = "refactor tools".to_string();
        let err = manifest.validate().unwrap_err();
        assert!(matches!(err, ManifestValidationError::InvalidId(_)));

        manifest.id = "nopublisher".to_string();
        let err = manifest.validate().unwrap_err();
        assert!(matches!(err, ManifestValidationError::InvalidId(_)));

        manifest.id = "  ".to_string();
        assert_eq!(manifest.validate().unwrap_err(), ManifestValidationError::EmptyId);
    }

    #[test]
    fn rejects_invalid_version_format() {
        let mut manifest = valid_manifest();
        manifest.version = "v1".to_string();
        let err = manifest.validate().unwrap_err();
        assert!(matches!(err, ManifestValidationError::InvalidVersion(_)));

        manifest.version = "1.0.0-".to_string();
        let err = manifest.validate().unwrap_err();
        assert!(matches!(err, ManifestValidationError::InvalidVersion(_)));
    }

    #[test]
    fn reports_malformed_json() {
        let err = ExtensionManifest::from_json_str("{\"id\": 3}").unwrap_err();
        assert!(matches!(err, ManifestValidationError::Malformed(_)));
    }
}
