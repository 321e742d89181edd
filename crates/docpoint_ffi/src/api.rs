//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose registration and resolution of contributed documentation to Dart
//!   via FRB.
//! - Keep error semantics simple: envelopes and empty lists, never panics.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - One process-wide runtime backs every call.
//! - Resolution calls never fail; bad input degrades to "no documentation".

use docpoint_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    DocumentationRuntime, FallbackLocalizer, PipelineConfig, WhenContext,
};
use log::warn;
use serde_json::Value;
use std::sync::OnceLock;

static RUNTIME: OnceLock<DocumentationRuntime> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir`.
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Refactoring documentation item for presentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefactoringDocItem {
    pub title: String,
    /// Command to execute when the item is picked.
    pub command: String,
}

/// View documentation item for presentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewDocItem {
    /// Authored documentation body, unrendered.
    pub contents: String,
}

/// Envelope for registration calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentationActionResponse {
    pub ok: bool,
    /// Entries registered (or removed, for unregister).
    pub entry_count: u32,
    /// Elements dropped by schema validation or entry caps.
    pub rejected_count: u32,
    /// Human-readable message for diagnostics.
    pub message: String,
}

impl DocumentationActionResponse {
    fn success(message: impl Into<String>, entry_count: usize, rejected_count: usize) -> Self {
        Self {
            ok: true,
            entry_count: saturating_u32(entry_count),
            rejected_count: saturating_u32(rejected_count),
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            entry_count: 0,
            rejected_count: 0,
            message: message.into(),
        }
    }
}

/// Registers an extension's `documentation` contribution block.
///
/// # FFI contract
/// - `contribution_json` is the JSON block (`{"refactoring": [...], "view": [...]}`).
/// - Replaces any earlier registration of the same extension.
/// - Malformed elements are dropped and counted, not fatal.
#[flutter_rust_bridge::frb(sync)]
pub fn register_documentation(
    extension_id: String,
    contribution_json: String,
) -> DocumentationActionResponse {
    let raw = match serde_json::from_str::<Value>(&contribution_json) {
        Ok(raw) => raw,
        Err(err) => {
            return DocumentationActionResponse::failure(format!(
                "register_documentation failed: contribution is not JSON: {err}"
            ));
        }
    };
    match runtime().accept_contribution(&extension_id, &raw) {
        Ok(report) => {
            let entries = report.receipt.refactoring_count + report.receipt.view_count;
            let rejected = report.rejected + report.truncated;
            DocumentationActionResponse::success(
                format!("Registered {entries} entries, rejected {rejected}."),
                entries,
                rejected,
            )
        }
        Err(err) => DocumentationActionResponse::failure(format!(
            "register_documentation failed: {err}"
        )),
    }
}

/// Removes every documentation entry of one extension.
#[flutter_rust_bridge::frb(sync)]
pub fn unregister_documentation(extension_id: String) -> DocumentationActionResponse {
    let removed = runtime().deactivate(&extension_id);
    DocumentationActionResponse::success(format!("Removed {removed} entries."), removed, 0)
}

/// Resolves refactoring documentation for one command id.
///
/// # FFI contract
/// - `context_json` is a JSON object of context keys; invalid input is
///   treated as an empty context.
/// - Returns an empty list when nothing matches.
#[flutter_rust_bridge::frb(sync)]
pub fn resolve_refactoring_documentation(
    command_id: String,
    context_json: String,
) -> Vec<RefactoringDocItem> {
    let context = parse_context(&context_json);
    runtime()
        .resolve_refactoring(&command_id, &context)
        .into_iter()
        .map(|resolved| RefactoringDocItem {
            title: resolved.title,
            command: resolved.command,
        })
        .collect()
}

/// Resolves view documentation for one view id.
#[flutter_rust_bridge::frb(sync)]
pub fn resolve_view_documentation(view_id: String, context_json: String) -> Vec<ViewDocItem> {
    let context = parse_context(&context_json);
    runtime()
        .resolve_view(&view_id, &context)
        .into_iter()
        .map(|resolved| ViewDocItem {
            contents: resolved.contents,
        })
        .collect()
}

/// JSON schema of the documentation point with source-language descriptions.
#[flutter_rust_bridge::frb(sync)]
pub fn documentation_schema_json() -> String {
    runtime()
        .point()
        .json_schema(&FallbackLocalizer)
        .to_string()
}

fn runtime() -> &'static DocumentationRuntime {
    RUNTIME.get_or_init(|| {
        let config = PipelineConfig::default()
            .with_env_overrides()
            .unwrap_or_else(|err| {
                warn!("event=config_fallback module=ffi status=warn reason={err}");
                PipelineConfig::default()
            });
        DocumentationRuntime::start(config)
    })
}

fn parse_context(raw: &str) -> WhenContext {
    if raw.trim().is_empty() {
        return WhenContext::new();
    }
    match serde_json::from_str::<Value>(raw)
        .ok()
        .and_then(WhenContext::from_json)
    {
        Some(context) => context,
        None => {
            warn!("event=context_rejected module=ffi status=warn bytes={}", raw.len());
            WhenContext::new()
        }
    }
}

fn saturating_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::{
        core_version, documentation_schema_json, init_logging, parse_context, ping,
        register_documentation, resolve_refactoring_documentation, resolve_view_documentation,
        unregister_documentation,
    };
    use std::time::{SystemTime, UNIX_EPOCH};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        let error = init_logging("info".to_string(), String::new());
        assert!(!error.is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "tmp/logs".to_string());
        assert!(!error.is_empty());
    }

    #[test]
    fn registers_and_resolves_refactoring_documentation() {
        let command = unique_token("refactor.extract");
        let contribution = serde_json::json!({"refactoring": [
            {"title": "Extract Function", "when": "editorHasSelection", "command": command},
            {"title": "Broken"}
        ]})
        .to_string();

        let response = register_documentation(unique_token("acme.ffi"), contribution);
        assert!(response.ok, "{}", response.message);
        assert_eq!(response.entry_count, 1);
        assert_eq!(response.rejected_count, 1);

        let visible = resolve_refactoring_documentation(
            command.clone(),
            r#"{"editorHasSelection": true}"#.to_string(),
        );
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].title, "Extract Function");

        let hidden = resolve_refactoring_documentation(command, "{}".to_string());
        assert!(hidden.is_empty());
    }

    #[test]
    fn unregister_removes_view_documentation() {
        let extension_id = unique_token("acme.views");
        let view = unique_token("outline");
        let contribution =
            serde_json::json!({"view": [{"view": view, "contents": "Symbols."}]}).to_string();
        assert!(register_documentation(extension_id.clone(), contribution).ok);
        assert_eq!(
            resolve_view_documentation(view.clone(), String::new()).len(),
            1
        );

        let removed = unregister_documentation(extension_id);
        assert_eq!(removed.entry_count, 1);
        assert!(resolve_view_documentation(view, String::new()).is_empty());
    }

    #[test]
    fn rejects_non_json_contribution_and_blank_extension_id() {
        let response = register_documentation(unique_token("acme.bad"), "{".to_string());
        assert!(!response.ok);

        let response = register_documentation("  ".to_string(), "{}".to_string());
        assert!(!response.ok);
        assert!(response.message.contains("extension id"));
    }

    #[test]
    fn invalid_context_is_treated_as_empty() {
        assert!(parse_context("not json").is_empty());
        assert!(parse_context("[1]").is_empty());
        assert_eq!(parse_context(r#"{"a": 1}"#).len(), 1);
    }

    #[test]
    fn schema_json_names_both_kinds() {
        let schema: serde_json::Value =
            serde_json::from_str(&documentation_schema_json()).expect("schema is JSON");
        assert!(schema["properties"]["refactoring"].is_object());
        assert!(schema["properties"]["view"].is_object());
    }

    fn unique_token(prefix: &str) -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time went backwards")
            .as_nanos();
        format!("{prefix}-{nanos}")
    }
}
