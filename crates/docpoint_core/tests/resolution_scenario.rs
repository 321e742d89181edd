use docpoint_core::{
    CollectingDiagnosticSink, ContextKeyEvaluator, ContributionDiagnostic, DocumentationRuntime,
    ExtensionManifest, PipelineConfig, ResolvedRefactoring, ResolvedView, WhenContext,
};
use serde_json::json;
use std::sync::Arc;

fn runtime() -> (DocumentationRuntime, Arc<CollectingDiagnosticSink>) {
    let sink = Arc::new(CollectingDiagnosticSink::new());
    let runtime = DocumentationRuntime::with_parts(
        PipelineConfig::default(),
        ContextKeyEvaluator,
        sink.clone(),
    );
    (runtime, sink)
}

fn register_scenario(runtime: &DocumentationRuntime) {
    runtime
        .accept_contribution(
            "acme.a",
            &json!({"refactoring": [{
                "title": "Extract Function",
                "when": "editorHasSelection",
                "command": "refactor.extractFunction"
            }]}),
        )
        .expect("extension A accepted");
    runtime
        .accept_contribution(
            "acme.b",
            &json!({"view": [{
                "view": "outline",
                "contents": "Shows symbol hierarchy.",
                "when": ""
            }]}),
        )
        .expect("extension B accepted");
}

#[test]
fn refactoring_and_view_documentation_resolve_against_context() {
    let (runtime, sink) = runtime();
    register_scenario(&runtime);

    let selected = WhenContext::new().with("editorHasSelection", true);
    assert_eq!(
        runtime.resolve_refactoring("refactor.extractFunction", &selected),
        vec![ResolvedRefactoring {
            title: "Extract Function".to_string(),
            command: "refactor.extractFunction".to_string(),
        }]
    );

    let unselected = WhenContext::new().with("editorHasSelection", false);
    assert!(runtime
        .resolve_refactoring("refactor.extractFunction", &unselected)
        .is_empty());

    assert_eq!(
        runtime.resolve_view("outline", &WhenContext::new()),
        vec![ResolvedView {
            contents: "Shows symbol hierarchy.".to_string(),
        }]
    );
    assert!(sink.is_empty());
}

#[test]
fn resolution_is_stable_across_repeated_queries() {
    let (runtime, _sink) = runtime();
    register_scenario(&runtime);
    runtime
        .accept_contribution(
            "acme.c",
            &json!({"refactoring": [
                {"title": "Extract Function (C)", "when": "true", "command": "refactor.extractFunction"}
            ]}),
        )
        .expect("extension C accepted");

    let context = WhenContext::new().with("editorHasSelection", true);
    let first = runtime.resolve_refactoring("refactor.extractFunction", &context);
    assert_eq!(first.len(), 2);
    for _ in 0..10 {
        assert_eq!(
            runtime.resolve_refactoring("refactor.extractFunction", &context),
            first
        );
    }
}

#[test]
fn malformed_entry_never_resolves_while_siblings_do() {
    let (runtime, sink) = runtime();
    let report = runtime
        .accept_contribution(
            "acme.partial",
            &json!({"refactoring": [
                {"title": "Missing Command", "when": "true"},
                {"title": "Inline Variable", "when": "true", "command": "refactor.inline"}
            ]}),
        )
        .expect("partial block accepted");
    assert_eq!(report.rejected, 1);

    let context = WhenContext::new();
    let resolved = runtime.resolve_refactoring("refactor.inline", &context);
    assert_eq!(resolved.len(), 1);
    assert_eq!(resolved[0].title, "Inline Variable");
    assert!(runtime
        .registry()
        .snapshot()
        .refactorings()
        .iter()
        .all(|registered| registered.entry.title != "Missing Command"));

    let diagnostics = sink.take();
    assert_eq!(diagnostics.len(), 1);
    match &diagnostics[0] {
        ContributionDiagnostic::SchemaValidation(err) => {
            assert_eq!(err.extension_id, "acme.partial");
            assert_eq!(err.violation.index, Some(0));
            assert_eq!(err.violation.field, Some("command"));
        }
        other => panic!("unexpected diagnostic: {other}"),
    }
}

#[test]
fn unmatched_ids_resolve_to_empty_lists() {
    let (runtime, _sink) = runtime();
    register_scenario(&runtime);
    let context = WhenContext::new().with("editorHasSelection", true);
    assert!(runtime
        .resolve_refactoring("refactor.unknown", &context)
        .is_empty());
    assert!(runtime.resolve_view("explorer", &context).is_empty());
}

#[test]
fn deactivation_hides_extension_documentation() {
    let (runtime, _sink) = runtime();
    register_scenario(&runtime);
    assert_eq!(runtime.deactivate("acme.b"), 1);
    assert!(runtime
        .resolve_view("outline", &WhenContext::new())
        .is_empty());
    assert_eq!(runtime.deactivate("acme.b"), 0);
}

#[test]
fn manifests_feed_the_documentation_point() {
    let (runtime, _sink) = runtime();
    let manifest = ExtensionManifest::from_json_str(
        r#"{
            "id": "acme.typescript-refactors",
            "version": "2.0.0",
            "contributes": {
                "languages": [{"id": "typescript"}],
                "documentation": {
                    "refactoring": [{
                        "title": "Move to new file",
                        "when": "resourceLangId == typescript",
                        "command": "refactor.move"
                    }]
                }
            }
        }"#,
    )
    .expect("manifest parses");
    runtime.accept_manifest(&manifest).expect("manifest accepted");

    let typescript = WhenContext::new().with("resourceLangId", "typescript");
    let rust = WhenContext::new().with("resourceLangId", "rust");
    assert_eq!(runtime.resolve_refactoring("refactor.move", &typescript).len(), 1);
    assert!(runtime.resolve_refactoring("refactor.move", &rust).is_empty());
}
