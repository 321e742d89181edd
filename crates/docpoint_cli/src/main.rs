//! CLI smoke entry point.
//!
//! # Responsibility
//! - Load extension manifests given on the command line into one runtime.
//! - Print diagnostics and a deterministic per-extension summary.

use docpoint_core::{
    CollectingDiagnosticSink, ContextKeyEvaluator, DocumentationRuntime, ExtensionManifest,
    PipelineConfig,
};
use std::process::ExitCode;
use std::sync::Arc;

fn main() -> ExitCode {
    println!("docpoint_core ping={}", docpoint_core::ping());
    println!("docpoint_core version={}", docpoint_core::core_version());

    let config = match PipelineConfig::default().with_env_overrides() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("config error: {err}");
            return ExitCode::FAILURE;
        }
    };
    if let Err(err) = docpoint_core::init_logging_from_config(&config) {
        eprintln!("logging error: {err}");
        return ExitCode::FAILURE;
    }

    let sink = Arc::new(CollectingDiagnosticSink::new());
    let runtime = DocumentationRuntime::with_parts(config, ContextKeyEvaluator, sink.clone());
    let mut failed = false;

    for path in std::env::args().skip(1) {
        let manifest = match std::fs::read_to_string(&path)
            .map_err(|err| err.to_string())
            .and_then(|raw| ExtensionManifest::from_json_str(&raw).map_err(|err| err.to_string()))
        {
            Ok(manifest) => manifest,
            Err(err) => {
                eprintln!("{path}: {err}");
                failed = true;
                continue;
            }
        };
        match runtime.accept_manifest(&manifest) {
            Ok(report) => println!(
                "{} refactoring={} view={} rejected={}",
                report.receipt.extension_id,
                report.receipt.refactoring_count,
                report.receipt.view_count,
                report.rejected + report.truncated
            ),
            Err(err) => {
                eprintln!("{path}: {err}");
                failed = true;
            }
        }
    }

    for diagnostic in sink.take() {
        println!("diagnostic: {diagnostic}");
    }
    let snapshot = runtime.registry().snapshot();
    println!(
        "registered extensions={} entries={}",
        snapshot.extension_ids().len(),
        snapshot.len()
    );

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
