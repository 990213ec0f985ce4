//! Translation manager: frontend selection, parallel parse, merge,
//! failure tolerance

use cpg_core::graph::NodeKind;
use cpg_core::{TranslationConfig, TranslationManager};
use std::fs;
use std::path::PathBuf;

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("cpg-{}-{}", name, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).expect("failed to create scratch dir");
    dir
}

#[test]
fn test_build_merges_units_across_languages() {
    let dir = scratch_dir("multi");
    let cpp = dir.join("lib.cpp");
    let go = dir.join("tool.go");
    fs::write(&cpp, "int shared() { return 1; }\n").unwrap();
    fs::write(&go, "package main\n\nfunc run() int {\n\treturn 2\n}\n").unwrap();

    let config = TranslationConfig::new()
        .source_files(vec![cpp, go])
        .top_level(dir.clone());
    let result = TranslationManager::new(config).analyze().expect("build failed");

    assert_eq!(result.units.len(), 2);
    assert!(result.failures.is_empty());

    let mut names = Vec::new();
    for &unit in &result.units {
        for f in result
            .graph
            .query()
            .declarations_by_name(unit, "shared", &[NodeKind::Function])
        {
            names.push(result.graph.node(f).unwrap().name().to_string());
        }
        for f in result
            .graph
            .query()
            .declarations_by_name(unit, "run", &[NodeKind::Function])
        {
            names.push(result.graph.node(f).unwrap().name().to_string());
        }
    }
    assert_eq!(names.len(), 2);
}

#[test]
fn test_unknown_extension_is_skipped() {
    let dir = scratch_dir("skip");
    let good = dir.join("main.cpp");
    let bad = dir.join("data.xyz");
    fs::write(&good, "int main() { return 0; }\n").unwrap();
    fs::write(&bad, "not source code").unwrap();

    let config = TranslationConfig::new().source_files(vec![good, bad.clone()]);
    let result = TranslationManager::new(config).analyze().expect("build failed");

    assert_eq!(result.units.len(), 1);
    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].0, bad);
}

#[test]
fn test_strict_mode_aborts_on_failure() {
    let dir = scratch_dir("strict");
    let good = dir.join("main.cpp");
    let bad = dir.join("data.xyz");
    fs::write(&good, "int main() { return 0; }\n").unwrap();
    fs::write(&bad, "whatever").unwrap();

    let config = TranslationConfig::new()
        .source_files(vec![good, bad])
        .fail_fast(true);
    assert!(TranslationManager::new(config).analyze().is_err());
}

#[test]
fn test_build_fails_with_no_units() {
    let config = TranslationConfig::new().source_files(vec![PathBuf::from("/missing/nope.xyz")]);
    assert!(TranslationManager::new(config).analyze().is_err());
}

#[test]
fn test_missing_file_is_recorded() {
    let dir = scratch_dir("missing");
    let good = dir.join("ok.cpp");
    fs::write(&good, "int f() { return 1; }\n").unwrap();
    let gone = dir.join("gone.cpp");

    let config = TranslationConfig::new().source_files(vec![good, gone.clone()]);
    let result = TranslationManager::new(config).analyze().expect("build failed");
    assert_eq!(result.units.len(), 1);
    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].0, gone);
}

#[test]
fn test_cross_unit_calls_resolve_after_merge() {
    let dir = scratch_dir("xunit");
    let lib = dir.join("lib.cpp");
    let app = dir.join("app.cpp");
    fs::write(&lib, "int helper() { return 7; }\n").unwrap();
    fs::write(&app, "int helper();\nint main() { return helper(); }\n").unwrap();

    let config = TranslationConfig::new().source_files(vec![lib.clone(), app]);
    let result = TranslationManager::new(config).analyze().expect("build failed");

    let graph = &result.graph;
    let call = result
        .units
        .iter()
        .flat_map(|&u| graph.query().subtree(u))
        .find(|&n| {
            graph.node(n).map(|m| m.kind()) == Some(NodeKind::CallExpression)
                && graph.node(n).unwrap().name() == "helper"
        })
        .expect("call not found");
    let targets = graph.query().invokes(call);
    assert!(
        !targets.is_empty(),
        "the call must resolve to at least one helper declaration"
    );
    for t in targets {
        assert_eq!(graph.node(t).unwrap().kind(), NodeKind::Function);
    }
}

#[test]
fn test_discovery_finds_sources() {
    let dir = scratch_dir("discover");
    fs::write(dir.join("a.cpp"), "int a;\n").unwrap();
    fs::write(dir.join("b.go"), "package b\n").unwrap();
    fs::write(dir.join("notes.txt"), "skip me\n").unwrap();

    let files = cpg_core::discover_source_files(&dir, &[".cpp", ".go"]).expect("discovery failed");
    assert_eq!(files.len(), 2);
}
