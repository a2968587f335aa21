//! Integration tests for the deadbind analysis
//!
//! These tests run the complete pipeline against the sample project fixture.

use deadbind::report::{MarkdownReporter, MethodGroup};
use deadbind::{AnalysisOutcome, Config, Pipeline};
use std::path::PathBuf;

/// Get the path to the sample project fixture
fn sample_project() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/sample_project")
}

fn analyze(config: &Config) -> AnalysisOutcome {
    Pipeline::new(config)
        .analyze_project(&sample_project())
        .expect("sample project should analyze")
}

fn group<'a>(outcome: &'a AnalysisOutcome, qualified_name: &str) -> Option<&'a MethodGroup> {
    outcome
        .report
        .method_groups
        .iter()
        .find(|g| g.qualified_name == qualified_name)
}

fn unused(outcome: &AnalysisOutcome, qualified_name: &str) -> Vec<(String, usize)> {
    group(outcome, qualified_name)
        .map(|g| g.methods.iter().map(|m| (m.name.clone(), m.line)).collect())
        .unwrap_or_default()
}

#[test]
fn test_fixture_is_indexed() {
    let outcome = analyze(&Config::default());
    assert_eq!(outcome.index.class_count(), 12);
    assert!(outcome.report.diagnostics.is_empty(), "{:?}", outcome.report.diagnostics);
}

#[test]
fn test_completely_unused_viewmodel() {
    let outcome = analyze(&Config::default());
    let classes: Vec<_> = outcome
        .report
        .unused_classes
        .iter()
        .map(|c| c.qualified_name.as_str())
        .collect();
    assert_eq!(classes, vec!["com.example.CompletelyUnusedViewModel"]);
    assert!(group(&outcome, "com.example.CompletelyUnusedViewModel").is_none());
}

#[test]
fn test_unused_methods_in_active_viewmodels() {
    let outcome = analyze(&Config::default());

    assert_eq!(
        unused(&outcome, "com.example.UserViewModel"),
        vec![
            ("processInternalData".to_string(), 33),
            ("unusedMethod".to_string(), 38),
            ("toOverride".to_string(), 44),
        ]
    );
    assert_eq!(
        unused(&outcome, "com.example.BaseViewModel"),
        vec![("commonBaseFunction".to_string(), 7), ("toOverride".to_string(), 12)]
    );
    assert_eq!(
        unused(&outcome, "com.example.QuoteTestViewModel"),
        vec![("anUnusedCommand".to_string(), 12)]
    );
    assert_eq!(
        unused(&outcome, "com.example.nested.NestedIncludeViewModel"),
        vec![("unusedNestedMethod".to_string(), 19)]
    );
    assert_eq!(outcome.report.method_groups.len(), 4);
}

#[test]
fn test_lifecycle_and_global_commands_are_never_unused() {
    let outcome = analyze(&Config::default());
    for (class, method) in [
        ("com.example.UserViewModel", "init"),
        ("com.example.OrderViewModel", "refresh"),
        ("com.example.nested.NestedIncludeViewModel", "init"),
    ] {
        assert!(
            !unused(&outcome, class).iter().any(|(name, _)| name == method),
            "{}.{} reported unused",
            class,
            method
        );
    }
}

#[test]
fn test_explicit_command_name_is_honored() {
    let outcome = analyze(&Config::default());
    assert!(unused(&outcome, "com.example.OrderViewModel").is_empty());
}

#[test]
fn test_dynamic_include_suppresses_commands() {
    let outcome = analyze(&Config::default());
    assert!(unused(&outcome, "com.example.DynamicIncludeViewModel").is_empty());
}

#[test]
fn test_included_template_reaches_parent_viewmodel() {
    let outcome = analyze(&Config::default());
    assert!(unused(&outcome, "com.example.ParentViewModel").is_empty());
    assert!(unused(&outcome, "com.example.NestedMainViewModel").is_empty());
    assert!(unused(&outcome, "com.example.NestedDetailViewModel").is_empty());
}

#[test]
fn test_el_and_zscript_references() {
    let outcome = analyze(&Config::default());
    assert!(unused(&outcome, "com.example.AdvancedViewModel").is_empty());
}

#[test]
fn test_retain_pattern_suppresses_method() {
    let mut config = Config::default();
    config.retain_patterns = vec!["UserViewModel.processInternalData".to_string()];
    let outcome = analyze(&config);
    assert_eq!(
        unused(&outcome, "com.example.UserViewModel"),
        vec![("unusedMethod".to_string(), 38), ("toOverride".to_string(), 44)]
    );
}

#[test]
fn test_report_is_idempotent() {
    let config = Config::default();
    let first = MarkdownReporter::new().render(&analyze(&config).report);
    let second = MarkdownReporter::new().render(&analyze(&config).report);
    assert_eq!(first, second);

    let parallel = Pipeline::new(&config)
        .with_parallel(true)
        .analyze_project(&sample_project())
        .unwrap();
    assert_eq!(first, MarkdownReporter::new().render(&parallel.report));
}

#[test]
fn test_markdown_report_lines() {
    let report = MarkdownReporter::new().render(&analyze(&Config::default()).report);

    assert!(report.starts_with("# Unused ViewModel Methods Report\n"));
    assert!(report.contains(
        "- **com.example.CompletelyUnusedViewModel** (at `src/main/java/com/example/CompletelyUnusedViewModel.java`)"
    ));
    assert!(report.contains("### ViewModel: `com.example.QuoteTestViewModel`\n- Method: `anUnusedCommand` (line 12)"));
    assert!(report.contains("- Method: `unusedMethod` (line 38)"));
    assert!(!report.contains("aCommandWithDoubleClick"));
    assert!(!report.contains("Congratulations"));
}
