//! Template scanning tests against the fixture ZUL files

use deadbind::model::{IncludeTarget, ReferenceKind, Resolution, ScopeRef, TemplateUnit};
use deadbind::parser::{Parser, ZulParser};
use deadbind::{Config, Pipeline, UnitInput};
use std::path::{Path, PathBuf};

fn webapp() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/sample_project/src/main/webapp")
}

fn scan_fixture(name: &str) -> TemplateUnit {
    let path = webapp().join(name);
    let contents = std::fs::read_to_string(&path).expect("fixture should exist");
    ZulParser::new()
        .parse(Path::new(name), &contents)
        .expect("fixture should scan")
}

fn references(unit: &TemplateUnit, kind: ReferenceKind) -> Vec<(&str, usize)> {
    unit.references
        .iter()
        .filter(|r| r.kind == kind)
        .map(|r| (r.name.as_str(), r.line))
        .collect()
}

#[test]
fn test_double_quoted_command_in_entity_attribute() {
    let unit = scan_fixture("quotetest.zul");
    assert_eq!(unit.bindings[0].class_name, "com.example.QuoteTestViewModel");
    assert_eq!(
        references(&unit, ReferenceKind::Command),
        vec![("aCommandWithDoubleClick", 4)]
    );
}

#[test]
fn test_global_command_and_property() {
    let unit = scan_fixture("order.zul");
    assert_eq!(references(&unit, ReferenceKind::GlobalCommand), vec![("refreshOrders", 4)]);
    assert_eq!(references(&unit, ReferenceKind::Command), vec![("submitOrder", 3)]);
    assert_eq!(references(&unit, ReferenceKind::Property), vec![("orderId", 2)]);
}

#[test]
fn test_included_template_has_inherited_scope() {
    let unit = scan_fixture("child.zul");
    assert!(!unit.has_local_viewmodel());
    assert!(unit.references.iter().all(|r| r.scope == ScopeRef::Inherited));

    let parent = scan_fixture("parent.zul");
    assert_eq!(parent.includes.len(), 1);
    assert_eq!(parent.includes[0].target, IncludeTarget::Static("child.zul".into()));
    assert_eq!(parent.includes[0].visible, vec![0]);
}

#[test]
fn test_el_and_zscript_accesses() {
    let unit = scan_fixture("advanced.zul");
    let properties = references(&unit, ReferenceKind::Property);
    assert!(properties.contains(&("user", 3)));
    assert!(properties.contains(&("getDynamicValue", 4)));
    assert!(properties.contains(&("runFromZscript", 6)));
    assert!(!properties.iter().any(|(name, _)| *name == "name"));
}

#[test]
fn test_dynamic_include_emits_one_opaque_command() {
    let unit = scan_fixture("dynamic.zul");
    let opaque: Vec<_> = unit
        .references
        .iter()
        .filter(|r| r.resolution == Resolution::Opaque)
        .collect();
    assert_eq!(opaque.len(), 1);
    assert_eq!(opaque[0].kind, ReferenceKind::Command);
    assert!(matches!(unit.includes[0].target, IncludeTarget::Opaque(_)));
}

#[test]
fn test_n_literal_plus_one_opaque_reference() {
    let source = r#"package com.example;
public class ToolbarViewModel {
    @Command public void one() {}
    @Command public void two() {}
    @Command public void three() {}
    @Command public void four() {}
    @Command public void five() {}
    public void helper() {}
}
"#;
    let literal = r#"<toolbar viewModel="@id('vm') @init('com.example.ToolbarViewModel')">
  <button onClick="@command('one')"/>
  <button onClick="@command('two')"/>
</toolbar>"#;
    let config = Config::default();
    let sources = vec![UnitInput::new("ToolbarViewModel.java", source)];

    let outcome = Pipeline::new(&config).run(&sources, &[UnitInput::new("toolbar.zul", literal)]);
    let names: Vec<_> = outcome.report.method_groups[0]
        .methods
        .iter()
        .map(|m| m.name.as_str())
        .collect();
    assert_eq!(names, vec!["three", "four", "five", "helper"]);

    let with_opaque = literal.replace(
        "</toolbar>",
        "  <button onClick=\"@command(vm.pending)\"/>\n</toolbar>",
    );
    let outcome = Pipeline::new(&config).run(&sources, &[UnitInput::new("toolbar.zul", with_opaque)]);
    let names: Vec<_> = outcome.report.method_groups[0]
        .methods
        .iter()
        .map(|m| m.name.as_str())
        .collect();
    assert_eq!(names, vec!["helper"]);
}

#[test]
fn test_malformed_template_is_skipped() {
    let config = Config::default();
    let sources = vec![UnitInput::new(
        "A.java",
        "package p; public class AViewModel { @Command public void go() {} }",
    )];
    let templates = vec![
        UnitInput::new("broken.zul", "<window><button onClick=\"@command('go')\"></window>"),
        UnitInput::new(
            "ok.zul",
            "<window viewModel=\"@id('vm') @init('p.AViewModel')\"><button onClick=\"@command('go')\"/></window>",
        ),
    ];
    let outcome = Pipeline::new(&config).run(&sources, &templates);
    assert!(outcome.report.is_clean());
    assert_eq!(outcome.report.diagnostics.len(), 1);
    assert_eq!(outcome.report.diagnostics[0].path, Some(PathBuf::from("broken.zul")));
}
