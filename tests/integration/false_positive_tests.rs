//! False-positive tests
//!
//! Each case reaches a ViewModel method through an indirect path and checks
//! that it is NOT reported as unused.
//!
//! Categories:
//! 1. Calls from plain Java code (services, helpers, static utilities)
//! 2. Inheritance (inherited commands, overrides, external supertypes)
//! 3. Template indirection (ternaries, includes, dynamic expressions)
//! 4. Method references, initializers and member types

use deadbind::{Config, Pipeline, UnitInput};

fn unused(sources: &[(&str, &str)], templates: &[(&str, &str)]) -> Vec<String> {
    unused_with(&Config::default(), sources, templates)
}

fn unused_with(config: &Config, sources: &[(&str, &str)], templates: &[(&str, &str)]) -> Vec<String> {
    let sources: Vec<UnitInput> = sources.iter().map(|(p, s)| UnitInput::new(*p, *s)).collect();
    let templates: Vec<UnitInput> = templates.iter().map(|(p, s)| UnitInput::new(*p, *s)).collect();
    let outcome = Pipeline::new(config).run(&sources, &templates);

    let mut names: Vec<String> = outcome
        .report
        .unused_classes
        .iter()
        .map(|c| c.qualified_name.clone())
        .collect();
    for group in &outcome.report.method_groups {
        for method in &group.methods {
            names.push(format!("{}.{}", group.qualified_name, method.name));
        }
    }
    names
}

const ACCOUNT_ZUL: &str = r#"<window viewModel="@id('vm') @init('app.AccountViewModel')">
  <button onClick="@command('save')"/>
</window>"#;

// ============================================================================
// 1. Calls from plain Java code
// ============================================================================

#[test]
fn test_called_from_service_through_typed_variable() {
    let vm = r#"package app;
public class AccountViewModel {
    @Command public void save() {}
    public void recalculate() {}
}"#;
    let service = r#"package app;
public class AccountService {
    private AccountViewModel viewModel;
    public void refresh() { viewModel.recalculate(); }
}"#;
    let result = unused(&[("AccountViewModel.java", vm), ("AccountService.java", service)], &[("a.zul", ACCOUNT_ZUL)]);
    assert!(result.is_empty(), "{:?}", result);
}

#[test]
fn test_static_call_through_class_name() {
    let vm = r#"package app;
public class AccountViewModel {
    @Command public void save() {}
    public static String format(String raw) { return raw; }
}"#;
    let util = r#"package app;
public class Printer {
    public void print(String raw) { System.out.println(AccountViewModel.format(raw)); }
}"#;
    let result = unused(&[("AccountViewModel.java", vm), ("Printer.java", util)], &[("a.zul", ACCOUNT_ZUL)]);
    assert!(result.is_empty(), "{:?}", result);
}

#[test]
fn test_internal_call_chain_from_command() {
    let vm = r#"package app;
public class AccountViewModel {
    @Command public void save() { validate(); }
    public void validate() { this.normalize(1); }
    public void normalize(int step) {}
    public void normalize() {}
}"#;
    let result = unused(&[("AccountViewModel.java", vm)], &[("a.zul", ACCOUNT_ZUL)]);
    // The zero-arity overload is a separate slot
    assert_eq!(result, vec!["app.AccountViewModel.normalize"]);
}

// ============================================================================
// 2. Inheritance
// ============================================================================

#[test]
fn test_inherited_command_referenced_from_subclass_template() {
    let base = r#"package app;
public abstract class CrudViewModel {
    @Command public void save() {}
}"#;
    let vm = r#"package app;
public class AccountViewModel extends CrudViewModel {
}"#;
    let result = unused(&[("CrudViewModel.java", base), ("AccountViewModel.java", vm)], &[("a.zul", ACCOUNT_ZUL)]);
    assert!(result.is_empty(), "{:?}", result);
}

#[test]
fn test_override_of_external_supertype() {
    let vm = r#"package app;
import org.zkoss.bind.BindComposer;
public class AccountViewModel extends BindComposer {
    @Command public void save() {}
    @Override
    public void doAfterCompose(Object comp) {}
}"#;
    let result = unused(&[("AccountViewModel.java", vm)], &[("a.zul", ACCOUNT_ZUL)]);
    assert!(result.is_empty(), "{:?}", result);
}

#[test]
fn test_override_reached_through_base_slot() {
    let base = r#"package app;
public abstract class CrudViewModel {
    @Command public void save() { persist(); }
    public void persist() {}
}"#;
    let vm = r#"package app;
public class AccountViewModel extends CrudViewModel {
    @Override
    public void persist() {}
}"#;
    let result = unused(&[("CrudViewModel.java", base), ("AccountViewModel.java", vm)], &[("a.zul", ACCOUNT_ZUL)]);
    assert!(result.is_empty(), "{:?}", result);
}

#[test]
fn test_setter_inherited_next_to_overriding_getter() {
    let base = r#"package app;
public class BaseFormViewModel {
    public void setName(String name) {}
}"#;
    let vm = r#"package app;
public class FormViewModel extends BaseFormViewModel {
    @Command public void save() {}
    public String getName() { return ""; }
}"#;
    let zul = r#"<window viewModel="@id('vm') @init('app.FormViewModel')">
  <textbox value="@bind(vm.name)"/>
  <button onClick="@command('save')"/>
</window>"#;
    let result = unused(&[("BaseFormViewModel.java", base), ("FormViewModel.java", vm)], &[("f.zul", zul)]);
    assert!(result.is_empty(), "{:?}", result);
}

// ============================================================================
// 3. Template indirection
// ============================================================================

#[test]
fn test_ternary_command_names() {
    let vm = r#"package app;
public class AccountViewModel {
    public boolean isEditing() { return false; }
    @Command public void save() {}
    @Command public void edit() {}
}"#;
    let zul = r#"<window viewModel="@id('vm') @init('app.AccountViewModel')">
  <button onClick="@command(vm.editing ? 'save' : 'edit')"/>
</window>"#;
    let result = unused(&[("AccountViewModel.java", vm)], &[("a.zul", zul)]);
    assert!(result.is_empty(), "{:?}", result);
}

#[test]
fn test_before_after_commands_and_setters() {
    let vm = r#"package app;
public class AccountViewModel {
    private String name;
    public String getName() { return name; }
    public void setName(String name) { this.name = name; }
    @Command public void save() {}
    @Command public void validate() {}
}"#;
    let zul = r#"<window viewModel="@id('vm') @init('app.AccountViewModel')">
  <textbox value="@save(vm.name, before='validate')"/>
  <button onClick="@command('save')"/>
</window>"#;
    let result = unused(&[("AccountViewModel.java", vm)], &[("a.zul", zul)]);
    assert!(result.is_empty(), "{:?}", result);
}

#[test]
fn test_global_command_from_another_template() {
    let vm = r#"package app;
public class AccountViewModel {
    @Command public void save() {}
    @GlobalCommand("accountsChanged") public void reload() {}
}"#;
    let other = r#"<div><button onClick="@global-command('accountsChanged')"/></div>"#;
    let result = unused(&[("AccountViewModel.java", vm)], &[("a.zul", ACCOUNT_ZUL), ("b.zul", other)]);
    assert!(result.is_empty(), "{:?}", result);
}

#[test]
fn test_opaque_property_keeps_accessors() {
    let vm = r#"package app;
public class AccountViewModel {
    @Command public void save() {}
    public String getOwner() { return ""; }
    public String getIban() { return ""; }
}"#;
    let zul = r#"<window viewModel="@id('vm') @init('app.AccountViewModel')">
  <button onClick="@command('save')"/>
  <label value="@load(vm[column])"/>
</window>"#;
    let result = unused(&[("AccountViewModel.java", vm)], &[("a.zul", zul)]);
    assert!(result.is_empty(), "{:?}", result);
}

#[test]
fn test_included_template_with_own_alias() {
    let main = r#"package app;
public class ShellViewModel {
    public String getTitle() { return ""; }
}"#;
    let vm = r#"package app;
public class AccountViewModel {
    @Command public void save() {}
    public String getBalance() { return ""; }
}"#;
    let shell = r#"<window viewModel="@id('shell') @init('app.ShellViewModel')">
  <label value="@load(shell.title)"/>
  <div viewModel="@id('vm') @init('app.AccountViewModel')">
    <include src="parts/balance.zul"/>
  </div>
</window>"#;
    let part = r#"<div>
  <label value="@load(vm.balance)"/>
  <button onClick="@command('save')"/>
</div>"#;
    let result = unused(
        &[("ShellViewModel.java", main), ("AccountViewModel.java", vm)],
        &[("web/shell.zul", shell), ("web/parts/balance.zul", part)],
    );
    assert!(result.is_empty(), "{:?}", result);
}

// ============================================================================
// 4. Method references, initializers and member types
// ============================================================================

#[test]
fn test_method_reference_and_constructor_call() {
    let vm = r#"package app;
import java.util.List;
public class AccountViewModel {
    public AccountViewModel() { setup(); }
    @Command public void save() { List.of("a").forEach(this::audit); }
    public void setup() {}
    public void audit(String entry) {}
}"#;
    let result = unused(&[("AccountViewModel.java", vm)], &[("a.zul", ACCOUNT_ZUL)]);
    assert!(result.is_empty(), "{:?}", result);
}

#[test]
fn test_custom_init_annotation() {
    let mut config = Config::default();
    config.annotations.init.push("PostConstruct".to_string());
    let vm = r#"package app;
public class AccountViewModel {
    @Command public void save() {}
    @PostConstruct public void warmUp() {}
}"#;
    let result = unused_with(&config, &[("AccountViewModel.java", vm)], &[("a.zul", ACCOUNT_ZUL)]);
    assert!(result.is_empty(), "{:?}", result);
}

#[test]
fn test_call_from_inner_listener_class() {
    let vm = r#"package app;
public class AccountViewModel {
    @Command public void save() {}
    public void reload() {}
    private class Listener {
        public void onEvent(Object event) { reload(); }
    }
    @Init public void init() { new Listener(); }
}"#;
    let result = unused(&[("AccountViewModel.java", vm)], &[("a.zul", ACCOUNT_ZUL)]);
    assert!(result.is_empty(), "{:?}", result);
}
