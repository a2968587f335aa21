//! ZUL template scanner.
//!
//! Reads a template with quick-xml and records ViewModel bindings, command and
//! property references, and `<include>` directives. References are scoped to
//! the innermost enclosing `viewModel` element; anything that cannot be scoped
//! locally is marked inherited and resolved later through the includers.

mod expression;
mod scanner;

pub use expression::{classify_name, NameExpr};

use super::common::{line_at, line_starts, Parser};
use crate::diagnostics::Diagnostic;
use crate::model::TemplateUnit;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use scanner::TemplateScanner;
use std::borrow::Cow;
use std::path::Path;
use tracing::debug;

const CDATA_OPEN: usize = "<![CDATA[".len();

#[derive(Debug, Default, Clone, Copy)]
pub struct ZulParser;

impl ZulParser {
    pub fn new() -> Self {
        Self
    }

    fn element(
        &self,
        path: &Path,
        scanner: &mut TemplateScanner,
        element: &BytesStart,
        offset: usize,
    ) -> Result<(), Diagnostic> {
        let tag = String::from_utf8_lossy(element.local_name().as_ref()).into_owned();
        let raw: &[u8] = element;

        // (local name, unescaped value, byte offset of the value)
        let mut attributes: Vec<(String, String, usize)> = Vec::new();
        let mut search_from = 0;
        for attr in element.attributes() {
            let attr = attr.map_err(|e| {
                Diagnostic::parse_error(
                    path,
                    format!("malformed attribute near line {}: {}", scanner.line(offset), e),
                )
            })?;

            let key_bytes = attr.key.as_ref();
            let key_at = find_bytes(&raw[search_from..], key_bytes)
                .map(|i| i + search_from)
                .unwrap_or(search_from);
            search_from = key_at + key_bytes.len();
            let value_at = raw[search_from..]
                .iter()
                .position(|b| *b == b'"' || *b == b'\'')
                .map(|i| search_from + i + 1)
                .unwrap_or(search_from);

            let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map(Cow::into_owned)
                .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).into_owned());

            // `<` of the tag precedes the raw content
            attributes.push((key, value, offset + 1 + value_at));
        }

        let viewmodel = attributes
            .iter()
            .find(|(key, _, _)| key == "viewModel")
            .map(|(_, value, at)| (value.as_str(), scanner.line(*at)));
        scanner.open(tag.clone(), viewmodel);

        for (key, value, at) in &attributes {
            if key != "viewModel" {
                scanner.attribute(value, *at);
            }
        }

        if tag == "include" {
            if let Some((_, src, at)) = attributes.iter().find(|(key, _, _)| key == "src") {
                scanner.include(src, scanner.line(*at));
            }
        }

        Ok(())
    }
}

impl Parser for ZulParser {
    type Output = TemplateUnit;

    fn parse(&self, path: &Path, contents: &str) -> Result<TemplateUnit, Diagnostic> {
        let starts = line_starts(contents);
        let mut scanner = TemplateScanner::new(TemplateUnit::new(path.to_path_buf()), &starts);

        let mut reader = Reader::from_str(contents);
        reader.trim_text(false);

        let mut buf = Vec::new();

        loop {
            let offset = reader.buffer_position();
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => self.element(path, &mut scanner, e, offset)?,
                Ok(Event::Empty(ref e)) => {
                    self.element(path, &mut scanner, e, offset)?;
                    scanner.close();
                }
                Ok(Event::End(_)) => {
                    scanner.close();
                }
                Ok(Event::Text(ref t)) => {
                    let text = t
                        .unescape()
                        .map(Cow::into_owned)
                        .unwrap_or_else(|_| String::from_utf8_lossy(t).into_owned());
                    scanner.text(&text, offset);
                }
                Ok(Event::CData(ref c)) => {
                    let text = String::from_utf8_lossy(c).into_owned();
                    scanner.text(&text, offset + CDATA_OPEN);
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Diagnostic::parse_error(
                        path,
                        format!(
                            "malformed XML near line {}: {}",
                            line_at(&starts, reader.buffer_position()),
                            e
                        ),
                    ));
                }
                _ => {}
            }
            buf.clear();
        }

        if let Some(tag) = scanner.current_tag() {
            return Err(Diagnostic::parse_error(
                path,
                format!("unclosed element <{}>", tag),
            ));
        }

        let unit = scanner.finish();
        debug!(
            "Scanned {}: {} bindings, {} references, {} includes",
            path.display(),
            unit.bindings.len(),
            unit.references.len(),
            unit.includes.len()
        );
        Ok(unit)
    }
}

fn find_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::DiagnosticKind;
    use crate::model::{IncludeTarget, ReferenceKind, Resolution, ScopeRef};

    fn scan(source: &str) -> TemplateUnit {
        ZulParser::new().parse(Path::new("page.zul"), source).unwrap()
    }

    fn names(unit: &TemplateUnit, kind: ReferenceKind) -> Vec<(&str, usize)> {
        unit.references
            .iter()
            .filter(|r| r.kind == kind)
            .map(|r| (r.name.as_str(), r.line))
            .collect()
    }

    #[test]
    fn test_binding_and_literal_references() {
        let unit = scan(
            r#"<zk>
  <window viewModel="@id('vm') @init('com.example.UserViewModel')">
    <textbox value="@bind(vm.username)"/>
    <button label="Save" onClick="@command('saveUser')"/>
  </window>
</zk>"#,
        );

        assert_eq!(unit.bindings.len(), 1);
        assert_eq!(unit.bindings[0].alias, "vm");
        assert_eq!(unit.bindings[0].class_name, "com.example.UserViewModel");
        assert_eq!(unit.bindings[0].line, 2);

        assert_eq!(names(&unit, ReferenceKind::Command), vec![("saveUser", 4)]);
        assert_eq!(names(&unit, ReferenceKind::Property), vec![("username", 3)]);
        assert!(unit
            .references
            .iter()
            .all(|r| r.scope == ScopeRef::Local(0) && r.resolution == Resolution::Literal));
    }

    #[test]
    fn test_event_attribute_on_later_line() {
        let unit = scan(
            r#"<window viewModel="@id('vm') @init('com.example.QuoteTestViewModel')">
    <listbox>
        <listitem label="Item"
                  onDoubleClick="@command('aCommandWithDoubleClick')"/>
    </listbox>
</window>"#,
        );
        assert_eq!(
            names(&unit, ReferenceKind::Command),
            vec![("aCommandWithDoubleClick", 4)]
        );
    }

    #[test]
    fn test_commands_scope_to_innermost_viewmodel() {
        let unit = scan(
            r#"<window viewModel="@id('vm') @init('com.example.NestedMainViewModel')">
  <button onClick="@command('saveAll')"/>
  <div viewModel="@id('detail') @init('com.example.NestedDetailViewModel')">
    <label value="@load(detail.detailInfo)"/>
    <label value="@load(vm.mainTitle)"/>
    <button onClick="@command('saveDetail')"/>
  </div>
</window>"#,
        );

        let scope_of = |name: &str| unit.references.iter().find(|r| r.name == name).unwrap().scope;
        assert_eq!(scope_of("saveAll"), ScopeRef::Local(0));
        assert_eq!(scope_of("saveDetail"), ScopeRef::Local(1));
        assert_eq!(scope_of("detailInfo"), ScopeRef::Local(1));
        assert_eq!(scope_of("mainTitle"), ScopeRef::Local(0));
    }

    #[test]
    fn test_global_command_and_explicit_name() {
        let unit = scan(
            r#"<window viewModel="@id('vm') @init('com.example.OrderViewModel')">
  <button onClick="@command('submitOrder')"/>
  <button onClick="@global-command('refreshOrders')"/>
</window>"#,
        );
        assert_eq!(names(&unit, ReferenceKind::Command), vec![("submitOrder", 2)]);
        assert_eq!(
            names(&unit, ReferenceKind::GlobalCommand),
            vec![("refreshOrders", 3)]
        );
    }

    #[test]
    fn test_ternary_command_is_enumerated() {
        let unit = scan(
            r#"<window viewModel="@id('vm') @init('com.example.FormViewModel')">
  <button onClick="@command(vm.editing ? 'update' : 'create')"/>
</window>"#,
        );
        let enumerated: Vec<_> = unit
            .references
            .iter()
            .filter(|r| r.resolution == Resolution::EnumeratedSet)
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(enumerated, vec!["update", "create"]);
        assert_eq!(names(&unit, ReferenceKind::Property), vec![("editing", 2)]);
    }

    #[test]
    fn test_dynamic_command_is_opaque() {
        let unit = scan(
            r#"<window viewModel="@id('vm') @init('com.example.FormViewModel')">
  <button onClick="@command(vm.nextAction)"/>
</window>"#,
        );
        let opaque: Vec<_> = unit
            .references
            .iter()
            .filter(|r| r.resolution == Resolution::Opaque)
            .collect();
        assert_eq!(opaque.len(), 1);
        assert_eq!(opaque[0].kind, ReferenceKind::Command);
        assert_eq!(opaque[0].scope, ScopeRef::Local(0));
    }

    #[test]
    fn test_dynamic_include_is_opaque() {
        let unit = scan(
            r#"<window viewModel="@id('vm') @init('com.example.DynamicIncludeViewModel')">
  <include src="${vm.path}"/>
</window>"#,
        );

        assert_eq!(unit.includes.len(), 1);
        assert_eq!(unit.includes[0].target, IncludeTarget::Opaque("vm.path".into()));
        assert_eq!(unit.includes[0].visible, vec![0]);

        let command = unit
            .references
            .iter()
            .find(|r| r.kind == ReferenceKind::Command)
            .unwrap();
        assert_eq!(command.resolution, Resolution::Opaque);
        assert_eq!(command.scope, ScopeRef::Local(0));
        assert_eq!(names(&unit, ReferenceKind::Property), vec![("path", 2)]);
    }

    #[test]
    fn test_static_and_enumerated_includes() {
        let unit = scan(
            r#"<window viewModel="@id('vm') @init('com.example.ParentViewModel')">
  <include src="child.zul"/>
  <include src="@load(vm.compact ? 'small.zul' : 'large.zul')"/>
</window>"#,
        );
        let targets: Vec<_> = unit.includes.iter().map(|i| i.target.clone()).collect();
        assert_eq!(
            targets,
            vec![
                IncludeTarget::Static("child.zul".into()),
                IncludeTarget::Static("small.zul".into()),
                IncludeTarget::Static("large.zul".into()),
            ]
        );
    }

    #[test]
    fn test_template_without_viewmodel_inherits() {
        let unit = scan(
            r#"<div>
  <label value="@load(vm.parentMessage)"/>
  <button onClick="@command('actionFromIncluded')"/>
</div>"#,
        );
        assert!(!unit.has_local_viewmodel());
        assert!(unit.references.iter().all(|r| r.scope == ScopeRef::Inherited));
        assert_eq!(unit.references[0].alias.as_deref(), Some("vm"));
    }

    #[test]
    fn test_zscript_and_el() {
        let unit = scan(
            r#"<window viewModel="@id('vm') @init('com.example.AdvancedViewModel')">
  <label value="${vm.user.name}"/>
  <zscript><![CDATA[
    vm.runFromZscript();
    String s = "vm.notAReference";
  ]]></zscript>
</window>"#,
        );
        assert_eq!(
            names(&unit, ReferenceKind::Property),
            vec![("user", 2), ("runFromZscript", 4)]
        );
    }

    #[test]
    fn test_implicit_objects_ignored() {
        let unit = scan(
            r#"<window viewModel="@id('vm') @init('com.example.ListViewModel')">
  <listbox model="@load(vm.items)">
    <template name="model">
      <listitem label="@load(each.label)" onClick="@command('open', item=each)"/>
    </template>
  </listbox>
</window>"#,
        );
        let properties: Vec<_> = names(&unit, ReferenceKind::Property)
            .into_iter()
            .map(|(n, _)| n)
            .collect();
        assert_eq!(properties, vec!["items"]);
    }

    #[test]
    fn test_malformed_template_is_parse_error() {
        let result = ZulParser::new().parse(Path::new("broken.zul"), "<window><div></window>");
        assert_eq!(result.unwrap_err().kind, DiagnosticKind::ParseError);

        let result = ZulParser::new().parse(Path::new("open.zul"), "<window><div/>");
        assert_eq!(result.unwrap_err().kind, DiagnosticKind::ParseError);
    }
}
