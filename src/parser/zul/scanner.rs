use super::expression::{
    include_source, parse_viewmodel, scan_accesses, scan_binding_value, Fragment, NameExpr,
};
use crate::model::{
    IncludeDirective, IncludeTarget, ReferenceKind, Resolution, ScopeRef, TemplateBindingReference,
    TemplateUnit, ViewModelBinding,
};
use crate::parser::common::line_at;

/// An open element and the binding it declares, if any
struct Frame {
    tag: String,
    binding: Option<usize>,
}

/// Accumulates one template's bindings and references while its events are read
pub(super) struct TemplateScanner<'a> {
    unit: TemplateUnit,
    line_starts: &'a [usize],
    stack: Vec<Frame>,
}

impl<'a> TemplateScanner<'a> {
    pub fn new(unit: TemplateUnit, line_starts: &'a [usize]) -> Self {
        Self {
            unit,
            line_starts,
            stack: Vec::new(),
        }
    }

    pub fn line(&self, offset: usize) -> usize {
        line_at(self.line_starts, offset)
    }

    pub fn current_tag(&self) -> Option<&str> {
        self.stack.last().map(|f| f.tag.as_str())
    }

    /// Open an element; `viewModel` is declared before any other attribute is scanned
    pub fn open(&mut self, tag: String, viewmodel: Option<(&str, usize)>) {
        let binding = viewmodel.and_then(|(value, line)| {
            let (alias, class_name) = parse_viewmodel(value)?;
            self.unit.bindings.push(ViewModelBinding {
                alias,
                class_name,
                line,
            });
            Some(self.unit.bindings.len() - 1)
        });
        self.stack.push(Frame { tag, binding });
    }

    pub fn close(&mut self) -> Option<String> {
        self.stack.pop().map(|f| f.tag)
    }

    pub fn finish(self) -> TemplateUnit {
        self.unit
    }

    /// Scan an attribute value whose first byte is at `offset`
    pub fn attribute(&mut self, value: &str, offset: usize) {
        let fragments = scan_binding_value(value);
        self.record(offset, fragments);
    }

    /// Scan element text. `<zscript>` bodies are scanned for raw member access,
    /// `<attribute>` bodies for bindings first, everything else for EL only.
    pub fn text(&mut self, text: &str, offset: usize) {
        let fragments = match self.current_tag() {
            Some("zscript") => {
                let mut fragments = Vec::new();
                scan_accesses(text, 0, &mut fragments);
                fragments
            }
            Some("attribute") => {
                let fragments = scan_binding_value(text);
                if fragments.is_empty() {
                    let mut raw = Vec::new();
                    scan_accesses(text, 0, &mut raw);
                    raw
                } else {
                    fragments
                }
            }
            _ => scan_binding_value(text),
        };
        self.record(offset, fragments);
    }

    pub fn include(&mut self, src: &str, line: usize) {
        let visible = self.visible();
        match include_source(src) {
            NameExpr::Literal(path) => self.unit.includes.push(IncludeDirective {
                line,
                target: IncludeTarget::Static(path),
                visible,
            }),
            NameExpr::Enumerated(paths) => {
                for path in paths {
                    self.unit.includes.push(IncludeDirective {
                        line,
                        target: IncludeTarget::Static(path),
                        visible: visible.clone(),
                    });
                }
            }
            NameExpr::Opaque(expr) => {
                // The included page may call back into any command of the owning ViewModel
                let scope = self.command_scope();
                self.push_reference(line, expr.clone(), ReferenceKind::Command, Resolution::Opaque, scope, None);
                self.unit.includes.push(IncludeDirective {
                    line,
                    target: IncludeTarget::Opaque(expr),
                    visible,
                });
            }
        }
    }

    fn record(&mut self, offset: usize, fragments: Vec<Fragment>) {
        for fragment in fragments {
            match fragment {
                Fragment::Command { global, name, offset: at } => {
                    let line = self.line(offset + at);
                    let kind = if global {
                        ReferenceKind::GlobalCommand
                    } else {
                        ReferenceKind::Command
                    };
                    let scope = self.command_scope();
                    self.push_names(line, name, kind, scope, None);
                }
                Fragment::Access { alias, member, offset: at } => {
                    let line = self.line(offset + at);
                    let scope = self.alias_scope(&alias);
                    self.push_names(line, member, ReferenceKind::Property, scope, Some(alias));
                }
            }
        }
    }

    fn push_names(
        &mut self,
        line: usize,
        name: NameExpr,
        kind: ReferenceKind,
        scope: ScopeRef,
        alias: Option<String>,
    ) {
        match name {
            NameExpr::Literal(name) => {
                self.push_reference(line, name, kind, Resolution::Literal, scope, alias)
            }
            NameExpr::Enumerated(names) => {
                for name in names {
                    self.push_reference(line, name, kind, Resolution::EnumeratedSet, scope, alias.clone());
                }
            }
            NameExpr::Opaque(expr) => {
                self.push_reference(line, expr, kind, Resolution::Opaque, scope, alias)
            }
        }
    }

    fn push_reference(
        &mut self,
        line: usize,
        name: String,
        kind: ReferenceKind,
        resolution: Resolution,
        scope: ScopeRef,
        alias: Option<String>,
    ) {
        let reference = TemplateBindingReference {
            path: self.unit.path.clone(),
            line,
            name,
            kind,
            resolution,
            scope,
            alias,
        };
        if !self.unit.references.contains(&reference) {
            self.unit.references.push(reference);
        }
    }

    /// Bindings of the open elements, outermost first
    fn visible(&self) -> Vec<usize> {
        self.stack.iter().filter_map(|f| f.binding).collect()
    }

    /// Innermost enclosing binding, else a `vm` binding anywhere in the unit
    fn command_scope(&self) -> ScopeRef {
        if let Some(&index) = self.visible().last() {
            return ScopeRef::Local(index);
        }
        match self.unit.bindings.iter().position(|b| b.alias == "vm") {
            Some(index) => ScopeRef::Local(index),
            None => ScopeRef::Inherited,
        }
    }

    /// Innermost enclosing binding with this alias, else any binding with it
    fn alias_scope(&self, alias: &str) -> ScopeRef {
        let enclosing = self
            .visible()
            .into_iter()
            .rev()
            .find(|&i| self.unit.bindings[i].alias == alias);
        let anywhere = || self.unit.bindings.iter().position(|b| b.alias == alias);
        match enclosing.or_else(anywhere) {
            Some(index) => ScopeRef::Local(index),
            None => ScopeRef::Inherited,
        }
    }
}
