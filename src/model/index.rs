use super::{ClassId, ClassModel, MethodId, MethodModel};
use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Outcome of matching a type name against the project
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeResolution {
    Resolved(ClassId),
    Ambiguous(Vec<ClassId>),
    Unknown,
}

impl TypeResolution {
    pub fn resolved(&self) -> Option<ClassId> {
        match self {
            TypeResolution::Resolved(id) => Some(*id),
            _ => None,
        }
    }
}

/// Project-wide index of extracted classes.
///
/// Built once per run by [`ProjectIndex::build`], then shared by reference with
/// every later stage. Classes are ordered by (path, qualified name) so ids are
/// stable across runs on the same input.
#[derive(Debug, Default)]
pub struct ProjectIndex {
    classes: Vec<ClassModel>,
    by_qualified: HashMap<String, ClassId>,
    by_simple: HashMap<String, Vec<ClassId>>,
    subclasses: HashMap<ClassId, Vec<ClassId>>,
    base_slots: HashMap<MethodId, MethodId>,
}

impl ProjectIndex {
    pub fn build(mut classes: Vec<ClassModel>, diagnostics: &mut Diagnostics) -> Self {
        classes.sort_by(|a, b| {
            a.path
                .cmp(&b.path)
                .then_with(|| a.qualified_name.cmp(&b.qualified_name))
        });

        let mut index = Self::default();

        for (i, mut class) in classes.into_iter().enumerate() {
            let id = ClassId(i);
            class.id = id;
            for method in &mut class.methods {
                method.class = id;
            }
            index
                .by_qualified
                .entry(class.qualified_name.clone())
                .or_insert(id);
            index
                .by_simple
                .entry(class.name.clone())
                .or_default()
                .push(id);
            index.classes.push(class);
        }

        index.resolve_superclasses(diagnostics);
        index.resolve_overrides();

        debug!(
            "Project index: {} classes, {} overrides",
            index.classes.len(),
            index.base_slots.len()
        );

        index
    }

    /// Second pass: match each declared superclass against the index
    fn resolve_superclasses(&mut self, diagnostics: &mut Diagnostics) {
        for i in 0..self.classes.len() {
            let Some(super_name) = self.classes[i].superclass_name.clone() else {
                continue;
            };

            match self.resolve_type(&self.classes[i], &super_name) {
                TypeResolution::Resolved(id) if id.0 != i => {
                    self.classes[i].superclass = Some(id);
                    self.subclasses.entry(id).or_default().push(ClassId(i));
                }
                TypeResolution::Resolved(_) => {}
                TypeResolution::Ambiguous(candidates) => {
                    let class = &self.classes[i];
                    let names: Vec<&str> = candidates
                        .iter()
                        .map(|c| self.classes[c.0].qualified_name.as_str())
                        .collect();
                    diagnostics.push(
                        Diagnostic::new(
                            DiagnosticKind::AmbiguousSuperclass,
                            format!(
                                "superclass `{}` of `{}` matches {}",
                                super_name,
                                class.qualified_name,
                                names.join(", ")
                            ),
                        )
                        .at(&class.path, Some(class.line)),
                    );
                }
                TypeResolution::Unknown => {
                    debug!(
                        "External superclass {} of {}",
                        super_name, self.classes[i].qualified_name
                    );
                }
            }
        }
    }

    fn resolve_overrides(&mut self) {
        let mut found = Vec::new();
        for class in &self.classes {
            for (index, method) in class.methods.iter().enumerate() {
                if let Some(base) = self.find_in_ancestors(class.id, |m| m.same_slot(method)) {
                    found.push((MethodId::new(class.id, index), base));
                }
            }
        }
        for (id, base) in found {
            self.classes[id.class.0].methods[id.index].is_override = true;
            self.base_slots.insert(id, base);
        }
    }

    /// Match a type name as seen from `from`: qualified name, imports, same
    /// package, then a unique simple name anywhere in the project.
    pub fn resolve_type(&self, from: &ClassModel, type_name: &str) -> TypeResolution {
        if type_name.contains('.') {
            if let Some(&id) = self.by_qualified.get(type_name) {
                return TypeResolution::Resolved(id);
            }
        }
        let simple = type_name.rsplit('.').next().unwrap_or(type_name);

        for import in &from.imports {
            if let Some(package) = import.strip_suffix(".*") {
                if let Some(&id) = self.by_qualified.get(&format!("{}.{}", package, simple)) {
                    return TypeResolution::Resolved(id);
                }
            } else if import.rsplit('.').next() == Some(simple) {
                if let Some(&id) = self.by_qualified.get(import) {
                    return TypeResolution::Resolved(id);
                }
            }
        }

        if let Some(package) = &from.package {
            if let Some(&id) = self.by_qualified.get(&format!("{}.{}", package, simple)) {
                return TypeResolution::Resolved(id);
            }
        }

        match self.by_simple.get(simple).map(Vec::as_slice) {
            Some([only]) => TypeResolution::Resolved(*only),
            Some(many) if many.len() > 1 => TypeResolution::Ambiguous(many.to_vec()),
            _ => TypeResolution::Unknown,
        }
    }

    pub fn classes(&self) -> impl Iterator<Item = &ClassModel> {
        self.classes.iter()
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    pub fn method_count(&self) -> usize {
        self.classes.iter().map(|c| c.methods.len()).sum()
    }

    pub fn class(&self, id: ClassId) -> &ClassModel {
        &self.classes[id.0]
    }

    pub fn method(&self, id: MethodId) -> &MethodModel {
        &self.classes[id.class.0].methods[id.index]
    }

    pub fn find_by_qualified(&self, qualified_name: &str) -> Option<ClassId> {
        self.by_qualified.get(qualified_name).copied()
    }

    pub fn find_by_simple(&self, name: &str) -> &[ClassId] {
        self.by_simple.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Resolved ancestors, nearest first; stops on inheritance cycles
    pub fn ancestors(&self, id: ClassId) -> Vec<ClassId> {
        let mut result = Vec::new();
        let mut seen = HashSet::from([id]);
        let mut current = self.class(id).superclass;
        while let Some(parent) = current {
            if !seen.insert(parent) {
                break;
            }
            result.push(parent);
            current = self.class(parent).superclass;
        }
        result
    }

    /// The class itself followed by its ancestors
    pub fn lineage(&self, id: ClassId) -> Vec<ClassId> {
        let mut chain = vec![id];
        chain.extend(self.ancestors(id));
        chain
    }

    /// Every transitive subclass
    pub fn descendants(&self, id: ClassId) -> Vec<ClassId> {
        let mut result = Vec::new();
        let mut seen = HashSet::from([id]);
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            for &child in self.subclasses.get(&current).map(Vec::as_slice).unwrap_or(&[]) {
                if seen.insert(child) {
                    result.push(child);
                    stack.push(child);
                }
            }
        }
        result.sort();
        result
    }

    /// Nearest ancestor method (excluding `class` itself) satisfying `predicate`
    pub fn find_in_ancestors(
        &self,
        class: ClassId,
        predicate: impl Fn(&MethodModel) -> bool,
    ) -> Option<MethodId> {
        for ancestor in self.ancestors(class) {
            if let Some(index) = self.class(ancestor).methods.iter().position(&predicate) {
                return Some(MethodId::new(ancestor, index));
            }
        }
        None
    }

    /// Base slot this method overrides, if the override relation is established
    pub fn base_slot(&self, id: MethodId) -> Option<MethodId> {
        self.base_slots.get(&id).copied()
    }

    /// (override, base) pairs in index order
    pub fn override_pairs(&self) -> Vec<(MethodId, MethodId)> {
        let mut pairs: Vec<_> = self.base_slots.iter().map(|(o, b)| (*o, *b)).collect();
        pairs.sort();
        pairs
    }
}
