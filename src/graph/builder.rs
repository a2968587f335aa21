use super::{Edge, EdgeKind, NodeKind, UsageGraph};
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::model::{
    capitalize, AnnotationKind, CallSite, ClassId, ClassModel, IncludeTarget, Instantiation,
    MethodId, ProjectIndex, Receiver, ReferenceKind, Resolution, ScopeRef, TemplateBindingReference,
    TemplateUnit, TypeResolution,
};
use std::collections::{HashMap, HashSet};
use std::path::{Component, Path};
use tracing::{debug, info, trace};

/// Bindings visible along one include path, outermost first
type ContextChain = Vec<(String, ClassId)>;

/// Builder for the usage graph.
///
/// Consumes the project index and every scanned template; performs no
/// analysis itself. Edges whose endpoints cannot be matched are dropped with
/// an unresolved-reference diagnostic.
pub struct CallGraphBuilder<'a> {
    index: &'a ProjectIndex,
    templates: &'a [TemplateUnit],

    /// The graph being built
    graph: UsageGraph,

    /// Resolved class of every binding, per template
    bound: Vec<Vec<Option<ClassId>>>,

    /// (template, include directive) -> included templates
    includes: HashMap<(usize, usize), Vec<usize>>,

    /// template -> include sites that pull it in
    includers: HashMap<usize, Vec<(usize, usize)>>,
}

impl<'a> CallGraphBuilder<'a> {
    pub fn new(index: &'a ProjectIndex, templates: &'a [TemplateUnit]) -> Self {
        Self {
            index,
            templates,
            graph: UsageGraph::new(),
            bound: Vec::new(),
            includes: HashMap::new(),
            includers: HashMap::new(),
        }
    }

    /// Build the final graph
    pub fn build(mut self, diagnostics: &mut Diagnostics) -> UsageGraph {
        self.add_nodes();
        self.add_call_edges(diagnostics);
        self.add_dispatch_edges(diagnostics);
        self.resolve_bindings(diagnostics);
        self.resolve_includes(diagnostics);

        let contexts: Vec<Vec<ContextChain>> = (0..self.templates.len())
            .map(|t| self.chains_of(t, &mut HashSet::new()))
            .collect();

        self.add_reference_edges(&contexts, diagnostics);
        self.add_inclusion_edges(&contexts, diagnostics);

        info!(
            "Usage graph: {} nodes, {} edges",
            self.graph.node_count(),
            self.graph.edge_count()
        );
        debug!("Edge kinds: {:?}", self.graph.edge_counts());

        self.graph
    }

    fn add_nodes(&mut self) {
        for t in 0..self.templates.len() {
            self.graph.add_node(NodeKind::Template(t));
        }
        for class in self.index.classes() {
            self.graph.add_node(NodeKind::Class(class.id));
            for id in class.method_ids() {
                self.graph.add_node(NodeKind::Method(id));
            }
        }
    }

    fn connect(&mut self, from: NodeKind, to: NodeKind, edge: Edge, diagnostics: &mut Diagnostics) {
        let (path, line) = (edge.path.clone(), edge.line);
        if !self.graph.add_edge(from, to, edge) {
            diagnostics.push(Diagnostic::unresolved(
                &path,
                line,
                format!("edge {:?} -> {:?} has an unknown endpoint", from, to),
            ));
        }
    }

    // ---- Java side ----

    fn add_call_edges(&mut self, diagnostics: &mut Diagnostics) {
        let index = self.index;
        for class in index.classes() {
            for (i, method) in class.methods.iter().enumerate() {
                let from = NodeKind::Method(MethodId::new(class.id, i));
                self.add_calls(class, from, &method.calls, &method.instantiations, diagnostics);
            }
            self.add_calls(
                class,
                NodeKind::Class(class.id),
                &class.initializer_calls,
                &class.initializer_instantiations,
                diagnostics,
            );
        }
    }

    fn add_calls(
        &mut self,
        class: &ClassModel,
        from: NodeKind,
        calls: &[CallSite],
        instantiations: &[Instantiation],
        diagnostics: &mut Diagnostics,
    ) {
        for call in calls {
            let targets = self.resolve_call(class, call);
            if targets.is_empty() {
                trace!("Ignoring call to {} outside the index", call.name);
            }
            for target in targets {
                let edge = Edge::new(EdgeKind::InternalCall, &class.path, call.line);
                self.connect(from, NodeKind::Method(target), edge, diagnostics);
            }
        }

        for instantiation in instantiations {
            if let Some(target) = self
                .index
                .resolve_type(class, &instantiation.type_name)
                .resolved()
            {
                let edge = Edge::new(EdgeKind::Instantiation, &class.path, instantiation.line);
                self.connect(from, NodeKind::Class(target), edge, diagnostics);
            }
        }
    }

    /// Methods a call site may invoke: the nearest class in the searched
    /// lineage declaring the name, matched by arity when possible
    fn resolve_call(&self, class: &ClassModel, call: &CallSite) -> Vec<MethodId> {
        let search = match &call.receiver {
            Receiver::This => self.index.lineage(class.id),
            Receiver::Super => self.index.ancestors(class.id),
            Receiver::Typed(type_name) => match self.index.resolve_type(class, type_name) {
                TypeResolution::Resolved(id) => self.index.lineage(id),
                _ => return Vec::new(),
            },
            Receiver::Unknown => return Vec::new(),
        };

        for candidate in search {
            let methods = &self.index.class(candidate).methods;
            let named: Vec<usize> = (0..methods.len())
                .filter(|&i| methods[i].name == call.name)
                .collect();
            if named.is_empty() {
                continue;
            }
            let exact: Vec<usize> = named
                .iter()
                .copied()
                .filter(|&i| call.arity.map_or(true, |arity| methods[i].arity == arity))
                .collect();
            let chosen = if exact.is_empty() { named } else { exact };
            return chosen
                .into_iter()
                .map(|i| MethodId::new(candidate, i))
                .collect();
        }

        Vec::new()
    }

    fn add_dispatch_edges(&mut self, diagnostics: &mut Diagnostics) {
        for (override_id, base_id) in self.index.override_pairs() {
            let class = self.index.class(override_id.class);
            let line = self.index.method(override_id).line;
            let edge = Edge::new(EdgeKind::Dispatch, &class.path, line);
            self.connect(
                NodeKind::Method(base_id),
                NodeKind::Method(override_id),
                edge,
                diagnostics,
            );
        }
    }

    // ---- Template side ----

    fn find_class(&self, name: &str) -> Option<ClassId> {
        if let Some(id) = self.index.find_by_qualified(name) {
            return Some(id);
        }
        match self.index.find_by_simple(name.rsplit('.').next().unwrap_or(name)) {
            [only] if !name.contains('.') => Some(*only),
            _ => None,
        }
    }

    fn resolve_bindings(&mut self, diagnostics: &mut Diagnostics) {
        let templates = self.templates;
        for (t, unit) in templates.iter().enumerate() {
            let mut resolved = Vec::with_capacity(unit.bindings.len());
            for binding in &unit.bindings {
                let class = self.find_class(&binding.class_name);
                match class {
                    Some(id) => {
                        let edge = Edge::new(EdgeKind::Binding, &unit.path, binding.line);
                        self.connect(NodeKind::Template(t), NodeKind::Class(id), edge, diagnostics);
                    }
                    None => diagnostics.push(Diagnostic::unresolved(
                        &unit.path,
                        binding.line,
                        format!("ViewModel class `{}` is not in the project", binding.class_name),
                    )),
                }
                resolved.push(class);
            }
            self.bound.push(resolved);
        }
    }

    fn resolve_includes(&mut self, diagnostics: &mut Diagnostics) {
        let templates = self.templates;
        for (t, unit) in templates.iter().enumerate() {
            for (d, directive) in unit.includes.iter().enumerate() {
                let target = match &directive.target {
                    IncludeTarget::Static(target) => target,
                    IncludeTarget::Opaque(expr) => {
                        debug!("Dynamic include `{}` in {}", expr, unit.path.display());
                        continue;
                    }
                };

                let matches = self.match_template(t, target);
                if matches.is_empty() {
                    diagnostics.push(Diagnostic::unresolved(
                        &unit.path,
                        directive.line,
                        format!("included template `{}` not found", target),
                    ));
                    continue;
                }
                for &m in &matches {
                    self.includers.entry(m).or_default().push((t, d));
                }
                self.includes.insert((t, d), matches);
            }
        }
    }

    /// Resolve an include `src` relative to the including template, falling
    /// back to a path-suffix match (`/x.zul` is relative to the web root)
    fn match_template(&self, from: usize, target: &str) -> Vec<usize> {
        let target = target.split(['?', '#']).next().unwrap_or(target).trim();
        let wanted = normalize(Path::new(target.trim_start_matches('/')));
        if wanted.is_empty() {
            return Vec::new();
        }

        if !target.starts_with('/') {
            if let Some(dir) = self.templates[from].path.parent() {
                let joined = normalize(&dir.join(target));
                let found: Vec<usize> = (0..self.templates.len())
                    .filter(|&t| normalize(&self.templates[t].path) == joined)
                    .collect();
                if !found.is_empty() {
                    return found;
                }
            }
        }

        (0..self.templates.len())
            .filter(|&t| normalize(&self.templates[t].path).ends_with(&wanted))
            .collect()
    }

    /// Every chain of bindings through which template `t` can be reached
    fn chains_of(&self, t: usize, visiting: &mut HashSet<usize>) -> Vec<ContextChain> {
        if !visiting.insert(t) {
            return Vec::new();
        }

        let mut chains = Vec::new();
        for &(includer, directive) in self.includers.get(&t).map(Vec::as_slice).unwrap_or(&[]) {
            let unit = &self.templates[includer];
            let site: ContextChain = unit.includes[directive]
                .visible
                .iter()
                .filter_map(|&b| Some((unit.bindings[b].alias.clone(), self.bound[includer][b]?)))
                .collect();

            let parents = self.chains_of(includer, visiting);
            if parents.is_empty() {
                if !site.is_empty() {
                    chains.push(site);
                }
            } else {
                for mut chain in parents {
                    chain.extend(site.iter().cloned());
                    chains.push(chain);
                }
            }
        }

        visiting.remove(&t);
        chains.sort();
        chains.dedup();
        chains
    }

    fn add_reference_edges(&mut self, contexts: &[Vec<ContextChain>], diagnostics: &mut Diagnostics) {
        let templates = self.templates;
        for (t, unit) in templates.iter().enumerate() {
            let from = NodeKind::Template(t);
            for reference in &unit.references {
                if reference.kind == ReferenceKind::GlobalCommand {
                    self.add_global_command(from, reference, diagnostics);
                    continue;
                }

                let targets = self.scope_targets(t, reference, &contexts[t]);
                if targets.is_empty() {
                    match (reference.scope, reference.kind) {
                        (ScopeRef::Inherited, ReferenceKind::Property) => trace!(
                            "Dropping `{}` in {}: alias {:?} is not bound by any includer",
                            reference.name,
                            unit.path.display(),
                            reference.alias
                        ),
                        (ScopeRef::Inherited, _) => diagnostics.push(Diagnostic::unresolved(
                            &reference.path,
                            reference.line,
                            format!("command `{}` has no ViewModel in scope", reference.name),
                        )),
                        // Local binding to an unknown class, already reported
                        (ScopeRef::Local(_), _) => {}
                    }
                    continue;
                }

                for class in targets {
                    self.add_reference(from, class, reference, diagnostics);
                }
            }
        }
    }

    fn scope_targets(
        &self,
        t: usize,
        reference: &TemplateBindingReference,
        contexts: &[ContextChain],
    ) -> Vec<ClassId> {
        let mut targets: Vec<ClassId> = match reference.scope {
            ScopeRef::Local(b) => self.bound[t].get(b).copied().flatten().into_iter().collect(),
            ScopeRef::Inherited => contexts
                .iter()
                .filter_map(|chain| match &reference.alias {
                    Some(alias) => chain.iter().rev().find(|(a, _)| a == alias).map(|(_, c)| *c),
                    None => chain.last().map(|(_, c)| *c),
                })
                .collect(),
        };
        targets.sort();
        targets.dedup();
        targets
    }

    fn add_reference(
        &mut self,
        from: NodeKind,
        class: ClassId,
        reference: &TemplateBindingReference,
        diagnostics: &mut Diagnostics,
    ) {
        let kind = EdgeKind::TemplateRef(reference.kind, reference.resolution);

        if reference.resolution == Resolution::Opaque {
            let edge = Edge::new(kind, &reference.path, reference.line);
            self.connect(from, NodeKind::Class(class), edge, diagnostics);
            return;
        }

        let methods = match reference.kind {
            ReferenceKind::Property => self.resolve_property(class, &reference.name),
            _ => self.resolve_command(class, &reference.name),
        };
        if methods.is_empty() {
            diagnostics.push(Diagnostic::unresolved(
                &reference.path,
                reference.line,
                format!(
                    "{} `{}` not found in `{}`",
                    reference.kind.display_name(),
                    reference.name,
                    self.index.class(class).qualified_name
                ),
            ));
            return;
        }
        for method in methods {
            let edge = Edge::new(kind, &reference.path, reference.line);
            self.connect(from, NodeKind::Method(method), edge, diagnostics);
        }
    }

    /// Command methods by binding name in the class and its ancestors, else
    /// non-command methods with exactly that name
    fn resolve_command(&self, class: ClassId, name: &str) -> Vec<MethodId> {
        let lineage = self.index.lineage(class);
        let by_binding = self.first_in_lineage(&lineage, |m| {
            m.binding_names(AnnotationKind::Command).contains(&name)
        });
        if !by_binding.is_empty() {
            return by_binding;
        }
        self.first_in_lineage(&lineage, |m| !m.is_any_command() && m.name == name)
    }

    /// Nearest declaration of each of `name`, `getName`, `isName`, `setName`
    fn resolve_property(&self, class: ClassId, name: &str) -> Vec<MethodId> {
        let capitalized = capitalize(name);
        let candidates = [
            name.to_string(),
            format!("get{}", capitalized),
            format!("is{}", capitalized),
            format!("set{}", capitalized),
        ];
        let lineage = self.index.lineage(class);
        let mut methods = Vec::new();
        for candidate in &candidates {
            for id in self.first_in_lineage(&lineage, |m| &m.name == candidate) {
                if !methods.contains(&id) {
                    methods.push(id);
                }
            }
        }
        methods
    }

    fn first_in_lineage(
        &self,
        lineage: &[ClassId],
        predicate: impl Fn(&crate::model::MethodModel) -> bool,
    ) -> Vec<MethodId> {
        for &class in lineage {
            let hits: Vec<MethodId> = self
                .index
                .class(class)
                .methods
                .iter()
                .enumerate()
                .filter(|(_, m)| predicate(m))
                .map(|(i, _)| MethodId::new(class, i))
                .collect();
            if !hits.is_empty() {
                return hits;
            }
        }
        Vec::new()
    }

    fn add_global_command(
        &mut self,
        from: NodeKind,
        reference: &TemplateBindingReference,
        diagnostics: &mut Diagnostics,
    ) {
        if reference.resolution == Resolution::Opaque {
            // Global commands are roots already
            debug!("Dynamic global command `{}`", reference.name);
            return;
        }

        let mut targets = Vec::new();
        for class in self.index.classes() {
            for (i, method) in class.methods.iter().enumerate() {
                if method
                    .binding_names(AnnotationKind::GlobalCommand)
                    .contains(&reference.name.as_str())
                {
                    targets.push(MethodId::new(class.id, i));
                }
            }
        }

        if targets.is_empty() {
            diagnostics.push(Diagnostic::unresolved(
                &reference.path,
                reference.line,
                format!("global command `{}` is not declared by any class", reference.name),
            ));
        }
        for target in targets {
            let kind = EdgeKind::TemplateRef(reference.kind, reference.resolution);
            let edge = Edge::new(kind, &reference.path, reference.line);
            self.connect(from, NodeKind::Method(target), edge, diagnostics);
        }
    }

    fn add_inclusion_edges(&mut self, contexts: &[Vec<ContextChain>], diagnostics: &mut Diagnostics) {
        let templates = self.templates;
        for (t, unit) in templates.iter().enumerate() {
            for (d, directive) in unit.includes.iter().enumerate() {
                let Some(targets) = self.includes.get(&(t, d)).cloned() else {
                    continue;
                };

                let sources: Vec<ClassId> = match directive.visible.last() {
                    Some(&b) => self.bound[t][b].into_iter().collect(),
                    None => contexts[t]
                        .iter()
                        .filter_map(|chain| chain.last().map(|(_, c)| *c))
                        .collect(),
                };

                for target in targets {
                    let included: Vec<ClassId> = self.bound[target].iter().flatten().copied().collect();
                    for &class in &included {
                        for &source in &sources {
                            if source == class {
                                continue;
                            }
                            let edge = Edge::new(EdgeKind::Inclusion, &unit.path, directive.line);
                            self.connect(NodeKind::Class(source), NodeKind::Class(class), edge, diagnostics);
                        }
                    }
                }
            }
        }
    }
}

/// Path components with `.` and `..` folded away
fn normalize(path: &Path) -> Vec<String> {
    let mut parts: Vec<String> = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::ParentDir => {
                parts.pop();
            }
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }
    parts
}
