use crate::config::Config;
use crate::graph::{EdgeKind, NodeKind, UsageGraph};
use crate::model::{ClassId, MethodId, ProjectIndex, ReferenceKind};
use std::collections::{BTreeSet, HashSet};
use tracing::{debug, info};

/// Detects the roots of the reachability closure
pub struct RootSetDetector<'a> {
    config: &'a Config,
    index: &'a ProjectIndex,
    graph: &'a UsageGraph,
}

impl<'a> RootSetDetector<'a> {
    pub fn new(config: &'a Config, index: &'a ProjectIndex, graph: &'a UsageGraph) -> Self {
        Self {
            config,
            index,
            graph,
        }
    }

    /// Classes in analysis scope: suffix matches and template-bound classes,
    /// plus their ancestors
    pub fn viewmodels(&self) -> BTreeSet<ClassId> {
        let mut viewmodels = BTreeSet::new();
        for class in self.index.classes() {
            let bound = self
                .graph
                .edges_into(NodeKind::Class(class.id))
                .iter()
                .any(|(_, edge)| edge.kind == EdgeKind::Binding);
            if bound || self.config.is_viewmodel_name(&class.name) {
                viewmodels.extend(self.index.lineage(class.id));
            }
        }
        debug!("{} classes are ViewModels", viewmodels.len());
        viewmodels
    }

    /// Detect every root node
    pub fn detect(&self, viewmodels: &BTreeSet<ClassId>) -> HashSet<NodeKind> {
        let mut roots: HashSet<NodeKind> = self.graph.nodes().filter(|n| matches!(n, NodeKind::Template(_))).collect();

        // 1. Lifecycle and global command methods, retained methods, out-of-scope classes
        for class in self.index.classes() {
            let in_scope = viewmodels.contains(&class.id);
            for id in class.method_ids() {
                let method = self.index.method(id);
                if !in_scope || method.is_init() || method.is_global_command() || self.is_retained(id) {
                    roots.insert(NodeKind::Method(id));
                }
            }
        }

        // 2. Template references
        for node in self.graph.nodes() {
            for (_, edge) in self.graph.edges_into(node) {
                if edge.kind.is_static_ref() {
                    roots.insert(node);
                } else if let NodeKind::Class(class) = node {
                    if edge.kind.is_opaque_ref(ReferenceKind::Command) {
                        self.add_opaque_commands(class, &mut roots);
                    } else if edge.kind.is_opaque_ref(ReferenceKind::Property) {
                        self.add_accessors(class, &mut roots);
                    }
                }
            }
        }

        info!("Detected {} roots", roots.len());
        roots
    }

    /// Whether a configured retain pattern protects this method
    pub fn is_retained(&self, id: MethodId) -> bool {
        let class = self.index.class(id.class);
        self.config
            .should_retain(&class.name, &class.qualified_name, &self.index.method(id).name)
    }

    /// Own and inherited command methods
    fn add_opaque_commands(&self, class: ClassId, roots: &mut HashSet<NodeKind>) {
        for owner in self.index.lineage(class) {
            for id in self.index.class(owner).method_ids() {
                if self.index.method(id).is_any_command() {
                    debug!("Opaque command keeps {}", self.index.method(id).name);
                    roots.insert(NodeKind::Method(id));
                }
            }
        }
    }

    fn add_accessors(&self, class: ClassId, roots: &mut HashSet<NodeKind>) {
        for owner in self.index.lineage(class) {
            for index in self.index.class(owner).accessor_indexes() {
                roots.insert(NodeKind::Method(MethodId::new(owner, index)));
            }
        }
    }
}
