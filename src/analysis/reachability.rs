use super::RootSetDetector;
use crate::config::Config;
use crate::graph::{EdgeKind, NodeKind, UsageGraph};
use crate::model::{ClassId, MethodId, ProjectIndex};
use petgraph::visit::Dfs;
use std::collections::{BTreeSet, HashSet};
use tracing::{debug, info};

/// Nodes reachable from the root set. Recomputed on every run.
#[derive(Debug, Default, Clone)]
pub struct ReachabilitySet {
    nodes: HashSet<NodeKind>,
}

impl ReachabilitySet {
    pub fn contains(&self, node: NodeKind) -> bool {
        self.nodes.contains(&node)
    }

    pub fn contains_method(&self, id: MethodId) -> bool {
        self.contains(NodeKind::Method(id))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Result of one reachability pass
#[derive(Debug, Default, Clone)]
pub struct AnalysisResult {
    /// Classes in analysis scope
    pub viewmodels: BTreeSet<ClassId>,

    pub reachable: ReachabilitySet,

    /// ViewModels nothing refers to, in index order
    pub completely_unused: Vec<ClassId>,

    /// Unreachable methods of active ViewModels, in index order
    pub unused_methods: Vec<MethodId>,
}

impl AnalysisResult {
    pub fn is_clean(&self) -> bool {
        self.completely_unused.is_empty() && self.unused_methods.is_empty()
    }
}

/// Analyzer for finding unused ViewModel classes and methods via graph traversal
pub struct ReachabilityAnalyzer<'a> {
    config: &'a Config,
    index: &'a ProjectIndex,
}

impl<'a> ReachabilityAnalyzer<'a> {
    pub fn new(config: &'a Config, index: &'a ProjectIndex) -> Self {
        Self { config, index }
    }

    /// Run the analysis over a built graph. Never fails.
    pub fn analyze(&self, graph: &UsageGraph) -> AnalysisResult {
        let detector = RootSetDetector::new(self.config, self.index, graph);
        let viewmodels = detector.viewmodels();
        let roots = detector.detect(&viewmodels);
        let reachable = self.find_reachable(graph, &roots);

        let completely_unused = self.find_completely_unused(graph, &viewmodels);
        let unused_methods =
            self.find_unused_methods(&detector, &viewmodels, &completely_unused, &reachable);

        info!(
            "{} of {} nodes reachable; {} unused ViewModels, {} unused methods",
            reachable.len(),
            graph.node_count(),
            completely_unused.len(),
            unused_methods.len()
        );

        AnalysisResult {
            viewmodels,
            reachable,
            completely_unused,
            unused_methods,
        }
    }

    /// Find all reachable nodes from the roots using DFS over every edge kind
    fn find_reachable(&self, graph: &UsageGraph, roots: &HashSet<NodeKind>) -> ReachabilitySet {
        let inner = graph.inner();
        let mut nodes = HashSet::new();
        let mut dfs = Dfs::empty(inner);

        let mut starts: Vec<NodeKind> = roots.iter().copied().collect();
        starts.sort();
        for root in starts {
            let Some(start) = graph.node_index(root) else {
                continue;
            };
            dfs.move_to(start);
            while let Some(index) = dfs.next(inner) {
                nodes.insert(graph.node(index));
            }
        }

        ReachabilitySet { nodes }
    }

    fn find_completely_unused(&self, graph: &UsageGraph, viewmodels: &BTreeSet<ClassId>) -> Vec<ClassId> {
        let used: HashSet<ClassId> = viewmodels
            .iter()
            .copied()
            .filter(|&class| self.is_directly_used(graph, class))
            .collect();

        // Classes outside the analysis scope count as active subclasses
        let is_active = |class: ClassId| !viewmodels.contains(&class) || used.contains(&class);

        viewmodels
            .iter()
            .copied()
            .filter(|&class| !used.contains(&class))
            .filter(|&class| !self.index.descendants(class).into_iter().any(|c| is_active(c)))
            .inspect(|&class| debug!("Completely unused: {}", self.index.class(class).qualified_name))
            .collect()
    }

    /// Any binding, inclusion, template reference or instantiation of the class,
    /// or a call or template reference into one of its methods from outside it
    fn is_directly_used(&self, graph: &UsageGraph, class: ClassId) -> bool {
        let into_class = graph.edges_into(NodeKind::Class(class)).into_iter().any(|(_, edge)| {
            matches!(
                edge.kind,
                EdgeKind::Binding | EdgeKind::Inclusion | EdgeKind::TemplateRef(..) | EdgeKind::Instantiation
            )
        });
        if into_class {
            return true;
        }

        let is_inside = |node: NodeKind| match node {
            NodeKind::Class(c) => c == class,
            NodeKind::Method(m) => m.class == class,
            NodeKind::Template(_) => false,
        };
        self.index.class(class).method_ids().any(|id| {
            graph.edges_into(NodeKind::Method(id)).into_iter().any(|(from, edge)| {
                matches!(edge.kind, EdgeKind::InternalCall | EdgeKind::TemplateRef(..)) && !is_inside(from)
            })
        })
    }

    fn find_unused_methods(
        &self,
        detector: &RootSetDetector<'_>,
        viewmodels: &BTreeSet<ClassId>,
        completely_unused: &[ClassId],
        reachable: &ReachabilitySet,
    ) -> Vec<MethodId> {
        let mut unused = Vec::new();
        for &class in viewmodels {
            if completely_unused.contains(&class) {
                continue;
            }
            for id in self.index.class(class).method_ids() {
                let method = self.index.method(id);
                if !(method.is_public || method.is_any_command()) || method.is_init() {
                    continue;
                }
                if reachable.contains_method(id) || detector.is_retained(id) {
                    continue;
                }
                // Overrides a supertype outside the project
                if method.declares_override() && self.index.base_slot(id).is_none() {
                    continue;
                }
                debug!("Unreachable: {}.{}", self.index.class(class).name, method.name);
                unused.push(id);
            }
        }
        unused
    }
}
