//! Project dependency graph construction and cycle detection.

use std::collections::{HashMap, HashSet};

use tsbuild_common::{ProjectId, ProjectRegistry};
use tsbuild_diagnostics::{Category, Diagnostic, DiagnosticCode, Reporter};

use crate::config_cache::{ConfigCache, ConfigEntry};

/// Code for an illegal reference cycle.
pub const GRAPH_CYCLE: DiagnosticCode = DiagnosticCode::new(Category::Graph, 201);

/// The dependency graph of one build: the ordered build queue plus the
/// bidirectional reference map.
///
/// Within the queue, every reference edge has the referenced project at a
/// strictly earlier index than the referencing one, so walking it front to
/// back builds leaves first. When construction fails (parse failure or an
/// illegal cycle) the queue is `None`, but the reference maps still hold
/// every traversed edge so watch invalidation can locate dependents.
#[derive(Debug, Default)]
pub struct BuildGraph {
    /// Projects in dependency-leaves-first order, each exactly once;
    /// `None` when construction failed.
    pub build_queue: Option<Vec<ProjectId>>,
    /// parent → projects it references (upstream edges), deduplicated.
    pub children: HashMap<ProjectId, Vec<ProjectId>>,
    /// child → projects that reference it (downstream edges), deduplicated.
    pub parents: HashMap<ProjectId, Vec<ProjectId>>,
}

impl BuildGraph {
    /// Collects every project that transitively references `id`, excluding
    /// `id` itself. Order is unspecified; callers re-classify each entry
    /// independently.
    pub fn transitive_dependents(&self, id: ProjectId) -> Vec<ProjectId> {
        let mut seen = HashSet::from([id]);
        let mut out = Vec::new();
        let mut work = vec![id];
        while let Some(current) = work.pop() {
            for &parent in self.parents.get(&current).into_iter().flatten() {
                if seen.insert(parent) {
                    out.push(parent);
                    work.push(parent);
                }
            }
        }
        out
    }
}

/// Builds the dependency graph for the given roots.
///
/// Depth-first search with three-color marking; projects enter the build
/// queue on post-order so leaves come first. When a configuration fails to
/// parse or an illegal cycle is found, traversal still completes — marking
/// every node and recording every edge — and the returned graph has no
/// build queue.
pub fn build_graph(
    roots: &[ProjectId],
    cache: &mut ConfigCache,
    registry: &ProjectRegistry,
    reporter: &dyn Reporter,
) -> BuildGraph {
    let mut builder = GraphBuilder {
        cache,
        registry,
        reporter,
        graph: BuildGraph::default(),
        queue: Vec::new(),
        temporary: HashSet::new(),
        permanent: HashSet::new(),
        stack: Vec::new(),
        failed: false,
    };
    for &root in roots {
        builder.visit(root, false);
    }
    let mut graph = builder.graph;
    if !builder.failed {
        graph.build_queue = Some(builder.queue);
    }
    graph
}

struct GraphBuilder<'a> {
    cache: &'a mut ConfigCache,
    registry: &'a ProjectRegistry,
    reporter: &'a dyn Reporter,
    graph: BuildGraph,
    queue: Vec<ProjectId>,
    temporary: HashSet<ProjectId>,
    permanent: HashSet<ProjectId>,
    stack: Vec<ProjectId>,
    failed: bool,
}

impl GraphBuilder<'_> {
    fn visit(&mut self, id: ProjectId, in_circular_context: bool) {
        if self.permanent.contains(&id) {
            return;
        }
        if self.temporary.contains(&id) {
            if !in_circular_context {
                let mut message =
                    String::from("Project references may not form a circular graph. Cycle detected:");
                for &entry in &self.stack {
                    message.push('\n');
                    message.push_str(&self.registry.config_path(entry).display().to_string());
                }
                self.reporter
                    .report_diagnostic(&Diagnostic::error(GRAPH_CYCLE, message));
                self.failed = true;
            }
            return;
        }

        self.temporary.insert(id);
        self.stack.push(id);

        let acquired: Result<Vec<(ProjectId, bool)>, Diagnostic> =
            match self.cache.acquire(self.registry, id) {
                ConfigEntry::Failed(diag) => Err(diag.clone()),
                ConfigEntry::Parsed(project) => Ok(project
                    .references
                    .iter()
                    .map(|r| (self.registry.intern_path(&r.path), r.circular))
                    .collect()),
            };
        let parsed_ok = match acquired {
            Err(diag) => {
                self.reporter.report_diagnostic(&diag);
                self.failed = true;
                false
            }
            Ok(references) => {
                // Edges are registered whether or not the subtree succeeds, so
                // a later invalidation of the child can still find us.
                for &(child, circular) in &references {
                    self.add_edge(id, child);
                    self.visit(child, in_circular_context || circular);
                }
                true
            }
        };

        self.stack.pop();
        self.temporary.remove(&id);
        self.permanent.insert(id);
        if parsed_ok {
            self.queue.push(id);
        }
    }

    fn add_edge(&mut self, parent: ProjectId, child: ProjectId) {
        let children = self.graph.children.entry(parent).or_default();
        if !children.contains(&child) {
            children.push(child);
        }
        let parents = self.graph.parents.entry(child).or_default();
        if !parents.contains(&parent) {
            parents.push(parent);
        }
    }
}
