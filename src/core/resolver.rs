//! SS-004: Reference graph construction, cycle detection, and topological order.
//!
//! Edges are derived from the deferred values inside each resource's
//! attributes: `A -> B` when an attribute of A references an output of B.
//! Acyclicity is verified with a three-color DFS; the emitted order uses
//! Kahn's algorithm with alphabetical tie-breaking for determinism.

use super::construct::ResourceDecl;
use super::error::{Result, SynthError};
use super::types::ResourceType;
use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap, HashMap};
use tracing::debug;

/// Dependency graph over resource identity paths.
#[derive(Debug, Clone, Default)]
pub struct ReferenceGraph {
    /// Identity paths in traversal order
    nodes: Vec<String>,

    /// Dependent -> producers it references
    dependencies: BTreeMap<String, BTreeSet<String>>,
}

impl ReferenceGraph {
    pub fn nodes(&self) -> &[String] {
        &self.nodes
    }

    /// Producers referenced by `path`, sorted.
    pub fn dependencies_of(&self, path: &str) -> Vec<String> {
        self.dependencies
            .get(path)
            .map(|deps| deps.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn edge_count(&self) -> usize {
        self.dependencies.values().map(BTreeSet::len).sum()
    }

    /// Add a resource with explicit dependencies. Used by tests and benches
    /// that exercise ordering without building a construct tree. Every
    /// dependency must be inserted as a node too; `topological_order` rejects
    /// the graph otherwise.
    pub fn insert(&mut self, path: &str, depends_on: &[&str]) {
        if !self.dependencies.contains_key(path) {
            self.nodes.push(path.to_string());
        }
        self.dependencies
            .entry(path.to_string())
            .or_default()
            .extend(depends_on.iter().map(|d| d.to_string()));
    }
}

/// Build the reference graph for `resources` (in traversal order).
///
/// Fails with `DanglingReference` when a deferred value names a producer that
/// is not among `resources`, with `UnknownOutput` when the producer's schema
/// has no such output, and with `ShapeMismatch` when the value's shape differs
/// from the schema's.
pub fn build_reference_graph(resources: &[&ResourceDecl]) -> Result<ReferenceGraph> {
    let types: HashMap<&str, ResourceType> = resources
        .iter()
        .map(|r| (r.path.as_str(), r.resource_type))
        .collect();

    let mut graph = ReferenceGraph::default();
    for resource in resources {
        let mut deps = BTreeSet::new();
        let mut failure = None;
        for value in resource.attributes.values() {
            value.visit_tokens(&mut |token| {
                token.visit_refs(&mut |dv| {
                    if failure.is_some() {
                        return;
                    }
                    match types.get(dv.producer()) {
                        None => {
                            failure = Some(SynthError::DanglingReference {
                                path: resource.path.clone(),
                                producer: dv.producer().to_string(),
                            });
                        }
                        Some(t) => match t.schema().output(dv.output()) {
                            None => {
                                failure = Some(SynthError::UnknownOutput {
                                    path: dv.producer().to_string(),
                                    resource_type: t.to_string(),
                                    output: dv.output().to_string(),
                                });
                            }
                            Some(spec) if spec.shape != dv.shape() => {
                                failure = Some(SynthError::ShapeMismatch {
                                    context: format!(
                                        "'{}' referencing {}.{}",
                                        resource.path,
                                        dv.producer(),
                                        dv.output()
                                    ),
                                    expected: spec.shape.to_string(),
                                    found: dv.shape(),
                                });
                            }
                            Some(_) => {
                                deps.insert(dv.producer().to_string());
                            }
                        },
                    }
                });
            });
        }
        if let Some(err) = failure {
            return Err(err);
        }
        for dep in &deps {
            debug!(from = %resource.path, to = %dep, "reference edge");
        }
        graph.nodes.push(resource.path.clone());
        graph.dependencies.insert(resource.path.clone(), deps);
    }
    Ok(graph)
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

/// Verify the graph is a DAG. On failure the error lists the cycle's paths,
/// closing on the first member.
pub fn check_acyclic(graph: &ReferenceGraph) -> Result<()> {
    let mut colors: HashMap<&str, Color> = graph
        .nodes
        .iter()
        .map(|n| (n.as_str(), Color::White))
        .collect();
    let mut stack: Vec<&str> = Vec::new();

    fn visit<'g>(
        graph: &'g ReferenceGraph,
        node: &'g str,
        colors: &mut HashMap<&'g str, Color>,
        stack: &mut Vec<&'g str>,
    ) -> Result<()> {
        colors.insert(node, Color::Gray);
        stack.push(node);
        if let Some(deps) = graph.dependencies.get(node) {
            for dep in deps {
                match colors.get(dep.as_str()).copied().unwrap_or(Color::White) {
                    Color::Gray => {
                        let start = stack.iter().position(|n| *n == dep).unwrap_or(0);
                        let mut cycle: Vec<String> =
                            stack[start..].iter().map(|n| n.to_string()).collect();
                        cycle.push(dep.clone());
                        return Err(SynthError::CyclicReference { cycle });
                    }
                    Color::White => visit(graph, dep, colors, stack)?,
                    Color::Black => {}
                }
            }
        }
        stack.pop();
        colors.insert(node, Color::Black);
        Ok(())
    }

    for node in &graph.nodes {
        if colors.get(node.as_str()) == Some(&Color::White) {
            visit(graph, node, &mut colors, &mut stack)?;
        }
    }
    Ok(())
}

/// Topological order (producers before dependents) with alphabetical
/// tie-breaking. Fails with `DanglingReference` if a dependency is not a node
/// and with `CyclicReference` if the graph has a cycle.
pub fn topological_order(graph: &ReferenceGraph) -> Result<Vec<String>> {
    for (node, deps) in &graph.dependencies {
        if let Some(missing) = deps.iter().find(|d| !graph.dependencies.contains_key(*d)) {
            return Err(SynthError::DanglingReference {
                path: node.clone(),
                producer: missing.clone(),
            });
        }
    }
    check_acyclic(graph)?;

    let mut in_degree: HashMap<&str, usize> = HashMap::new();
    let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();
    for node in &graph.nodes {
        in_degree.insert(node, graph.dependencies.get(node).map_or(0, BTreeSet::len));
    }
    for (node, deps) in &graph.dependencies {
        for dep in deps {
            dependents.entry(dep.as_str()).or_default().push(node.as_str());
        }
    }

    let mut ready: BinaryHeap<Reverse<&str>> = in_degree
        .iter()
        .filter(|(_, &d)| d == 0)
        .map(|(n, _)| Reverse(*n))
        .collect();

    let mut order = Vec::with_capacity(graph.nodes.len());
    while let Some(Reverse(current)) = ready.pop() {
        order.push(current.to_string());
        for next in dependents.get(current).into_iter().flatten() {
            if let Some(degree) = in_degree.get_mut(next) {
                *degree -= 1;
                if *degree == 0 {
                    ready.push(Reverse(next));
                }
            }
        }
    }

    Ok(order)
}
