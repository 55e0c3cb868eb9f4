//! Transitive package closures over `propagated` edges.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::fmt;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Dfs;

use super::{Package, RuntimeInstance};

/// Names a runtime instance could not resolve, sorted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedNames(pub BTreeSet<String>);

impl fmt::Display for UnresolvedNames {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let names: Vec<&str> = self.0.iter().map(String::as_str).collect();
    write!(f, "{}", names.join(", "))
  }
}

/// The packages reachable from a set of roots, with an edge from every
/// package to each package it propagates.
#[derive(Debug, Clone, Default)]
pub struct Closure {
  graph: DiGraph<Package, ()>,
  nodes: HashMap<String, NodeIndex>,
}

impl Closure {
  pub fn contains(&self, name: &str) -> bool {
    self.nodes.contains_key(name)
  }

  pub fn get(&self, name: &str) -> Option<&Package> {
    self.nodes.get(name).map(|&idx| &self.graph[idx])
  }

  pub fn len(&self) -> usize {
    self.nodes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
  }

  pub fn packages(&self) -> impl Iterator<Item = &Package> {
    self.graph.node_weights()
  }

  /// Name to version for every package in the closure.
  pub fn versions(&self) -> BTreeMap<String, String> {
    self
      .packages()
      .map(|pkg| (pkg.name.clone(), pkg.version.clone()))
      .collect()
  }

  /// Every package reachable from `name`, itself included.
  pub fn reachable_from(&self, name: &str) -> BTreeSet<String> {
    let Some(&start) = self.nodes.get(name) else {
      return BTreeSet::new();
    };
    let mut reached = BTreeSet::new();
    let mut dfs = Dfs::new(&self.graph, start);
    while let Some(idx) = dfs.next(&self.graph) {
      reached.insert(self.graph[idx].name.clone());
    }
    reached
  }
}

/// Resolve `roots` and everything they propagate against `runtime`.
///
/// Resolution is total: every name that fails to resolve is collected, and the
/// error lists all of them.
pub fn resolve_closure<'a, I>(runtime: &dyn RuntimeInstance, roots: I) -> Result<Closure, UnresolvedNames>
where
  I: IntoIterator<Item = &'a str>,
{
  let mut closure = Closure::default();
  let mut missing = BTreeSet::new();
  let mut seen = BTreeSet::new();
  let mut queue: VecDeque<String> = roots.into_iter().map(str::to_string).collect();

  while let Some(name) = queue.pop_front() {
    if !seen.insert(name.clone()) {
      continue;
    }
    match runtime.resolve(&name) {
      Some(pkg) => {
        queue.extend(pkg.propagated.iter().cloned());
        let idx = closure.graph.add_node(pkg);
        closure.nodes.insert(name, idx);
      }
      None => {
        missing.insert(name);
      }
    }
  }

  if !missing.is_empty() {
    return Err(UnresolvedNames(missing));
  }

  let edges: Vec<(NodeIndex, NodeIndex)> = closure
    .graph
    .node_indices()
    .flat_map(|from| {
      let nodes = &closure.nodes;
      closure.graph[from]
        .propagated
        .iter()
        .filter_map(move |dep| nodes.get(dep).map(|&to| (from, to)))
    })
    .collect();
  for (from, to) in edges {
    closure.graph.add_edge(from, to, ());
  }

  Ok(closure)
}
