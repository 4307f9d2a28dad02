//! Target dependency DAG.
//!
//! The graph is built once from the target table and checked for unknown
//! prerequisites and cycles before anything runs. Execution order for a
//! requested target is a depth-first post-order over the declared
//! prerequisite lists, so prerequisites always come first and ties follow
//! declaration order.

use std::collections::{HashMap, HashSet};

use petgraph::Direction;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};

use super::types::{GraphError, TargetDef, UNIT_TEST_PREFIX};

/// A DAG of targets with edges from prerequisite to dependent.
#[derive(Debug, Clone)]
pub struct TargetGraph {
  graph: DiGraph<String, ()>,

  /// Map from target name to node index.
  nodes: HashMap<String, NodeIndex>,

  /// Definitions in declaration order.
  defs: Vec<TargetDef>,
}

impl TargetGraph {
  /// Build and validate a graph from target definitions.
  pub fn new(defs: Vec<TargetDef>) -> Result<Self, GraphError> {
    let mut graph = DiGraph::new();
    let mut nodes = HashMap::new();

    for def in &defs {
      if nodes.contains_key(&def.name) {
        return Err(GraphError::DuplicateTarget(def.name.clone()));
      }
      let idx = graph.add_node(def.name.clone());
      nodes.insert(def.name.clone(), idx);
    }

    let mut dag = Self { graph, nodes, defs };
    for i in 0..dag.defs.len() {
      dag.connect(i)?;
    }
    dag.verify_acyclic()?;

    Ok(dag)
  }

  /// Add edges for the prerequisites of `defs[index]`.
  fn connect(&mut self, index: usize) -> Result<(), GraphError> {
    let def = &self.defs[index];
    let dependent = self.nodes[&def.name];
    for prerequisite in &def.prerequisites {
      let Some(&dep_idx) = self.nodes.get(prerequisite) else {
        return Err(GraphError::UnknownPrerequisite {
          target: def.name.clone(),
          prerequisite: prerequisite.clone(),
        });
      };
      self.graph.add_edge(dep_idx, dependent, ());
    }
    Ok(())
  }

  fn verify_acyclic(&self) -> Result<(), GraphError> {
    toposort(&self.graph, None)
      .map(|_| ())
      .map_err(|cycle| GraphError::Cycle(self.graph[cycle.node_id()].clone()))
  }

  /// Add a target after construction (used for `ut-<name>`).
  pub fn insert(&mut self, def: TargetDef) -> Result<(), GraphError> {
    if self.nodes.contains_key(&def.name) {
      return Err(GraphError::DuplicateTarget(def.name));
    }
    let idx = self.graph.add_node(def.name.clone());
    self.nodes.insert(def.name.clone(), idx);
    self.defs.push(def);
    self.connect(self.defs.len() - 1)?;
    self.verify_acyclic()
  }

  /// Look up a target, synthesizing `ut-<name>` targets on demand.
  ///
  /// Returns a graph that contains the requested target.
  pub fn with_target(&self, name: &str) -> Result<TargetGraph, GraphError> {
    if self.contains(name) {
      return Ok(self.clone());
    }
    match name.strip_prefix(UNIT_TEST_PREFIX) {
      Some(test) => {
        let mut graph = self.clone();
        graph.insert(TargetDef::unit_test(test)?)?;
        Ok(graph)
      }
      None => Err(GraphError::UnknownTarget(name.to_string())),
    }
  }

  pub fn contains(&self, name: &str) -> bool {
    self.nodes.contains_key(name)
  }

  pub fn get(&self, name: &str) -> Option<&TargetDef> {
    self.defs.iter().find(|d| d.name == name)
  }

  /// All targets in declaration order.
  pub fn targets(&self) -> &[TargetDef] {
    &self.defs
  }

  /// Targets that must run for `name`, prerequisites first, `name` last.
  pub fn execution_order(&self, name: &str) -> Result<Vec<&TargetDef>, GraphError> {
    if !self.contains(name) {
      return Err(GraphError::UnknownTarget(name.to_string()));
    }
    let mut order = Vec::new();
    let mut visited = HashSet::new();
    self.visit(name, &mut visited, &mut order);
    Ok(order)
  }

  fn visit<'a>(&'a self, name: &str, visited: &mut HashSet<String>, order: &mut Vec<&'a TargetDef>) {
    if !visited.insert(name.to_string()) {
      return;
    }
    let Some(def) = self.get(name) else {
      return;
    };
    for prerequisite in &def.prerequisites {
      self.visit(prerequisite, visited, order);
    }
    order.push(def);
  }

  /// Direct prerequisites of a target, in declaration order.
  pub fn prerequisites(&self, name: &str) -> Vec<String> {
    self.get(name).map(|d| d.prerequisites.clone()).unwrap_or_default()
  }

  /// Targets that directly depend on `name`.
  pub fn dependents(&self, name: &str) -> Vec<String> {
    let Some(&idx) = self.nodes.get(name) else {
      return Vec::new();
    };
    let mut names: Vec<String> = self
      .graph
      .neighbors_directed(idx, Direction::Outgoing)
      .map(|dep| self.graph[dep].clone())
      .collect();
    names.sort();
    names
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::target::types::*;

  fn group(name: &str, prerequisites: &[&str]) -> TargetDef {
    TargetDef {
      name: name.to_string(),
      prerequisites: prerequisites.iter().map(|p| p.to_string()).collect(),
      kind: TargetKind::Group,
      freshness: Freshness::Always,
      description: String::new(),
    }
  }

  fn names(order: &[&TargetDef]) -> Vec<String> {
    order.iter().map(|d| d.name.clone()).collect()
  }

  #[test]
  fn standard_graph_is_valid() {
    let graph = TargetGraph::new(standard_targets()).unwrap();
    assert_eq!(graph.targets().len(), 7);
  }

  #[test]
  fn all_runs_prerequisites_first() {
    let graph = TargetGraph::new(standard_targets()).unwrap();
    let order = graph.execution_order(ALL).unwrap();
    assert_eq!(names(&order), vec![THIRD_PARTY, BUILD, CONFIGURE_INPLACE, ALL]);
  }

  #[test]
  fn installer_order() {
    let graph = TargetGraph::new(standard_targets()).unwrap();
    let order = graph.execution_order(INSTALLER).unwrap();
    assert_eq!(names(&order), vec![THIRD_PARTY, BUILD, INSTALLER]);
  }

  #[test]
  fn clean_has_no_prerequisites() {
    let graph = TargetGraph::new(standard_targets()).unwrap();
    assert_eq!(names(&graph.execution_order(CLEAN).unwrap()), vec![CLEAN]);
  }

  #[test]
  fn ties_follow_declaration_order() {
    let graph = TargetGraph::new(vec![
      group("b", &[]),
      group("a", &[]),
      group("top", &["b", "a"]),
    ])
    .unwrap();
    assert_eq!(names(&graph.execution_order("top").unwrap()), vec!["b", "a", "top"]);
  }

  #[test]
  fn diamond_visits_shared_prerequisite_once() {
    //     base
    //    /    \
    //  left  right
    //    \    /
    //     top
    let graph = TargetGraph::new(vec![
      group("base", &[]),
      group("left", &["base"]),
      group("right", &["base"]),
      group("top", &["left", "right"]),
    ])
    .unwrap();
    assert_eq!(
      names(&graph.execution_order("top").unwrap()),
      vec!["base", "left", "right", "top"]
    );
  }

  #[test]
  fn cycle_is_detected_at_construction() {
    let err = TargetGraph::new(vec![group("a", &["b"]), group("b", &["a"])]).unwrap_err();
    assert!(matches!(err, GraphError::Cycle(_)));
  }

  #[test]
  fn self_dependency_is_a_cycle() {
    let err = TargetGraph::new(vec![group("a", &["a"])]).unwrap_err();
    assert!(matches!(err, GraphError::Cycle(name) if name == "a"));
  }

  #[test]
  fn unknown_prerequisite_is_rejected() {
    let err = TargetGraph::new(vec![group("a", &["missing"])]).unwrap_err();
    assert!(matches!(
      err,
      GraphError::UnknownPrerequisite { ref target, ref prerequisite } if target == "a" && prerequisite == "missing"
    ));
  }

  #[test]
  fn duplicate_targets_are_rejected() {
    let err = TargetGraph::new(vec![group("a", &[]), group("a", &[])]).unwrap_err();
    assert!(matches!(err, GraphError::DuplicateTarget(_)));
  }

  #[test]
  fn unknown_target_lookup() {
    let graph = TargetGraph::new(standard_targets()).unwrap();
    assert!(matches!(graph.with_target("deploy"), Err(GraphError::UnknownTarget(_))));
    assert!(matches!(graph.execution_order("deploy"), Err(GraphError::UnknownTarget(_))));
  }

  #[test]
  fn unit_test_target_is_synthesized() {
    let graph = TargetGraph::new(standard_targets()).unwrap();
    let extended = graph.with_target("ut-foo").unwrap();
    let order = extended.execution_order("ut-foo").unwrap();
    assert_eq!(names(&order), vec![THIRD_PARTY, BUILD, CONFIGURE_INPLACE, "ut-foo"]);

    // The base graph is left untouched
    assert!(!graph.contains("ut-foo"));
  }

  #[test]
  fn invalid_unit_test_name() {
    let graph = TargetGraph::new(standard_targets()).unwrap();
    assert!(matches!(graph.with_target("ut-../x"), Err(GraphError::InvalidTestName(_))));
    assert!(matches!(graph.with_target("ut-"), Err(GraphError::InvalidTestName(_))));
  }

  #[test]
  fn dependents_and_prerequisites() {
    let graph = TargetGraph::new(standard_targets()).unwrap();
    assert_eq!(graph.prerequisites(INSTALLER), vec![THIRD_PARTY, BUILD]);
    assert_eq!(
      graph.dependents(BUILD),
      vec![ALL, CONFIGURE_INPLACE, INSTALLER, UNITTEST]
    );
    assert!(graph.dependents(ALL).is_empty());
  }
}
