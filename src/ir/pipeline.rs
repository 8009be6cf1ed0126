use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use petgraph::algo::toposort;
use petgraph::graph::NodeIndex;
use petgraph::Graph;
use thiserror::Error;
use tracing::{debug, warn};

use super::expr_node::{walk, Expr, NodeObserver};
use super::visitor::Visitor;
use crate::error::TransformError;

/// Either a rewriting engine or a read-only observer.
pub enum TransformKind {
    /// Replaces the tree with the visitor's output
    Rewrite(Arc<dyn Visitor + Send + Sync>),
    /// Walks the tree without modifying it (requires Mutex for interior mutability)
    Observe(Arc<Mutex<dyn NodeObserver + Send>>),
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("transform dependency cycle involving '{transform}'")]
    Cycle { transform: String },

    #[error("transform '{transform}' depends on unknown transform '{dependency}'")]
    MissingDependency { transform: String, dependency: String },

    #[error("tree depth {depth} exceeds the pipeline limit of {limit}")]
    DepthLimitExceeded { depth: usize, limit: usize },

    #[error("transform '{id}' failed: {source}")]
    Transform {
        id: String,
        #[source]
        source: TransformError,
    },
}

/// Manages a pipeline of transformations applied to an expression tree.
/// Transformations are organized in a dependency graph and executed in topological order,
/// ensuring that dependent transformations run after their prerequisites.
pub struct Pipeline {
    /// The dependency graph of transformations.
    graph: Graph<Transform, ()>,
    /// Maps transformation IDs to their indices in the graph.
    node_indices: HashMap<String, NodeIndex>,
    depth_limit: Option<usize>,
}

/// A single transformation in the pipeline, including its engine and dependencies.
pub struct Transform {
    /// Unique identifier for the transformation.
    pub id: String,
    /// List of transformation IDs this transform depends on.
    pub dependencies: Vec<String>,
    pub kind: TransformKind,
}

impl Transform {
    pub fn rewrite(id: &str, dependencies: &[&str], visitor: Arc<dyn Visitor + Send + Sync>) -> Self {
        Transform {
            id: id.to_string(),
            dependencies: dependencies.iter().map(|d| d.to_string()).collect(),
            kind: TransformKind::Rewrite(visitor),
        }
    }

    pub fn observe(id: &str, dependencies: &[&str], observer: Arc<Mutex<dyn NodeObserver + Send>>) -> Self {
        Transform {
            id: id.to_string(),
            dependencies: dependencies.iter().map(|d| d.to_string()).collect(),
            kind: TransformKind::Observe(observer),
        }
    }
}

impl Clone for Transform {
    fn clone(&self) -> Self {
        Transform {
            id: self.id.clone(),
            dependencies: self.dependencies.clone(),
            kind: match &self.kind {
                TransformKind::Rewrite(v) => TransformKind::Rewrite(Arc::clone(v)),
                TransformKind::Observe(o) => TransformKind::Observe(Arc::clone(o)),
            },
        }
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Pipeline {
    /// Creates a new, empty transformation pipeline with no depth limit.
    pub fn new() -> Self {
        Pipeline {
            graph: Graph::new(),
            node_indices: HashMap::new(),
            depth_limit: None,
        }
    }

    /// Rejects trees deeper than `limit` before any transform runs.
    pub fn with_depth_limit(mut self, limit: usize) -> Self {
        self.depth_limit = Some(limit);
        self
    }

    /// Adds a transformation to the pipeline, establishing its dependencies.
    ///
    /// Dependencies may be added before or after their dependents; edges are wired
    /// whichever side arrives second. Re-adding an id replaces the earlier transform.
    ///
    /// # Arguments
    /// * `transform` - The transformation to add.
    pub fn add_transform(&mut self, transform: Transform) {
        self.remove_transform(&transform.id);
        let id = transform.id.clone();
        let dependencies = transform.dependencies.clone();
        let node = self.graph.add_node(transform);
        self.node_indices.insert(id.clone(), node);

        for dep_id in &dependencies {
            if let Some(dep_node) = self.node_indices.get(dep_id) {
                self.graph.add_edge(*dep_node, node, ());
            }
        }
        let dependents: Vec<NodeIndex> = self
            .graph
            .node_indices()
            .filter(|&idx| idx != node && self.graph[idx].dependencies.contains(&id))
            .collect();
        for dependent in dependents {
            self.graph.add_edge(node, dependent, ());
        }
    }

    /// Removes a transformation from the pipeline by its ID.
    ///
    /// # Arguments
    /// * `id` - The ID of the transformation to remove.
    pub fn remove_transform(&mut self, id: &str) {
        if let Some(node) = self.node_indices.remove(id) {
            self.graph.remove_node(node);
            // remove_node swaps the last node into the freed slot
            if let Some(moved) = self.graph.node_weight(node) {
                self.node_indices.insert(moved.id.clone(), node);
            }
        }
    }

    /// Ids of the registered transforms in execution order.
    pub fn order(&self) -> Result<Vec<String>, PipelineError> {
        self.check_dependencies()?;
        let order = toposort(&self.graph, None).map_err(|cycle| PipelineError::Cycle {
            transform: self.graph[cycle.node_id()].id.clone(),
        })?;
        Ok(order.into_iter().map(|idx| self.graph[idx].id.clone()).collect())
    }

    /// Applies all transformations in the pipeline to the given tree in topological order.
    ///
    /// # Arguments
    /// * `tree` - The input tree to transform.
    ///
    /// # Returns
    /// The tree produced by the last `Rewrite` transform, or the input itself when the
    /// pipeline holds only observers.
    ///
    /// # Note
    /// - Rewrite transforms produce a new version of the tree
    /// - Observe transforms see the tree as left by the transforms ordered before them
    pub fn apply(&self, tree: &Arc<Expr>) -> Result<Arc<Expr>, PipelineError> {
        if let Some(limit) = self.depth_limit {
            if tree.exceeds_depth(limit) {
                let depth = tree.depth();
                warn!(depth, limit, "tree rejected by pipeline depth limit");
                return Err(PipelineError::DepthLimitExceeded { depth, limit });
            }
        }

        self.check_dependencies()?;
        let order = toposort(&self.graph, None).map_err(|cycle| PipelineError::Cycle {
            transform: self.graph[cycle.node_id()].id.clone(),
        })?;

        let mut current = Arc::clone(tree);
        for node_idx in order {
            let transform = &self.graph[node_idx];
            debug!(transform = %transform.id, "applying transform");
            match &transform.kind {
                TransformKind::Rewrite(visitor) => {
                    current = visitor.visit_node(&current).map_err(|source| PipelineError::Transform {
                        id: transform.id.clone(),
                        source,
                    })?;
                }
                TransformKind::Observe(observer) => {
                    let mut observer = observer.lock();
                    walk(&current, &mut *observer);
                }
            }
        }
        Ok(current)
    }

    fn check_dependencies(&self) -> Result<(), PipelineError> {
        for transform in self.graph.node_weights() {
            if let Some(missing) = transform
                .dependencies
                .iter()
                .find(|dep| !self.node_indices.contains_key(dep.as_str()))
            {
                return Err(PipelineError::MissingDependency {
                    transform: transform.id.clone(),
                    dependency: missing.clone(),
                });
            }
        }
        Ok(())
    }
}
