//! Task dependency graph and scheduling order.
//!
//! # Invariants
//! - Every dependency names a node of the graph
//! - No node depends on itself
//! - Node ids are unique
//! - The graph is acyclic (checked when computing the order)

use std::collections::{BTreeSet, HashMap};

use super::TaskId;

/// Directed acyclic graph of tasks. Edge `a -> b` means "b depends on a".
///
/// Node indices are declaration positions.
#[derive(Debug, Clone)]
pub struct TaskGraph {
    ids: Vec<TaskId>,
    deps: Vec<Vec<usize>>,
}

impl TaskGraph {
    /// Build a graph from `(task, dependencies)` pairs in declaration order.
    ///
    /// # Errors
    /// Returns `Err` for duplicate ids, unknown dependencies or
    /// self-dependencies. Cycles are reported by [`execution_order`].
    ///
    /// [`execution_order`]: TaskGraph::execution_order
    pub fn new(nodes: Vec<(TaskId, Vec<TaskId>)>) -> Result<Self, GraphError> {
        let mut index: HashMap<TaskId, usize> = HashMap::with_capacity(nodes.len());
        for (i, (id, _)) in nodes.iter().enumerate() {
            if index.insert(*id, i).is_some() {
                return Err(GraphError::DuplicateTask(*id));
            }
        }

        let mut ids = Vec::with_capacity(nodes.len());
        let mut deps = Vec::with_capacity(nodes.len());
        for (id, upstream) in nodes {
            let mut resolved = Vec::with_capacity(upstream.len());
            for dep in upstream {
                if dep == id {
                    return Err(GraphError::SelfDependency(id));
                }
                let &dep_index = index.get(&dep).ok_or(GraphError::UnknownDependency {
                    task: id,
                    dependency: dep,
                })?;
                if !resolved.contains(&dep_index) {
                    resolved.push(dep_index);
                }
            }
            ids.push(id);
            deps.push(resolved);
        }

        Ok(Self { ids, deps })
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn id(&self, index: usize) -> TaskId {
        self.ids[index]
    }

    /// Direct dependencies of a node, in the order they were declared.
    pub fn dependencies(&self, index: usize) -> &[usize] {
        &self.deps[index]
    }

    /// Topological order (Kahn's algorithm).
    ///
    /// Among ready nodes the one declared first runs first, so a chain
    /// declared in dependency order runs exactly in declaration order.
    ///
    /// # Errors
    /// Returns `GraphError::CircularDependency` with the nodes left unscheduled.
    pub fn execution_order(&self) -> Result<Vec<usize>, GraphError> {
        let n = self.ids.len();
        let mut in_degree = vec![0usize; n];
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); n];

        for (i, deps) in self.deps.iter().enumerate() {
            for &dep in deps {
                dependents[dep].push(i);
                in_degree[i] += 1;
            }
        }

        let mut ready: BTreeSet<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();
        let mut order = Vec::with_capacity(n);

        while let Some(node) = ready.pop_first() {
            order.push(node);
            for &next in &dependents[node] {
                in_degree[next] -= 1;
                if in_degree[next] == 0 {
                    ready.insert(next);
                }
            }
        }

        if order.len() != n {
            let stuck = (0..n)
                .filter(|&i| in_degree[i] > 0)
                .map(|i| self.ids[i])
                .collect();
            return Err(GraphError::CircularDependency(stuck));
        }
        Ok(order)
    }

    /// Every transitive dependency of `index` (excluding itself), unordered.
    pub fn ancestors(&self, index: usize) -> BTreeSet<usize> {
        let mut seen = BTreeSet::new();
        let mut stack: Vec<usize> = self.deps[index].clone();
        while let Some(node) = stack.pop() {
            if seen.insert(node) {
                stack.extend(self.deps[node].iter().copied());
            }
        }
        seen
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    #[error("Task {0} is declared more than once")]
    DuplicateTask(TaskId),

    #[error("Task {task} depends on unknown task {dependency}")]
    UnknownDependency { task: TaskId, dependency: TaskId },

    #[error("Task {0} depends on itself")]
    SelfDependency(TaskId),

    #[error("Circular dependency detected among {} task(s)", .0.len())]
    CircularDependency(Vec<TaskId>),
}
