//! Crew - runs a set of tasks in dependency order.
//!
//! # Execution
//! 1. `Crew::new` validates membership and the dependency graph, and fixes
//!    the execution order up front
//! 2. `Crew::execute` runs one task at a time, feeding each agent the
//!    results of every task upstream of it
//! 3. The first failing task aborts the run; later tasks never start

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;

use crate::agents::Agent;
use crate::task::{GraphError, Task, TaskError, TaskGraph, TaskId, TaskOutput};

/// Aggregated result of a crew run.
#[derive(Debug, Clone, Serialize)]
pub struct CrewOutput {
    /// Raw text of the last task executed
    pub raw: String,
    /// Every task output, in execution order
    pub tasks_output: Vec<TaskOutput>,
}

pub struct Crew {
    agents: Vec<Arc<Agent>>,
    tasks: Vec<Task>,
    graph: TaskGraph,
    order: Vec<usize>,
    executed: bool,
}

impl Crew {
    /// Assemble a crew.
    ///
    /// # Errors
    /// - `CrewError::NoTasks` for an empty task list
    /// - `CrewError::AgentNotInCrew` when a task's agent was not passed in
    /// - `CrewError::Graph` for duplicate ids, unknown or self references, cycles
    pub fn new(agents: Vec<Arc<Agent>>, tasks: Vec<Task>) -> Result<Self, CrewError> {
        if tasks.is_empty() {
            return Err(CrewError::NoTasks);
        }

        let members: HashSet<_> = agents.iter().map(|a| a.id()).collect();
        if let Some(task) = tasks.iter().find(|t| !members.contains(&t.agent().id())) {
            return Err(CrewError::AgentNotInCrew {
                task: task.id(),
                role: task.agent().role().to_string(),
            });
        }

        let graph = TaskGraph::new(
            tasks
                .iter()
                .map(|t| (t.id(), t.context().to_vec()))
                .collect(),
        )?;
        let order = graph.execution_order()?;

        Ok(Self {
            agents,
            tasks,
            graph,
            order,
            executed: false,
        })
    }

    pub fn agents(&self) -> &[Arc<Agent>] {
        &self.agents
    }

    /// Tasks in declaration order.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Task ids in the order they will run.
    pub fn execution_order(&self) -> Vec<TaskId> {
        self.order.iter().map(|&i| self.graph.id(i)).collect()
    }

    /// Run every task once, sequentially.
    ///
    /// # Errors
    /// - `CrewError::TaskFailed` for the first task whose agent fails
    /// - `CrewError::AlreadyExecuted` on a second call
    pub async fn execute(&mut self) -> Result<CrewOutput, CrewError> {
        if self.executed {
            return Err(CrewError::AlreadyExecuted);
        }
        self.executed = true;

        let total = self.order.len();
        let mut completed: HashSet<TaskId> = HashSet::with_capacity(total);
        let mut tasks_output: Vec<TaskOutput> = Vec::with_capacity(total);

        for step in 0..total {
            let index = self.order[step];
            let input = self.input_for(index);

            let task = &mut self.tasks[index];
            task.start(&completed)?;

            let agent = Arc::clone(task.agent());
            tracing::info!(
                "Task {}/{} started: {} ({})",
                step + 1,
                total,
                agent.role(),
                task.id()
            );

            let result = agent.perform_with_lookup(&input, task.lookup_query()).await;
            match result {
                Ok(raw) => {
                    let output = task.complete(raw)?.clone();
                    tracing::info!(
                        "Task {}/{} completed: {} ({} chars)",
                        step + 1,
                        total,
                        agent.role(),
                        output.raw.chars().count()
                    );
                    completed.insert(output.task_id);
                    tasks_output.push(output);
                }
                Err(e) => {
                    let reason = e.to_string();
                    task.fail(reason.clone())?;
                    tracing::error!(
                        "Task {}/{} failed: {} - {}",
                        step + 1,
                        total,
                        agent.role(),
                        reason
                    );
                    return Err(CrewError::TaskFailed {
                        task_id: task.id(),
                        description: task.description().to_string(),
                        reason,
                    });
                }
            }
        }

        let raw = tasks_output
            .last()
            .map(|o| o.raw.clone())
            .unwrap_or_default();
        Ok(CrewOutput { raw, tasks_output })
    }

    /// Effective input for a task: its own prompt plus every upstream
    /// result, transitively, in execution order.
    fn input_for(&self, index: usize) -> String {
        let ancestors = self.graph.ancestors(index);
        let upstream: Vec<&TaskOutput> = self
            .order
            .iter()
            .filter(|i| ancestors.contains(i))
            .filter_map(|&i| self.tasks[i].output())
            .collect();
        self.tasks[index].effective_input(&upstream)
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum CrewError {
    #[error("A crew needs at least one task")]
    NoTasks,

    #[error("Task {task} is assigned to agent '{role}', which is not a crew member")]
    AgentNotInCrew { task: TaskId, role: String },

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Task(#[from] TaskError),

    #[error("Task '{description}' failed: {reason}")]
    TaskFailed {
        task_id: TaskId,
        description: String,
        reason: String,
    },

    #[error("This crew has already been executed")]
    AlreadyExecuted,
}
