//! Core Task type and its lifecycle.
//!
//! # Invariants
//! - `id` is unique within a crew
//! - `output.is_some()` iff `status == Completed`
//! - A completed task's output never changes

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::agents::Agent;

/// Unique identifier for a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Create a new unique task ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Status of a task in its lifecycle.
///
/// # State Machine
/// ```text
/// Pending -> Running -> Completed
///                   \-> Failed
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed { reason: String },
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed { .. })
    }

    fn label(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "Pending",
            TaskStatus::Running => "Running",
            TaskStatus::Completed => "Completed",
            TaskStatus::Failed { .. } => "Failed",
        }
    }
}

/// Result of a completed task, as seen by downstream tasks and callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskOutput {
    pub task_id: TaskId,
    pub agent_role: String,
    pub description: String,
    pub raw: String,
    pub completed_at: DateTime<Utc>,
}

/// A unit of work assigned to exactly one agent.
#[derive(Debug, Clone)]
pub struct Task {
    id: TaskId,

    /// What to accomplish
    description: String,

    /// Human-readable contract for the result (not validated)
    expected_output: String,

    agent: Arc<Agent>,

    /// Upstream tasks whose results feed this one
    context: Vec<TaskId>,

    /// Query handed to tools when the agent's client cannot call them itself
    lookup_query: Option<String>,

    status: TaskStatus,
    output: Option<TaskOutput>,
}

impl Task {
    /// Create a pending task bound to `agent`.
    ///
    /// # Errors
    /// Returns `TaskError::EmptyDescription` for a blank description.
    pub fn new(
        description: impl Into<String>,
        expected_output: impl Into<String>,
        agent: &Arc<Agent>,
    ) -> Result<Self, TaskError> {
        let description = description.into();
        if description.trim().is_empty() {
            return Err(TaskError::EmptyDescription);
        }

        Ok(Self {
            id: TaskId::new(),
            description,
            expected_output: expected_output.into(),
            agent: Arc::clone(agent),
            context: Vec::new(),
            lookup_query: None,
            status: TaskStatus::Pending,
            output: None,
        })
    }

    /// Set the upstream tasks, replacing any previous list.
    pub fn with_context(mut self, upstream: Vec<TaskId>) -> Self {
        self.context = upstream;
        self
    }

    /// Add one upstream task.
    pub fn depends_on(mut self, upstream: &Task) -> Self {
        self.context.push(upstream.id);
        self
    }

    pub fn with_lookup_query(mut self, query: impl Into<String>) -> Self {
        self.lookup_query = Some(query.into());
        self
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn expected_output(&self) -> &str {
        &self.expected_output
    }

    pub fn agent(&self) -> &Arc<Agent> {
        &self.agent
    }

    pub fn context(&self) -> &[TaskId] {
        &self.context
    }

    /// Query for the tool-call fallback: the explicit lookup query, else the description.
    pub fn lookup_query(&self) -> &str {
        self.lookup_query.as_deref().unwrap_or(&self.description)
    }

    pub fn status(&self) -> &TaskStatus {
        &self.status
    }

    pub fn output(&self) -> Option<&TaskOutput> {
        self.output.as_ref()
    }

    /// Prompt presented to the agent: description, expected output, then
    /// every upstream result in the order given.
    pub fn effective_input(&self, upstream: &[&TaskOutput]) -> String {
        let mut input = format!(
            "{}\n\nExpected output: {}",
            self.description.trim(),
            self.expected_output.trim()
        );

        if !upstream.is_empty() {
            input.push_str("\n\nResults from previous tasks:");
            for output in upstream {
                input.push_str(&format!(
                    "\n\n### {} (task {})\n{}",
                    output.agent_role, output.task_id, output.raw
                ));
            }
        }
        input
    }

    // State transitions - explicit and validated

    /// Transition to Running.
    ///
    /// # Preconditions
    /// - `self.status == Pending`
    /// - every id in `context` is in `completed`
    pub fn start(&mut self, completed: &HashSet<TaskId>) -> Result<(), TaskError> {
        if self.status != TaskStatus::Pending {
            return Err(self.invalid_transition("Running"));
        }
        if let Some(missing) = self.context.iter().find(|id| !completed.contains(id)) {
            return Err(TaskError::DependencyNotCompleted {
                task: self.id,
                dependency: *missing,
            });
        }
        self.status = TaskStatus::Running;
        Ok(())
    }

    /// Transition to Completed, recording the output.
    ///
    /// # Precondition
    /// `self.status == Running`
    pub fn complete(&mut self, raw: String) -> Result<&TaskOutput, TaskError> {
        if self.status != TaskStatus::Running {
            return Err(self.invalid_transition("Completed"));
        }
        self.status = TaskStatus::Completed;
        let output: &TaskOutput = self.output.insert(TaskOutput {
            task_id: self.id,
            agent_role: self.agent.role().to_string(),
            description: self.description.clone(),
            raw,
            completed_at: Utc::now(),
        });
        Ok(output)
    }

    /// Transition to Failed.
    ///
    /// # Precondition
    /// `self.status == Running`
    pub fn fail(&mut self, reason: String) -> Result<(), TaskError> {
        if self.status != TaskStatus::Running {
            return Err(self.invalid_transition("Failed"));
        }
        self.status = TaskStatus::Failed { reason };
        Ok(())
    }

    fn invalid_transition(&self, to: &str) -> TaskError {
        TaskError::InvalidTransition {
            from: self.status.label().to_string(),
            to: to.to_string(),
        }
    }
}

/// Errors that can occur during task operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskError {
    #[error("Task description cannot be empty")]
    EmptyDescription,

    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Task {task} cannot start before task {dependency} completes")]
    DependencyNotCompleted { task: TaskId, dependency: TaskId },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::test_support::scripted_agent;

    fn task(description: &str) -> Task {
        Task::new(description, "A paragraph", &scripted_agent("Researcher", vec![])).unwrap()
    }

    #[test]
    fn new_task_is_pending_without_output() {
        let t = task("Research solar energy");
        assert_eq!(t.status(), &TaskStatus::Pending);
        assert!(t.output().is_none());
        assert!(t.context().is_empty());
    }

    #[test]
    fn blank_description_is_rejected() {
        let agent = scripted_agent("Researcher", vec![]);
        assert_eq!(
            Task::new("   ", "x", &agent).unwrap_err(),
            TaskError::EmptyDescription
        );
    }

    #[test]
    fn happy_path_records_output_once() {
        let mut t = task("Research solar energy");
        t.start(&HashSet::new()).unwrap();
        assert_eq!(t.status(), &TaskStatus::Running);

        let output = t.complete("Findings".to_string()).unwrap();
        assert_eq!(output.raw, "Findings");
        assert_eq!(output.agent_role, "Researcher");
        assert_eq!(t.status(), &TaskStatus::Completed);

        // Completed output cannot be overwritten.
        let err = t.complete("Other".to_string()).unwrap_err();
        assert_eq!(
            err,
            TaskError::InvalidTransition {
                from: "Completed".to_string(),
                to: "Completed".to_string()
            }
        );
        assert_eq!(t.output().unwrap().raw, "Findings");
    }

    #[test]
    fn failure_requires_running() {
        let mut t = task("Write");
        assert!(t.fail("nope".to_string()).is_err());
        t.start(&HashSet::new()).unwrap();
        t.fail("provider down".to_string()).unwrap();
        assert_eq!(
            t.status(),
            &TaskStatus::Failed {
                reason: "provider down".to_string()
            }
        );
        assert!(t.status().is_terminal());
        assert!(t.start(&HashSet::new()).is_err());
    }

    #[test]
    fn start_waits_for_upstream() {
        let upstream = task("Research");
        let mut t = task("Write").depends_on(&upstream);

        let err = t.start(&HashSet::new()).unwrap_err();
        assert_eq!(
            err,
            TaskError::DependencyNotCompleted {
                task: t.id(),
                dependency: upstream.id()
            }
        );
        assert_eq!(t.status(), &TaskStatus::Pending);

        let done: HashSet<_> = [upstream.id()].into_iter().collect();
        t.start(&done).unwrap();
    }

    #[test]
    fn effective_input_contains_upstream_results() {
        let mut upstream = task("Research");
        upstream.start(&HashSet::new()).unwrap();
        let out = upstream.complete("Solar panels convert light.".to_string()).unwrap().clone();

        let t = task("Write an article").depends_on(&upstream);
        let input = t.effective_input(&[&out]);
        assert!(input.starts_with("Write an article"));
        assert!(input.contains("Expected output: A paragraph"));
        assert!(input.contains("Solar panels convert light."));

        let alone = task("Write an article").effective_input(&[]);
        assert!(!alone.contains("previous tasks"));
    }

    #[test]
    fn lookup_query_defaults_to_description() {
        let t = task("Solar Energy");
        assert_eq!(t.lookup_query(), "Solar Energy");
        let t = task("Research the topic thoroughly").with_lookup_query("Solar Energy");
        assert_eq!(t.lookup_query(), "Solar Energy");
    }
}
