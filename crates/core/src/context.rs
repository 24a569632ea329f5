//! Execution context for depth-bounded sub-agent spawning.
//!
//! A context is immutable once created; spawning derives a new one rather
//! than mutating the parent. Depth counts nesting from the root run (depth
//! 0), and `max_depth` caps how far delegation may nest. Iteration budgets
//! halve at each level so a delegation chain converges.

use serde::{Deserialize, Serialize};

use crate::error::ContextError;
use crate::task::TaskId;

/// Where in a delegation tree a run sits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionContext {
    /// Nesting level, 0 for the root run
    pub depth: u32,

    /// Maximum nesting level; `depth == max_depth` means no further spawns
    pub max_depth: u32,

    /// The task the root run is solving
    pub root_task_id: TaskId,

    /// The task of the immediate parent run, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_task_id: Option<TaskId>,

    /// Skill names along the path from the root, in spawn order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skill_chain: Vec<String>,
}

impl ExecutionContext {
    /// Context for a root run.
    pub fn root(task_id: TaskId, max_depth: u32) -> Self {
        Self {
            depth: 0,
            max_depth,
            root_task_id: task_id,
            parent_task_id: None,
            skill_chain: Vec::new(),
        }
    }

    /// Whether this run may spawn a sub-agent.
    pub fn can_spawn_sub_agent(&self) -> bool {
        self.depth < self.max_depth
    }

    /// Derive the context for a delegated sub-run. Fails fast if the depth
    /// bound is already reached; callers gate on `can_spawn_sub_agent` for
    /// the soft path.
    pub fn create_child_context(
        &self,
        task_id: TaskId,
        skill_name: impl Into<String>,
    ) -> Result<ExecutionContext, ContextError> {
        if !self.can_spawn_sub_agent() {
            return Err(ContextError::DepthExceeded {
                depth: self.depth,
                max_depth: self.max_depth,
            });
        }

        let mut skill_chain = self.skill_chain.clone();
        skill_chain.push(skill_name.into());

        Ok(ExecutionContext {
            depth: self.depth + 1,
            max_depth: self.max_depth,
            root_task_id: self.root_task_id.clone(),
            parent_task_id: Some(task_id),
            skill_chain,
        })
    }

    /// Iteration budget a child inherits from `base_iterations`: half,
    /// never below 1. Pure arithmetic, independent of spawn eligibility.
    pub fn get_iteration_budget_for_child(&self, base_iterations: u32) -> u32 {
        (base_iterations / 2).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_context_starts_at_depth_zero() {
        let ctx = ExecutionContext::root(TaskId::from("root"), 3);
        assert_eq!(ctx.depth, 0);
        assert!(ctx.parent_task_id.is_none());
        assert!(ctx.skill_chain.is_empty());
        assert!(ctx.can_spawn_sub_agent());
    }

    #[test]
    fn spawning_is_bounded_by_max_depth() {
        let root = ExecutionContext::root(TaskId::from("root"), 2);

        let child = root
            .create_child_context(TaskId::from("t1"), "research")
            .unwrap();
        assert_eq!(child.depth, 1);

        let grandchild = child
            .create_child_context(TaskId::from("t2"), "summarize")
            .unwrap();
        assert_eq!(grandchild.depth, 2);
        assert!(!grandchild.can_spawn_sub_agent());

        let err = grandchild
            .create_child_context(TaskId::from("t3"), "refine")
            .unwrap_err();
        assert!(matches!(
            err,
            ContextError::DepthExceeded {
                depth: 2,
                max_depth: 2
            }
        ));
    }

    #[test]
    fn max_depth_zero_cannot_spawn_at_all() {
        let root = ExecutionContext::root(TaskId::from("root"), 0);
        assert!(!root.can_spawn_sub_agent());
        assert!(root
            .create_child_context(TaskId::from("t1"), "anything")
            .is_err());
    }

    #[test]
    fn child_context_tracks_lineage() {
        let root = ExecutionContext::root(TaskId::from("root"), 3);
        let child = root
            .create_child_context(TaskId::from("parent-task"), "research")
            .unwrap();
        let grandchild = child
            .create_child_context(TaskId::from("child-task"), "extract")
            .unwrap();

        assert_eq!(grandchild.root_task_id.0, "root");
        assert_eq!(
            grandchild.parent_task_id.as_ref().unwrap().0,
            "child-task"
        );
        assert_eq!(grandchild.skill_chain, vec!["research", "extract"]);
    }

    #[test]
    fn child_budgets_halve_with_floor_of_one() {
        let root = ExecutionContext::root(TaskId::from("root"), 3);
        assert_eq!(root.get_iteration_budget_for_child(16), 8);

        let child = root
            .create_child_context(TaskId::from("t1"), "s1")
            .unwrap();
        assert_eq!(child.get_iteration_budget_for_child(8), 4);

        let grandchild = child
            .create_child_context(TaskId::from("t2"), "s2")
            .unwrap();
        assert_eq!(grandchild.get_iteration_budget_for_child(4), 2);

        assert_eq!(root.get_iteration_budget_for_child(1), 1);
        assert_eq!(root.get_iteration_budget_for_child(0), 1);
    }

    #[test]
    fn budget_arithmetic_ignores_spawn_eligibility() {
        let ctx = ExecutionContext::root(TaskId::from("root"), 0);
        assert!(!ctx.can_spawn_sub_agent());
        assert_eq!(ctx.get_iteration_budget_for_child(10), 5);
    }
}
