/// Task lifecycle and the mutation guard
///
/// A task starts CONFIGURABLE and moves to LOCKED once, when it begins
/// executing. Declarations are only accepted while CONFIGURABLE.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

use crate::error::{InputsError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Configurable,
    Locked,
}

/// Shared handle on a task's lifecycle state
///
/// Clones observe the same state; the execution engine keeps one to call
/// [`TaskLifecycle::lock`] and the task's registry keeps another.
#[derive(Debug, Clone, Default)]
pub struct TaskLifecycle {
    locked: Arc<AtomicBool>,
}

impl TaskLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> TaskState {
        if self.locked.load(Ordering::Acquire) {
            TaskState::Locked
        } else {
            TaskState::Configurable
        }
    }

    pub fn is_locked(&self) -> bool {
        self.state() == TaskState::Locked
    }

    /// Move to LOCKED. Returns false if the task was already locked.
    pub fn lock(&self) -> bool {
        let was_locked = self.locked.swap(true, Ordering::AcqRel);
        if !was_locked {
            debug!(operation = "lifecycle.lock", "task locked for execution");
        }
        !was_locked
    }
}

/// Rejects mutations of a task's declarations once it has started executing
#[derive(Debug, Clone)]
pub struct TaskMutator {
    task: String,
    lifecycle: TaskLifecycle,
}

impl TaskMutator {
    pub fn new(task: impl Into<String>, lifecycle: TaskLifecycle) -> Self {
        Self {
            task: task.into(),
            lifecycle,
        }
    }

    pub fn lifecycle(&self) -> &TaskLifecycle {
        &self.lifecycle
    }

    pub fn assert_mutable(&self, operation: &str) -> Result<()> {
        if self.lifecycle.is_locked() {
            debug!(
                task = %self.task,
                operation,
                status = "rejected",
                "mutation after task locked"
            );
            return Err(InputsError::IllegalMutation {
                operation: operation.to_string(),
                task: self.task.clone(),
            });
        }
        Ok(())
    }
}
