use std::fmt;
use std::sync::Arc;

use crate::properties::Bean;

/// The task whose inputs are being declared
///
/// Only its path (for messages) and its annotated members (for discovery)
/// are used here; the task itself lives in the execution engine.
#[derive(Clone)]
pub struct Task {
    path: String,
    bean: Option<Arc<dyn Bean>>,
}

impl Task {
    /// A task without annotated members
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: normalize_path(path.into()),
            bean: None,
        }
    }

    /// A task whose annotated members are discovered from `bean`
    pub fn with_bean(path: impl Into<String>, bean: Arc<dyn Bean>) -> Self {
        Self {
            path: normalize_path(path.into()),
            bean: Some(bean),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn name(&self) -> &str {
        self.path.rsplit(':').next().unwrap_or(&self.path)
    }

    pub fn bean(&self) -> Option<&Arc<dyn Bean>> {
        self.bean.as_ref()
    }

    pub fn display_name(&self) -> String {
        self.to_string()
    }
}

fn normalize_path(path: String) -> String {
    if path.starts_with(':') {
        path
    } else {
        format!(":{}", path)
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task '{}'", self.path)
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("path", &self.path)
            .field("annotated", &self.bean.is_some())
            .finish()
    }
}
