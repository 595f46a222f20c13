// Library interface for fabrik-inputs
// Task input declarations: explicit registration, annotation discovery,
// and lazy queries over a task's files and values.

pub mod config;
pub mod descriptor;
pub mod error;
pub mod inputs;
pub mod lifecycle;
pub mod logging;
pub mod properties;
pub mod resolver;
pub mod task;
pub mod value;

// Re-export commonly used types
pub use config::{discover_config, InputsConfig};
pub use error::{InputsError, Result};
pub use inputs::{FileSet, FileSetView, TaskInputs};
pub use lifecycle::{TaskLifecycle, TaskMutator, TaskState};
pub use properties::{NormalizerKind, PathSensitivity, PropertyVisitor, PropertyWalker};
pub use resolver::{BaseDirResolver, FileResolver};
pub use task::Task;
pub use value::LazyValue;
