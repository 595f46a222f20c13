use thiserror::Error;

/// Errors raised while declaring, walking or resolving task inputs
#[derive(Error, Debug)]
pub enum InputsError {
    /// A declaration was attempted after the owning task started executing
    #[error("Cannot call {operation} on {task} after task has started execution")]
    IllegalMutation { operation: String, task: String },

    /// Annotation discovery reached a bean that is already being visited
    #[error("Cyclic property graph in {task}: {}", path.join(" -> "))]
    CyclicPropertyGraph { task: String, path: Vec<String> },

    /// A path sensitivity outside the recognised set
    #[error("Unknown path sensitivity: {0}")]
    UnknownNormalizer(String),

    /// A required property resolved to a missing, null or non-existent value
    #[error("Invalid value for property '{property}' of {task}: {reason}")]
    InvalidPropertyValue {
        task: String,
        property: String,
        reason: String,
    },

    /// A property with this name is already registered
    #[error("Property '{property}' is already declared on {task}")]
    DuplicateProperty { task: String, property: String },

    /// A deferred value producer or the file resolver failed
    #[error("Failed to resolve property '{property}': {source}")]
    Resolution {
        property: String,
        #[source]
        source: anyhow::Error,
    },

    /// Validation found one or more invalid properties
    #[error("Validation of {task} failed:\n  - {}", problems.join("\n  - "))]
    Validation { task: String, problems: Vec<String> },
}

impl InputsError {
    pub(crate) fn invalid_value(
        task: impl Into<String>,
        property: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        InputsError::InvalidPropertyValue {
            task: task.into(),
            property: property.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = InputsError> = std::result::Result<T, E>;
